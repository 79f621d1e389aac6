//! Memory descriptors: shape, element type, and physical layout of one
//! tensor argument, independent of its backing storage.

use crate::dtype::DataType;
use crate::status::{PlanError, PlanResult};

/// Highest tensor rank any descriptor family handles.
pub const MAX_NDIMS: usize = 5;

/// Logical extent of one axis.
pub type Dim = i64;

/// Physical layout tag. A closed set: the channel-major family with trailing
/// spatial axes, one tag per rank, plus `Undef` for "no layout fixed yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FormatTag {
    Undef,
    /// 1D `[channels]`, bias vectors.
    X,
    /// 2D `[batch, channels]`.
    Nc,
    /// 3D `[batch, channels, width]`.
    Ncw,
    /// 4D `[batch, channels, height, width]`.
    Nchw,
    /// 5D `[batch, channels, depth, height, width]`.
    Ncdhw,
}

impl FormatTag {
    /// Rank this tag describes, `None` for `Undef`.
    pub const fn ndims(self) -> Option<usize> {
        match self {
            Self::Undef => None,
            Self::X => Some(1),
            Self::Nc => Some(2),
            Self::Ncw => Some(3),
            Self::Nchw => Some(4),
            Self::Ncdhw => Some(5),
        }
    }
}

/// Shape/type/layout description of one tensor argument.
///
/// `padded_dims` carries the physical extents for layouts that round an axis
/// up; for the plain channel-major tags it equals `dims`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryDesc {
    ndims: usize,
    dims: [Dim; MAX_NDIMS],
    padded_dims: [Dim; MAX_NDIMS],
    data_type: DataType,
    format: FormatTag,
}

impl MemoryDesc {
    /// Build a descriptor in a concrete layout. The tag's rank must match the
    /// number of extents given.
    pub fn new(dims: &[Dim], data_type: DataType, format: FormatTag) -> PlanResult<Self> {
        if dims.is_empty() || dims.len() > MAX_NDIMS {
            return Err(PlanError::InvalidDesc("rank must be within 1..=5"));
        }
        if dims.iter().any(|&d| d < 0) {
            return Err(PlanError::InvalidDesc("negative extent"));
        }
        if let Some(tag_ndims) = format.ndims() {
            if tag_ndims != dims.len() {
                return Err(PlanError::InvalidDesc("format tag rank mismatch"));
            }
        }
        let mut d = [0; MAX_NDIMS];
        d[..dims.len()].copy_from_slice(dims);
        Ok(Self {
            ndims: dims.len(),
            dims: d,
            padded_dims: d,
            data_type,
            format,
        })
    }

    /// The shared "absent" descriptor: rank 0, no layout. Argument slots a
    /// variant does not define are bound to this.
    pub const fn zero() -> Self {
        Self {
            ndims: 0,
            dims: [0; MAX_NDIMS],
            padded_dims: [0; MAX_NDIMS],
            data_type: DataType::F32,
            format: FormatTag::Undef,
        }
    }

    /// Override the physical extents for a blocked/rounded layout. Each padded
    /// extent must cover its logical extent.
    pub fn with_padded_dims(mut self, padded: &[Dim]) -> PlanResult<Self> {
        if padded.len() != self.ndims {
            return Err(PlanError::InvalidDesc("padded rank mismatch"));
        }
        for (i, &p) in padded.iter().enumerate() {
            if p < self.dims[i] {
                return Err(PlanError::InvalidDesc("padded extent below logical extent"));
            }
            self.padded_dims[i] = p;
        }
        Ok(self)
    }

    pub fn ndims(&self) -> usize {
        self.ndims
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims[..self.ndims]
    }

    pub fn padded_dims(&self) -> &[Dim] {
        &self.padded_dims[..self.ndims]
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// True for the absent sentinel.
    pub fn is_zero(&self) -> bool {
        self.ndims == 0
    }

    /// True iff at least one logical extent is zero.
    pub fn has_zero_dim(&self) -> bool {
        self.dims().iter().any(|&d| d == 0)
    }

    /// Total logical element count.
    pub fn nelems(&self) -> Dim {
        if self.is_zero() {
            return 0;
        }
        self.dims().iter().product()
    }

    /// Product of logical extents over `axes` (e.g. all non-batch axes).
    pub fn dims_product(&self, axes: std::ops::Range<usize>) -> Dim {
        self.dims[axes.start.min(self.ndims)..axes.end.min(self.ndims)]
            .iter()
            .product()
    }

    /// Product of padded extents over `axes`.
    pub fn padded_dims_product(&self, axes: std::ops::Range<usize>) -> Dim {
        self.padded_dims[axes.start.min(self.ndims)..axes.end.min(self.ndims)]
            .iter()
            .product()
    }

    /// True iff this descriptor is laid out in one of `tags`.
    pub fn matches_one_of(&self, tags: &[FormatTag]) -> bool {
        self.format != FormatTag::Undef && tags.contains(&self.format)
    }

    /// Whether the physical layout is fully pinned down (a concrete blocking
    /// structure exists). Padded-extent queries require this.
    pub fn is_blocking_desc(&self) -> bool {
        self.format != FormatTag::Undef && self.ndims > 0
    }

    /// Format compatibility: same blocking structure and padding.
    pub fn format_compatible(&self, other: &MemoryDesc) -> bool {
        self.ndims == other.ndims
            && self.format == other.format
            && self.padded_dims() == other.padded_dims()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_tag_must_agree() {
        assert!(MemoryDesc::new(&[2, 16, 4, 4], DataType::F32, FormatTag::Nchw).is_ok());
        assert_eq!(
            MemoryDesc::new(&[2, 16, 4], DataType::F32, FormatTag::Nchw),
            Err(PlanError::InvalidDesc("format tag rank mismatch"))
        );
    }

    #[test]
    fn zero_dim_detection() {
        let md = MemoryDesc::new(&[0, 16], DataType::F32, FormatTag::Nc).unwrap();
        assert!(md.has_zero_dim());
        assert!(!md.is_zero());
        assert!(!MemoryDesc::new(&[4, 16], DataType::F32, FormatTag::Nc)
            .unwrap()
            .has_zero_dim());
    }

    #[test]
    fn absent_sentinel() {
        let md = MemoryDesc::zero();
        assert!(md.is_zero());
        assert_eq!(md.nelems(), 0);
        assert!(!md.is_blocking_desc());
    }

    #[test]
    fn padded_dims_cover_logical() {
        let md = MemoryDesc::new(&[2, 60, 3, 3], DataType::F32, FormatTag::Nchw)
            .unwrap()
            .with_padded_dims(&[2, 64, 3, 3])
            .unwrap();
        assert_eq!(md.padded_dims_product(1..4), 64 * 3 * 3);
        assert_eq!(md.dims_product(1..4), 60 * 3 * 3);
        assert!(MemoryDesc::new(&[2, 60], DataType::F32, FormatTag::Nc)
            .unwrap()
            .with_padded_dims(&[2, 32])
            .is_err());
    }

    #[test]
    fn format_compatibility_requires_padding_match() {
        let a = MemoryDesc::new(&[2, 60, 3, 3], DataType::F32, FormatTag::Nchw)
            .unwrap()
            .with_padded_dims(&[2, 64, 3, 3])
            .unwrap();
        let b = MemoryDesc::new(&[2, 60, 3, 3], DataType::F32, FormatTag::Nchw).unwrap();
        assert!(!a.format_compatible(&b));
        assert!(a.format_compatible(&a));
    }
}
