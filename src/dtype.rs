//! Element data types shared across descriptor families.

use std::mem;

/// Storage data type of one tensor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    F32,
    F16,
    BF16,
    /// 8-bit unsigned, used for workspace masks.
    U8,
    S32,
}

impl DataType {
    /// Size in bytes per element.
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::F32 => mem::size_of::<f32>(),
            Self::F16 => mem::size_of::<half::f16>(),
            Self::BF16 => mem::size_of::<half::bf16>(),
            Self::U8 => mem::size_of::<u8>(),
            Self::S32 => mem::size_of::<i32>(),
        }
    }

    /// The type used internally for sums and reductions, regardless of
    /// storage precision. The 16-bit float formats accumulate in f32.
    pub const fn accumulation(self) -> DataType {
        match self {
            Self::F32 | Self::F16 | Self::BF16 => Self::F32,
            Self::U8 | Self::S32 => Self::S32,
        }
    }

    /// True for the reduced-precision float formats that need a conversion
    /// buffer and an ISA gate.
    pub const fn is_reduced_float(self) -> bool {
        matches!(self, Self::F16 | Self::BF16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(DataType::F32.size_bytes(), 4);
        assert_eq!(DataType::BF16.size_bytes(), 2);
        assert_eq!(DataType::F16.size_bytes(), 2);
        assert_eq!(DataType::U8.size_bytes(), 1);
    }

    #[test]
    fn accumulation_widens() {
        assert_eq!(DataType::BF16.accumulation(), DataType::F32);
        assert_eq!(DataType::F32.accumulation(), DataType::F32);
    }
}
