//! Inner-product (fully-connected) descriptor family.
//!
//! Three variants (forward, backward-w.r.t.-data, backward-w.r.t.-weights)
//! share one value type parameterized by a variant tag. All shape accessors
//! are written once against the propagation-direction-invariant slot
//! selection in [`prop_invariant_md`] instead of being duplicated per
//! direction.

use crate::attr::PrimitiveAttr;
use crate::dtype::DataType;
use crate::memory::{Dim, MemoryDesc};
use crate::primitive::{
    ArgId, ArgUsage, OpDescRef, PrimitiveDesc, PrimitiveKind, PropKind, Query, QueryAnswer,
};
use crate::scratchpad::ScratchpadRegistry;
use crate::status::{PlanError, PlanResult};

/// Logical argument roles of the family, before direction resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpRole {
    Src,
    Weights,
    Bias,
    Dst,
}

/// Immutable operator description: one memory descriptor per slot that can
/// exist for some direction, plus the accumulation type. Slots a direction
/// does not use stay at [`MemoryDesc::zero`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InnerProductDesc {
    pub prop_kind: PropKind,
    pub src_desc: MemoryDesc,
    pub diff_src_desc: MemoryDesc,
    pub weights_desc: MemoryDesc,
    pub diff_weights_desc: MemoryDesc,
    pub bias_desc: MemoryDesc,
    pub diff_bias_desc: MemoryDesc,
    pub dst_desc: MemoryDesc,
    pub diff_dst_desc: MemoryDesc,
    pub accum_data_type: DataType,
}

impl InnerProductDesc {
    fn blank(prop_kind: PropKind, accum_data_type: DataType) -> Self {
        Self {
            prop_kind,
            src_desc: MemoryDesc::zero(),
            diff_src_desc: MemoryDesc::zero(),
            weights_desc: MemoryDesc::zero(),
            diff_weights_desc: MemoryDesc::zero(),
            bias_desc: MemoryDesc::zero(),
            diff_bias_desc: MemoryDesc::zero(),
            dst_desc: MemoryDesc::zero(),
            diff_dst_desc: MemoryDesc::zero(),
            accum_data_type,
        }
    }

    /// Forward pass: `dst = src * weights^T (+ bias)`.
    pub fn forward(
        prop_kind: PropKind,
        src: MemoryDesc,
        weights: MemoryDesc,
        bias: Option<MemoryDesc>,
        dst: MemoryDesc,
        accum_data_type: DataType,
    ) -> PlanResult<Self> {
        if !prop_kind.is_fwd() {
            return Err(PlanError::InvalidDesc("forward desc needs a forward prop kind"));
        }
        let mut desc = Self::blank(prop_kind, accum_data_type);
        desc.src_desc = src;
        desc.weights_desc = weights;
        desc.bias_desc = bias.unwrap_or_else(MemoryDesc::zero);
        desc.dst_desc = dst;
        Ok(desc)
    }

    /// Backward-data pass: `diff_src = diff_dst * weights`.
    pub fn backward_data(
        diff_src: MemoryDesc,
        weights: MemoryDesc,
        diff_dst: MemoryDesc,
        accum_data_type: DataType,
    ) -> Self {
        let mut desc = Self::blank(PropKind::BackwardData, accum_data_type);
        desc.diff_src_desc = diff_src;
        desc.weights_desc = weights;
        desc.diff_dst_desc = diff_dst;
        desc
    }

    /// Backward-weights pass: `diff_weights = diff_dst^T * src`.
    pub fn backward_weights(
        src: MemoryDesc,
        diff_weights: MemoryDesc,
        diff_bias: Option<MemoryDesc>,
        diff_dst: MemoryDesc,
        accum_data_type: DataType,
    ) -> Self {
        let mut desc = Self::blank(PropKind::BackwardWeights, accum_data_type);
        desc.src_desc = src;
        desc.diff_weights_desc = diff_weights;
        desc.diff_bias_desc = diff_bias.unwrap_or_else(MemoryDesc::zero);
        desc.diff_dst_desc = diff_dst;
        desc
    }
}

/// Select the memory descriptor that plays `role` for the description's
/// propagation direction.
///
/// The forward pass reads the plain slots; backward-data substitutes the diff
/// counterpart for source, backward-weights for weights and bias, and every
/// backward direction for destination. Each shape accessor goes through this
/// single table.
pub fn prop_invariant_md(desc: &InnerProductDesc, role: IpRole) -> &MemoryDesc {
    match role {
        IpRole::Src => {
            if desc.prop_kind == PropKind::BackwardData {
                &desc.diff_src_desc
            } else {
                &desc.src_desc
            }
        }
        IpRole::Weights => {
            if desc.prop_kind == PropKind::BackwardWeights {
                &desc.diff_weights_desc
            } else {
                &desc.weights_desc
            }
        }
        IpRole::Bias => {
            if desc.prop_kind == PropKind::BackwardWeights {
                &desc.diff_bias_desc
            } else {
                &desc.bias_desc
            }
        }
        IpRole::Dst => {
            if desc.prop_kind.is_fwd() {
                &desc.dst_desc
            } else {
                &desc.diff_dst_desc
            }
        }
    }
}

/// Which of the three descriptor variants a prop kind selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVariant {
    Forward,
    BackwardData,
    BackwardWeights,
}

impl IpVariant {
    fn from_prop_kind(prop_kind: PropKind) -> PlanResult<Self> {
        match prop_kind {
            PropKind::ForwardTraining | PropKind::ForwardInference => Ok(Self::Forward),
            PropKind::BackwardData => Ok(Self::BackwardData),
            PropKind::BackwardWeights => Ok(Self::BackwardWeights),
            PropKind::Backward => Err(PlanError::Unimplemented(
                "combined backward is not defined for inner product",
            )),
        }
    }
}

/// Validated inner-product primitive descriptor.
///
/// One value type covers all three variants; the variant tag drives the
/// argument-role table and the indexed accessors.
#[derive(Debug, Clone)]
pub struct InnerProductPd {
    desc: InnerProductDesc,
    attr: PrimitiveAttr,
    variant: IpVariant,
    scratchpad: ScratchpadRegistry,
}

impl InnerProductPd {
    pub const NAME: &'static str = "ip:any";

    /// Validate the description and freeze the descriptor.
    ///
    /// Backward variants take the paired forward descriptor; backward-weights
    /// requires bias presence to mirror it.
    pub fn new(
        desc: InnerProductDesc,
        attr: PrimitiveAttr,
        hint_fwd_pd: Option<&InnerProductPd>,
    ) -> PlanResult<Self> {
        let variant = IpVariant::from_prop_kind(desc.prop_kind)?;

        let src = prop_invariant_md(&desc, IpRole::Src);
        let wei = prop_invariant_md(&desc, IpRole::Weights);
        let dst = prop_invariant_md(&desc, IpRole::Dst);
        let ndims = src.ndims();
        if !(2..=5).contains(&ndims) {
            return Err(PlanError::InvalidDesc("source rank must be within 2..=5"));
        }
        if wei.ndims() != ndims {
            return Err(PlanError::InvalidDesc("weights rank must match source rank"));
        }
        if dst.ndims() != 2 {
            return Err(PlanError::InvalidDesc("destination must be [batch, channels]"));
        }
        if src.dims()[0] != dst.dims()[0] {
            return Err(PlanError::InvalidDesc("batch extent mismatch"));
        }
        if wei.dims()[0] != dst.dims()[1] {
            return Err(PlanError::InvalidDesc("weights leading extent must be OC"));
        }
        if wei.dims()[1..] != src.dims()[1..] {
            return Err(PlanError::InvalidDesc("weights trailing extents must match source"));
        }
        let bias = prop_invariant_md(&desc, IpRole::Bias);
        if !bias.is_zero() {
            if bias.ndims() != 1 {
                return Err(PlanError::InvalidDesc("bias must be a vector"));
            }
            if bias.dims()[0] != dst.dims()[1] {
                return Err(PlanError::InvalidDesc("bias extent must be OC"));
            }
        }

        let pd = Self {
            desc,
            attr,
            variant,
            scratchpad: ScratchpadRegistry::new(),
        };

        match variant {
            IpVariant::Forward => {
                if hint_fwd_pd.is_some() {
                    return Err(PlanError::InvalidDesc("forward variant takes no hint"));
                }
            }
            IpVariant::BackwardData => {}
            IpVariant::BackwardWeights => {
                if let Some(hint) = hint_fwd_pd {
                    if hint.variant != IpVariant::Forward {
                        return Err(PlanError::InvalidDesc("hint must be a forward descriptor"));
                    }
                    if hint.with_bias() != pd.with_bias() {
                        return Err(PlanError::Unimplemented(
                            "bias presence must mirror the paired forward descriptor",
                        ));
                    }
                }
            }
        }

        log::debug!("{}: descriptor ready ({:?})", Self::NAME, pd.variant);
        Ok(pd)
    }

    pub fn desc(&self) -> &InnerProductDesc {
        &self.desc
    }

    pub fn attr(&self) -> &PrimitiveAttr {
        &self.attr
    }

    pub fn variant(&self) -> IpVariant {
        self.variant
    }

    fn inv(&self, role: IpRole) -> &MemoryDesc {
        prop_invariant_md(&self.desc, role)
    }

    // Shape accessors, all through the invariant slot selection.

    pub fn ndims(&self) -> usize {
        self.inv(IpRole::Src).ndims()
    }

    pub fn mb(&self) -> Dim {
        self.inv(IpRole::Src).dims()[0]
    }

    pub fn ic(&self) -> Dim {
        self.inv(IpRole::Src).dims()[1]
    }

    pub fn oc(&self) -> Dim {
        self.inv(IpRole::Dst).dims()[1]
    }

    fn spatial(md: &MemoryDesc, ndims: usize, from_end: usize) -> Dim {
        if ndims >= from_end && md.ndims() >= from_end {
            md.dims()[md.ndims() - (from_end - 2)]
        } else {
            1
        }
    }

    pub fn id(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Src), self.ndims(), 5)
    }

    pub fn ih(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Src), self.ndims(), 4)
    }

    pub fn iw(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Src), self.ndims(), 3)
    }

    pub fn od(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Dst), self.inv(IpRole::Dst).ndims(), 5)
    }

    pub fn oh(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Dst), self.inv(IpRole::Dst).ndims(), 4)
    }

    pub fn ow(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Dst), self.inv(IpRole::Dst).ndims(), 3)
    }

    pub fn kd(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Weights), self.ndims(), 5)
    }

    pub fn kh(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Weights), self.ndims(), 4)
    }

    pub fn kw(&self) -> Dim {
        Self::spatial(self.inv(IpRole::Weights), self.ndims(), 3)
    }

    /// Total input-channel count: product of all non-batch source axes.
    pub fn ic_total(&self) -> Dim {
        let src = self.inv(IpRole::Src);
        src.dims_product(1..src.ndims())
    }

    /// Padded total input-channel count. Requires a pinned-down blocked
    /// layout; returns `-1` when the layout is not a blocking descriptor,
    /// which callers must treat as a precondition violation.
    pub fn ic_total_padded(&self) -> Dim {
        let src = if self.desc.prop_kind == PropKind::BackwardData {
            &self.desc.diff_src_desc
        } else {
            &self.desc.src_desc
        };
        if !src.is_blocking_desc() {
            return -1;
        }
        src.padded_dims_product(1..src.ndims())
    }

    /// Bias participates iff its descriptor is non-degenerate.
    pub fn with_bias(&self) -> bool {
        let bias = self.inv(IpRole::Bias);
        !bias.is_zero() && !bias.has_zero_dim()
    }

    pub fn has_zero_dim_memory(&self) -> bool {
        self.inv(IpRole::Src).has_zero_dim() || self.inv(IpRole::Dst).has_zero_dim()
    }

    pub fn is_fwd(&self) -> bool {
        self.desc.prop_kind.is_fwd()
    }

    /// Check each expected data type against the frozen descriptors; `None`
    /// means "don't care". Bias is checked only when it participates.
    pub fn expect_data_types(
        &self,
        src: Option<DataType>,
        wei: Option<DataType>,
        bia: Option<DataType>,
        dst: Option<DataType>,
        acc: Option<DataType>,
    ) -> bool {
        let matches = |want: Option<DataType>, have: DataType| want.is_none_or(|t| t == have);
        let mut ok = matches(src, self.inv(IpRole::Src).data_type())
            && matches(wei, self.inv(IpRole::Weights).data_type())
            && matches(dst, self.inv(IpRole::Dst).data_type())
            && matches(acc, self.desc.accum_data_type);
        if self.with_bias() {
            ok = ok && matches(bia, self.inv(IpRole::Bias).data_type());
        }
        ok
    }

    // Indexed accessors. Slots a variant does not define, and indices beyond
    // what it defines, answer `None`.

    pub fn src_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::Forward | IpVariant::BackwardWeights, 0) => Some(&self.desc.src_desc),
            _ => None,
        }
    }

    pub fn dst_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::Forward, 0) => Some(&self.desc.dst_desc),
            _ => None,
        }
    }

    pub fn weights_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::Forward | IpVariant::BackwardData, 0) => Some(&self.desc.weights_desc),
            (IpVariant::Forward, 1) if self.with_bias() => Some(&self.desc.bias_desc),
            _ => None,
        }
    }

    pub fn diff_src_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::BackwardData, 0) => Some(&self.desc.diff_src_desc),
            _ => None,
        }
    }

    pub fn diff_dst_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::BackwardData | IpVariant::BackwardWeights, 0) => {
                Some(&self.desc.diff_dst_desc)
            }
            _ => None,
        }
    }

    pub fn diff_weights_md(&self, index: usize) -> Option<&MemoryDesc> {
        match (self.variant, index) {
            (IpVariant::BackwardWeights, 0) => Some(&self.desc.diff_weights_desc),
            (IpVariant::BackwardWeights, 1) if self.with_bias() => Some(&self.desc.diff_bias_desc),
            _ => None,
        }
    }
}

impl PrimitiveDesc for InnerProductPd {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::InnerProduct
    }

    fn op_desc(&self) -> OpDescRef<'_> {
        OpDescRef::InnerProduct(&self.desc)
    }

    fn impl_info(&self) -> &'static str {
        Self::NAME
    }

    fn arg_usage(&self, arg: ArgId) -> ArgUsage {
        match (self.variant, arg) {
            (IpVariant::Forward, ArgId::Src | ArgId::Weights) => ArgUsage::Input,
            (IpVariant::Forward, ArgId::Bias) if self.with_bias() => ArgUsage::Input,
            (IpVariant::Forward, ArgId::Dst) => ArgUsage::Output,

            (IpVariant::BackwardData, ArgId::Weights | ArgId::DiffDst) => ArgUsage::Input,
            (IpVariant::BackwardData, ArgId::DiffSrc) => ArgUsage::Output,

            (IpVariant::BackwardWeights, ArgId::Src | ArgId::DiffDst) => ArgUsage::Input,
            (IpVariant::BackwardWeights, ArgId::DiffWeights) => ArgUsage::Output,
            (IpVariant::BackwardWeights, ArgId::DiffBias) if self.with_bias() => ArgUsage::Output,

            _ => ArgUsage::Unused,
        }
    }

    fn arg_md(&self, arg: ArgId) -> Option<&MemoryDesc> {
        match arg {
            ArgId::Src => self.src_md(0),
            ArgId::Weights => self.weights_md(0),
            ArgId::Bias => self.weights_md(1),
            ArgId::Dst => self.dst_md(0),
            ArgId::DiffSrc => self.diff_src_md(0),
            ArgId::DiffWeights => self.diff_weights_md(0),
            ArgId::DiffBias => self.diff_weights_md(1),
            ArgId::DiffDst => self.diff_dst_md(0),
            _ => None,
        }
    }

    fn n_inputs(&self) -> usize {
        match self.variant {
            IpVariant::Forward => 2 + usize::from(self.with_bias()),
            IpVariant::BackwardData | IpVariant::BackwardWeights => 2,
        }
    }

    fn n_outputs(&self) -> usize {
        match self.variant {
            IpVariant::Forward | IpVariant::BackwardData => 1,
            IpVariant::BackwardWeights => 1 + usize::from(self.with_bias()),
        }
    }

    fn scratchpad_registry(&self) -> &ScratchpadRegistry {
        &self.scratchpad
    }

    fn query(&self, what: Query) -> PlanResult<QueryAnswer<'_>> {
        match what {
            Query::InnerProductDesc => Ok(QueryAnswer::OpDesc(self.op_desc())),
            _ => self.query_generic(what),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FormatTag;

    fn md(dims: &[Dim], tag: FormatTag) -> MemoryDesc {
        MemoryDesc::new(dims, DataType::F32, tag).unwrap()
    }

    fn fwd_desc(with_bias: bool) -> InnerProductDesc {
        InnerProductDesc::forward(
            PropKind::ForwardTraining,
            md(&[16, 32], FormatTag::Nc),
            md(&[8, 32], FormatTag::Nc),
            with_bias.then(|| md(&[8], FormatTag::X)),
            md(&[16, 8], FormatTag::Nc),
            DataType::F32,
        )
        .unwrap()
    }

    #[test]
    fn rank2_channel_accessors() {
        let pd = InnerProductPd::new(fwd_desc(false), PrimitiveAttr::new(), None).unwrap();
        assert_eq!(pd.ic(), 32);
        assert_eq!(pd.ic_total(), 32);
        assert_eq!(pd.oc(), 8);
        assert_eq!(pd.mb(), 16);
        assert_eq!((pd.id(), pd.ih(), pd.iw()), (1, 1, 1));
    }

    #[test]
    fn rank4_spatial_accessors() {
        let desc = InnerProductDesc::forward(
            PropKind::ForwardInference,
            md(&[2, 16, 3, 3], FormatTag::Nchw),
            md(&[8, 16, 3, 3], FormatTag::Nchw),
            None,
            md(&[2, 8], FormatTag::Nc),
            DataType::F32,
        )
        .unwrap();
        let pd = InnerProductPd::new(desc, PrimitiveAttr::new(), None).unwrap();
        assert_eq!(pd.ic_total(), 16 * 3 * 3);
        assert_eq!((pd.ih(), pd.iw()), (3, 3));
        assert_eq!((pd.kh(), pd.kw()), (3, 3));
        assert_eq!((pd.od(), pd.oh(), pd.ow()), (1, 1, 1));
        assert_eq!(pd.id(), 1);
    }

    #[test]
    fn io_counts_follow_bias() {
        let with = InnerProductPd::new(fwd_desc(true), PrimitiveAttr::new(), None).unwrap();
        assert_eq!(with.n_inputs(), 3);
        assert_eq!(with.n_outputs(), 1);
        assert!(with.with_bias());

        let without = InnerProductPd::new(fwd_desc(false), PrimitiveAttr::new(), None).unwrap();
        assert_eq!(without.n_inputs(), 2);
        assert!(!without.with_bias());
    }

    #[test]
    fn backward_data_roles() {
        let desc = InnerProductDesc::backward_data(
            md(&[16, 32], FormatTag::Nc),
            md(&[8, 32], FormatTag::Nc),
            md(&[16, 8], FormatTag::Nc),
            DataType::F32,
        );
        let pd = InnerProductPd::new(desc, PrimitiveAttr::new(), None).unwrap();
        assert_eq!(pd.arg_usage(ArgId::Weights), ArgUsage::Input);
        assert_eq!(pd.arg_usage(ArgId::DiffDst), ArgUsage::Input);
        assert_eq!(pd.arg_usage(ArgId::DiffSrc), ArgUsage::Output);
        assert_eq!(pd.arg_usage(ArgId::Bias), ArgUsage::Unused);
        assert_eq!(pd.ic(), 32);
        assert_eq!(pd.oc(), 8);
        assert!(pd.src_md(0).is_none());
        assert!(pd.diff_src_md(0).is_some());
    }

    #[test]
    fn backward_weights_mirrors_hint_bias() {
        let fwd = InnerProductPd::new(fwd_desc(true), PrimitiveAttr::new(), None).unwrap();
        let bwd_desc = InnerProductDesc::backward_weights(
            md(&[16, 32], FormatTag::Nc),
            md(&[8, 32], FormatTag::Nc),
            None,
            md(&[16, 8], FormatTag::Nc),
            DataType::F32,
        );
        let err = InnerProductPd::new(bwd_desc, PrimitiveAttr::new(), Some(&fwd)).unwrap_err();
        assert!(err.is_unimplemented());

        let bwd_desc = InnerProductDesc::backward_weights(
            md(&[16, 32], FormatTag::Nc),
            md(&[8, 32], FormatTag::Nc),
            Some(md(&[8], FormatTag::X)),
            md(&[16, 8], FormatTag::Nc),
            DataType::F32,
        );
        let pd = InnerProductPd::new(bwd_desc, PrimitiveAttr::new(), Some(&fwd)).unwrap();
        assert_eq!(pd.n_outputs(), 2);
        assert_eq!(pd.arg_usage(ArgId::DiffBias), ArgUsage::Output);
        assert!(pd.diff_weights_md(1).is_some());
        assert!(pd.diff_weights_md(2).is_none());
    }

    #[test]
    fn zero_dim_memory_across_ranks() {
        for dims in [
            &[0i64, 16][..],
            &[2, 16, 0][..],
            &[2, 0, 3, 3][..],
            &[2, 16, 0, 3, 3][..],
        ] {
            let tag = match dims.len() {
                2 => FormatTag::Nc,
                3 => FormatTag::Ncw,
                4 => FormatTag::Nchw,
                _ => FormatTag::Ncdhw,
            };
            let mut wdims = dims.to_vec();
            wdims[0] = 8;
            wdims[1] = dims[1];
            let desc = InnerProductDesc::forward(
                PropKind::ForwardTraining,
                md(dims, tag),
                md(&wdims, tag),
                None,
                md(&[dims[0], 8], FormatTag::Nc),
                DataType::F32,
            )
            .unwrap();
            let pd = InnerProductPd::new(desc, PrimitiveAttr::new(), None).unwrap();
            assert!(pd.has_zero_dim_memory());
        }
        let pd = InnerProductPd::new(fwd_desc(false), PrimitiveAttr::new(), None).unwrap();
        assert!(!pd.has_zero_dim_memory());
    }

    #[test]
    fn padded_channel_count_needs_blocking() {
        let pd = InnerProductPd::new(fwd_desc(false), PrimitiveAttr::new(), None).unwrap();
        assert_eq!(pd.ic_total_padded(), 32);

        let desc = InnerProductDesc::forward(
            PropKind::ForwardTraining,
            md(&[16, 32], FormatTag::Undef),
            md(&[8, 32], FormatTag::Nc),
            None,
            md(&[16, 8], FormatTag::Nc),
            DataType::F32,
        )
        .unwrap();
        let pd = InnerProductPd::new(desc, PrimitiveAttr::new(), None).unwrap();
        assert_eq!(pd.ic_total_padded(), -1);
    }

    #[test]
    fn expected_data_types_with_dont_care() {
        let pd = InnerProductPd::new(fwd_desc(true), PrimitiveAttr::new(), None).unwrap();
        assert!(pd.expect_data_types(
            Some(DataType::F32),
            None,
            Some(DataType::F32),
            Some(DataType::F32),
            Some(DataType::F32),
        ));
        assert!(!pd.expect_data_types(Some(DataType::BF16), None, None, None, None));
    }

    #[test]
    fn combined_backward_is_rejected() {
        let mut desc = fwd_desc(false);
        desc.prop_kind = PropKind::Backward;
        desc.diff_dst_desc = desc.dst_desc;
        desc.diff_src_desc = desc.src_desc;
        let err = InnerProductPd::new(desc, PrimitiveAttr::new(), None).unwrap_err();
        assert!(err.is_unimplemented());
    }
}
