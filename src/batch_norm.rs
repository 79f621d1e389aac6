//! Batch-normalization descriptor and scratchpad planner for the
//! channel-major (ncsp) layout family.
//!
//! `init`-time validation either freezes a ready descriptor or answers
//! `Unimplemented` so the caller can negotiate another implementation. All
//! scratch sizes are closed-form functions of shape, channel count, element
//! width, and the engine's worker-pool width; execution never allocates.

use crate::attr::PrimitiveAttr;
use crate::dtype::DataType;
use crate::engine::Engine;
use crate::isa::IsaLevel;
use crate::memory::{Dim, FormatTag, MemoryDesc};
use crate::primitive::{
    ArgId, ArgUsage, OpDescRef, PrimitiveDesc, PrimitiveKind, PropKind, Query, QueryAnswer,
};
use crate::scratchpad::{ScratchKey, ScratchpadRegistry};
use crate::status::{PlanError, PlanResult};

/// Layouts the ncsp family accepts, one per supported rank.
const NCSP_TAGS: [FormatTag; 3] = [FormatTag::Ncdhw, FormatTag::Nchw, FormatTag::Nc];

/// Lane width the reduced-precision conversion buffers are rounded to.
const CVT_SIMD_W: Dim = 16;

/// Workspace elements are single bytes (one activation mask per value).
const WS_DATA_TYPE: DataType = DataType::U8;

/// Behavior switches of one batch-normalization operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BnormFlags {
    /// Statistics are supplied by the caller instead of being computed.
    pub use_global_stats: bool,
    /// Apply learned per-channel scale and shift.
    pub use_scale_shift: bool,
    /// Fuse a ReLU into the normalization and keep its mask in a workspace.
    pub fuse_norm_relu: bool,
}

/// Immutable operator description for batch normalization.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchNormDesc {
    pub prop_kind: PropKind,
    pub src_desc: MemoryDesc,
    pub diff_src_desc: MemoryDesc,
    /// Scale-shift parameters, `[2, C]` in f32 when in use.
    pub scale_shift_desc: MemoryDesc,
    pub diff_scale_shift_desc: MemoryDesc,
    pub epsilon: f32,
    pub flags: BnormFlags,
    pub accum_data_type: DataType,
}

impl BatchNormDesc {
    /// Forward description. The scale-shift descriptor defaults to `[2, C]`
    /// f32 when the flag asks for it.
    pub fn forward(
        prop_kind: PropKind,
        src: MemoryDesc,
        epsilon: f32,
        flags: BnormFlags,
    ) -> PlanResult<Self> {
        if !prop_kind.is_fwd() {
            return Err(PlanError::InvalidDesc("forward desc needs a forward prop kind"));
        }
        let scale_shift = if flags.use_scale_shift {
            default_scale_shift(&src)?
        } else {
            MemoryDesc::zero()
        };
        Ok(Self {
            prop_kind,
            src_desc: src,
            diff_src_desc: MemoryDesc::zero(),
            scale_shift_desc: scale_shift,
            diff_scale_shift_desc: MemoryDesc::zero(),
            epsilon,
            flags,
            accum_data_type: src.data_type().accumulation(),
        })
    }

    /// Backward description; `prop_kind` selects the data-only or the
    /// combined pass.
    pub fn backward(
        prop_kind: PropKind,
        src: MemoryDesc,
        diff_src: MemoryDesc,
        epsilon: f32,
        flags: BnormFlags,
    ) -> PlanResult<Self> {
        if !matches!(prop_kind, PropKind::Backward | PropKind::BackwardData) {
            return Err(PlanError::InvalidDesc(
                "backward desc needs backward or backward-data prop kind",
            ));
        }
        if src.dims() != diff_src.dims() {
            return Err(PlanError::InvalidDesc("source and diff-source extents differ"));
        }
        let (scale_shift, diff_scale_shift) = if flags.use_scale_shift {
            (default_scale_shift(&src)?, default_scale_shift(&src)?)
        } else {
            (MemoryDesc::zero(), MemoryDesc::zero())
        };
        Ok(Self {
            prop_kind,
            src_desc: src,
            diff_src_desc: diff_src,
            scale_shift_desc: scale_shift,
            diff_scale_shift_desc: diff_scale_shift,
            epsilon,
            flags,
            accum_data_type: src.data_type().accumulation(),
        })
    }

    pub fn is_training(&self) -> bool {
        self.prop_kind == PropKind::ForwardTraining
    }

    pub fn stats_is_src(&self) -> bool {
        self.flags.use_global_stats
    }

    pub fn use_scale_shift(&self) -> bool {
        self.flags.use_scale_shift
    }

    pub fn fuse_norm_relu(&self) -> bool {
        self.flags.fuse_norm_relu
    }

    pub fn ndims(&self) -> usize {
        self.src_desc.ndims()
    }

    /// Channel count.
    pub fn c(&self) -> Dim {
        self.src_desc.dims()[1]
    }

    pub fn d(&self) -> Dim {
        spatial_dim(&self.src_desc, 5)
    }

    pub fn h(&self) -> Dim {
        spatial_dim(&self.src_desc, 4)
    }

    pub fn w(&self) -> Dim {
        spatial_dim(&self.src_desc, 3)
    }

    /// Product of the spatial axes; 1 for the degenerate 2D layout.
    fn spatial_size(&self) -> Dim {
        if matches!(self.ndims(), 4 | 5) {
            self.d() * self.h() * self.w()
        } else {
            1
        }
    }
}

fn default_scale_shift(src: &MemoryDesc) -> PlanResult<MemoryDesc> {
    let c = src
        .dims()
        .get(1)
        .copied()
        .ok_or(PlanError::InvalidDesc("source rank below 2"))?;
    MemoryDesc::new(&[2, c], DataType::F32, FormatTag::Nc)
}

fn spatial_dim(md: &MemoryDesc, from_end: usize) -> Dim {
    if md.ndims() >= from_end {
        md.dims()[md.ndims() - (from_end - 2)]
    } else {
        1
    }
}

fn rnd_up(value: Dim, multiple: Dim) -> Dim {
    (value + multiple - 1) / multiple * multiple
}

/// Workspace descriptor for the fused-ReLU mask: one byte per activation,
/// same shape and layout as the source.
fn default_ws(src: &MemoryDesc) -> PlanResult<MemoryDesc> {
    MemoryDesc::new(src.dims(), WS_DATA_TYPE, src.format())
}

/// Validation shared by both directions: element precision, ISA gate,
/// scale-shift precision, canonical layout.
fn common_checks(engine: &Engine, desc: &BatchNormDesc) -> PlanResult<()> {
    let dt = desc.src_desc.data_type();
    if !matches!(dt, DataType::F32 | DataType::BF16) {
        return Err(PlanError::Unimplemented("unsupported element type"));
    }
    if dt.is_reduced_float() && !engine.mayiuse(IsaLevel::Avx512) {
        return Err(PlanError::Unimplemented("bf16 requires avx512"));
    }
    if desc.use_scale_shift() && desc.scale_shift_desc.data_type() != DataType::F32 {
        return Err(PlanError::Unimplemented("scale-shift must be f32"));
    }
    if !desc.src_desc.matches_one_of(&NCSP_TAGS) {
        return Err(PlanError::Unimplemented("source layout outside the ncsp family"));
    }
    Ok(())
}

/// Book the reduced-precision conversion buffer:
/// `nbufs x nthreads x round_up(spatial, 16)` accumulation elements.
fn book_cvt(
    scratchpad: &mut ScratchpadRegistry,
    acc_size: usize,
    nbufs: usize,
    nthreads: usize,
    spatial: Dim,
) {
    let per_thread = rnd_up(spatial, CVT_SIMD_W) as usize;
    scratchpad.book(ScratchKey::BnormCvt, acc_size * nbufs * nthreads * per_thread);
}

/// Forward ncsp batch-normalization descriptor, frozen after `create`.
#[derive(Debug, Clone)]
pub struct NcspBatchNormFwdPd {
    desc: BatchNormDesc,
    attr: PrimitiveAttr,
    ws_md: Option<MemoryDesc>,
    scratchpad: ScratchpadRegistry,
}

impl NcspBatchNormFwdPd {
    pub const NAME: &'static str = "ncsp_bnorm:any";

    /// Validate and freeze. Every rule must hold or the answer is
    /// `Unimplemented` and the caller tries another implementation.
    pub fn create(
        engine: &Engine,
        desc: &BatchNormDesc,
        attr: &PrimitiveAttr,
    ) -> PlanResult<Self> {
        if !desc.prop_kind.is_fwd() {
            return Err(PlanError::Unimplemented("forward variant requires a forward direction"));
        }
        if desc.src_desc.has_zero_dim() {
            return Err(PlanError::Unimplemented("zero-sized axis"));
        }
        common_checks(engine, desc)?;
        if !(attr.has_default_values() || attr.with_relu_post_op()) {
            return Err(PlanError::Unimplemented("unsupported attributes"));
        }

        let ws_md = if desc.is_training() && desc.fuse_norm_relu() {
            Some(default_ws(&desc.src_desc)?)
        } else {
            None
        };

        let mut pd = Self {
            desc: *desc,
            attr: attr.clone(),
            ws_md,
            scratchpad: ScratchpadRegistry::new(),
        };
        pd.init_scratchpad(engine.nthreads());
        log::debug!(
            "{}: forward ready, scratchpad {} bytes",
            Self::NAME,
            pd.scratchpad.total_size()
        );
        Ok(pd)
    }

    fn init_scratchpad(&mut self, nthreads: usize) {
        let desc = &self.desc;
        let acc = desc.accum_data_type.size_bytes();
        let c = desc.c() as usize;

        if !desc.stats_is_src() {
            self.scratchpad.book(ScratchKey::BnormReduction, acc * c * nthreads);
            if !desc.is_training() {
                self.scratchpad.book(ScratchKey::BnormTmpMean, acc * c);
                self.scratchpad.book(ScratchKey::BnormTmpVar, acc * c);
            }
        }

        if desc.src_desc.data_type().is_reduced_float() {
            book_cvt(&mut self.scratchpad, acc, 2, nthreads, desc.spatial_size());
        }
    }

    pub fn desc(&self) -> &BatchNormDesc {
        &self.desc
    }

    pub fn attr(&self) -> &PrimitiveAttr {
        &self.attr
    }
}

impl PrimitiveDesc for NcspBatchNormFwdPd {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::BatchNormalization
    }

    fn op_desc(&self) -> OpDescRef<'_> {
        OpDescRef::BatchNorm(&self.desc)
    }

    fn impl_info(&self) -> &'static str {
        Self::NAME
    }

    fn arg_usage(&self, arg: ArgId) -> ArgUsage {
        match arg {
            ArgId::Src => ArgUsage::Input,
            ArgId::Dst => ArgUsage::Output,
            ArgId::Mean | ArgId::Variance => {
                if self.desc.stats_is_src() {
                    ArgUsage::Input
                } else if self.desc.is_training() {
                    ArgUsage::Output
                } else {
                    ArgUsage::Unused
                }
            }
            ArgId::Weights if self.desc.use_scale_shift() => ArgUsage::Input,
            ArgId::Workspace if self.ws_md.is_some() => ArgUsage::Output,
            _ => ArgUsage::Unused,
        }
    }

    fn arg_md(&self, arg: ArgId) -> Option<&MemoryDesc> {
        match arg {
            ArgId::Src | ArgId::Dst => Some(&self.desc.src_desc),
            ArgId::Weights if self.desc.use_scale_shift() => Some(&self.desc.scale_shift_desc),
            ArgId::Workspace => self.ws_md.as_ref(),
            _ => None,
        }
    }

    fn n_inputs(&self) -> usize {
        1 + 2 * usize::from(self.desc.stats_is_src()) + usize::from(self.desc.use_scale_shift())
    }

    fn n_outputs(&self) -> usize {
        let stats_out = self.desc.is_training() && !self.desc.stats_is_src();
        1 + usize::from(self.ws_md.is_some()) + 2 * usize::from(stats_out)
    }

    fn scratchpad_registry(&self) -> &ScratchpadRegistry {
        &self.scratchpad
    }

    fn workspace_md(&self) -> Option<&MemoryDesc> {
        self.ws_md.as_ref()
    }

    fn query(&self, what: Query) -> PlanResult<QueryAnswer<'_>> {
        match what {
            Query::BatchNormDesc => Ok(QueryAnswer::OpDesc(self.op_desc())),
            _ => self.query_generic(what),
        }
    }
}

/// Backward ncsp batch-normalization descriptor.
#[derive(Debug, Clone)]
pub struct NcspBatchNormBwdPd {
    desc: BatchNormDesc,
    attr: PrimitiveAttr,
    ws_md: Option<MemoryDesc>,
    scratchpad: ScratchpadRegistry,
}

impl NcspBatchNormBwdPd {
    pub const NAME: &'static str = "ncsp_bnorm:any";

    /// Validate against the paired forward descriptor and freeze.
    ///
    /// The fused-ReLU workspace must be bit-identical in shape, type, and
    /// layout to the one the forward descriptor produced; a mismatch is a
    /// validation failure, never a silent adaptation.
    pub fn create(
        engine: &Engine,
        desc: &BatchNormDesc,
        attr: &PrimitiveAttr,
        hint_fwd_pd: Option<&NcspBatchNormFwdPd>,
    ) -> PlanResult<Self> {
        if !matches!(desc.prop_kind, PropKind::Backward | PropKind::BackwardData) {
            return Err(PlanError::Unimplemented("backward variant requires a backward direction"));
        }
        if desc.src_desc.has_zero_dim() || desc.diff_src_desc.has_zero_dim() {
            return Err(PlanError::Unimplemented("zero-sized axis"));
        }
        if desc.src_desc.data_type() != desc.diff_src_desc.data_type() {
            return Err(PlanError::Unimplemented("source and diff-source types differ"));
        }
        common_checks(engine, desc)?;
        if desc.use_scale_shift() && desc.diff_scale_shift_desc.data_type() != DataType::F32 {
            return Err(PlanError::Unimplemented("diff scale-shift must be f32"));
        }
        if !desc.diff_src_desc.matches_one_of(&NCSP_TAGS) {
            return Err(PlanError::Unimplemented("diff-source layout outside the ncsp family"));
        }
        if !attr.has_default_values() {
            return Err(PlanError::Unimplemented("unsupported attributes"));
        }

        let ws_md = if desc.fuse_norm_relu() {
            let ws = default_ws(&desc.src_desc)?;
            match hint_fwd_pd.and_then(|hint| hint.workspace_md()) {
                Some(fwd_ws) if *fwd_ws == ws => Some(ws),
                _ => {
                    return Err(PlanError::Unimplemented(
                        "workspace does not match the paired forward descriptor",
                    ))
                }
            }
        } else {
            None
        };

        let mut pd = Self {
            desc: *desc,
            attr: attr.clone(),
            ws_md,
            scratchpad: ScratchpadRegistry::new(),
        };
        pd.init_scratchpad(engine.nthreads());
        log::debug!(
            "{}: backward ready, scratchpad {} bytes",
            Self::NAME,
            pd.scratchpad.total_size()
        );
        Ok(pd)
    }

    fn init_scratchpad(&mut self, nthreads: usize) {
        let desc = &self.desc;
        let acc = desc.accum_data_type.size_bytes();
        let c = desc.c() as usize;

        self.scratchpad
            .book(ScratchKey::BnormReduction, acc * 2 * c * nthreads);

        // The combined backward pass with scale-shift accumulates gradients
        // straight into the caller's output buffer.
        if !(desc.use_scale_shift() && desc.prop_kind == PropKind::Backward) {
            self.scratchpad
                .book(ScratchKey::BnormTmpDiffScaleShift, acc * 2 * c);
        }

        if desc.src_desc.data_type().is_reduced_float() {
            let nbufs = 2 + usize::from(!desc.stats_is_src());
            book_cvt(&mut self.scratchpad, acc, nbufs, nthreads, desc.spatial_size());
        }
    }

    pub fn desc(&self) -> &BatchNormDesc {
        &self.desc
    }

    pub fn attr(&self) -> &PrimitiveAttr {
        &self.attr
    }
}

impl PrimitiveDesc for NcspBatchNormBwdPd {
    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::BatchNormalization
    }

    fn op_desc(&self) -> OpDescRef<'_> {
        OpDescRef::BatchNorm(&self.desc)
    }

    fn impl_info(&self) -> &'static str {
        Self::NAME
    }

    fn arg_usage(&self, arg: ArgId) -> ArgUsage {
        match arg {
            ArgId::Src | ArgId::Mean | ArgId::Variance | ArgId::DiffDst => ArgUsage::Input,
            ArgId::Weights if self.desc.use_scale_shift() => ArgUsage::Input,
            ArgId::Workspace if self.ws_md.is_some() => ArgUsage::Input,
            ArgId::DiffSrc => ArgUsage::Output,
            ArgId::DiffWeights
                if self.desc.use_scale_shift() && self.desc.prop_kind == PropKind::Backward =>
            {
                ArgUsage::Output
            }
            _ => ArgUsage::Unused,
        }
    }

    fn arg_md(&self, arg: ArgId) -> Option<&MemoryDesc> {
        match arg {
            ArgId::Src => Some(&self.desc.src_desc),
            ArgId::DiffDst | ArgId::DiffSrc => Some(&self.desc.diff_src_desc),
            ArgId::Weights if self.desc.use_scale_shift() => Some(&self.desc.scale_shift_desc),
            ArgId::DiffWeights if self.desc.use_scale_shift() => {
                Some(&self.desc.diff_scale_shift_desc)
            }
            ArgId::Workspace => self.ws_md.as_ref(),
            _ => None,
        }
    }

    fn n_inputs(&self) -> usize {
        4 + usize::from(self.desc.use_scale_shift()) + usize::from(self.ws_md.is_some())
    }

    fn n_outputs(&self) -> usize {
        let ss_grad = self.desc.use_scale_shift() && self.desc.prop_kind == PropKind::Backward;
        1 + usize::from(ss_grad)
    }

    fn scratchpad_registry(&self) -> &ScratchpadRegistry {
        &self.scratchpad
    }

    fn workspace_md(&self) -> Option<&MemoryDesc> {
        self.ws_md.as_ref()
    }

    fn query(&self, what: Query) -> PlanResult<QueryAnswer<'_>> {
        match what {
            Query::BatchNormDesc => Ok(QueryAnswer::OpDesc(self.op_desc())),
            _ => self.query_generic(what),
        }
    }
}
