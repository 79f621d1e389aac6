//! kernel-plan: the descriptor and planning layer of a neural-network
//! primitive kernel library.
//!
//! Given an abstract operator description (shapes, data types, propagation
//! direction), this crate validates feasibility for a concrete compute
//! strategy, derives the canonical memory layouts every argument must have,
//! and precomputes the workspace and per-thread scratchpad layout the numeric
//! kernel will need, so execution is allocation-free.
//!
//! # Quick start
//!
//! ```
//! use kernel_plan::{
//!     BatchNormDesc, BnormFlags, DataType, Engine, FormatTag, MemoryDesc,
//!     PrimitiveAttr, PrimitiveDesc, PropKind, select_bnorm_fwd,
//! };
//!
//! let src = MemoryDesc::new(&[32, 64, 7, 7], DataType::F32, FormatTag::Nchw).unwrap();
//! let desc = BatchNormDesc::forward(
//!     PropKind::ForwardTraining, src, 1e-5, BnormFlags::default(),
//! ).unwrap();
//! let pd = select_bnorm_fwd(&Engine::host(), &desc, &PrimitiveAttr::new()).unwrap();
//! let scratch_bytes = pd.scratchpad_registry().total_size();
//! # let _ = scratch_bytes;
//! ```
//!
//! Numeric kernel bodies, device abstraction, and the thread-pool runtime are
//! external collaborators; this layer only plans for them.

pub mod attr;
pub mod batch_norm;
pub mod dtype;
pub mod engine;
pub mod inner_product;
pub mod isa;
pub mod memory;
pub mod primitive;
pub mod registry;
pub mod scratchpad;
pub mod status;

pub use attr::{PostOp, PrimitiveAttr};
pub use batch_norm::{BatchNormDesc, BnormFlags, NcspBatchNormBwdPd, NcspBatchNormFwdPd};
pub use dtype::DataType;
pub use engine::Engine;
pub use inner_product::{
    prop_invariant_md, InnerProductDesc, InnerProductPd, IpRole, IpVariant,
};
pub use isa::{get_isa_level, IsaLevel};
pub use memory::{Dim, FormatTag, MemoryDesc, MAX_NDIMS};
pub use primitive::{
    ArgId, ArgUsage, OpDescRef, PrimitiveDesc, PrimitiveKind, PropKind, Query, QueryAnswer,
};
pub use registry::{select_bnorm_bwd, select_bnorm_fwd, select_inner_product};
pub use scratchpad::{ScratchKey, ScratchpadRegistry};
pub use status::{PlanError, PlanResult};
