//! The contract every primitive descriptor implements: frozen operator
//! description, argument-role resolution, query interface, and scratchpad /
//! workspace access.

use crate::batch_norm::BatchNormDesc;
use crate::inner_product::InnerProductDesc;
use crate::memory::MemoryDesc;
use crate::scratchpad::ScratchpadRegistry;
use crate::status::{PlanError, PlanResult};

/// Which pass of a trainable operator is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PropKind {
    ForwardTraining,
    ForwardInference,
    BackwardData,
    BackwardWeights,
    /// Combined backward pass: data and weight gradients in one sweep.
    Backward,
}

impl PropKind {
    pub fn is_fwd(self) -> bool {
        matches!(self, Self::ForwardTraining | Self::ForwardInference)
    }

    pub fn is_bwd(self) -> bool {
        !self.is_fwd()
    }
}

/// Operator family a descriptor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveKind {
    InnerProduct,
    BatchNormalization,
}

/// Argument slot identifiers, shared by every operator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ArgId {
    Src,
    Weights,
    Bias,
    Dst,
    Mean,
    Variance,
    Workspace,
    DiffSrc,
    DiffWeights,
    DiffBias,
    DiffDst,
}

/// Role a slot plays for one concrete descriptor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgUsage {
    Input,
    Output,
    Unused,
}

/// Borrowed view of the family-specific operator description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpDescRef<'a> {
    InnerProduct(&'a InnerProductDesc),
    BatchNorm(&'a BatchNormDesc),
}

/// Query kinds understood by the generic interface. Families answer their own
/// op-desc kind and fall back to the generic path for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// The operator description as its family-specific type.
    InnerProductDesc,
    /// The operator description as its family-specific type.
    BatchNormDesc,
    /// Memory descriptor bound to a slot.
    ArgMd(ArgId),
    /// Workspace descriptor, if one was planned.
    WorkspaceMd,
    /// Total scratchpad bytes to supply at execution.
    ScratchpadSize,
    NumInputs,
    NumOutputs,
    /// Implementation name for diagnostics.
    ImplInfo,
}

/// Answers returned by [`PrimitiveDesc::query`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryAnswer<'a> {
    OpDesc(OpDescRef<'a>),
    Md(Option<&'a MemoryDesc>),
    Size(usize),
    Count(usize),
    Info(&'static str),
}

/// A validated, immutable primitive descriptor.
///
/// Everything reachable through this trait is frozen once construction
/// succeeds; concurrent reads from many threads are safe.
pub trait PrimitiveDesc {
    fn kind(&self) -> PrimitiveKind;

    /// The frozen operator description.
    fn op_desc(&self) -> OpDescRef<'_>;

    /// Implementation name for diagnostics ("ncsp_bnorm:any" style).
    fn impl_info(&self) -> &'static str;

    /// Role the given slot plays for this variant.
    fn arg_usage(&self, arg: ArgId) -> ArgUsage;

    /// Memory descriptor bound to a slot, `None` when the slot does not apply.
    fn arg_md(&self, arg: ArgId) -> Option<&MemoryDesc>;

    fn n_inputs(&self) -> usize;

    fn n_outputs(&self) -> usize;

    fn scratchpad_registry(&self) -> &ScratchpadRegistry;

    fn workspace_md(&self) -> Option<&MemoryDesc> {
        None
    }

    /// Generic query path. Families override [`Self::query`] to answer their
    /// own op-desc kind and delegate everything else here.
    fn query_generic(&self, what: Query) -> PlanResult<QueryAnswer<'_>> {
        match what {
            Query::ArgMd(arg) => Ok(QueryAnswer::Md(self.arg_md(arg))),
            Query::WorkspaceMd => Ok(QueryAnswer::Md(self.workspace_md())),
            Query::ScratchpadSize => {
                Ok(QueryAnswer::Size(self.scratchpad_registry().total_size()))
            }
            Query::NumInputs => Ok(QueryAnswer::Count(self.n_inputs())),
            Query::NumOutputs => Ok(QueryAnswer::Count(self.n_outputs())),
            Query::ImplInfo => Ok(QueryAnswer::Info(self.impl_info())),
            Query::InnerProductDesc | Query::BatchNormDesc => {
                Err(PlanError::UnsupportedQuery("op desc kind mismatch"))
            }
        }
    }

    fn query(&self, what: Query) -> PlanResult<QueryAnswer<'_>> {
        self.query_generic(what)
    }
}
