//! Primitive attributes.
//!
//! The post-op subsystem lives outside this layer; planning reads exactly two
//! facts from an attribute set: whether everything is at its default, and
//! whether the only non-default setting is a fused ReLU activation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PostOp {
    /// Fused eltwise ReLU applied to the primitive's output.
    EltwiseRelu,
    /// Accumulate into the destination instead of overwriting it.
    Sum,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PrimitiveAttr {
    post_ops: Vec<PostOp>,
}

impl PrimitiveAttr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_post_op(mut self, op: PostOp) -> Self {
        self.post_ops.push(op);
        self
    }

    pub fn has_default_values(&self) -> bool {
        self.post_ops.is_empty()
    }

    /// True iff the only non-default setting is a single fused ReLU.
    pub fn with_relu_post_op(&self) -> bool {
        self.post_ops == [PostOp::EltwiseRelu]
    }
}
