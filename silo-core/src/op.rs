/// Closed vocabulary of condition operators. The SQL text of each operator
/// is a per-dialect template owned by the [`SqlWriter`](crate::SqlWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Renders to nothing. Placeholder slot before the first joiner.
    Nop,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Between,
    Starts,
    Ends,
    Contains,
    IsNull,
    NotNull,
    And,
    Or,
}

impl Op {
    /// Whether a leaf with this operator carries at least one parameter.
    pub fn has_param(&self) -> bool {
        !matches!(self, Op::Nop | Op::IsNull | Op::NotNull | Op::And | Op::Or)
    }

    pub fn is_joiner(&self) -> bool {
        matches!(self, Op::And | Op::Or)
    }

    /// The `like` family embeds its parameter inside a quoted pattern, so
    /// string operands render unquoted there.
    pub fn is_pattern(&self) -> bool {
        matches!(self, Op::Starts | Op::Ends | Op::Contains)
    }
}
