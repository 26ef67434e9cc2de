use crate::{Op, Value};

/// One node of a condition tree: a comparison leaf, a parenthesized group,
/// or an explicit AND/OR marker applying to the next leaf or group.
///
/// Consecutive leaves with no marker in between are joined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Leaf(CondLeaf),
    Group(Vec<Cond>),
    And,
    Or,
}

/// A single comparison. A `Text` parameter that starts with the field's own
/// name is a placeholder resolved from the caller's parameter map at compile
/// time; anything else is a literal embedded at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct CondLeaf {
    pub field: String,
    pub op: Op,
    pub param1: Option<Value>,
    pub param2: Option<Value>,
}

impl Cond {
    pub fn leaf(field: impl Into<String>, op: Op, param: impl Into<Value>) -> Self {
        Cond::Leaf(CondLeaf {
            field: field.into(),
            op,
            param1: Some(param.into()),
            param2: None,
        })
    }

    pub fn between(
        field: impl Into<String>,
        param1: impl Into<Value>,
        param2: impl Into<Value>,
    ) -> Self {
        Cond::Leaf(CondLeaf {
            field: field.into(),
            op: Op::Between,
            param1: Some(param1.into()),
            param2: Some(param2.into()),
        })
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Cond::Leaf(CondLeaf {
            field: field.into(),
            op: Op::IsNull,
            param1: None,
            param2: None,
        })
    }

    pub fn not_null(field: impl Into<String>) -> Self {
        Cond::Leaf(CondLeaf {
            field: field.into(),
            op: Op::NotNull,
            param1: None,
            param2: None,
        })
    }

    /// A group whose members join with the default AND.
    pub fn all(items: Vec<Cond>) -> Self {
        Cond::Group(items)
    }

    /// A group whose members join with OR.
    pub fn any(items: Vec<Cond>) -> Self {
        let mut out = Vec::with_capacity(items.len() * 2);
        for item in items {
            if !out.is_empty() {
                out.push(Cond::Or);
            }
            out.push(item);
        }
        Cond::Group(out)
    }

    /// The empty condition, compiles to nothing.
    pub fn none() -> Self {
        Cond::Group(Vec::new())
    }

    /// Rewrite the operator of the first leaf on `field`, recursing into
    /// groups. Returns whether a leaf was rewritten.
    pub fn replace_op(&mut self, field: &str, op: Op) -> bool {
        match self {
            Cond::Leaf(leaf) if leaf.field == field => {
                leaf.op = op;
                true
            }
            Cond::Group(items) => items.iter_mut().any(|item| item.replace_op(field, op)),
            _ => false,
        }
    }
}
