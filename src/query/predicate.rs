//! Predicate trees for WHERE and JOIN conditions.
//!
//! Predicates are built by composition starting from [`field`]; operands are
//! moved into their parent, so a node can never be attached to two parents
//! and the tree is acyclic by construction.

use crate::value::Datum;

/// Comparison operator of a leaf predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
}

impl CompareOp {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Like => "LIKE",
            CompareOp::In => "IN",
        }
    }
}

/// A node in a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: CompareOp,
        value: Datum,
    },
    /// Field-to-field comparison, the shape of a join condition.
    FieldCompare {
        left: String,
        op: CompareOp,
        right: String,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull(String),
    IsMissing(String),
    IsUnknown(String),
}

impl Predicate {
    /// Conjunction; adjacent AND nodes are flattened.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, Predicate::And(mut right)) => {
                right.insert(0, left);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction; adjacent OR nodes are flattened.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, Predicate::Or(mut right)) => {
                right.insert(0, left);
                Predicate::Or(right)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

/// Entry point for comparison predicates: `field("age").gt(30)`.
pub fn field(name: impl Into<String>) -> Field {
    Field(name.into())
}

/// A field reference awaiting a comparison operator.
#[derive(Debug, Clone)]
pub struct Field(String);

impl Field {
    fn compare(self, op: CompareOp, value: impl Into<Datum>) -> Predicate {
        Predicate::Compare {
            field: self.0,
            op,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    /// Equality against another field rather than a literal.
    pub fn eq_field(self, other: impl Into<String>) -> Predicate {
        Predicate::FieldCompare {
            left: self.0,
            op: CompareOp::Eq,
            right: other.into(),
        }
    }

    pub fn ne(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    pub fn gte(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    pub fn lt(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    pub fn lte(self, value: impl Into<Datum>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }

    pub fn like(self, pattern: impl Into<String>) -> Predicate {
        self.compare(CompareOp::Like, Datum::Str(pattern.into()))
    }

    /// Membership test against a list of candidate values.
    pub fn is_in<T: Into<Datum>>(self, values: impl IntoIterator<Item = T>) -> Predicate {
        let items = values.into_iter().map(Into::into).collect();
        self.compare(CompareOp::In, Datum::Array(items))
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull(self.0)
    }

    pub fn is_missing(self) -> Predicate {
        Predicate::IsMissing(self.0)
    }

    /// Three-valued-logic test: true when the field is null or missing.
    pub fn is_unknown(self) -> Predicate {
        Predicate::IsUnknown(self.0)
    }
}
