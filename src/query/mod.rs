//! Query construction: descriptors, predicates, literal encoding and
//! statement rendering.

pub mod descriptor;
pub mod encode;
pub mod predicate;
pub mod render;

pub use descriptor::{
    Aggregate, DatasetDescriptor, FieldDef, JoinClause, JoinKind, Order, SelectDescriptor,
    Statement, TypeDescriptor, TypeTag,
};
pub use encode::{bind_positional, encode};
pub use predicate::{field, CompareOp, Field, Predicate};
pub use render::render;
