//! Expression system for logical plans.

mod agg;
#[allow(clippy::module_inception)]
mod expr;
mod value;

pub use agg::{count, max, mean, min, sum, AggExpr, AggFunc};
pub use expr::{col, lit, BinaryOp, LogicalExpr, UnaryOp};
pub use value::Value;
