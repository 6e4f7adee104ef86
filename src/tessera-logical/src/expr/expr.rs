//! Logical expression tree.

use serde::{Deserialize, Serialize};

use super::Value;

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&",
            Self::Or => "|",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        };
        write!(f, "{symbol}")
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Numeric negation.
    Neg,
    /// Is null check.
    IsNull,
    /// Is not null check.
    IsNotNull,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Not => write!(f, "NOT"),
            Self::Neg => write!(f, "-"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Logical expression evaluated against the rows of one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalExpr {
    /// Column reference.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Renamed expression.
    Alias(Box<LogicalExpr>, String),
    /// Binary operation.
    Binary {
        left: Box<LogicalExpr>,
        op: BinaryOp,
        right: Box<LogicalExpr>,
    },
    /// Unary operation.
    Unary { op: UnaryOp, expr: Box<LogicalExpr> },
}

impl LogicalExpr {
    /// Create a column reference expression.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }

    /// Create a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a binary expression.
    pub fn binary(left: LogicalExpr, op: BinaryOp, right: LogicalExpr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, expr: LogicalExpr) -> Self {
        Self::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    /// Rename the output of this expression.
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias(Box::new(self), name.into())
    }

    /// Name of the column this expression produces.
    ///
    /// Literals and unaliased compound expressions take the name of their
    /// leftmost column, or `literal` when they reference none.
    pub fn output_name(&self) -> String {
        match self {
            Self::Column(name) | Self::Alias(_, name) => name.clone(),
            Self::Literal(_) => "literal".to_string(),
            Self::Binary { left, .. } => left.output_name(),
            Self::Unary { expr, .. } => expr.output_name(),
        }
    }

    // Comparison operators

    /// Equality comparison.
    pub fn eq(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Less than or equal comparison.
    pub fn lte(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Lte, other)
    }

    /// Greater than comparison.
    pub fn gt(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Greater than or equal comparison.
    pub fn gte(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Gte, other)
    }

    // Logical operators

    /// Logical AND.
    pub fn and(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Logical OR.
    pub fn or(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Is null check.
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOp::IsNull, self)
    }

    /// Is not null check.
    pub fn is_not_null(self) -> Self {
        Self::unary(UnaryOp::IsNotNull, self)
    }

    // Arithmetic operators

    /// Addition.
    pub fn add(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Add, other)
    }
}

impl std::fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column(name) => write!(f, "col({name})"),
            Self::Literal(val) => write!(f, "lit({val})"),
            Self::Alias(expr, name) => write!(f, "{expr} AS {name}"),
            Self::Binary { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Unary {
                op: op @ (UnaryOp::IsNull | UnaryOp::IsNotNull),
                expr,
            } => write!(f, "{expr} {op}"),
            Self::Unary { op, expr } => write!(f, "{op} {expr}"),
        }
    }
}

/// Create a column reference.
pub fn col(name: impl Into<String>) -> LogicalExpr {
    LogicalExpr::column(name)
}

/// Create a literal.
pub fn lit(value: impl Into<Value>) -> LogicalExpr {
    LogicalExpr::literal(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_building() {
        let expr = col("year").gte(lit(2022i64));

        assert!(matches!(
            expr,
            LogicalExpr::Binary {
                op: BinaryOp::Gte,
                ..
            }
        ));
        assert_eq!(expr.to_string(), "col(year) >= lit(2022)");
    }

    #[test]
    fn test_compound_expression() {
        let expr = col("year")
            .gte(lit(2020))
            .and(col("month").lte(lit(6)).or(col("flag").is_null()));

        assert!(matches!(
            expr,
            LogicalExpr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
        assert_eq!(
            expr.to_string(),
            "col(year) >= lit(2020) & col(month) <= lit(6) | col(flag) IS NULL"
        );
    }

    #[test]
    fn test_output_name() {
        assert_eq!(col("a").output_name(), "a");
        assert_eq!(col("a").add(lit(1)).output_name(), "a");
        assert_eq!(col("a").add(lit(1)).alias("b").output_name(), "b");
        assert_eq!(lit("x").output_name(), "literal");
    }
}
