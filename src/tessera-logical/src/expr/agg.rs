//! Aggregate expressions.

use serde::{Deserialize, Serialize};

use super::LogicalExpr;

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    Count,
    Sum,
    Min,
    Max,
    Mean,
    List,
    Concat,
}

impl AggFunc {
    /// Get the function name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::List => "list",
            Self::Concat => "concat",
        }
    }
}

impl std::fmt::Display for AggFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An aggregate function applied to an input expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggExpr {
    /// The aggregate function.
    pub func: AggFunc,
    /// The input expression.
    pub expr: Box<LogicalExpr>,
    /// Optional alias for the result column.
    pub alias: Option<String>,
}

impl AggExpr {
    /// Create a new aggregate expression.
    pub fn new(func: AggFunc, expr: LogicalExpr) -> Self {
        Self {
            func,
            expr: Box::new(expr),
            alias: None,
        }
    }

    /// Set alias for the result.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Get the effective output name.
    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| self.expr.output_name())
    }
}

impl std::fmt::Display for AggExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.func, self.expr)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

/// `count(expr)`.
pub fn count(expr: LogicalExpr) -> AggExpr {
    AggExpr::new(AggFunc::Count, expr)
}

/// `sum(expr)`.
pub fn sum(expr: LogicalExpr) -> AggExpr {
    AggExpr::new(AggFunc::Sum, expr)
}

/// `min(expr)`.
pub fn min(expr: LogicalExpr) -> AggExpr {
    AggExpr::new(AggFunc::Min, expr)
}

/// `max(expr)`.
pub fn max(expr: LogicalExpr) -> AggExpr {
    AggExpr::new(AggFunc::Max, expr)
}

/// `mean(expr)`.
pub fn mean(expr: LogicalExpr) -> AggExpr {
    AggExpr::new(AggFunc::Mean, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;

    #[test]
    fn test_agg_display() {
        assert_eq!(sum(col("x")).to_string(), "sum(col(x))");
        assert_eq!(
            count(col("x")).with_alias("n").to_string(),
            "count(col(x)) AS n"
        );
    }

    #[test]
    fn test_agg_output_name() {
        assert_eq!(max(col("price")).output_name(), "price");
        assert_eq!(mean(col("price")).with_alias("avg").output_name(), "avg");
    }
}
