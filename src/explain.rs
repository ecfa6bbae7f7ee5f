//! EXPLAIN (ANALYZE, FORMAT JSON) analysis.

pub mod lint;
mod parser;
mod plan;

pub use lint::{PlanLintConfig, lint_plan};
pub use parser::{ExplainError, parse_explain};
pub use plan::{ExplainPlan, PlanNode};
