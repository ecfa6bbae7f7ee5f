//! PostgreSQL `EXPLAIN (ANALYZE, FORMAT JSON)` parser.
//!
//! Accepts the three shapes users paste:
//! - the array PostgreSQL prints, `[{"Plan": {...}, "Execution Time": ...}]`
//! - a single object with a `Plan` key
//! - a bare plan node with a `Node Type` key

use super::plan::{ExplainPlan, PlanNode};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Could not parse plan: paste the output of EXPLAIN (ANALYZE, FORMAT JSON)")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unrecognized format: expected EXPLAIN JSON output with a Plan or Node Type")]
    UnrecognizedFormat,

    #[error("Invalid plan structure: {0}")]
    InvalidStructure(String),
}

pub type Result<T> = std::result::Result<T, ExplainError>;

/// Parse EXPLAIN JSON into a plan tree with exclusive timings.
///
/// Node ids restart at 0 on every call.
pub fn parse_explain(input: &str) -> Result<ExplainPlan> {
    let value: Value = serde_json::from_str(input.trim())?;

    if let Some(entry) = value
        .as_array()
        .and_then(|arr| arr.first())
        .filter(|entry| entry.get("Plan").is_some_and(Value::is_object))
    {
        let planning_time = number(entry, "Planning Time").unwrap_or(0.0);
        let execution_time = number(entry, "Execution Time").unwrap_or(0.0);
        let root = PlanBuilder::new(execution_time).build_root(&entry["Plan"])?;
        return Ok(ExplainPlan {
            root,
            planning_time,
            execution_time,
            total_time: planning_time + execution_time,
        });
    }

    let root = if let Some(plan) = value.get("Plan").filter(|p| p.is_object()) {
        plan
    } else if value.get("Node Type").is_some() {
        &value
    } else {
        return Err(ExplainError::UnrecognizedFormat);
    };

    let root = PlanBuilder::new(0.0).build_root(root)?;
    Ok(ExplainPlan {
        root,
        planning_time: 0.0,
        execution_time: 0.0,
        total_time: 0.0,
    })
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(|v| v.as_f64())
}

/// Counts may be printed as floats (`"Actual Loops": 1.0`).
fn count(raw: &Map<String, Value>, key: &str) -> u64 {
    raw.get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

fn float(raw: &Map<String, Value>, key: &str) -> Option<f64> {
    raw.get(key).and_then(|v| v.as_f64())
}

/// Non-empty string value.
fn text(raw: &Map<String, Value>, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

struct PlanBuilder {
    next_id: usize,
    execution_time: f64,
}

impl PlanBuilder {
    fn new(execution_time: f64) -> Self {
        Self {
            next_id: 0,
            execution_time,
        }
    }

    fn build_root(&mut self, value: &Value) -> Result<PlanNode> {
        let raw = value
            .as_object()
            .ok_or_else(|| ExplainError::InvalidStructure("Plan is not an object".into()))?;
        self.build(raw)
    }

    fn build(&mut self, raw: &Map<String, Value>) -> Result<PlanNode> {
        let id = self.next_id;
        self.next_id += 1;

        let node_type = text(raw, "Node Type").unwrap_or_else(|| "Unknown".to_string());
        let mut node = PlanNode::new(id, node_type);

        node.relation = text(raw, "Relation Name");
        node.alias = text(raw, "Alias");
        node.index_name = text(raw, "Index Name");
        node.parent_relationship = text(raw, "Parent Relationship");
        node.join_type = text(raw, "Join Type");

        node.startup_cost = float(raw, "Startup Cost").unwrap_or(0.0);
        node.total_cost = float(raw, "Total Cost").unwrap_or(0.0);
        node.plan_rows = float(raw, "Plan Rows").unwrap_or(0.0);
        node.plan_width = count(raw, "Plan Width");

        node.actual_startup_time = float(raw, "Actual Startup Time");
        node.actual_total_time = float(raw, "Actual Total Time");
        node.actual_rows = float(raw, "Actual Rows");
        if raw.contains_key("Actual Loops") {
            node.actual_loops = count(raw, "Actual Loops");
        }

        node.shared_hit_blocks = count(raw, "Shared Hit Blocks");
        node.shared_read_blocks = count(raw, "Shared Read Blocks");

        node.filter = text(raw, "Filter");
        node.index_cond = text(raw, "Index Cond");
        node.hash_cond = text(raw, "Hash Cond");
        node.recheck_cond = text(raw, "Recheck Cond");
        node.rows_removed_by_filter = count(raw, "Rows Removed by Filter");
        node.rows_removed_by_index_recheck = count(raw, "Rows Removed by Index Recheck");

        if let Some(keys) = raw.get("Sort Key").and_then(|v| v.as_array()) {
            node.sort_key = keys
                .iter()
                .filter_map(|k| k.as_str().map(String::from))
                .collect();
        }
        node.sort_method = text(raw, "Sort Method");
        node.sort_space_used = count(raw, "Sort Space Used");
        node.sort_space_type = text(raw, "Sort Space Type");

        node.hash_buckets = count(raw, "Hash Buckets");
        node.hash_batches = count(raw, "Hash Batches");
        node.peak_memory_usage = count(raw, "Peak Memory Usage");

        if let Some(plans) = raw.get("Plans") {
            let plans = plans.as_array().ok_or_else(|| {
                ExplainError::InvalidStructure(format!("Plans of node {} is not an array", id))
            })?;
            for (i, child) in plans.iter().enumerate() {
                let child = child.as_object().ok_or_else(|| {
                    ExplainError::InvalidStructure(format!(
                        "Plans entry {} of node {} is not an object",
                        i, id
                    ))
                })?;
                node.children.push(self.build(child)?);
            }
        }

        node.compute_timing(self.execution_time);
        Ok(node)
    }
}
