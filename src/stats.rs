//! Summary statistics over an analyzed plan or schema.

use crate::diagnostics::{WarningCode, WarningCounts};
use crate::explain::{ExplainPlan, PlanNode};
use crate::schema::Schema;
use indexmap::IndexMap;
use serde::Serialize;

const SLOWEST_NODES: usize = 3;

/// Compact reference to a plan node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: usize,
    pub node_type: String,
    pub relation: Option<String>,
    pub actual_rows: Option<f64>,
    pub exclusive_time: f64,
    pub time_percent: f64,
}

impl From<&PlanNode> for NodeSummary {
    fn from(node: &PlanNode) -> Self {
        Self {
            id: node.id,
            node_type: node.node_type.clone(),
            relation: node.relation.clone(),
            actual_rows: node.actual_rows,
            exclusive_time: node.exclusive_time,
            time_percent: node.time_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub planning_time: f64,
    pub execution_time: f64,
    pub total_time: f64,
    pub node_count: usize,
    /// Levels in the tree; the root alone is depth 1
    pub max_depth: usize,
    pub warnings: WarningCounts,
    pub seq_scans: Vec<NodeSummary>,
    /// Up to three nodes with the largest positive exclusive time
    pub slowest_nodes: Vec<NodeSummary>,
    pub total_shared_hit: u64,
    pub total_shared_read: u64,
    /// Hit share of all shared buffer accesses, when any were recorded
    pub cache_hit_ratio: Option<f64>,
    /// Node type -> count, in first-seen order
    pub node_types: IndexMap<String, usize>,
}

impl PlanStats {
    pub fn collect(plan: &ExplainPlan) -> Self {
        let mut node_count = 0;
        let mut warnings = WarningCounts::default();
        let mut seq_scans = Vec::new();
        let mut timed: Vec<&PlanNode> = Vec::new();
        let mut total_shared_hit = 0;
        let mut total_shared_read = 0;
        let mut node_types: IndexMap<String, usize> = IndexMap::new();

        for node in plan.nodes() {
            node_count += 1;
            for w in &node.warnings {
                warnings.add(w);
            }
            total_shared_hit += node.shared_hit_blocks;
            total_shared_read += node.shared_read_blocks;

            if node.node_type == "Seq Scan" {
                seq_scans.push(NodeSummary::from(node));
            }
            *node_types.entry(node.node_type.clone()).or_insert(0) += 1;

            if node.exclusive_time > 0.0 {
                timed.push(node);
            }
        }

        // Stable sort keeps traversal order among equal times
        timed.sort_by(|a, b| b.exclusive_time.total_cmp(&a.exclusive_time));
        let slowest_nodes = timed
            .into_iter()
            .take(SLOWEST_NODES)
            .map(NodeSummary::from)
            .collect();

        let accesses = total_shared_hit + total_shared_read;
        let cache_hit_ratio = (accesses > 0).then(|| total_shared_hit as f64 / accesses as f64);

        Self {
            planning_time: plan.planning_time,
            execution_time: plan.execution_time,
            total_time: plan.total_time,
            node_count,
            max_depth: plan.root.depth(),
            warnings,
            seq_scans,
            slowest_nodes,
            total_shared_hit,
            total_shared_read,
            cache_hit_ratio,
            node_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStats {
    pub table_count: usize,
    pub column_count: usize,
    pub relation_count: usize,
    pub index_count: usize,
    pub warnings: WarningCounts,
    pub cycle_count: usize,
}

impl SchemaStats {
    pub fn collect(schema: &Schema) -> Self {
        Self {
            table_count: schema.tables.len(),
            column_count: schema.column_count(),
            relation_count: schema.relations.len(),
            index_count: schema.indexes.len(),
            warnings: schema.all_warnings().collect(),
            cycle_count: schema
                .warnings
                .iter()
                .filter(|w| w.code == WarningCode::CircularDependency)
                .count(),
        }
    }
}
