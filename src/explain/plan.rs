//! Plan tree produced from EXPLAIN output.

use crate::diagnostics::Warning;
use serde::Serialize;

/// A parsed EXPLAIN ANALYZE result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPlan {
    pub root: PlanNode,
    pub planning_time: f64,
    pub execution_time: f64,
    /// Planning plus execution time
    pub total_time: f64,
}

impl ExplainPlan {
    /// Nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> {
        self.root.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanNode {
    /// Pre-order position within the plan
    pub id: usize,
    pub node_type: String,
    pub relation: Option<String>,
    pub alias: Option<String>,
    pub index_name: Option<String>,
    pub parent_relationship: Option<String>,
    pub join_type: Option<String>,

    pub startup_cost: f64,
    pub total_cost: f64,
    pub plan_rows: f64,
    pub plan_width: u64,

    pub actual_startup_time: Option<f64>,
    pub actual_total_time: Option<f64>,
    pub actual_rows: Option<f64>,
    pub actual_loops: u64,

    pub shared_hit_blocks: u64,
    pub shared_read_blocks: u64,

    pub filter: Option<String>,
    pub index_cond: Option<String>,
    pub hash_cond: Option<String>,
    pub recheck_cond: Option<String>,
    pub rows_removed_by_filter: u64,
    pub rows_removed_by_index_recheck: u64,

    pub sort_key: Vec<String>,
    pub sort_method: Option<String>,
    pub sort_space_used: u64,
    pub sort_space_type: Option<String>,

    pub hash_buckets: u64,
    pub hash_batches: u64,
    pub peak_memory_usage: u64,

    /// Own time across all loops, children excluded
    pub exclusive_time: f64,
    /// Share of execution time spent in this node
    pub time_percent: f64,

    pub warnings: Vec<Warning>,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub fn new(id: usize, node_type: impl Into<String>) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            relation: None,
            alias: None,
            index_name: None,
            parent_relationship: None,
            join_type: None,
            startup_cost: 0.0,
            total_cost: 0.0,
            plan_rows: 0.0,
            plan_width: 0,
            actual_startup_time: None,
            actual_total_time: None,
            actual_rows: None,
            actual_loops: 1,
            shared_hit_blocks: 0,
            shared_read_blocks: 0,
            filter: None,
            index_cond: None,
            hash_cond: None,
            recheck_cond: None,
            rows_removed_by_filter: 0,
            rows_removed_by_index_recheck: 0,
            sort_key: Vec::new(),
            sort_method: None,
            sort_space_used: 0,
            sort_space_type: None,
            hash_buckets: 0,
            hash_batches: 0,
            peak_memory_usage: 0,
            exclusive_time: 0.0,
            time_percent: 0.0,
            warnings: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Compute `exclusive_time` and `time_percent` from this node's and its
    /// children's actual timings.
    pub fn compute_timing(&mut self, execution_time: f64) {
        if let Some(total) = self.actual_total_time {
            let children_time: f64 = self
                .children
                .iter()
                .map(|c| c.actual_total_time.unwrap_or(0.0) * c.actual_loops.max(1) as f64)
                .sum();
            self.exclusive_time = (total * self.actual_loops as f64 - children_time).max(0.0);
        }

        if execution_time > 0.0 && self.exclusive_time > 0.0 {
            self.time_percent = self.exclusive_time / execution_time * 100.0;
        }
    }

    /// This node and its descendants in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Visit this node and its descendants in pre-order, mutably.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut PlanNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Number of levels in this subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PlanNode::depth).max().unwrap_or(0)
    }

    /// Short label such as `Seq Scan on orders o`.
    pub fn label(&self) -> String {
        let mut label = self.node_type.clone();
        if let Some(index) = &self.index_name {
            label.push_str(" using ");
            label.push_str(index);
        }
        if let Some(relation) = &self.relation {
            label.push_str(" on ");
            label.push_str(relation);
            if let Some(alias) = self.alias.as_ref().filter(|a| *a != relation) {
                label.push(' ');
                label.push_str(alias);
            }
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn timed(id: usize, node_type: &str, total: Option<f64>, loops: u64) -> PlanNode {
        let mut node = PlanNode::new(id, node_type);
        node.actual_total_time = total;
        node.actual_loops = loops;
        node
    }

    #[test]
    fn test_exclusive_time_subtracts_children() {
        let mut root = timed(0, "Hash Join", Some(100.0), 1);
        root.children.push(timed(1, "Seq Scan", Some(30.0), 1));
        root.compute_timing(200.0);

        assert_eq!(root.exclusive_time, 70.0);
        assert_eq!(root.time_percent, 35.0);
    }

    #[test]
    fn test_exclusive_time_uses_loops_and_floors_at_zero() {
        let mut root = timed(0, "Nested Loop", Some(10.0), 1);
        root.children.push(timed(1, "Index Scan", Some(0.5), 40));
        root.children.push(timed(2, "Seq Scan", None, 1));
        root.compute_timing(10.0);

        assert_eq!(root.exclusive_time, 0.0);
        assert_eq!(root.time_percent, 0.0);
    }

    #[test]
    fn test_no_actual_time_means_no_exclusive_time() {
        let mut node = timed(0, "Seq Scan", None, 1);
        node.compute_timing(100.0);
        assert_eq!(node.exclusive_time, 0.0);
        assert_eq!(node.time_percent, 0.0);
    }

    #[test]
    fn test_iter_is_pre_order_and_depth() {
        let mut root = PlanNode::new(0, "Sort");
        let mut join = PlanNode::new(1, "Hash Join");
        join.children.push(PlanNode::new(2, "Seq Scan"));
        join.children.push(PlanNode::new(3, "Hash"));
        root.children.push(join);
        root.children.push(PlanNode::new(4, "Result"));

        let ids: Vec<usize> = root.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(root.depth(), 3);
    }

    #[test]
    fn test_label() {
        let mut node = PlanNode::new(0, "Index Scan");
        node.index_name = Some("orders_pkey".to_string());
        node.relation = Some("orders".to_string());
        node.alias = Some("o".to_string());
        assert_eq!(node.label(), "Index Scan using orders_pkey on orders o");

        node.alias = Some("orders".to_string());
        node.index_name = None;
        assert_eq!(node.label(), "Index Scan on orders");
    }
}
