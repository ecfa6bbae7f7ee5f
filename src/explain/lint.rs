//! Plan node rules.

use super::plan::{ExplainPlan, PlanNode};
use crate::diagnostics::{Level, Warning, WarningCode};
use crate::format::{format_count, format_rows};

/// Thresholds for the plan rules.
#[derive(Debug, Clone)]
pub struct PlanLintConfig {
    /// Seq Scan rows above which a scan is reported
    pub seq_scan_rows: u64,
    /// Share of rows discarded by a filter above which it is reported
    pub filter_ratio: f64,
    /// Actual/estimated row ratio (either way) above which it is reported
    pub row_estimate_factor: f64,
    /// Nested Loop iterations above which the join is reported
    pub nested_loop_iterations: u64,
    /// Buffer cache hit ratio below which a node is reported
    pub cache_hit_ratio: f64,
    /// Share of execution time above which a node is a bottleneck
    pub bottleneck_percent: f64,
}

impl Default for PlanLintConfig {
    fn default() -> Self {
        Self {
            seq_scan_rows: 10_000,
            filter_ratio: 0.8,
            row_estimate_factor: 10.0,
            nested_loop_iterations: 1000,
            cache_hit_ratio: 0.9,
            bottleneck_percent: 50.0,
        }
    }
}

/// Attach warnings to every node of the plan.
///
/// A node's previous warnings are replaced.
pub fn lint_plan(plan: &mut ExplainPlan, config: &PlanLintConfig) {
    plan.root
        .visit_mut(&mut |node: &mut PlanNode| node.warnings = lint_node(node, config));
}

fn lint_node(node: &PlanNode, config: &PlanLintConfig) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let actual_rows = node.actual_rows.unwrap_or(0.0);
    let relation = node.relation.as_deref().unwrap_or("table");

    if node.node_type == "Seq Scan" && actual_rows > config.seq_scan_rows as f64 {
        warnings.push(Warning::new(
            Level::Warning,
            WarningCode::SeqScanLarge,
            format!(
                "Sequential scan on {}: {} rows. Consider adding an index.",
                relation,
                format_rows(actual_rows)
            ),
        ));
    }

    if node.rows_removed_by_filter > 0 && actual_rows > 0.0 {
        let removed = node.rows_removed_by_filter as f64;
        let ratio = removed / (actual_rows + removed);
        if ratio > config.filter_ratio {
            warnings.push(Warning::new(
                Level::Warning,
                WarningCode::HighFilterRatio,
                format!(
                    "{:.0}% of rows discarded by the filter ({} of {}). An index on the filtered column would speed up the query.",
                    ratio * 100.0,
                    format_count(node.rows_removed_by_filter),
                    format_rows(actual_rows + removed)
                ),
            ));
        }
    }

    if node.plan_rows > 0.0
        && let Some(actual) = node.actual_rows
    {
        let factor = actual / node.plan_rows;
        if factor > config.row_estimate_factor || factor < 1.0 / config.row_estimate_factor {
            warnings.push(
                Warning::new(
                    Level::Info,
                    WarningCode::RowEstimateOff,
                    format!(
                        "Expected {} rows, got {} (x{:.1}). Refresh planner statistics: ANALYZE {}.",
                        format_rows(node.plan_rows),
                        format_rows(actual),
                        factor,
                        relation
                    ),
                )
                .with_suggestion(format!("ANALYZE {};", relation)),
            );
        }
    }

    if node.sort_space_type.as_deref() == Some("Disk") {
        warnings.push(Warning::new(
            Level::Danger,
            WarningCode::DiskSort,
            format!(
                "Sort spilled to disk ({} kB). Increase work_mem or rework the query.",
                format_count(node.sort_space_used)
            ),
        ));
    }

    if node.hash_batches > 1 {
        warnings.push(Warning::new(
            Level::Warning,
            WarningCode::HashBatches,
            format!(
                "Hash split into {} batches (did not fit in memory, {} kB). Increase work_mem.",
                node.hash_batches,
                format_count(node.peak_memory_usage)
            ),
        ));
    }

    if node.node_type == "Nested Loop" && node.actual_loops > config.nested_loop_iterations {
        warnings.push(Warning::new(
            Level::Danger,
            WarningCode::NestedLoopMany,
            format!(
                "Nested Loop: {} iterations. A Hash Join or Merge Join may be more efficient.",
                format_count(node.actual_loops)
            ),
        ));
    }

    if node.shared_read_blocks > 0 && node.shared_hit_blocks > 0 {
        let hit = node.shared_hit_blocks as f64;
        let hit_ratio = hit / (hit + node.shared_read_blocks as f64);
        if hit_ratio < config.cache_hit_ratio {
            warnings.push(Warning::new(
                Level::Info,
                WarningCode::LowCacheHit,
                format!(
                    "Cache hit ratio: {:.1}%. Consider increasing shared_buffers.",
                    hit_ratio * 100.0
                ),
            ));
        }
    }

    if node.time_percent > config.bottleneck_percent {
        warnings.push(Warning::new(
            Level::Danger,
            WarningCode::Bottleneck,
            format!(
                "This node takes {:.1}% of total execution time.",
                node.time_percent
            ),
        ));
    }

    warnings
}
