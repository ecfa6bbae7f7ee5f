//! Plain text reports for terminal output.

use crate::diagnostics::{Warning, WarningCounts};
use crate::explain::PlanNode;
use crate::format::{format_count, format_ms, format_rows, max_width, pad_right};
use crate::schema::{Column, Table};
use crate::{PlanAnalysis, SchemaAnalysis};
use std::fmt;

const LEVEL_WIDTH: usize = 9;

fn write_counts(f: &mut fmt::Formatter<'_>, counts: &WarningCounts) -> fmt::Result {
    writeln!(
        f,
        "Warnings: {} ({} danger, {} warning, {} info)",
        counts.total, counts.danger, counts.warning, counts.info
    )
}

fn write_warning(f: &mut fmt::Formatter<'_>, indent: &str, warning: &Warning) -> fmt::Result {
    let level = format!("[{}]", warning.level);
    writeln!(
        f,
        "{}{} {}: {}",
        indent,
        pad_right(&level, LEVEL_WIDTH),
        warning.code,
        warning.message
    )?;
    if let Some(suggestion) = &warning.suggestion {
        writeln!(f, "{}{} fix: {}", indent, pad_right("", LEVEL_WIDTH), suggestion)?;
    }
    Ok(())
}

/// Text report for a schema analysis.
pub struct SchemaReport<'a>(pub &'a SchemaAnalysis);

impl SchemaReport<'_> {
    fn write_table(f: &mut fmt::Formatter<'_>, table: &Table) -> fmt::Result {
        writeln!(f, "{}", table.name)?;

        let name_width = max_width(table.columns.iter().map(|c| c.name.as_str()));
        let type_width = max_width(table.columns.iter().map(|c| c.typ.as_str()));
        for col in &table.columns {
            let line = format!(
                "  {}  {}  {}",
                pad_right(&col.name, name_width),
                pad_right(&col.typ, type_width),
                Self::column_flags(col)
            );
            writeln!(f, "{}", line.trim_end())?;
        }

        for idx in &table.indexes {
            writeln!(
                f,
                "  index {} ({}){}",
                idx.name,
                idx.columns.join(", "),
                if idx.is_unique { " UNIQUE" } else { "" }
            )?;
        }
        if !table.referenced_by.is_empty() {
            let names: Vec<&str> = table.referenced_by.iter().map(String::as_str).collect();
            writeln!(f, "  referenced by: {}", names.join(", "))?;
        }
        Ok(())
    }

    fn column_flags(col: &Column) -> String {
        let mut flags = Vec::new();
        if col.is_primary_key {
            flags.push("PK".to_string());
        }
        if let Some(target) = &col.reference {
            let mut fk = format!("FK -> {}.{}", target.table, target.column);
            if let Some(action) = target.on_delete {
                fk.push_str(&format!(" ON DELETE {}", action));
            }
            flags.push(fk);
        }
        if !col.is_nullable && !col.is_primary_key {
            flags.push("NOT NULL".to_string());
        }
        if col.is_unique && !col.is_primary_key {
            flags.push("UNIQUE".to_string());
        }
        if let Some(default) = &col.default_value {
            flags.push(format!("DEFAULT {}", default));
        }
        if let Some(check) = &col.check_expression {
            flags.push(format!("CHECK ({})", check));
        }
        flags.join(" ")
    }
}

impl fmt::Display for SchemaReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let stats = &analysis.stats;

        writeln!(
            f,
            "Schema: {} tables, {} columns, {} relations, {} indexes",
            stats.table_count, stats.column_count, stats.relation_count, stats.index_count
        )?;
        write_counts(f, &stats.warnings)?;

        for table in analysis.schema.tables.values() {
            writeln!(f)?;
            Self::write_table(f, table)?;
        }

        if stats.warnings.total > 0 {
            writeln!(f)?;
            writeln!(f, "Findings")?;
            for warning in analysis.schema.all_warnings() {
                write_warning(f, "  ", warning)?;
            }
        }

        if !analysis.diagnostics.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped input")?;
            for d in &analysis.diagnostics {
                writeln!(f, "  statement {}: {} ({})", d.statement, d.message, d.snippet)?;
            }
        }

        Ok(())
    }
}

/// Text report for a plan analysis, with the plan drawn as an indented tree.
pub struct PlanReport<'a>(pub &'a PlanAnalysis);

impl PlanReport<'_> {
    fn write_node(f: &mut fmt::Formatter<'_>, node: &PlanNode, depth: usize) -> fmt::Result {
        let indent = "   ".repeat(depth);
        let arrow = if depth == 0 { "" } else { "-> " };

        let mut line = format!("{}{}{}", indent, arrow, node.label());
        if node.actual_total_time.is_some() {
            line.push_str(&format!(
                "  self {} ({:.1}%)",
                format_ms(node.exclusive_time),
                node.time_percent
            ));
        }
        match node.actual_rows {
            Some(rows) => line.push_str(&format!(
                "  rows {} of {} est",
                format_rows(rows),
                format_rows(node.plan_rows)
            )),
            None => line.push_str(&format!("  est rows {}", format_rows(node.plan_rows))),
        }
        if node.actual_loops > 1 {
            line.push_str(&format!("  loops {}", format_count(node.actual_loops)));
        }
        writeln!(f, "{}", line)?;

        let detail_indent = format!("{}{}", indent, if depth == 0 { "  " } else { "     " });
        for (label, value) in [
            ("Filter", &node.filter),
            ("Index Cond", &node.index_cond),
            ("Hash Cond", &node.hash_cond),
            ("Recheck Cond", &node.recheck_cond),
        ] {
            if let Some(value) = value {
                writeln!(f, "{}{}: {}", detail_indent, label, value)?;
            }
        }
        for warning in &node.warnings {
            write_warning(f, &detail_indent, warning)?;
        }

        for child in &node.children {
            Self::write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let stats = &analysis.stats;

        writeln!(
            f,
            "Planning {}, execution {}, total {}",
            format_ms(stats.planning_time),
            format_ms(stats.execution_time),
            format_ms(stats.total_time)
        )?;
        writeln!(f, "Nodes: {}, depth {}", stats.node_count, stats.max_depth)?;
        if let Some(ratio) = stats.cache_hit_ratio {
            writeln!(
                f,
                "Buffers: {} hit, {} read ({:.1}% cached)",
                format_count(stats.total_shared_hit),
                format_count(stats.total_shared_read),
                ratio * 100.0
            )?;
        }
        write_counts(f, &stats.warnings)?;

        writeln!(f)?;
        Self::write_node(f, &analysis.plan.root, 0)?;

        if !stats.slowest_nodes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Slowest nodes")?;
            for (rank, node) in stats.slowest_nodes.iter().enumerate() {
                let target = node
                    .relation
                    .as_ref()
                    .map(|r| format!(" on {}", r))
                    .unwrap_or_default();
                writeln!(
                    f,
                    "  {}. #{} {}{}  {} ({:.1}%)",
                    rank + 1,
                    node.id,
                    node.node_type,
                    target,
                    format_ms(node.exclusive_time),
                    node.time_percent
                )?;
            }
        }

        Ok(())
    }
}
