pub mod diagnostics;
pub mod explain;
pub mod format;
pub mod graph;
pub mod report;
pub mod schema;
pub mod sql;
pub mod stats;

use serde::Serialize;
use tracing::info;
use wasm_bindgen::prelude::*;

use explain::{ExplainError, ExplainPlan, PlanLintConfig};
use schema::Schema;
use schema::lint::SchemaLintConfig;
use sql::{DdlError, ParseDiagnostic};
use stats::{PlanStats, SchemaStats};

/// Result of analyzing DDL text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAnalysis {
    pub schema: Schema,
    /// Statements and clauses that were skipped
    pub diagnostics: Vec<ParseDiagnostic>,
    pub stats: SchemaStats,
}

impl SchemaAnalysis {
    pub fn has_danger(&self) -> bool {
        self.stats.warnings.has_danger()
    }
}

/// Result of analyzing EXPLAIN output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAnalysis {
    pub plan: ExplainPlan,
    pub stats: PlanStats,
}

impl PlanAnalysis {
    pub fn has_danger(&self) -> bool {
        self.stats.warnings.has_danger()
    }
}

/// Parse DDL, build the schema graph, lint it and summarize.
pub fn analyze_ddl(source: &str, config: &SchemaLintConfig) -> Result<SchemaAnalysis, DdlError> {
    let parsed = sql::parse_ddl(source)?;
    let mut schema = Schema::from_statements(parsed.statements);
    schema::lint::lint_schema(&mut schema, config);
    let stats = SchemaStats::collect(&schema);

    info!(
        tables = stats.table_count,
        relations = stats.relation_count,
        warnings = stats.warnings.total,
        skipped = parsed.diagnostics.len(),
        "schema analyzed"
    );

    Ok(SchemaAnalysis {
        schema,
        diagnostics: parsed.diagnostics,
        stats,
    })
}

/// Parse EXPLAIN JSON, lint the plan and summarize.
pub fn analyze_explain(source: &str, config: &PlanLintConfig) -> Result<PlanAnalysis, ExplainError> {
    let mut plan = explain::parse_explain(source)?;
    explain::lint_plan(&mut plan, config);
    let stats = PlanStats::collect(&plan);

    info!(
        nodes = stats.node_count,
        execution_ms = stats.execution_time,
        warnings = stats.warnings.total,
        "plan analyzed"
    );

    Ok(PlanAnalysis { plan, stats })
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Analyze DDL and return the analysis as JSON
#[wasm_bindgen(js_name = "analyzeDdl")]
pub fn analyze_ddl_json(source: &str) -> Result<String, String> {
    let analysis = analyze_ddl(source, &SchemaLintConfig::default()).map_err(|e| e.to_string())?;
    serde_json::to_string(&analysis).map_err(|e| e.to_string())
}

/// Analyze EXPLAIN JSON and return the analysis as JSON
#[wasm_bindgen(js_name = "analyzeExplain")]
pub fn analyze_explain_json(source: &str) -> Result<String, String> {
    let analysis =
        analyze_explain(source, &PlanLintConfig::default()).map_err(|e| e.to_string())?;
    serde_json::to_string(&analysis).map_err(|e| e.to_string())
}
