use dbalens::diagnostics::{Level, WarningCode};
use dbalens::explain::{ExplainError, PlanLintConfig};
use dbalens::report::{PlanReport, SchemaReport};
use dbalens::schema::lint::SchemaLintConfig;
use dbalens::sql::DdlError;
use dbalens::{analyze_ddl, analyze_explain};
use pretty_assertions::assert_eq;

const ECOMMERCE: &str = include_str!("../demos/ecommerce.sql");
const HR: &str = include_str!("../demos/hr.sql");
const TELECOM: &str = include_str!("../demos/telecom.sql");
const PLAN_SIMPLE: &str = include_str!("../demos/plan_simple.json");
const PLAN_MEDIUM: &str = include_str!("../demos/plan_medium.json");
const PLAN_COMPLEX: &str = include_str!("../demos/plan_complex.json");

fn schema_codes(sql: &str) -> Vec<(Option<String>, Option<String>, WarningCode)> {
    let analysis = analyze_ddl(sql, &SchemaLintConfig::default()).unwrap();
    analysis
        .schema
        .all_warnings()
        .map(|w| (w.table.clone(), w.column.clone(), w.code))
        .collect()
}

#[test]
fn ecommerce_schema() {
    let analysis = analyze_ddl(ECOMMERCE, &SchemaLintConfig::default()).unwrap();
    let stats = &analysis.stats;

    assert_eq!(stats.table_count, 5);
    assert_eq!(stats.column_count, 29);
    assert_eq!(stats.relation_count, 5);
    assert_eq!(stats.index_count, 4);
    assert_eq!(stats.cycle_count, 0);
    assert!(analysis.diagnostics.is_empty());
    assert!(!analysis.has_danger());

    assert_eq!(
        schema_codes(ECOMMERCE),
        vec![
            (
                Some("categories".to_string()),
                Some("parent_id".to_string()),
                WarningCode::FkNoIndex
            ),
            (
                Some("order_items".to_string()),
                Some("product_id".to_string()),
                WarningCode::FkNoIndex
            ),
        ]
    );

    let products = analysis.schema.table("products").unwrap();
    let price = products.column("price").unwrap();
    assert_eq!(price.typ, "NUMERIC(10,2)");
    assert_eq!(price.check_expression.as_deref(), Some("price > 0"));
    assert!(!price.is_nullable);

    let orders = analysis.schema.table("orders").unwrap();
    let status = orders.column("status").unwrap();
    assert_eq!(status.default_value.as_deref(), Some("'new'"));
    assert_eq!(
        status.check_expression.as_deref(),
        Some("status IN ('new','paid','shipped','delivered','cancelled')")
    );
}

#[test]
fn hr_schema_cycle_and_composite_key() {
    let analysis = analyze_ddl(HR, &SchemaLintConfig::default()).unwrap();

    // departments <-> employees via the ALTER TABLE head reference
    assert_eq!(analysis.schema.warnings.len(), 1);
    let cycle = &analysis.schema.warnings[0];
    assert_eq!(cycle.code, WarningCode::CircularDependency);
    assert_eq!(cycle.tables, vec!["departments".to_string(), "employees".to_string()]);

    let head = analysis
        .schema
        .relations
        .iter()
        .find(|r| r.from_column == "head_employee_id")
        .unwrap();
    assert_eq!(head.id, "fk_dept_head");
    assert_eq!(head.to_table, "employees");

    let skills = analysis.schema.table("employee_skills").unwrap();
    assert_eq!(
        skills.primary_key,
        vec!["employee_id".to_string(), "skill_id".to_string()]
    );
    assert!(skills.warnings.is_empty());

    let orphan = analysis.schema.table("orphan_table").unwrap();
    let codes: Vec<WarningCode> = orphan.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec![WarningCode::OrphanTable]);

    assert_eq!(analysis.stats.relation_count, 10);
    assert_eq!(analysis.stats.warnings.warning, 9);
    assert_eq!(analysis.stats.warnings.info, 1);
    assert!(!analysis.has_danger());
}

#[test]
fn telecom_schema_is_clean_of_missing_keys() {
    let analysis = analyze_ddl(TELECOM, &SchemaLintConfig::default()).unwrap();

    assert_eq!(analysis.stats.table_count, 8);
    assert!(analysis.schema.all_warnings().all(|w| w.code != WarningCode::NoPrimaryKey));
    let audit = analysis.schema.table("audit_log").unwrap();
    assert_eq!(audit.column("action").unwrap().typ, "VARCHAR(10)");
    assert!(
        audit
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::OrphanTable)
    );
}

#[test]
fn missing_primary_key_is_danger() {
    let analysis = analyze_ddl("CREATE TABLE events (payload JSONB);", &SchemaLintConfig::default()).unwrap();
    let events = analysis.schema.table("events").unwrap();
    let danger: Vec<WarningCode> = events
        .warnings
        .iter()
        .filter(|w| w.level == Level::Danger)
        .map(|w| w.code)
        .collect();
    assert_eq!(danger, vec![WarningCode::NoPrimaryKey]);
    assert!(analysis.has_danger());
}

#[test]
fn ddl_without_tables_fails() {
    let err = analyze_ddl("CREATE VIEW v AS SELECT 1;", &SchemaLintConfig::default()).unwrap_err();
    assert!(matches!(err, DdlError::NoTables { skipped: 1 }));
}

#[test]
fn simple_plan() {
    let analysis = analyze_explain(PLAN_SIMPLE, &PlanLintConfig::default()).unwrap();

    assert_eq!(analysis.stats.node_count, 1);
    // A lone node owns all of the execution time it reports
    let codes: Vec<WarningCode> = analysis.plan.root.warnings.iter().map(|w| w.code).collect();
    assert_eq!(codes, vec![WarningCode::Bottleneck]);
    assert_eq!(analysis.plan.root.index_name.as_deref(), Some("users_pkey"));
    assert_eq!(analysis.plan.planning_time, 0.082);
    assert_eq!(analysis.plan.execution_time, 0.035);
}

#[test]
fn medium_plan() {
    let analysis = analyze_explain(PLAN_MEDIUM, &PlanLintConfig::default()).unwrap();
    let stats = &analysis.stats;

    assert_eq!(stats.node_count, 6);
    assert_eq!(stats.max_depth, 5);

    let scans: Vec<usize> = stats.seq_scans.iter().map(|n| n.id).collect();
    assert_eq!(scans, vec![3, 5]);
    let slowest: Vec<usize> = stats.slowest_nodes.iter().map(|n| n.id).collect();
    assert_eq!(slowest, vec![3, 2, 1]);

    let orders = analysis.plan.nodes().find(|n| n.id == 3).unwrap();
    let codes: Vec<WarningCode> = orders.warnings.iter().map(|w| w.code).collect();
    assert_eq!(
        codes,
        vec![
            WarningCode::SeqScanLarge,
            WarningCode::HighFilterRatio,
            WarningCode::LowCacheHit,
            WarningCode::Bottleneck,
        ]
    );

    let sort = analysis.plan.nodes().find(|n| n.id == 1).unwrap();
    assert_eq!(sort.sort_key, vec!["o.total DESC".to_string()]);
    assert_eq!(sort.warnings[0].code, WarningCode::RowEstimateOff);

    assert_eq!(stats.warnings.total, 6);
    assert_eq!(stats.warnings.danger, 1);
    assert_eq!(stats.warnings.warning, 3);
    assert_eq!(stats.warnings.info, 2);
}

#[test]
fn complex_plan() {
    let analysis = analyze_explain(PLAN_COMPLEX, &PlanLintConfig::default()).unwrap();
    let stats = &analysis.stats;

    assert!(analysis.has_danger());
    assert_eq!(stats.warnings.total, 5);
    assert_eq!(stats.warnings.danger, 1);

    let root: Vec<WarningCode> = analysis.plan.root.warnings.iter().map(|w| w.code).collect();
    assert_eq!(root, vec![WarningCode::DiskSort]);

    let slowest: Vec<usize> = stats.slowest_nodes.iter().map(|n| n.id).collect();
    assert_eq!(slowest, vec![1, 5, 2]);

    let lower = PlanLintConfig {
        bottleneck_percent: 40.0,
        ..PlanLintConfig::default()
    };
    let analysis = analyze_explain(PLAN_COMPLEX, &lower).unwrap();
    let join: Vec<WarningCode> = analysis.plan.root.children[0]
        .warnings
        .iter()
        .map(|w| w.code)
        .collect();
    assert_eq!(join, vec![WarningCode::Bottleneck]);
}

#[test]
fn invalid_plan_input() {
    let err = analyze_explain("not json", &PlanLintConfig::default()).unwrap_err();
    assert!(matches!(err, ExplainError::InvalidJson(_)));
}

#[test]
fn reports_render() {
    let schema = analyze_ddl(HR, &SchemaLintConfig::default()).unwrap();
    let text = SchemaReport(&schema).to_string();
    assert!(text.contains("CIRCULAR_DEPENDENCY: Circular dependency: departments \u{2192} employees \u{2192} departments"));

    let plan = analyze_explain(PLAN_MEDIUM, &PlanLintConfig::default()).unwrap();
    let text = PlanReport(&plan).to_string();
    assert!(text.starts_with("Planning 1.25 ms, execution 892.89 ms, total 894.14 ms\n"));
    assert!(text.contains("-> Seq Scan on orders o"));
}
