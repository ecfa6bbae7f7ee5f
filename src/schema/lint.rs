//! Schema design rules.

use super::{Schema, Table};
use crate::diagnostics::{Level, Warning, WarningCode};
use crate::graph::find_cycles;

/// Thresholds for the schema rules.
#[derive(Debug, Clone)]
pub struct SchemaLintConfig {
    /// Tables with more columns than this are reported as wide
    pub wide_table_columns: usize,
}

impl Default for SchemaLintConfig {
    fn default() -> Self {
        Self {
            wide_table_columns: 20,
        }
    }
}

/// Attach warnings to each table, and cycle warnings to the schema.
///
/// Previous warnings are replaced, so linting twice gives the same result.
pub fn lint_schema(schema: &mut Schema, config: &SchemaLintConfig) {
    for table in schema.tables.values_mut() {
        table.warnings = lint_table(table, config);
    }

    schema.warnings = find_schema_cycles(schema)
        .into_iter()
        .map(|cycle| {
            let mut path = cycle.join(" \u{2192} ");
            path.push_str(" \u{2192} ");
            path.push_str(&cycle[0]);
            Warning::new(
                Level::Warning,
                WarningCode::CircularDependency,
                format!("Circular dependency: {}", path),
            )
            .with_tables(cycle)
        })
        .collect();
}

fn lint_table(table: &Table, config: &SchemaLintConfig) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for col in table.foreign_key_columns() {
        if table.is_indexed(&col.name) {
            continue;
        }
        warnings.push(
            Warning::new(
                Level::Warning,
                WarningCode::FkNoIndex,
                format!(
                    "{}.{}: foreign key without an index. JOINs and cascading deletes over this relation will be slow.",
                    table.name, col.name
                ),
            )
            .with_table(&table.name)
            .with_column(&col.name)
            .with_suggestion(format!(
                "CREATE INDEX idx_{0}_{1} ON {0}({1});",
                table.name, col.name
            )),
        );
    }

    let has_outgoing = table.foreign_key_columns().next().is_some();
    if !has_outgoing && table.referenced_by.is_empty() {
        warnings.push(
            Warning::new(
                Level::Info,
                WarningCode::OrphanTable,
                format!("Table {} is not related to any other table.", table.name),
            )
            .with_table(&table.name),
        );
    }

    if table.primary_key.is_empty() {
        warnings.push(
            Warning::new(
                Level::Danger,
                WarningCode::NoPrimaryKey,
                format!("Table {} has no PRIMARY KEY.", table.name),
            )
            .with_table(&table.name),
        );
    }

    if table.columns.len() > config.wide_table_columns {
        warnings.push(
            Warning::new(
                Level::Info,
                WarningCode::WideTable,
                format!(
                    "Table {} has {} columns. Consider normalizing it.",
                    table.name,
                    table.columns.len()
                ),
            )
            .with_table(&table.name),
        );
    }

    warnings
}

/// Distinct cycles in the foreign key graph, in table order.
pub fn find_schema_cycles(schema: &Schema) -> Vec<Vec<String>> {
    let vertices: Vec<&str> = schema.tables.keys().map(String::as_str).collect();
    let edges: Vec<(&str, &str)> = schema
        .relations
        .iter()
        .map(|r| (r.from_table.as_str(), r.to_table.as_str()))
        .collect();
    find_cycles(&vertices, &edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse_ddl;
    use pretty_assertions::assert_eq;

    fn lint(sql: &str) -> Schema {
        let mut schema = Schema::from_statements(parse_ddl(sql).unwrap().statements);
        lint_schema(&mut schema, &SchemaLintConfig::default());
        schema
    }

    fn codes(schema: &Schema) -> Vec<WarningCode> {
        schema.all_warnings().map(|w| w.code).collect()
    }

    #[test]
    fn test_fk_without_index() {
        let schema = lint(
            r#"
            CREATE TABLE users (id SERIAL PRIMARY KEY);
            CREATE TABLE posts (id SERIAL PRIMARY KEY, user_id INT REFERENCES users(id));
            "#,
        );

        let posts = schema.table("posts").unwrap();
        assert_eq!(posts.warnings.len(), 1);
        let w = &posts.warnings[0];
        assert_eq!(w.code, WarningCode::FkNoIndex);
        assert_eq!(w.level, Level::Warning);
        assert_eq!(w.column.as_deref(), Some("user_id"));
        assert_eq!(
            w.suggestion.as_deref(),
            Some("CREATE INDEX idx_posts_user_id ON posts(user_id);")
        );
        assert!(schema.table("users").unwrap().warnings.is_empty());
    }

    #[test]
    fn test_indexed_fk_is_clean() {
        let schema = lint(
            r#"
            CREATE TABLE users (id SERIAL PRIMARY KEY);
            CREATE TABLE posts (id SERIAL PRIMARY KEY, user_id INT REFERENCES users(id));
            CREATE INDEX idx_posts_user ON posts(user_id);
            "#,
        );

        assert!(codes(&schema).is_empty());
    }

    #[test]
    fn test_fk_in_primary_key_is_clean() {
        let schema = lint(
            r#"
            CREATE TABLE a (id INT PRIMARY KEY);
            CREATE TABLE b (id INT PRIMARY KEY);
            CREATE TABLE ab (
                a_id INT REFERENCES a(id),
                b_id INT REFERENCES b(id),
                PRIMARY KEY (a_id, b_id)
            );
            "#,
        );

        assert!(codes(&schema).is_empty());
    }

    #[test]
    fn test_orphan_and_missing_primary_key() {
        let schema = lint("CREATE TABLE logs (message TEXT);");

        assert_eq!(
            codes(&schema),
            vec![WarningCode::OrphanTable, WarningCode::NoPrimaryKey]
        );
        let logs = schema.table("logs").unwrap();
        assert_eq!(logs.warnings[1].level, Level::Danger);
        assert_eq!(logs.warnings[1].message, "Table logs has no PRIMARY KEY.");
    }

    #[test]
    fn test_wide_table_threshold() {
        let columns: Vec<String> = (0..21).map(|i| format!("c{} INT", i)).collect();
        let sql = format!("CREATE TABLE wide (id INT PRIMARY KEY, {});", columns.join(", "));

        let mut schema = Schema::from_statements(parse_ddl(&sql).unwrap().statements);
        lint_schema(&mut schema, &SchemaLintConfig::default());
        assert!(codes(&schema).contains(&WarningCode::WideTable));

        let relaxed = SchemaLintConfig {
            wide_table_columns: 22,
        };
        lint_schema(&mut schema, &relaxed);
        assert!(!codes(&schema).contains(&WarningCode::WideTable));
    }

    #[test]
    fn test_cycle_of_three_reported_once() {
        let schema = lint(
            r#"
            CREATE TABLE a (id INT PRIMARY KEY, b_id INT REFERENCES b(id));
            CREATE TABLE b (id INT PRIMARY KEY, c_id INT REFERENCES c(id));
            CREATE TABLE c (id INT PRIMARY KEY, a_id INT REFERENCES a(id));
            "#,
        );

        assert_eq!(schema.warnings.len(), 1);
        let w = &schema.warnings[0];
        assert_eq!(w.code, WarningCode::CircularDependency);
        assert_eq!(w.tables, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(w.message, "Circular dependency: a \u{2192} b \u{2192} c \u{2192} a");
        assert!(w.table.is_none());
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let schema = lint(
            "CREATE TABLE employees (id INT PRIMARY KEY, manager_id INT REFERENCES employees(id));",
        );

        assert!(schema.warnings.is_empty());
        // Self-referencing table is not an orphan
        assert_eq!(codes(&schema), vec![WarningCode::FkNoIndex]);
    }

    #[test]
    fn test_lint_is_idempotent() {
        let mut schema = lint("CREATE TABLE logs (message TEXT);");
        let before = schema.clone();
        lint_schema(&mut schema, &SchemaLintConfig::default());
        assert_eq!(schema, before);
    }

    #[test]
    fn test_all_warnings_order() {
        let schema = lint(
            r#"
            CREATE TABLE a (id INT PRIMARY KEY, b_id INT REFERENCES b(id));
            CREATE TABLE b (id INT PRIMARY KEY, a_id INT REFERENCES a(id));
            "#,
        );

        assert_eq!(
            codes(&schema),
            vec![
                WarningCode::FkNoIndex,
                WarningCode::FkNoIndex,
                WarningCode::CircularDependency,
            ]
        );
    }
}
