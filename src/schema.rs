//! Resolved relational schema: tables, columns, foreign keys and indexes.

pub mod lint;

use crate::diagnostics::Warning;
use crate::sql::{ColumnDef, ColumnModifier, CreateTable, ForeignTarget, ReferentialAction, Statement};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ForeignTarget>,
}

impl Column {
    fn from_def(def: ColumnDef) -> Self {
        let is_pk = def.has(|m| matches!(m, ColumnModifier::Pk));
        let is_serial = def.typ.contains("SERIAL");
        let is_nullable = !def.has(|m| matches!(m, ColumnModifier::NotNull)) && !is_pk && !is_serial;
        let is_unique = is_pk || def.has(|m| matches!(m, ColumnModifier::Unique));

        let mut default_value = None;
        let mut check_expression = None;
        let mut reference = None;
        for modifier in def.modifiers {
            match modifier {
                ColumnModifier::Default(value) => default_value = Some(value),
                ColumnModifier::Check(expr) => check_expression = Some(expr),
                ColumnModifier::References(target) => reference = Some(target),
                _ => {}
            }
        }

        Self {
            name: def.name,
            typ: def.typ,
            is_primary_key: is_pk,
            is_foreign_key: reference.is_some(),
            is_nullable,
            is_unique,
            default_value,
            check_expression,
            reference,
        }
    }

    fn mark_primary_key(&mut self) {
        self.is_primary_key = true;
        self.is_nullable = false;
        self.is_unique = true;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
}

/// A foreign key edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<Index>,
    pub warnings: Vec<Warning>,
    /// Tables this table has foreign keys into
    pub references_to: IndexSet<String>,
    /// Tables with foreign keys into this table
    pub referenced_by: IndexSet<String>,
}

impl Table {
    fn from_statement(stmt: CreateTable) -> Self {
        let mut columns: Vec<Column> = stmt.columns.into_iter().map(Column::from_def).collect();

        for pk in &stmt.primary_key {
            if let Some(col) = columns.iter_mut().find(|c| &c.name == pk) {
                col.mark_primary_key();
            }
        }

        // Composite key order first, then inline keys in column order
        let inline: Vec<String> = columns
            .iter()
            .filter(|c| c.is_primary_key && !stmt.primary_key.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();
        let mut primary_key = stmt.primary_key;
        primary_key.extend(inline);

        Self {
            name: stmt.name,
            columns,
            primary_key,
            indexes: Vec::new(),
            warnings: Vec::new(),
            references_to: IndexSet::new(),
            referenced_by: IndexSet::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn foreign_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_foreign_key)
    }

    /// True when an index leads with `column` or the primary key covers it.
    pub fn is_indexed(&self, column: &str) -> bool {
        self.indexes
            .iter()
            .any(|idx| idx.columns.first().is_some_and(|c| c == column))
            || self.primary_key.iter().any(|c| c == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Tables in first `CREATE TABLE` order
    pub tables: IndexMap<String, Table>,
    pub relations: Vec<Relation>,
    pub indexes: Vec<Index>,
    /// Findings without a single owning table
    pub warnings: Vec<Warning>,
}

impl Schema {
    /// Resolve parsed statements into a schema graph.
    ///
    /// Tables are created first, so ALTER TABLE and CREATE INDEX may
    /// precede the table they target in the input.
    pub fn from_statements(statements: Vec<Statement>) -> Self {
        let mut schema = Schema::default();
        let mut primary_keys = Vec::new();
        let mut foreign_keys = Vec::new();
        let mut indexes = Vec::new();

        for statement in statements {
            match statement {
                Statement::CreateTable(stmt) => {
                    let table = Table::from_statement(stmt);
                    if schema.tables.contains_key(&table.name) {
                        debug!(table = %table.name, "table redefined, keeping the last definition");
                    }
                    schema.tables.insert(table.name.clone(), table);
                }
                Statement::AddPrimaryKey { table, columns } => primary_keys.push((table, columns)),
                Statement::AddForeignKey(fk) => foreign_keys.push(fk),
                Statement::CreateIndex(idx) => indexes.push(idx),
            }
        }

        for (table_name, columns) in primary_keys {
            let Some(table) = schema.tables.get_mut(&table_name) else {
                debug!(table = %table_name, "primary key for unknown table");
                continue;
            };
            if !table.primary_key.is_empty() {
                debug!(table = %table_name, "primary key replaced by ALTER TABLE");
            }
            for col in &mut table.columns {
                if columns.contains(&col.name) {
                    col.mark_primary_key();
                } else {
                    col.is_primary_key = false;
                }
            }
            table.primary_key = columns;
        }

        for fk in foreign_keys {
            if schema.has_relation(&fk.table, &fk.column) {
                debug!(table = %fk.table, column = %fk.column, "duplicate foreign key ignored");
                continue;
            }

            if let Some(col) = schema
                .tables
                .get_mut(&fk.table)
                .and_then(|t| t.column_mut(&fk.column))
            {
                col.is_foreign_key = true;
                col.reference = Some(fk.target.clone());
            }

            let id = fk
                .constraint
                .unwrap_or_else(|| format!("{}_{}_fk", fk.table, fk.column));
            schema.relations.push(Relation {
                id,
                from_table: fk.table,
                from_column: fk.column,
                to_table: fk.target.table,
                to_column: fk.target.column,
                on_delete: fk.target.on_delete,
            });
        }

        for idx in indexes {
            let name = idx
                .name
                .unwrap_or_else(|| format!("{}_{}_idx", idx.table, idx.columns.join("_")));
            let index = Index {
                name,
                table: idx.table,
                columns: idx.columns,
                is_unique: idx.unique,
            };
            match schema.tables.get_mut(&index.table) {
                Some(table) => table.indexes.push(index.clone()),
                None => debug!(index = %index.name, table = %index.table, "index on unknown table"),
            }
            schema.indexes.push(index);
        }

        schema.collect_inline_references();
        schema.link_tables();
        schema
    }

    fn has_relation(&self, table: &str, column: &str) -> bool {
        self.relations
            .iter()
            .any(|r| r.from_table == table && r.from_column == column)
    }

    fn collect_inline_references(&mut self) {
        let mut inline = Vec::new();
        for table in self.tables.values() {
            for col in &table.columns {
                let Some(target) = &col.reference else {
                    continue;
                };
                if self.has_relation(&table.name, &col.name) {
                    continue;
                }
                inline.push(Relation {
                    id: format!("{}_{}_fk", table.name, col.name),
                    from_table: table.name.clone(),
                    from_column: col.name.clone(),
                    to_table: target.table.clone(),
                    to_column: target.column.clone(),
                    on_delete: target.on_delete,
                });
            }
        }
        self.relations.extend(inline);
    }

    /// Fill `references_to` / `referenced_by` from the relations.
    fn link_tables(&mut self) {
        for rel in &self.relations {
            if let Some(from) = self.tables.get_mut(&rel.from_table) {
                from.references_to.insert(rel.to_table.clone());
            }
            if let Some(to) = self.tables.get_mut(&rel.to_table) {
                to.referenced_by.insert(rel.from_table.clone());
            }
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }

    /// Every warning: per table in table order, then schema-wide ones.
    pub fn all_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.tables
            .values()
            .flat_map(|t| t.warnings.iter())
            .chain(self.warnings.iter())
    }
}
