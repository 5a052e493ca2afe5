// src/compiler/report.rs
//! Report strategy: row-level listings of one entity.

use super::builder::SelectBuilder;
use super::params::ParamMap;
use super::CompiledQuery;
use crate::descriptor::QueryDescriptor;
use crate::roles::Role;
use crate::schema::{columns, SchemaRegistry};

const ROW_CAP: u32 = 100;

/// Identifier and assignment keys are never useful in a human-facing
/// report; they are dropped even when explicitly requested.
fn is_identifier_column(column: &str) -> bool {
    column == "id"
        || column.ends_with("_id")
        || column == "responsible"
        || column.ends_with("_responsible")
        || column == "manager"
        || column.ends_with("_manager")
}

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;
    let mut params = ParamMap::new();

    let mut selected: Vec<String> = descriptor
        .requested_columns
        .iter()
        .map(|logical| columns::resolve(entity, logical))
        .filter(|resolved| !is_identifier_column(resolved))
        .map(|resolved| format!("{alias}.{resolved}"))
        .collect();
    if selected.is_empty() {
        let label = columns::resolve(entity, "name");
        selected.push(format!("{alias}.{label}"));
    }

    let query = SelectBuilder::new(&entity.table, alias).select_all(selected);
    let query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);

    let created = columns::resolve(entity, "created_at");
    let sql = query
        .order_by(format!("{alias}.{created} DESC"))
        .limit(ROW_CAP)
        .into_template();

    CompiledQuery {
        sql_template: sql,
        parameters: params,
    }
}
