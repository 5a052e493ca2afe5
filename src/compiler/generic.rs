// src/compiler/generic.rs
//! Generic strategy: the fallback listing for unclassified intents.

use super::builder::SelectBuilder;
use super::params::ParamMap;
use super::CompiledQuery;
use crate::descriptor::QueryDescriptor;
use crate::roles::Role;
use crate::schema::{columns, SchemaRegistry};

const ROW_CAP: u32 = 50;

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;
    let mut params = ParamMap::new();

    let query = SelectBuilder::new(&entity.table, alias)
        .select_all(entity.columns.iter().map(|col| format!("{alias}.{col}")));
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
