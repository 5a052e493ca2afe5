// src/compiler/comparison.rs
//! Comparison strategy: per-category counts with a completion rate.

use super::builder::SelectBuilder;
use super::params::ParamMap;
use super::CompiledQuery;
use crate::descriptor::QueryDescriptor;
use crate::roles::Role;
use crate::schema::{columns, SchemaRegistry};

const CATEGORY_CAP: u32 = 20;

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;
    let group_col = &entity.group_by_column;
    let status_col = columns::resolve(entity, "status");
    let mut params = ParamMap::new();

    let query = SelectBuilder::new(&entity.table, alias)
        .select(format!("{alias}.{group_col} AS category"))
        .select("COUNT(*) AS count")
        .select(format!(
            "AVG(CASE WHEN {alias}.{status_col} = 'completed' THEN 1 ELSE 0 END) * 100 \
             AS completion_rate"
        ));
    let query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);
    let sql = query
        .group_by(format!("{alias}.{group_col}"))
        .order_by("count DESC")
        .limit(CATEGORY_CAP)
        .into_template();

    CompiledQuery {
        sql_template: sql,
        parameters: params,
    }
}
