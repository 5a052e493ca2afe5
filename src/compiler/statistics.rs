// src/compiler/statistics.rs
//! Statistics strategy: one aggregate row over the primary entity.

use super::builder::SelectBuilder;
use super::params::ParamMap;
use super::CompiledQuery;
use crate::descriptor::QueryDescriptor;
use crate::roles::Role;
use crate::schema::{columns, SchemaRegistry};

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;
    let status_col = columns::resolve(entity, "status");
    let mut params = ParamMap::new();

    let mut query = SelectBuilder::new(&entity.table, alias)
        .select("COUNT(*) AS total_count")
        .select(format!(
            "COUNT(DISTINCT {alias}.{status_col}) AS unique_statuses"
        ));
    if entity.has_column("progress") {
        query = query
            .select(format!("AVG({alias}.progress) AS avg_progress"))
            .select(format!("MIN({alias}.progress) AS min_progress"))
            .select(format!("MAX({alias}.progress) AS max_progress"));
    }

    let query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);

    CompiledQuery {
        sql_template: query.into_template(),
        parameters: params,
    }
}
