// src/compiler/chart.rs
//! Chart strategy: label/value pairs for visualization.
//!
//! Three shapes. `radialBar` lists individual rows with a 0-100 score,
//! `radar` averages that score per label, everything else buckets rows by
//! the entity's grouping column and counts them.

use super::builder::SelectBuilder;
use super::params::ParamMap;
use super::CompiledQuery;
use crate::descriptor::{ChartKind, QueryDescriptor};
use crate::roles::Role;
use crate::schema::{columns, EntitySchema, SchemaRegistry};

/// Entities whose rows carry a meaningful per-item completion score.
const PROGRESS_CHART_ENTITIES: &[&str] = &["stages", "objects", "sections"];

const ITEM_CAP: u32 = 10;
const BUCKET_CAP: u32 = 20;

/// 0-100 completion score derived from the status column, for entities
/// without a stored progress figure.
fn status_score(alias: &str, status_col: &str) -> String {
    format!(
        "CASE WHEN {alias}.{status_col} = 'completed' THEN 100 \
         WHEN {alias}.{status_col} = 'active' THEN 50 ELSE 0 END"
    )
}

fn wants_progress_items(descriptor: &QueryDescriptor, entity: &EntitySchema) -> bool {
    descriptor.metrics.iter().any(|m| m == "progress")
        || PROGRESS_CHART_ENTITIES.contains(&entity.name.as_str())
}

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;
    let name_col = columns::resolve(entity, "name");
    let mut params = ParamMap::new();

    if descriptor.chart_type == Some(ChartKind::RadialBar)
        && wants_progress_items(descriptor, entity)
    {
        let query = SelectBuilder::new(&entity.table, alias);
        let query = if entity.has_column("progress") {
            query
                .select(format!("{alias}.{name_col} AS label"))
                .select(format!("COALESCE({alias}.progress, 0) AS value"))
        } else {
            let status_col = columns::resolve(entity, "status");
            query
                .select(format!(
                    "{alias}.{name_col} || ' (' || {alias}.{status_col} || ')' AS label"
                ))
                .select(format!("{} AS value", status_score(alias, &status_col)))
                .select(format!("{alias}.{status_col} AS status"))
        };
        let query =
            super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);
        let sql = query
            .order_by("value DESC")
            .limit(ITEM_CAP)
            .into_template();
        return CompiledQuery {
            sql_template: sql,
            parameters: params,
        };
    }

    if descriptor.chart_type == Some(ChartKind::Radar) {
        let score = if entity.has_column("progress") {
            format!("{alias}.progress")
        } else {
            let status_col = columns::resolve(entity, "status");
            status_score(alias, &status_col)
        };
        let query = SelectBuilder::new(&entity.table, alias)
            .select(format!("{alias}.{name_col} AS label"))
            .select(format!("COALESCE(AVG({score}), 0) AS value"));
        let query =
            super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);
        let sql = query
            .group_by(format!("{alias}.{name_col}"))
            .limit(ITEM_CAP)
            .into_template();
        return CompiledQuery {
            sql_template: sql,
            parameters: params,
        };
    }

    // pie, bar, line, area, and unspecified kinds: bucket and count
    let group_col = &entity.group_by_column;
    let query = SelectBuilder::new(&entity.table, alias)
        .select(format!("{alias}.{group_col} AS label"))
        .select("COUNT(*) AS value");
    let query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);
    let sql = query
        .group_by(format!("{alias}.{group_col}"))
        .order_by("value DESC")
        .limit(BUCKET_CAP)
        .into_template();
    CompiledQuery {
        sql_template: sql,
        parameters: params,
    }
}
