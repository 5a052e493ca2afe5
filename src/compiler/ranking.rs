// src/compiler/ranking.rs
//! Ranking strategy: top-N grouped aggregates.
//!
//! Counts, summed budgets, budget overruns or summed hours, grouped by a
//! display entity (typically people). Metrics that need a table the join
//! did not bring in degrade to a plain count instead of referencing a
//! missing alias.

use tracing::{debug, warn};

use super::builder::{JoinKind, SelectBuilder};
use super::filters::{BUDGET_ENTITY, HOURS_ENTITY};
use super::params::ParamMap;
use super::{report, CompiledQuery};
use crate::descriptor::{QueryDescriptor, SortDir};
use crate::roles::Role;
use crate::schema::{columns, joins, SchemaRegistry};

/// Display entity used when grouping people-style rankings.
const PEOPLE_ENTITY: &str = "profiles";

const DEFAULT_TOP_N: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    Count,
    Budget,
    Overrun,
    Hours,
}

impl Metric {
    fn output_alias(self) -> &'static str {
        match self {
            Metric::Count => "count",
            Metric::Budget => "total_budget",
            Metric::Overrun => "overrun",
            Metric::Hours => "total_hours",
        }
    }
}

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    let entity = super::primary_entity(registry, descriptor);
    let alias = &entity.alias;

    let group = match descriptor.group_by_entity.as_deref() {
        Some(name) => match registry.get(name) {
            Some(schema) => schema,
            None => {
                warn!(group = %name, "unknown grouping entity, compiling as report");
                return report::build(descriptor, registry, role, caller_id);
            }
        },
        None => entity,
    };
    let grouped_elsewhere = group.name != entity.name;

    // The display entity must be reachable from the primary; otherwise the
    // ranking has nothing meaningful to group by.
    let group_join = if grouped_elsewhere {
        let condition = joins::resolve(registry, &entity.name, alias, &group.name, &group.alias)
            .or_else(|| {
                joins::resolve(registry, &group.name, &group.alias, &entity.name, alias)
            });
        match condition {
            Some(condition) => Some(condition),
            None => {
                warn!(
                    primary = %entity.name,
                    group = %group.name,
                    "no join path to grouping entity, compiling as report"
                );
                return report::build(descriptor, registry, role, caller_id);
            }
        }
    } else {
        None
    };

    let mut params = ParamMap::new();
    let mut query = SelectBuilder::new(&entity.table, alias);

    // Secondary metric entity, joined tight so missing figures drop the row.
    if let Some(related) = descriptor.entities.get(1).and_then(|n| registry.get(n)) {
        match joins::resolve(registry, &entity.name, alias, &related.name, &related.alias) {
            Some(condition) => {
                query = query.join(JoinKind::Inner, &related.table, &related.alias, &condition);
            }
            None => debug!(
                primary = %entity.name,
                related = %related.name,
                "no join path to metric entity, skipping"
            ),
        }
    }
    if let Some(condition) = &group_join {
        query = query.join(JoinKind::Inner, &group.table, &group.alias, condition);
    }

    let budget_alias = registry.get(BUDGET_ENTITY).map(|e| e.alias.clone());
    let hours_alias = registry.get(HOURS_ENTITY).map(|e| e.alias.clone());
    let has_budget = budget_alias
        .as_deref()
        .is_some_and(|a| query.references_alias(a));
    let has_hours = hours_alias
        .as_deref()
        .is_some_and(|a| query.references_alias(a));

    let metric = match descriptor.order_by.as_deref().unwrap_or("count") {
        "budget" | "total_amount" if has_budget => Metric::Budget,
        "spent" | "total_spent" if has_budget => Metric::Overrun,
        "hours" if has_hours => Metric::Hours,
        _ => Metric::Count,
    };

    // Display columns and their GROUP BY keys.
    let group_alias = &group.alias;
    let group_by_cols: Vec<String>;
    if group.name == PEOPLE_ENTITY {
        query = query
            .select(format!("{group_alias}.first_name"))
            .select(format!("{group_alias}.last_name"));
        group_by_cols = vec![
            format!("{group_alias}.user_id"),
            format!("{group_alias}.first_name"),
            format!("{group_alias}.last_name"),
        ];
    } else {
        let name_col = columns::resolve(group, "name");
        let id_col = columns::resolve(group, "id");
        query = query.select(format!("{group_alias}.{name_col}"));
        group_by_cols = vec![
            format!("{group_alias}.{id_col}"),
            format!("{group_alias}.{name_col}"),
        ];
    }

    match metric {
        Metric::Count => {
            query = query.select(format!("COUNT({alias}.*) AS count"));
        }
        Metric::Budget => {
            let b = budget_alias.as_deref().unwrap_or_default();
            query = query.select(format!("SUM({b}.total_amount) AS total_budget"));
        }
        Metric::Overrun => {
            let b = budget_alias.as_deref().unwrap_or_default();
            query = query
                .select(format!("SUM({b}.total_spent - {b}.total_amount) AS overrun"))
                .select(format!("SUM({b}.total_spent) AS total_spent"))
                .select(format!("SUM({b}.total_amount) AS total_budget"));
        }
        Metric::Hours => {
            let pd = hours_alias.as_deref().unwrap_or_default();
            query = query.select(format!("SUM({pd}.hours_actual_total) AS total_hours"));
        }
    }

    query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);

    for col in group_by_cols {
        query = query.group_by(col);
    }
    if metric == Metric::Overrun {
        let b = budget_alias.as_deref().unwrap_or_default();
        query = query.having(format!("SUM({b}.total_spent - {b}.total_amount) > 0"));
    }

    let direction = descriptor
        .order_direction
        .unwrap_or(SortDir::Desc)
        .as_sql();
    let sql = query
        .order_by(format!("{} {direction}", metric.output_alias()))
        .limit(descriptor.limit.unwrap_or(DEFAULT_TOP_N))
        .into_template();

    CompiledQuery {
        sql_template: sql,
        parameters: params,
    }
}
