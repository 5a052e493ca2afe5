// src/compiler/filters.rs
//! User filter and personalization predicates.
//!
//! Every value flows through the parameter map; predicates only ever carry
//! `:name` placeholders. Interval literals are derived from the closed
//! [`DateRange`] enum, never from request text.

use tracing::debug;

use super::builder::SelectBuilder;
use super::params::{placeholder, ParamMap};
use crate::descriptor::Filters;
use crate::schema::columns;
use crate::schema::{EntitySchema, SchemaRegistry};

/// Entity holding budget figures for numeric range filters.
pub(crate) const BUDGET_ENTITY: &str = "v_budgets_full";
/// Entity holding hour totals for numeric range filters.
pub(crate) const HOURS_ENTITY: &str = "view_project_dashboard";
/// Entities whose rows carry a progress figure worth range-filtering.
const PROGRESS_ENTITIES: &[&str] = &["objects", "stages", "sections"];

// =============================================================================
// User Filters
// =============================================================================

/// Apply status, date-range and project filters against `entity`.
pub(crate) fn apply_user_filters(
    mut query: SelectBuilder,
    params: &mut ParamMap,
    filters: &Filters,
    entity: &EntitySchema,
) -> SelectBuilder {
    let alias = &entity.alias;
    let status_col = columns::resolve(entity, "status");
    let created_col = columns::resolve(entity, "created_at");

    if let Some(status) = filters.status.as_deref() {
        if status.contains(',') {
            let statuses: Vec<&str> = status
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let slots: Vec<String> = (0..statuses.len())
                .map(|i| placeholder(&format!("status_{i}")))
                .collect();
            query = query.filter(format!(
                "{alias}.{status_col} IN ({})",
                slots.join(", ")
            ));
            for (i, value) in statuses.iter().enumerate() {
                params.insert(&format!("status_{i}"), *value);
            }
        } else {
            query = query.filter(format!(
                "{alias}.{status_col} = {}",
                placeholder("status")
            ));
            params.insert("status", status);
        }
    }

    if let Some(range) = filters.date_range {
        query = query.filter(format!(
            "{alias}.{created_col} >= NOW() - INTERVAL '{} days'",
            range.interval_days()
        ));
    }

    // Direct project scoping, only for entities that expose the raw key.
    if let Some(project_id) = filters.project_id.as_deref() {
        if entity.has_column("project_id") {
            query = query.filter(format!(
                "{alias}.project_id = {}",
                placeholder("project_id")
            ));
            params.insert("project_id", project_id);
        }
    }

    query
}

// =============================================================================
// Related-Entity Numeric Filters
// =============================================================================

/// Apply budget, hours and progress range filters.
///
/// Budget and hour predicates bind to the owning entity's alias and are
/// skipped unless that alias already participates in the statement, so a
/// filter never references a table the strategy did not bring in.
pub(crate) fn apply_related_filters(
    mut query: SelectBuilder,
    params: &mut ParamMap,
    filters: &Filters,
    registry: &SchemaRegistry,
    entities: &[String],
) -> SelectBuilder {
    if let Some(budget) = registry.get(BUDGET_ENTITY) {
        if query.references_alias(&budget.alias) {
            if let Some(min) = filters.min_budget {
                query = query.filter(format!(
                    "{}.total_amount >= {}",
                    budget.alias,
                    placeholder("min_budget")
                ));
                params.insert("min_budget", min);
            }
            if let Some(max) = filters.max_budget {
                query = query.filter(format!(
                    "{}.total_amount <= {}",
                    budget.alias,
                    placeholder("max_budget")
                ));
                params.insert("max_budget", max);
            }
        }
    }

    if let Some(dashboard) = registry.get(HOURS_ENTITY) {
        if query.references_alias(&dashboard.alias) {
            if let Some(min) = filters.min_hours {
                query = query.filter(format!(
                    "{}.hours_actual_total >= {}",
                    dashboard.alias,
                    placeholder("min_hours")
                ));
                params.insert("min_hours", min);
            }
            if let Some(max) = filters.max_hours {
                query = query.filter(format!(
                    "{}.hours_actual_total <= {}",
                    dashboard.alias,
                    placeholder("max_hours")
                ));
                params.insert("max_hours", max);
            }
        }
    }

    // Progress ranges bind to the primary entity when it tracks progress.
    let primary = entities
        .first()
        .and_then(|name| registry.get(name))
        .filter(|e| PROGRESS_ENTITIES.contains(&e.name.as_str()));
    if let Some(primary) = primary {
        let progress_col = columns::resolve(primary, "progress");
        if let Some(min) = filters.min_progress {
            query = query.filter(format!(
                "{}.{progress_col} >= {}",
                primary.alias,
                placeholder("min_progress")
            ));
            params.insert("min_progress", min);
        }
        if let Some(max) = filters.max_progress {
            query = query.filter(format!(
                "{}.{progress_col} <= {}",
                primary.alias,
                placeholder("max_progress")
            ));
            params.insert("max_progress", max);
        }
    }

    query
}

// =============================================================================
// Personalization
// =============================================================================

/// Restrict rows to those owned by the caller ("my projects", "my tasks").
///
/// Ownership is expressed differently per entity: projects go through the
/// manager column, work items through their responsible column, stages
/// through the objects that sit on them. Entities with no ownership notion
/// pass through untouched.
pub(crate) fn apply_personalization(
    mut query: SelectBuilder,
    params: &mut ParamMap,
    entity: &EntitySchema,
    caller_id: &str,
) -> SelectBuilder {
    let alias = &entity.alias;
    let slot = placeholder("user_id");

    let predicate = match entity.name.as_str() {
        "projects" => {
            let manager_col = columns::resolve(entity, "manager");
            Some(format!("{alias}.{manager_col} = {slot}"))
        }
        "objects" | "sections" | "tasks" => {
            let responsible_col = columns::resolve(entity, "responsible");
            Some(format!("{alias}.{responsible_col} = {slot}"))
        }
        "stages" => Some(format!(
            "EXISTS (SELECT 1 FROM objects o WHERE o.object_stage_id = {alias}.stage_id \
             AND o.object_responsible = {slot})"
        )),
        _ => {
            debug!(entity = %entity.name, "no personalization rule for entity");
            None
        }
    };

    if let Some(predicate) = predicate {
        query = query.filter(predicate);
        params.insert("user_id", caller_id);
    }
    query
}
