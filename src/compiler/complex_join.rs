// src/compiler/complex_join.rs
//! Complex-join strategy: one primary entity joined to the rest.
//!
//! Join flavor tracks the descriptor flags: INNER when every entity must
//! match, LEFT otherwise, LEFT plus an IS NULL probe for "without" queries
//! (anti-join). Relateds that cannot be joined are skipped rather than
//! guessed at.

use tracing::debug;

use super::builder::{JoinKind, SelectBuilder};
use super::params::ParamMap;
use super::{filters, rbac, report, CompiledQuery};
use crate::descriptor::QueryDescriptor;
use crate::roles::Role;
use crate::schema::{columns, joins, SchemaRegistry};

const ROW_CAP: u32 = 100;

pub(crate) fn build(
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    role: Role,
    caller_id: Option<&str>,
) -> CompiledQuery {
    if descriptor.entities.len() < 2 {
        debug!("complex join needs two entities, compiling as report");
        return report::build(descriptor, registry, role, caller_id);
    }

    let entity = registry.get_or_default(&descriptor.entities[0]);
    let alias = &entity.alias;
    let mut params = ParamMap::new();

    // Requested columns: the primary keeps what it owns, the rest go to the
    // first joined entity that owns them, unknown names stay on the primary.
    let mut selected: Vec<String> = Vec::new();
    for logical in &descriptor.requested_columns {
        let primary_resolved = columns::resolve(entity, logical);
        if entity.has_column(&primary_resolved) {
            selected.push(format!("{alias}.{primary_resolved}"));
            continue;
        }
        let routed = descriptor.entities[1..].iter().find_map(|name| {
            let related = registry.get(name)?;
            let resolved = columns::resolve(related, logical);
            related
                .has_column(&resolved)
                .then(|| format!("{}.{}", related.alias, resolved))
        });
        selected.push(routed.unwrap_or_else(|| format!("{alias}.{primary_resolved}")));
    }

    let join_kind = if descriptor.exclude_related {
        JoinKind::Left
    } else if descriptor.require_all_entities {
        JoinKind::Inner
    } else {
        JoinKind::Left
    };

    let mut query = SelectBuilder::new(&entity.table, alias).select_all(selected);
    for related_name in &descriptor.entities[1..] {
        let Some(related) = registry.get(related_name) else {
            debug!(entity = %related_name, "skipping unknown related entity");
            continue;
        };
        let Some(condition) =
            joins::resolve(registry, &entity.name, alias, &related.name, &related.alias)
        else {
            debug!(
                primary = %entity.name,
                related = %related.name,
                "no join path between entities, skipping"
            );
            continue;
        };
        query = query.join(join_kind, &related.table, &related.alias, &condition);
    }

    if descriptor.exclude_related {
        // Anti-join: constrain the related side, then keep only primary rows
        // with no partner. Both steps need the related alias in the statement.
        if let Some(related) = registry.get(&descriptor.entities[1]) {
            if query.references_alias(&related.alias) {
                query =
                    filters::apply_user_filters(query, &mut params, &descriptor.filters, related);
                let related_id = columns::resolve(related, "id");
                query = query.filter(format!("{}.{related_id} IS NULL", related.alias));
            }
        }
        if let Some(caller) = caller_id {
            if descriptor.personalized {
                query = filters::apply_personalization(query, &mut params, entity, caller);
            }
        }
        query = rbac::apply_rbac(query, &mut params, entity, role, caller_id);
    } else {
        query = super::inject(query, &mut params, descriptor, registry, entity, role, caller_id);
    }

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
