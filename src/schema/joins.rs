// src/schema/joins.rs
//! Join predicate resolution between two entities.
//!
//! Tries an ordered chain of pure strategies and returns the first
//! predicate found. `None` means the pair is not joinable; callers must
//! fall back to a single-entity compilation path rather than emit a broken
//! join.

use super::{columns, inflect::singularize, EntitySchema, SchemaRegistry};

/// Entity representing people; the target of ownership heuristics.
const PEOPLE_ENTITY: &str = "profiles";
/// Column-name token marking an ownership foreign key.
const OWNERSHIP_TOKEN: &str = "responsible";
/// Entity storing cross-entity aggregates keyed by (entity_id, entity_type).
const POLYMORPHIC_ENTITY: &str = "v_budgets_full";
/// Entities the polymorphic aggregate rows can point back at.
const POLYMORPHIC_SOURCES: &[&str] = &["projects", "stages", "objects"];

struct JoinContext<'a> {
    primary: &'a EntitySchema,
    primary_alias: &'a str,
    related: &'a EntitySchema,
    related_alias: &'a str,
}

/// Resolve the join predicate connecting `primary` to `related`.
///
/// Strategy order, first hit wins: declared relation forward, declared
/// relation reverse, people-ownership heuristic, polymorphic aggregate
/// special case. Unknown entities resolve to `None`.
pub fn resolve(
    registry: &SchemaRegistry,
    primary: &str,
    primary_alias: &str,
    related: &str,
    related_alias: &str,
) -> Option<String> {
    let cx = JoinContext {
        primary: registry.get(primary)?,
        primary_alias,
        related: registry.get(related)?,
        related_alias,
    };

    const STRATEGIES: &[fn(&JoinContext) -> Option<String>] = &[
        declared_forward,
        declared_reverse,
        people_ownership,
        polymorphic_aggregate,
    ];
    STRATEGIES.iter().find_map(|strategy| strategy(&cx))
}

/// `primary` declares a relation targeting `related`.
fn declared_forward(cx: &JoinContext) -> Option<String> {
    let rel = cx.primary.relation_to(&cx.related.name)?;
    Some(format!(
        "{}.{} = {}.{}",
        cx.related_alias, rel.target_key, cx.primary_alias, rel.local_key
    ))
}

/// `related` declares a relation targeting `primary`.
fn declared_reverse(cx: &JoinContext) -> Option<String> {
    let rel = cx.related.relation_to(&cx.primary.name)?;
    Some(format!(
        "{}.{} = {}.{}",
        cx.primary_alias, rel.target_key, cx.related_alias, rel.local_key
    ))
}

/// The related entity is people: bind any ownership-named column of the
/// primary to the people identifier.
fn people_ownership(cx: &JoinContext) -> Option<String> {
    if cx.related.name != PEOPLE_ENTITY {
        return None;
    }
    let people_id = columns::resolve(cx.related, "id");
    cx.primary
        .columns
        .iter()
        .find(|col| col.to_lowercase().contains(OWNERSHIP_TOKEN))
        .map(|col| {
            format!(
                "{}.{} = {}.{}",
                cx.related_alias, people_id, cx.primary_alias, col
            )
        })
}

/// The related entity stores polymorphic aggregates: match on entity_id and
/// assert the literal entity_type discriminator (the primary's singular
/// name).
fn polymorphic_aggregate(cx: &JoinContext) -> Option<String> {
    if cx.related.name != POLYMORPHIC_ENTITY
        || !POLYMORPHIC_SOURCES.contains(&cx.primary.name.as_str())
    {
        return None;
    }
    let primary_id = columns::resolve(cx.primary, "id");
    Some(format!(
        "{}.entity_id = {}.{} AND {}.entity_type = '{}'",
        cx.related_alias,
        cx.primary_alias,
        primary_id,
        cx.related_alias,
        singularize(&cx.primary.name)
    ))
}
