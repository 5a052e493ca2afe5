// src/schema/columns.rs
//! Logical → physical column resolution.
//!
//! Descriptors speak a logical vocabulary ("status", "created_at", "id",
//! "name"); each entity stores those under its own physical names. The
//! resolver tries an ordered chain of pure strategies and always returns a
//! string — an unresolvable name passes through unchanged so the database
//! rejects it loudly instead of the compiler guessing silently.

use super::EntitySchema;
use super::inflect::singularize;

/// Resolve a logical column name against an entity's schema.
///
/// Strategy order, first hit wins:
/// 1. entity override table (known irregular naming),
/// 2. direct membership in the declared column list,
/// 3. `<singular entity>_<logical>` prefix guess, if that is a member,
/// 4. identity fallback.
pub fn resolve(entity: &EntitySchema, logical: &str) -> String {
    override_hit(entity, logical)
        .or_else(|| direct_member(entity, logical))
        .or_else(|| prefixed_guess(entity, logical))
        .unwrap_or_else(|| logical.to_string())
}

fn override_hit(entity: &EntitySchema, logical: &str) -> Option<String> {
    entity.overrides.get(logical).cloned()
}

fn direct_member(entity: &EntitySchema, logical: &str) -> Option<String> {
    entity.has_column(logical).then(|| logical.to_string())
}

fn prefixed_guess(entity: &EntitySchema, logical: &str) -> Option<String> {
    let prefixed = format!("{}_{}", singularize(&entity.name), logical);
    entity.has_column(&prefixed).then_some(prefixed)
}
