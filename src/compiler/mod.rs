// src/compiler/mod.rs
//! Descriptor-to-SQL compilation.
//!
//! One strategy per intent. Every strategy produces a [`CompiledQuery`]:
//! a SQL template holding only `:name` placeholders, plus the typed
//! parameter map those placeholders draw from. Compilation is total — an
//! under-specified descriptor degrades to a simpler query instead of
//! failing.
//!
//! All strategies share one injection pipeline, applied in a fixed order:
//! user filters, related-entity numeric filters, personalization, RBAC.

pub mod builder;
pub mod params;

pub(crate) mod filters;
pub(crate) mod rbac;

mod chart;
mod comparison;
mod complex_join;
mod generic;
mod ranking;
mod report;
mod statistics;

use tracing::debug;

use crate::descriptor::{Intent, QueryDescriptor};
use crate::roles::Role;
use crate::schema::{builtin_registry, EntitySchema, SchemaRegistry};

use self::builder::SelectBuilder;
use self::params::ParamMap;

// =============================================================================
// Compiled Query
// =============================================================================

/// Output of compilation: a placeholder template and its parameters.
///
/// The template never contains request-derived values; the renderer is the
/// only component that substitutes them.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql_template: String,
    pub parameters: ParamMap,
}

// =============================================================================
// Query Compiler
// =============================================================================

/// Compiles descriptors against a schema registry.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    registry: SchemaRegistry,
}

impl QueryCompiler {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Compiler over the built-in entity registry.
    pub fn builtin() -> Self {
        Self::new(builtin_registry())
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compile `descriptor` under `role`, personalizing for `caller_id`.
    pub fn compile(
        &self,
        descriptor: &QueryDescriptor,
        role: Role,
        caller_id: Option<&str>,
    ) -> CompiledQuery {
        debug!(
            intent = ?descriptor.intent,
            role = %role,
            entities = ?descriptor.entities,
            "compiling descriptor"
        );
        match descriptor.intent {
            Intent::Report => report::build(descriptor, &self.registry, role, caller_id),
            Intent::Chart => chart::build(descriptor, &self.registry, role, caller_id),
            Intent::Statistics => statistics::build(descriptor, &self.registry, role, caller_id),
            Intent::Comparison => comparison::build(descriptor, &self.registry, role, caller_id),
            Intent::ComplexJoin => complex_join::build(descriptor, &self.registry, role, caller_id),
            Intent::Ranking => ranking::build(descriptor, &self.registry, role, caller_id),
            Intent::Generic => generic::build(descriptor, &self.registry, role, caller_id),
        }
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Primary entity of the descriptor, falling back to the registry default.
fn primary_entity<'a>(
    registry: &'a SchemaRegistry,
    descriptor: &QueryDescriptor,
) -> &'a EntitySchema {
    match descriptor.primary_entity() {
        Some(name) => registry.get_or_default(name),
        None => registry.get_or_default(registry.default_entity()),
    }
}

/// The uniform injection pipeline: user filters, related numeric filters,
/// personalization, then RBAC. Order matters only for readability of the
/// emitted WHERE clause; predicates are AND-combined.
fn inject(
    query: SelectBuilder,
    params: &mut ParamMap,
    descriptor: &QueryDescriptor,
    registry: &SchemaRegistry,
    entity: &EntitySchema,
    role: Role,
    caller_id: Option<&str>,
) -> SelectBuilder {
    let query = filters::apply_user_filters(query, params, &descriptor.filters, entity);
    let query = filters::apply_related_filters(
        query,
        params,
        &descriptor.filters,
        registry,
        &descriptor.entities,
    );
    let query = match caller_id {
        Some(caller) if descriptor.personalized => {
            filters::apply_personalization(query, params, entity, caller)
        }
        _ => query,
    };
    rbac::apply_rbac(query, params, entity, role, caller_id)
}
