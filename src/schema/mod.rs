// src/schema/mod.rs
//! Entity metadata: the trusted registry the compiler resolves against.
//!
//! Every queryable logical entity (table or view) is described by an
//! [`EntitySchema`]: physical table, SQL alias, column list, declared
//! relations, column-name overrides, and default grouping/label/value
//! columns. The registry is loaded once at startup and never mutated at
//! request time; it is configuration, not user input.

pub mod columns;
pub mod inflect;
pub mod joins;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

/// A declared relation from one entity to another.
///
/// `local_key` is a column on the declaring entity, `target_key` the column
/// it matches on the target entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub name: String,
    pub target: String,
    pub local_key: String,
    pub target_key: String,
}

/// Schema metadata for one queryable logical entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    /// Logical entity name used in query descriptors.
    pub name: String,
    /// Physical table or view name.
    pub table: String,
    /// Short SQL alias, stable across all generated queries.
    pub alias: String,
    /// Physical column names, in declaration order.
    pub columns: Vec<String>,
    /// Declared relations, in declaration order (scan order matters for
    /// join resolution).
    pub relations: Vec<Relation>,
    /// Logical → physical column names for known irregular naming.
    pub overrides: HashMap<String, String>,
    /// Default grouping column for chart/comparison intents.
    pub group_by_column: String,
    /// Human-readable label column.
    pub label_column: String,
    /// Default value/identifier column.
    pub value_column: String,
}

impl EntitySchema {
    pub fn new(name: &str, table: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            alias: alias.to_string(),
            columns: Vec::new(),
            relations: Vec::new(),
            overrides: HashMap::new(),
            group_by_column: String::new(),
            label_column: String::new(),
            value_column: String::new(),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_relation(
        mut self,
        name: &str,
        target: &str,
        local_key: &str,
        target_key: &str,
    ) -> Self {
        self.relations.push(Relation {
            name: name.to_string(),
            target: target.to_string(),
            local_key: local_key.to_string(),
            target_key: target_key.to_string(),
        });
        self
    }

    pub fn with_overrides(mut self, pairs: &[(&str, &str)]) -> Self {
        for (logical, physical) in pairs {
            self.overrides
                .insert(logical.to_string(), physical.to_string());
        }
        self
    }

    pub fn with_default_columns(mut self, group_by: &str, label: &str, value: &str) -> Self {
        self.group_by_column = group_by.to_string();
        self.label_column = label.to_string();
        self.value_column = value.to_string();
        self
    }

    /// True when `column` is a declared physical column of this entity.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// First declared relation targeting `entity`, if any.
    pub fn relation_to(&self, entity: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.target == entity)
    }
}

/// The set of queryable entities, keyed by logical name.
///
/// Unknown entity names fall back to a configured default rather than
/// erroring; the compiler never rejects a descriptor for naming an entity
/// the registry has not heard of.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entities: Vec<EntitySchema>,
    index: HashMap<String, usize>,
    default_entity: String,
}

impl SchemaRegistry {
    pub fn new(default_entity: &str) -> Self {
        Self {
            entities: Vec::new(),
            index: HashMap::new(),
            default_entity: default_entity.to_string(),
        }
    }

    pub fn register(&mut self, schema: EntitySchema) {
        self.index.insert(schema.name.clone(), self.entities.len());
        self.entities.push(schema);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    /// Look up an entity, falling back to the default entity for unknown
    /// names. The fallback is logged at debug level, never an error.
    pub fn get_or_default(&self, name: &str) -> &EntitySchema {
        if let Some(schema) = self.get(name) {
            return schema;
        }
        debug!(entity = %name, default = %self.default_entity, "unknown entity, using default");
        self.get(&self.default_entity)
            .unwrap_or_else(|| &self.entities[0])
    }

    pub fn default_entity(&self) -> &str {
        &self.default_entity
    }

    /// Entity names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name.as_str())
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntitySchema> {
        self.entities.iter()
    }

    /// The built-in production registry, constructed once per process.
    pub fn builtin() -> &'static SchemaRegistry {
        static BUILTIN: Lazy<SchemaRegistry> = Lazy::new(builtin_registry);
        &BUILTIN
    }
}

// ============================================================================
// Built-in registry
// ============================================================================

/// Fresh copy of the built-in registry, open for further registration.
/// [`SchemaRegistry::builtin`] serves the shared read-only copy.
pub fn builtin_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new("projects");

    registry.register(
        EntitySchema::new("projects", "projects", "p")
            .with_columns(&[
                "project_id",
                "project_name",
                "project_status",
                "project_description",
                "project_manager",
                "project_lead_engineer",
                "project_created",
                "project_updated",
                "client_id",
                "external_id",
                "external_source",
                "stage_type",
            ])
            .with_relation("stages", "stages", "project_id", "project_id")
            .with_relation("manager", "profiles", "project_manager", "user_id")
            .with_relation("budget", "v_budgets_full", "project_id", "entity_id")
            .with_overrides(&[
                ("id", "project_id"),
                ("name", "project_name"),
                ("status", "project_status"),
                ("description", "project_description"),
                ("created_at", "project_created"),
                ("updated_at", "project_updated"),
                ("manager", "project_manager"),
                ("lead_engineer", "project_lead_engineer"),
            ])
            .with_default_columns("project_status", "project_name", "project_id"),
    );

    registry.register(
        EntitySchema::new("stages", "stages", "s")
            .with_columns(&[
                "stage_id",
                "stage_project_id",
                "stage_name",
                "stage_description",
                "stage_created",
                "stage_updated",
                "external_id",
                "external_source",
            ])
            .with_relation("project", "projects", "stage_project_id", "project_id")
            .with_relation("objects", "objects", "stage_id", "object_stage_id")
            .with_overrides(&[
                ("id", "stage_id"),
                ("name", "stage_name"),
                ("description", "stage_description"),
                ("project_id", "stage_project_id"),
                ("created_at", "stage_created"),
                ("updated_at", "stage_updated"),
            ])
            .with_default_columns("stage_project_id", "stage_name", "stage_id"),
    );

    registry.register(
        EntitySchema::new("objects", "objects", "o")
            .with_columns(&[
                "object_id",
                "object_stage_id",
                "object_name",
                "object_description",
                "object_responsible",
                "object_start_date",
                "object_end_date",
                "object_created",
                "object_updated",
                "object_project_id",
            ])
            .with_relation("stage", "stages", "object_stage_id", "stage_id")
            .with_relation("responsible", "profiles", "object_responsible", "user_id")
            .with_relation("sections", "sections", "object_id", "section_object_id")
            .with_relation("project", "projects", "object_project_id", "project_id")
            .with_overrides(&[
                ("id", "object_id"),
                ("name", "object_name"),
                ("description", "object_description"),
                ("responsible", "object_responsible"),
                ("responsible_id", "object_responsible"),
                ("stage_id", "object_stage_id"),
                ("project_id", "object_project_id"),
                ("start_date", "object_start_date"),
                ("end_date", "object_end_date"),
                ("created_at", "object_created"),
                ("updated_at", "object_updated"),
            ])
            .with_default_columns("object_responsible", "object_name", "object_id"),
    );

    registry.register(
        EntitySchema::new("sections", "sections", "sec")
            .with_columns(&[
                "section_id",
                "section_object_id",
                "section_name",
                "section_description",
                "section_responsible",
                "section_status_id",
                "section_project_id",
                "section_start_date",
                "section_end_date",
                "section_created",
                "section_updated",
            ])
            .with_relation("object", "objects", "section_object_id", "object_id")
            .with_overrides(&[
                ("id", "section_id"),
                ("name", "section_name"),
                ("description", "section_description"),
                ("responsible", "section_responsible"),
                ("responsible_id", "section_responsible"),
                ("object_id", "section_object_id"),
                ("project_id", "section_project_id"),
                ("status_id", "section_status_id"),
                ("start_date", "section_start_date"),
                ("end_date", "section_end_date"),
                ("created_at", "section_created"),
                ("updated_at", "section_updated"),
            ])
            .with_default_columns("section_status_id", "section_name", "section_id"),
    );

    registry.register(
        EntitySchema::new("profiles", "profiles", "u")
            .with_columns(&[
                "user_id",
                "email",
                "first_name",
                "last_name",
                "position_id",
                "department_id",
                "team_id",
                "created_at",
            ])
            .with_relation("assigned_tasks", "tasks", "user_id", "task_responsible")
            .with_overrides(&[("id", "user_id")])
            .with_default_columns("department_id", "first_name", "user_id"),
    );

    registry.register(
        EntitySchema::new(
            "view_employee_workloads",
            "view_employee_workloads",
            "w",
        )
        .with_columns(&[
            "user_id",
            "full_name",
            "project_name",
            "section_name",
            "loading_rate",
            "loading_start",
            "loading_finish",
        ])
        .with_overrides(&[
            // The view has no created_at or status; sort by loading_start
            // and bucket by loading_rate instead.
            ("created_at", "loading_start"),
            ("status", "loading_rate"),
            ("id", "user_id"),
            ("name", "full_name"),
        ])
        .with_default_columns("loading_rate", "full_name", "loading_rate"),
    );

    registry.register(
        EntitySchema::new("v_budgets_full", "v_budgets_full", "b")
            .with_columns(&[
                "budget_id",
                "entity_id",
                "entity_type",
                "total_amount",
                "total_spent",
                "remaining_amount",
                "spent_percentage",
            ])
            .with_overrides(&[
                ("created_at", "budget_id"),
                ("status", "entity_type"),
                ("id", "budget_id"),
                ("name", "entity_id"),
                ("spent", "total_spent"),
                ("remaining", "remaining_amount"),
            ])
            .with_default_columns("entity_type", "entity_id", "total_amount"),
    );

    registry.register(
        EntitySchema::new("view_project_dashboard", "view_project_dashboard", "pd")
            .with_columns(&["project_id", "hours_planned_total", "hours_actual_total"])
            .with_overrides(&[
                ("created_at", "project_id"),
                ("status", "project_id"),
                ("id", "project_id"),
                ("name", "project_id"),
            ])
            .with_default_columns("project_id", "project_id", "hours_planned_total"),
    );

    registry.register(
        EntitySchema::new(
            "view_planning_analytics_summary",
            "view_planning_analytics_summary",
            "pas",
        )
        .with_columns(&[
            "analytics_date",
            "projects_in_work_today",
            "avg_department_loading",
        ])
        .with_default_columns("analytics_date", "analytics_date", "projects_in_work_today"),
    );

    registry.register(
        EntitySchema::new("view_my_work_analytics", "view_my_work_analytics", "mwa")
            .with_columns(&["user_id", "week_hours", "comments_count"])
            .with_default_columns("user_id", "user_id", "week_hours"),
    );

    registry.register(
        EntitySchema::new("tasks", "tasks", "t")
            .with_columns(&[
                "task_id",
                "task_parent_section",
                "task_name",
                "task_description",
                "task_responsible",
                "task_status",
                "task_created",
                "task_updated",
                "task_start_date",
                "task_end_date",
            ])
            .with_relation("section", "sections", "task_parent_section", "section_id")
            .with_relation("responsible", "profiles", "task_responsible", "user_id")
            .with_overrides(&[
                ("id", "task_id"),
                ("name", "task_name"),
                ("description", "task_description"),
                ("responsible", "task_responsible"),
                ("responsible_id", "task_responsible"),
                ("section_id", "task_parent_section"),
                ("status", "task_status"),
                ("start_date", "task_start_date"),
                ("end_date", "task_end_date"),
                ("created_at", "task_created"),
                ("updated_at", "task_updated"),
            ])
            .with_default_columns("task_status", "task_name", "task_id"),
    );

    registry
}
