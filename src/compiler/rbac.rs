// src/compiler/rbac.rs
//! Role-based row filtering.
//!
//! Predicates are compiled per role from a closed policy table; the status
//! literals below are policy constants, not request input. Caller identity
//! always travels as the `rbac_user_id` parameter so the renderer can escape
//! it like any other value.

use super::builder::SelectBuilder;
use super::params::{placeholder, ParamMap};
use crate::roles::Role;
use crate::schema::columns;
use crate::schema::EntitySchema;

/// Append the role's row restriction for `entity`.
///
/// Guests see only active/completed rows and no profile rows at all.
/// Viewers lose cancelled rows. Engineers are narrowed to work assigned to
/// them, walking up from objects through stages to projects. Managers and
/// admins pass through unrestricted.
pub(crate) fn apply_rbac(
    mut query: SelectBuilder,
    params: &mut ParamMap,
    entity: &EntitySchema,
    role: Role,
    caller_id: Option<&str>,
) -> SelectBuilder {
    let alias = &entity.alias;
    let status_col = columns::resolve(entity, "status");

    let predicate = match role {
        Role::Guest => {
            if entity.name == "profiles" {
                Some("1 = 0".to_string())
            } else {
                Some(format!(
                    "{alias}.{status_col} IN ('active', 'completed')"
                ))
            }
        }
        Role::Viewer => Some(format!("{alias}.{status_col} != 'cancelled'")),
        Role::Engineer => caller_id.and_then(|caller| {
            let slot = placeholder("rbac_user_id");
            let predicate = match entity.name.as_str() {
                "objects" => {
                    let responsible_col = columns::resolve(entity, "responsible");
                    Some(format!("{alias}.{responsible_col} = {slot}"))
                }
                "stages" => Some(format!(
                    "EXISTS (SELECT 1 FROM objects o WHERE o.object_stage_id = {alias}.stage_id \
                     AND o.object_responsible = {slot})"
                )),
                "projects" => Some(format!(
                    "EXISTS (SELECT 1 FROM stages s \
                     INNER JOIN objects o ON o.object_stage_id = s.stage_id \
                     WHERE s.stage_project_id = {alias}.project_id \
                     AND o.object_responsible = {slot})"
                )),
                _ => None,
            };
            if predicate.is_some() {
                params.insert("rbac_user_id", caller);
            }
            predicate
        }),
        Role::Manager | Role::Admin => None,
    };

    if let Some(predicate) = predicate {
        query = query.filter(predicate);
    }
    query
}
