//! Report compilation through the public compiler entry point.

use scry::descriptor::{Filters, Intent, QueryDescriptor};
use scry::roles::Role;
use scry::{render, sql, QueryCompiler};

fn report(entities: &[&str]) -> QueryDescriptor {
    QueryDescriptor::new(Intent::Report).with_entities(entities)
}

#[test]
fn test_report_defaults_to_label_listing() {
    let compiler = QueryCompiler::builtin();
    let compiled = compiler.compile(&report(&["projects"]), Role::Admin, None);
    assert!(compiled.sql_template.starts_with("SELECT\n    p.project_name\n"));
    assert!(compiled.sql_template.contains("ORDER BY p.project_created DESC"));
    assert!(compiled.sql_template.contains("LIMIT 100"));
    assert!(compiled.parameters.is_empty());
}

#[test]
fn test_missing_entity_falls_back_to_default() {
    let compiler = QueryCompiler::builtin();
    for descriptor in [report(&[]), report(&["warehouses"])] {
        let compiled = compiler.compile(&descriptor, Role::Admin, None);
        assert!(
            compiled.sql_template.contains("FROM projects p"),
            "expected the default entity, got:\n{}",
            compiled.sql_template
        );
    }
}

#[test]
fn test_requested_columns_resolve_and_drop_identifiers() {
    let compiler = QueryCompiler::builtin();
    let d = report(&["projects"]).with_requested_columns(&["name", "status", "id", "manager"]);
    let compiled = compiler.compile(&d, Role::Admin, None);
    let sql = &compiled.sql_template;
    assert!(sql.contains("p.project_name"));
    assert!(sql.contains("p.project_status"));
    assert!(!sql.contains("p.project_id,"), "id columns belong out of reports");
    assert!(!sql.contains("project_manager"));
}

#[test]
fn test_identifier_only_request_falls_back_to_label() {
    let compiler = QueryCompiler::builtin();
    let d = report(&["tasks"]).with_requested_columns(&["id", "responsible"]);
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("t.task_name"));
    assert!(!compiled.sql_template.contains("t.task_id"));
}

#[test]
fn test_status_filter_stays_out_of_the_template() {
    let compiler = QueryCompiler::builtin();
    let d = report(&["projects"]).with_filters(Filters {
        status: Some("active".into()),
        ..Filters::default()
    });
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("p.project_status = :status"));
    assert!(
        !compiled.sql_template.contains("active"),
        "filter value leaked into the template"
    );
    assert!(compiled.parameters.get("status").is_some());

    let rendered = render::render(&compiled).expect("template and parameters should agree");
    assert!(rendered.contains("p.project_status = 'active'"));
    sql::ensure_select(&rendered).expect("rendered report should be a single SELECT");
}

#[test]
fn test_full_injection_order_survives_rendering() {
    let compiler = QueryCompiler::builtin();
    let d = report(&["projects"])
        .with_filters(Filters {
            status: Some("active".into()),
            ..Filters::default()
        })
        .personalized();
    let compiled = compiler.compile(&d, Role::Viewer, Some("u-42"));
    let template = &compiled.sql_template;

    let status = template.find("p.project_status = :status").unwrap();
    let mine = template.find("p.project_manager = :user_id").unwrap();
    let rbac = template.find("p.project_status != 'cancelled'").unwrap();
    assert!(status < mine && mine < rbac, "injection order drifted:\n{template}");

    let rendered = render::render(&compiled).unwrap();
    assert!(rendered.contains("p.project_manager = 'u-42'"));
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_view_reports_sort_by_redirected_column() {
    let compiler = QueryCompiler::builtin();
    let compiled = compiler.compile(&report(&["view_employee_workloads"]), Role::Admin, None);
    assert!(compiled.sql_template.contains("FROM view_employee_workloads w"));
    assert!(compiled.sql_template.contains("ORDER BY w.loading_start DESC"));
}

#[test]
fn test_comma_separated_statuses_expand_to_parameter_list() {
    let compiler = QueryCompiler::builtin();
    let d = report(&["tasks"]).with_filters(Filters {
        status: Some("active, paused".into()),
        ..Filters::default()
    });
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled
        .sql_template
        .contains("t.task_status IN (:status_0, :status_1)"));

    let rendered = render::render(&compiled).unwrap();
    assert!(rendered.contains("t.task_status IN ('active', 'paused')"));
    sql::ensure_select(&rendered).unwrap();
}
