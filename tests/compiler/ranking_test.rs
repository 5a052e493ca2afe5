//! Ranking compilation: top-N grouped aggregates.

use scry::descriptor::{Filters, Intent, QueryDescriptor, SortDir};
use scry::roles::Role;
use scry::schema::builtin_registry;
use scry::{render, sql, QueryCompiler};

fn ranking(entities: &[&str]) -> QueryDescriptor {
    QueryDescriptor::new(Intent::Ranking).with_entities(entities)
}

#[test]
fn test_count_ranking_groups_people() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["projects"]).with_group_by_entity("profiles");
    let compiled = compiler.compile(&d, Role::Admin, None);
    let sql = &compiled.sql_template;
    assert!(sql.contains("u.first_name"));
    assert!(sql.contains("u.last_name"));
    assert!(sql.contains("COUNT(p.*) AS count"));
    assert!(sql.contains("INNER JOIN profiles u ON u.user_id = p.project_manager"));
    assert!(sql.contains("GROUP BY u.user_id, u.first_name, u.last_name"));
    assert!(sql.contains("ORDER BY count DESC"));
    assert!(sql.contains("LIMIT 10"));
}

#[test]
fn test_overrun_ranking_joins_budgets_and_keeps_positive_rows() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["projects", "v_budgets_full"])
        .with_group_by_entity("profiles")
        .with_order("spent", SortDir::Desc)
        .with_limit(3);
    let compiled = compiler.compile(&d, Role::Admin, None);
    let template = &compiled.sql_template;
    assert!(template.contains("SUM(b.total_spent - b.total_amount) AS overrun"));
    assert!(template.contains("INNER JOIN v_budgets_full b ON b.entity_id = p.project_id"));
    assert!(template.contains("INNER JOIN profiles u ON u.user_id = p.project_manager"));
    assert!(template.contains("HAVING SUM(b.total_spent - b.total_amount) > 0"));
    assert!(template.contains("ORDER BY overrun DESC"));
    assert!(template.contains("LIMIT 3"));

    let rendered = render::render(&compiled).unwrap();
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_metric_without_its_entity_degrades_to_count() {
    let compiler = QueryCompiler::builtin();
    // "budget" ordering without the budget entity joined in.
    let d = ranking(&["projects"])
        .with_group_by_entity("profiles")
        .with_order("budget", SortDir::Desc);
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("COUNT(p.*) AS count"));
    assert!(!compiled.sql_template.contains("total_amount"));
    assert!(compiled.sql_template.contains("ORDER BY count DESC"));

    // "hours" ordering when the dashboard view cannot be reached.
    let d = ranking(&["projects", "view_project_dashboard"])
        .with_group_by_entity("profiles")
        .with_order("hours", SortDir::Desc);
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("COUNT(p.*) AS count"));
    assert!(!compiled.sql_template.contains("hours_actual_total"));
}

#[test]
fn test_hours_metric_fires_once_a_join_path_is_registered() {
    // The stock registry has no path to the dashboard view; registering one
    // on a copy is enough for the hours metric to engage.
    let mut registry = builtin_registry();
    let projects = registry
        .get("projects")
        .expect("projects should exist")
        .clone()
        .with_relation("dashboard", "view_project_dashboard", "project_id", "project_id");
    registry.register(projects);

    let compiler = QueryCompiler::new(registry);
    let d = ranking(&["projects", "view_project_dashboard"])
        .with_group_by_entity("profiles")
        .with_order("hours", SortDir::Desc);
    let compiled = compiler.compile(&d, Role::Admin, None);
    let template = &compiled.sql_template;
    assert!(template.contains("SUM(pd.hours_actual_total) AS total_hours"));
    assert!(template.contains("INNER JOIN view_project_dashboard pd ON pd.project_id = p.project_id"));
    assert!(template.contains("ORDER BY total_hours DESC"));
}

#[test]
fn test_count_ranking_with_metric_entity_still_counts() {
    // The budget entity rides along as an INNER JOIN, but the requested
    // order is count, so no budget aggregate appears.
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["projects", "v_budgets_full"])
        .with_group_by_entity("profiles")
        .with_order("count", SortDir::Desc)
        .with_limit(3)
        .with_filters(Filters {
            status: Some("active".into()),
            ..Filters::default()
        });
    let compiled = compiler.compile(&d, Role::Admin, None);
    let template = &compiled.sql_template;
    assert!(template.contains("COUNT(p.*) AS count"));
    assert!(template.contains("INNER JOIN v_budgets_full b ON b.entity_id = p.project_id"));
    assert!(template.contains("INNER JOIN profiles u ON u.user_id = p.project_manager"));
    assert!(template.contains("p.project_status = :status"));
    assert!(template.contains("GROUP BY u.user_id, u.first_name, u.last_name"));
    assert!(template.contains("ORDER BY count DESC"));
    assert!(template.contains("LIMIT 3"));
    assert!(!template.contains("HAVING"));

    let rendered = render::render(&compiled).unwrap();
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_plain_entity_grouping_uses_id_and_label() {
    let compiler = QueryCompiler::builtin();
    let compiled = compiler.compile(&ranking(&["tasks"]), Role::Admin, None);
    let sql = &compiled.sql_template;
    assert!(sql.contains("t.task_name"));
    assert!(sql.contains("GROUP BY t.task_id, t.task_name"));
    assert!(!sql.contains("INNER JOIN"));
}

#[test]
fn test_unreachable_grouping_entity_falls_back_to_report() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["v_budgets_full"]).with_group_by_entity("view_my_work_analytics");
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("LIMIT 100"), "report cap expected");
    assert!(!compiled.sql_template.contains("GROUP BY"));
}

#[test]
fn test_unknown_grouping_entity_falls_back_to_report() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["projects"]).with_group_by_entity("warehouses");
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("p.project_name"));
    assert!(!compiled.sql_template.contains("GROUP BY"));
}

#[test]
fn test_ascending_order_is_honored() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["tasks"]).with_order("count", SortDir::Asc);
    let compiled = compiler.compile(&d, Role::Admin, None);
    assert!(compiled.sql_template.contains("ORDER BY count ASC"));
}

#[test]
fn test_filters_and_rbac_restrict_rows_before_grouping() {
    let compiler = QueryCompiler::builtin();
    let d = ranking(&["projects"])
        .with_group_by_entity("profiles")
        .with_filters(Filters {
            status: Some("active".into()),
            ..Filters::default()
        });
    let compiled = compiler.compile(&d, Role::Viewer, None);
    let template = &compiled.sql_template;
    assert!(template.contains("p.project_status = :status"));
    assert!(template.contains("p.project_status != 'cancelled'"));
    let wher = template.find("WHERE").unwrap();
    let group = template.find("GROUP BY").unwrap();
    assert!(wher < group, "restrictions must precede grouping:\n{template}");

    let rendered = render::render(&compiled).unwrap();
    sql::ensure_select(&rendered).unwrap();
}
