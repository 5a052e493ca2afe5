//! Placeholder substitution and the SELECT-only gate, end to end.

use scry::compiler::params::{ParamMap, ParamValue};
use scry::compiler::CompiledQuery;
use scry::descriptor::{Filters, Intent, QueryDescriptor};
use scry::render::{render, render_template, RenderError};
use scry::roles::Role;
use scry::{sql, QueryCompiler};

fn params(entries: &[(&str, ParamValue)]) -> ParamMap {
    let mut map = ParamMap::new();
    for (name, value) in entries {
        map.insert(name, value.clone());
    }
    map
}

#[test]
fn test_each_value_type_renders_as_a_literal() {
    let map = params(&[
        ("status", ParamValue::Str("active".into())),
        ("count", ParamValue::Int(7)),
        ("ratio", ParamValue::Float(2.5)),
        ("archived", ParamValue::Bool(false)),
        ("parent", ParamValue::Null),
    ]);
    let rendered = render_template(
        "SELECT 1 WHERE a = :status AND b = :count AND c = :ratio \
         AND d = :archived AND e IS NOT DISTINCT FROM :parent",
        &map,
    )
    .unwrap();
    assert_eq!(
        rendered,
        "SELECT 1 WHERE a = 'active' AND b = 7 AND c = 2.5 \
         AND d = FALSE AND e IS NOT DISTINCT FROM NULL"
    );
}

#[test]
fn test_apostrophes_double_inside_string_literals() {
    let map = params(&[("name", ParamValue::Str("O'Brien".into()))]);
    let rendered = render_template(
        "SELECT u.user_id FROM profiles u WHERE u.last_name = :name",
        &map,
    )
    .unwrap();
    assert!(rendered.contains("u.last_name = 'O''Brien'"));
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_injection_payload_stays_one_literal() {
    let payload = "x'; DROP TABLE projects; --";
    let map = params(&[("name", ParamValue::Str(payload.into()))]);
    let rendered = render_template(
        "SELECT p.project_id FROM projects p WHERE p.project_name = :name",
        &map,
    )
    .unwrap();
    assert!(rendered.contains("'x''; DROP TABLE projects; --'"));
    // Still exactly one SELECT statement; the payload never escapes its
    // quotes.
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_cast_operator_is_not_a_placeholder() {
    let map = params(&[("tag", ParamValue::Str("infra".into()))]);
    let rendered = render_template(
        "SELECT meta::jsonb FROM projects p WHERE p.external_id = :tag::text",
        &map,
    )
    .unwrap();
    assert_eq!(
        rendered,
        "SELECT meta::jsonb FROM projects p WHERE p.external_id = 'infra'::text"
    );
}

#[test]
fn test_substituted_values_are_never_rescanned() {
    let map = params(&[
        ("a", ParamValue::Str(":b".into())),
        ("b", ParamValue::Int(1)),
    ]);
    let rendered = render_template("SELECT 1 WHERE x = :a AND y = :b", &map).unwrap();
    assert_eq!(rendered, "SELECT 1 WHERE x = ':b' AND y = 1");
}

#[test]
fn test_unknown_placeholder_is_an_error() {
    let compiled = CompiledQuery {
        sql_template: "SELECT 1 WHERE x = :ghost".to_string(),
        parameters: ParamMap::new(),
    };
    let err = render(&compiled).unwrap_err();
    assert_eq!(err, RenderError::UnknownPlaceholder { name: "ghost".into() });
}

#[test]
fn test_unused_parameter_is_an_error() {
    let compiled = CompiledQuery {
        sql_template: "SELECT 1".to_string(),
        parameters: params(&[("status", ParamValue::Str("active".into()))]),
    };
    let err = render(&compiled).unwrap_err();
    assert_eq!(err, RenderError::UnusedParameter { name: "status".into() });
}

#[test]
fn test_compiled_queries_round_trip_through_the_gate() {
    let compiler = QueryCompiler::builtin();
    let d = QueryDescriptor::new(Intent::Report)
        .with_entities(&["projects"])
        .with_filters(Filters {
            status: Some("it's active".into()),
            min_budget: Some(10_000.0),
            ..Filters::default()
        });
    let compiled = compiler.compile(&d, Role::Viewer, None);
    let rendered = render(&compiled).unwrap();
    assert!(rendered.contains("'it''s active'"));
    sql::ensure_select(&rendered).unwrap();
}

#[test]
fn test_gate_rejects_everything_but_a_single_select() {
    let err = sql::ensure_select("DELETE FROM projects").unwrap_err();
    assert!(matches!(err, sql::SqlError::NotSelect { ref kind } if kind == "DELETE"));

    let err = sql::ensure_select("SELECT 1; DROP TABLE projects").unwrap_err();
    assert!(matches!(err, sql::SqlError::StatementCount(2)));

    assert!(matches!(
        sql::ensure_select("SELEC * FORM projects"),
        Err(sql::SqlError::Parse(_))
    ));

    sql::ensure_select("SELECT p.project_name FROM projects p LIMIT 5").unwrap();
}
