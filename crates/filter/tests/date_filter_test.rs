#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Date filter integration tests.
//!
//! Operators, null management, invalid input and descriptions.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use sieve_filter::diagnostics::Severity;
use sieve_filter::error::InvalidFilterValue;
use sieve_filter::filter::{DateFilter, Filter};
use sieve_filter::metadata::FieldType;
use sieve_filter::naming::CamelCaseToSnakeCaseNameConverter;
use sieve_filter::query::ParameterValue;
use sieve_test_utils::{Harness, properties, recording_core, rendered};

fn filter_with(policy: Option<&str>) -> (DateFilter, Arc<sieve_test_utils::RecordingSink>) {
    let (core, sink) = recording_core(Some(properties(&[("createdAt", policy)])));
    (DateFilter::new(core), sink)
}

fn run(filter: &DateFilter, harness: &mut Harness, value: serde_json::Value) -> Option<Vec<String>> {
    let mut pass = harness.pass();
    filter
        .filter_property("createdAt", &value, &mut pass)
        .map(|predicates| rendered(&predicates))
}

// -------------------------------------------------------------------------
// Operators
// -------------------------------------------------------------------------

#[test]
fn invalid_operator_value_drops_only_that_clause() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(
        &filter,
        &mut harness,
        json!({"after": "2023-01-01", "before": "not-a-date"}),
    );

    assert_eq!(wheres, Some(vec!["o.createdAt >= :createdAt_p1".to_string()]));
    assert_eq!(
        harness.value("createdAt_p1"),
        Some(&ParameterValue::Date(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        ))
    );
    assert_eq!(
        harness.query.parameter("createdAt_p1").unwrap().ty,
        Some(FieldType::DateTime)
    );
    assert_eq!(
        sink.entries(),
        vec![(
            Severity::Notice,
            InvalidFilterValue::InvalidDate {
                field: "createdAt".to_string()
            }
        )]
    );
}

#[test]
fn operators_map_to_comparisons_in_fixed_order() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(
        &filter,
        &mut harness,
        json!({
            "strictly_after": "2023-01-01T10:00:00",
            "after": "2023-01-01",
            "strictly_before": "2024-01-01T00:00:00+02:00",
            "before": "2024-06-30"
        }),
    )
    .unwrap();

    assert_eq!(
        wheres,
        vec![
            "o.createdAt <= :createdAt_p1",
            "o.createdAt < :createdAt_p2",
            "o.createdAt >= :createdAt_p3",
            "o.createdAt > :createdAt_p4",
        ]
    );
    assert!(sink.is_empty());
    assert!(matches!(
        harness.value("createdAt_p2"),
        Some(ParameterValue::DateTimeTz(_))
    ));
    assert!(matches!(
        harness.value("createdAt_p4"),
        Some(ParameterValue::DateTime(_))
    ));
}

#[test]
fn filter_property_does_not_touch_the_where_list() {
    let (filter, _sink) = filter_with(None);
    let mut harness = Harness::dummy();

    run(&filter, &mut harness, json!({"after": "2023-01-01"}));

    assert!(harness.query.wheres().is_empty());
    assert_eq!(harness.query.parameters().len(), 1);
}

#[test]
fn null_operator_values_are_skipped_silently() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(&filter, &mut harness, json!({"after": null, "unknown": "x"}));

    assert_eq!(wheres, Some(vec![]));
    assert!(sink.is_empty());
}

#[test]
fn non_string_operator_value_is_reported() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(&filter, &mut harness, json!({"after": ["2023-01-01"]}));

    assert_eq!(wheres, Some(vec![]));
    assert_eq!(
        sink.entries()[0].1,
        InvalidFilterValue::ExpectedString {
            operator: "after".to_string()
        }
    );
    assert!(harness.query.parameters().is_empty());
}

#[test]
fn impossible_calendar_dates_are_rejected() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(&filter, &mut harness, json!({"before": "2023-02-30"}));

    assert_eq!(wheres, Some(vec![]));
    assert_eq!(sink.len(), 1);
}

#[test]
fn rejected_clauses_do_not_consume_parameter_names() {
    let (filter, _sink) = filter_with(None);
    let mut harness = Harness::dummy();

    let wheres = run(
        &filter,
        &mut harness,
        json!({"before": "garbage", "after": "2023-01-01"}),
    );

    assert_eq!(wheres, Some(vec!["o.createdAt >= :createdAt_p1".to_string()]));
}

// -------------------------------------------------------------------------
// Applicability
// -------------------------------------------------------------------------

#[test]
fn scalar_value_is_not_applicable() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::dummy();

    assert_eq!(run(&filter, &mut harness, json!("2023-01-01")), None);
    assert!(sink.is_empty());
}

#[test]
fn non_date_and_disabled_properties_are_not_applicable() {
    let (core, _sink) = recording_core(None);
    let filter = DateFilter::new(core);
    let mut harness = Harness::dummy();
    let value = json!({"after": "2023-01-01"});

    let mut pass = harness.pass();
    assert!(filter.filter_property("age", &value, &mut pass).is_none());
    assert!(filter.filter_property("missing", &value, &mut pass).is_none());
    // Nested properties must be listed explicitly.
    assert!(
        filter
            .filter_property("relatedDummy.dummyDate", &value, &mut pass)
            .is_none()
    );
    assert!(filter.filter_property("dummyDate", &value, &mut pass).is_some());
    assert!(filter.filter_property("updatedAt", &value, &mut pass).is_some());
}

#[test]
fn unlisted_property_is_not_applicable() {
    let (filter, _sink) = filter_with(None);
    let mut harness = Harness::dummy();
    let mut pass = harness.pass();

    assert!(
        filter
            .filter_property("dummyDate", &json!({"after": "2023-01-01"}), &mut pass)
            .is_none()
    );
}

#[test]
fn query_without_root_alias_is_not_applicable() {
    let (filter, sink) = filter_with(None);
    let mut harness = Harness::unaliased();

    assert_eq!(run(&filter, &mut harness, json!({"after": "2023-01-01"})), None);
    assert!(harness.query.parameters().is_empty());
    assert!(sink.is_empty());
}

#[test]
fn nested_property_is_joined() {
    let (core, _sink) = recording_core(Some(properties(&[("relatedDummy.dummyDate", None)])));
    let filter = DateFilter::new(core);
    let mut harness = Harness::dummy();

    let wheres = {
        let mut pass = harness.pass();
        filter
            .filter_property(
                "relatedDummy.dummyDate",
                &json!({"after": "2023-01-01"}),
                &mut pass,
            )
            .unwrap()
    };

    assert_eq!(
        rendered(&wheres),
        vec!["relatedDummy_a1.dummyDate >= :dummyDate_p1"]
    );
    assert_eq!(harness.query.joins().len(), 1);
    assert_eq!(harness.query.joins()[0].path, "o.relatedDummy");
}

// -------------------------------------------------------------------------
// Null management
// -------------------------------------------------------------------------

fn single(policy: &str, operator: &str) -> String {
    let (filter, _sink) = filter_with(Some(policy));
    let mut harness = Harness::dummy();
    let mut value = serde_json::Map::new();
    value.insert(operator.to_string(), json!("2023-01-01"));
    let mut wheres = run(&filter, &mut harness, value.into()).unwrap();
    assert_eq!(wheres.len(), 1);
    wheres.remove(0)
}

#[test]
fn exclude_null_checks_not_null_first() {
    assert_eq!(
        single("exclude_null", "after"),
        "(o.createdAt IS NOT NULL AND o.createdAt >= :createdAt_p1)"
    );
    assert_eq!(
        single("exclude_null", "strictly_before"),
        "(o.createdAt IS NOT NULL AND o.createdAt < :createdAt_p1)"
    );
}

#[test]
fn include_null_before() {
    assert_eq!(
        single("include_null_before", "before"),
        "(o.createdAt <= :createdAt_p1 OR o.createdAt IS NULL)"
    );
    assert_eq!(
        single("include_null_before", "strictly_before"),
        "(o.createdAt < :createdAt_p1 OR o.createdAt IS NULL)"
    );
    assert_eq!(
        single("include_null_before", "after"),
        "(o.createdAt >= :createdAt_p1 AND o.createdAt IS NOT NULL)"
    );
}

#[test]
fn include_null_after() {
    assert_eq!(
        single("include_null_after", "strictly_after"),
        "(o.createdAt > :createdAt_p1 OR o.createdAt IS NULL)"
    );
    assert_eq!(
        single("include_null_after", "before"),
        "(o.createdAt <= :createdAt_p1 AND o.createdAt IS NOT NULL)"
    );
}

#[test]
fn include_null_before_and_after() {
    for operator in ["before", "strictly_before", "after", "strictly_after"] {
        let rendered = single("include_null_before_and_after", operator);
        assert!(rendered.ends_with(" OR o.createdAt IS NULL)"), "{rendered}");
    }
}

#[test]
fn unrecognized_policy_still_excludes_null() {
    assert_eq!(
        single("sometimes_null", "after"),
        "(o.createdAt >= :createdAt_p1 AND o.createdAt IS NOT NULL)"
    );
}

#[test]
fn no_policy_keeps_the_bare_comparison() {
    let (filter, _sink) = filter_with(None);
    let mut harness = Harness::dummy();
    let wheres = run(&filter, &mut harness, json!({"before": "2023-01-01"})).unwrap();
    assert_eq!(wheres, vec!["o.createdAt <= :createdAt_p1"]);
}

#[test]
fn null_managed_fragment_renders_to_sql() {
    let (filter, _sink) = filter_with(Some("include_null_after"));
    let mut harness = Harness::dummy();
    let predicates = {
        let mut pass = harness.pass();
        filter
            .filter_property("createdAt", &json!({"after": "2023-01-01"}), &mut pass)
            .unwrap()
    };
    for predicate in predicates {
        sieve_filter::query::QueryTarget::and_where(&mut harness.query, predicate);
    }

    let sql = harness.query.to_sql().unwrap();
    sieve_test_utils::assert::contains(&sql, "\"o\".\"createdAt\" >= '2023-01-01'");
    sieve_test_utils::assert::contains(&sql, "OR \"o\".\"createdAt\" IS NULL");
}

// -------------------------------------------------------------------------
// Descriptions
// -------------------------------------------------------------------------

#[test]
fn description_covers_every_date_field_and_operator() {
    let (core, _sink) = recording_core(None);
    let description = DateFilter::new(core).description("Dummy");

    assert_eq!(description.len(), 12);
    let entry = &description["createdAt[strictly_after]"];
    assert_eq!(entry.property, "createdAt");
    assert_eq!(entry.value_type, "DateTimeInterface");
    assert!(!entry.required);
    assert!(description.contains_key("dummyDate[before]"));
    assert!(!description.keys().any(|k| k.starts_with("age")));
}

#[test]
fn description_uses_public_names() {
    let (core, _sink) = recording_core(Some(properties(&[("createdAt", None)])));
    let core = core.with_name_converter(Arc::new(CamelCaseToSnakeCaseNameConverter));
    let description = DateFilter::new(core).description("Dummy");

    let keys: Vec<&str> = description.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "created_at[after]",
            "created_at[before]",
            "created_at[strictly_after]",
            "created_at[strictly_before]",
        ]
    );
    assert_eq!(description["created_at[after]"].property, "created_at");
}
