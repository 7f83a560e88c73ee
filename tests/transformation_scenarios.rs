//! End-to-end transformation runs over in-memory engines

mod utils;

use notaql::{
    Argument, ComparisonOperator, Evaluator, Fixation, MemoryInput, MemoryOutput, ObjectConstructor,
    Predicate, RunSummary, Transformation, Value,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use utils::{abc_records, init_logging, records, sorted, sum_by_b};

#[test]
fn test_sum_grouped_by_b() {
    init_logging();
    let output = MemoryOutput::new();
    let summary = sum_by_b(MemoryInput::new(abc_records()), output.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        output.records(),
        records(json!([
            {"b": "x", "sum": 3},
            {"b": "y", "sum": 3}
        ]))
    );
    assert_eq!(
        summary,
        RunSummary {
            records_read: 3,
            records_matched: 3,
            groups: 2,
            emitted: 2,
            ..RunSummary::default()
        }
    );
}

#[rstest]
#[case::strictly_greater(ComparisonOperator::Gt, 0)]
#[case::at_least(ComparisonOperator::Ge, 2)]
#[case::equal(ComparisonOperator::Eq, 2)]
#[case::below(ComparisonOperator::Lt, 0)]
fn test_out_predicate_boundary(#[case] op: ComparisonOperator, #[case] expected: usize) {
    let output = MemoryOutput::new();
    let summary = sum_by_b(MemoryInput::new(abc_records()), output.clone())
        .out_predicate(Predicate::comparison(
            op,
            Argument::field("OUT.sum"),
            Argument::literal(3),
        ))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.emitted, expected);
    assert_eq!(summary.filtered, 2 - expected);
    assert_eq!(output.records().len(), expected);
}

#[test]
fn test_in_predicate_rejects_records() {
    let output = MemoryOutput::new();
    let summary = sum_by_b(MemoryInput::new(abc_records()), output.clone())
        .in_predicate(Predicate::at_least(Argument::field("IN.a"), Argument::literal(2)))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_rejected, 1);
    assert_eq!(summary.records_matched, 2);
    assert_eq!(
        output.records(),
        records(json!([
            {"b": "x", "sum": 2},
            {"b": "y", "sum": 3}
        ]))
    );
}

#[test]
fn test_missing_path_drops_only_that_object() {
    let input = MemoryInput::new(records(json!([
        {"id": 1, "c": "present"},
        {"id": 2},
        {"id": 3, "c": "also present"}
    ])));
    let output = MemoryOutput::new();
    let summary = Transformation::builder(input, output.clone())
        .field("id", Argument::field("IN.id"))
        .field("c", Argument::field("IN.c"))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.dropped, 1);
    assert_eq!(
        output.records(),
        records(json!([
            {"id": 1, "c": "present"},
            {"id": 3, "c": "also present"}
        ]))
    );
}

#[test]
fn test_aggregate_without_contributions_drops_group() {
    let input = MemoryInput::new(records(json!([
        {"b": "x", "c": 5},
        {"b": "y"},
        {"b": "x", "c": 7}
    ])));
    let output = MemoryOutput::new();
    let summary = Transformation::builder(input, output.clone())
        .field("b", Argument::field("IN.b"))
        .field("top", Argument::aggregate("MAX", vec![Argument::field("IN.c")]))
        .field("n", Argument::aggregate("COUNT", vec![]))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.dropped, 1);
    assert_eq!(output.records(), records(json!([{"b": "x", "top": 7, "n": 2}])));
}

#[test]
fn test_coalesce_keeps_objects_with_missing_fields() {
    let input = MemoryInput::new(records(json!([{"id": 1, "c": "here"}, {"id": 2}])));
    let output = MemoryOutput::new();
    Transformation::builder(input, output.clone())
        .field("id", Argument::field("IN.id"))
        .field(
            "c",
            Argument::call("COALESCE", vec![Argument::field("IN.c"), Argument::literal("none")]),
        )
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        output.records(),
        records(json!([
            {"id": 1, "c": "here"},
            {"id": 2, "c": "none"}
        ]))
    );
}

#[test]
fn test_computed_grouping_key_and_nested_output() {
    let input = MemoryInput::new(records(json!([
        {"city": "berlin", "name": "ann", "age": 30},
        {"city": "Berlin", "name": "bob", "age": 40},
        {"city": "paris", "name": "eve", "age": 25}
    ])));
    let output = MemoryOutput::new();
    Transformation::builder(input, output.clone())
        .field("city", Argument::call("UPPER", vec![Argument::field("IN.city")]))
        .field(
            "stats",
            Argument::object(
                ObjectConstructor::new()
                    .with_field("people", Argument::aggregate("COUNT", vec![]))
                    .with_field("names", Argument::aggregate("SET", vec![Argument::field("IN.name")]))
                    .with_field("mean_age", Argument::aggregate("AVG", vec![Argument::field("IN.age")])),
            ),
        )
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        output.records(),
        records(json!([
            {"city": "BERLIN", "stats": {"people": 2, "names": ["ann", "bob"], "mean_age": 35.0}},
            {"city": "PARIS", "stats": {"people": 1, "names": ["eve"], "mean_age": 25.0}}
        ]))
    );
}

#[test]
fn test_grouping_is_order_independent() {
    let data = records(json!([
        {"k": "a", "v": 4, "t": "p"},
        {"k": "b", "v": 1, "t": "q"},
        {"k": "a", "v": 9, "t": "q"},
        {"k": "c", "v": -2},
        {"k": "b", "v": 7, "t": "p"},
        {"k": "a", "v": 4, "t": "r"},
        {"k": "c", "v": 3, "t": ["s", "p"]}
    ]));

    let run = |input: Vec<Value>| {
        let output = MemoryOutput::new();
        Transformation::builder(MemoryInput::new(input), output.clone())
            .field("k", Argument::field("IN.k"))
            .field("total", Argument::aggregate("SUM", vec![Argument::field("IN.v")]))
            .field("low", Argument::aggregate("MIN", vec![Argument::field("IN.v")]))
            .field("high", Argument::aggregate("MAX", vec![Argument::field("IN.v")]))
            .field("n", Argument::aggregate("COUNT", vec![Argument::field("IN.t")]))
            .field("tags", Argument::aggregate("SET", vec![Argument::field("IN.t")]))
            .build()
            .unwrap()
            .run()
            .unwrap();
        sorted(output.records())
    };

    let expected = run(data.clone());
    assert_eq!(expected.len(), 3);

    let mut reversed = data.clone();
    reversed.reverse();
    assert_eq!(run(reversed), expected);

    let mut rotated = data.clone();
    rotated.rotate_left(3);
    assert_eq!(run(rotated), expected);

    let mut interleaved: Vec<Value> = data.iter().step_by(2).cloned().collect();
    interleaved.extend(data.iter().skip(1).step_by(2).cloned());
    assert_eq!(run(interleaved), expected);
}

#[test]
fn test_grouping_keys_keep_numeric_kinds_apart() {
    let input = MemoryInput::new(records(json!([
        {"a": 1, "b": 1},
        {"a": 2, "b": 1.0},
        {"a": 4, "b": 1},
        {"a": 8, "b": 0.0},
        {"a": 16, "b": -0.0}
    ])));
    let output = MemoryOutput::new();
    let summary = sum_by_b(input, output.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.groups, 4);
    assert_eq!(
        output.records(),
        records(json!([
            {"b": 1, "sum": 5},
            {"b": 1.0, "sum": 2},
            {"b": 0.0, "sum": 8},
            {"b": -0.0, "sum": 16}
        ]))
    );
}

#[rstest]
#[case::back_inside_range(vec![i64::MAX, -1, 1])]
#[case::briefly_outside_range(vec![i64::MAX, 1, -1])]
#[case::largest_last(vec![1, -1, i64::MAX])]
fn test_integer_sum_does_not_depend_on_arrival_order(#[case] amounts: Vec<i64>) {
    let input: Vec<Value> = amounts
        .iter()
        .map(|a| Value::from(json!({"a": a, "b": "x"})))
        .collect();
    let output = MemoryOutput::new();
    sum_by_b(MemoryInput::new(input), output.clone())
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(output.records(), records(json!([{"b": "x", "sum": i64::MAX}])));
}

#[test]
fn test_integer_sum_outside_range_fails_in_every_order() {
    for amounts in [[i64::MAX, 1, 0], [1, 0, i64::MAX], [0, i64::MAX, 1]] {
        let input: Vec<Value> = amounts
            .iter()
            .map(|a| Value::from(json!({"a": a, "b": "x"})))
            .collect();
        let err = sum_by_b(MemoryInput::new(input), MemoryOutput::new())
            .build()
            .unwrap()
            .run()
            .unwrap_err();
        assert_eq!(err.kind(), notaql::ErrorKind::FunctionFailed, "{amounts:?}");
        assert_eq!(err.state, notaql::RunState::Emitting, "{amounts:?}");
    }
}

#[rstest]
#[case(json!(null))]
#[case(json!(true))]
#[case(json!(-17))]
#[case(json!(2.5))]
#[case(json!("text"))]
#[case(json!([1, "two", [3.0]]))]
#[case(json!({"nested": {"list": [], "flag": false}}))]
fn test_literal_evaluates_to_itself(#[case] json: serde_json::Value) {
    let value = Value::from(json);
    let evaluator = Evaluator::default();
    let record = Fixation::from_record(Value::from(json!({"a": 1})));

    for fixation in [Fixation::empty(), record] {
        let result = evaluator
            .evaluate(&Argument::literal(value.clone()), &fixation)
            .unwrap();
        assert_eq!(result.value, value);
    }
}

#[test]
fn test_literal_binary_and_timestamp_evaluate_to_themselves() {
    let evaluator = Evaluator::default();
    let timestamp = chrono::DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    for value in [Value::Binary(vec![0, 159, 255]), Value::Timestamp(timestamp)] {
        let result = evaluator
            .evaluate(&Argument::literal(value.clone()), &Fixation::empty())
            .unwrap();
        assert_eq!(result.value, value);
    }
}

#[test]
fn test_in_predicate_gate_matches_direct_evaluation() {
    let predicate = Predicate::or(vec![
        Predicate::greater_than(Argument::field("IN.a"), Argument::literal(1)),
        Predicate::equals(Argument::field("IN.b"), Argument::literal("y")),
    ]);
    let transformation = sum_by_b(MemoryInput::new([]), MemoryOutput::new())
        .in_predicate(predicate.clone())
        .build()
        .unwrap();
    let evaluator = Evaluator::default();

    let candidates = records(json!([
        {"a": 1, "b": "x"},
        {"a": 2, "b": "x"},
        {"a": 0, "b": "y"},
        {"a": "one"},
        {}
    ]));
    for record in candidates {
        let fixation = Fixation::from_record(record.clone());
        let candidate = notaql::ValueEvaluationResult::new(record.clone(), fixation.clone());
        let direct = predicate.evaluate(&evaluator, &candidate, &fixation).unwrap();
        assert_eq!(transformation.satisfies_in_predicate(&record).unwrap(), direct, "{record}");
    }

    let open = sum_by_b(MemoryInput::new([]), MemoryOutput::new()).build().unwrap();
    for record in abc_records() {
        assert!(open.satisfies_in_predicate(&record).unwrap());
    }
}

#[rstest]
#[case::mismatched(json!({"a": "text", "b": "x"}), false, false)]
#[case::missing(json!({"b": "x"}), false, true)]
#[case::comparable(json!({"a": 0, "b": "x"}), true, false)]
#[case::nested_field_present(json!({"a": {"b": 1}, "b": "x"}), false, false)]
fn test_negation_does_not_admit_unevaluable_records(
    #[case] record: serde_json::Value,
    #[case] comparison_passes: bool,
    #[case] exists_passes: bool,
) {
    let record = Value::from(record);
    let negated_comparison = sum_by_b(MemoryInput::new([]), MemoryOutput::new())
        .in_predicate(Predicate::negate(Predicate::greater_than(
            Argument::field("IN.a"),
            Argument::literal(1),
        )))
        .build()
        .unwrap();
    let negated_exists = sum_by_b(MemoryInput::new([]), MemoryOutput::new())
        .in_predicate(Predicate::negate(Predicate::exists(Argument::field("IN.a.b"))))
        .build()
        .unwrap();

    assert_eq!(
        negated_comparison.satisfies_in_predicate(&record).unwrap(),
        comparison_passes
    );
    // IN.a.b is absent only when IN.a is; a scalar IN.a is a type mismatch
    assert_eq!(
        negated_exists.satisfies_in_predicate(&record).unwrap(),
        exists_passes
    );
}

#[test]
fn test_exists_and_null_filters() {
    let input = MemoryInput::new(records(json!([
        {"b": "x", "c": 1},
        {"b": "y"},
        {"b": "z", "c": null},
        {"b": "w", "d": 2}
    ])));
    let output = MemoryOutput::new();
    let summary = Transformation::builder(input, output.clone())
        .field("b", Argument::field("IN.b"))
        .field(
            "c",
            Argument::call("COALESCE", vec![Argument::field("IN.c"), Argument::literal(Value::Null)]),
        )
        .in_predicate(Predicate::or(vec![
            Predicate::exists(Argument::field("IN.c")),
            Predicate::exists(Argument::field("IN.d")),
        ]))
        .out_predicate(Predicate::negate(Predicate::equals(
            Argument::field("OUT.c"),
            Argument::literal(Value::Null),
        )))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.records_rejected, 1);
    assert_eq!(summary.filtered, 2);
    assert_eq!(output.records(), records(json!([{"b": "x", "c": 1}])));
}

#[test]
fn test_runs_are_independent() {
    let output = MemoryOutput::new();
    let transformation = sum_by_b(MemoryInput::new(abc_records()), output.clone())
        .build()
        .unwrap();

    let first = transformation.run().unwrap();
    let second = transformation.run().unwrap();
    assert_eq!(first, second);
    assert_eq!(output.take().len(), 4);
    assert_eq!(output.flush_count(), 2);
}
