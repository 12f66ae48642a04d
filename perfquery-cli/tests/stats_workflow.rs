mod common;
use assert_cmd::assert::OutputAssertExt;
use common::*;
use predicates::prelude::*;

/// Integers are summed exactly and averaged as floats
#[test]
fn stats_integers() {
    let out = run_json(cli().args(["stats", "1", "2", "3", "-4"]));

    assert_eq!(out["count"], 4);
    assert_eq!(out["sum"], 2);
    assert_eq!(out["average"], 0.5);
}

/// Mixed input falls back to floats
#[test]
fn stats_floats() {
    let out = run_json(cli().args(["stats", "1.5", "2", "2.5"]));

    assert_eq!(out["sum"], 6.0);
    assert_eq!(out["average"], 2.0);
}

/// An integer total beyond i64 is computed as floats
#[test]
fn stats_integer_overflow_falls_back_to_floats() {
    let out = run_json(cli().args(["stats", "9223372036854775807", "1"]));

    assert_eq!(out["count"], 2);
    assert!(out["sum"].is_f64());
    assert_eq!(out["sum"].as_f64(), Some(9223372036854775808.0));
    assert_eq!(out["average"].as_f64(), Some(4611686018427387904.0));

    let out = run_json(cli().args(["stats", "--", "-9223372036854775808", "-1"]));
    assert!(out["sum"].is_f64());
    assert_eq!(out["sum"].as_f64(), Some(-9223372036854775808.0));
}

/// No values: zero sum, no average
#[test]
fn stats_empty_input() {
    let out = run_json(cli().args(["stats"]));

    assert_eq!(out["count"], 0);
    assert_eq!(out["sum"], 0);
    assert!(out["average"].is_null());
}

/// Boolean mode reports whether every value is true
#[test]
fn stats_bools() {
    let out = run_json(cli().args(["stats", "--bools", "true", "true"]));
    assert_eq!(out["all_true"], true);

    let out = run_json(cli().args(["stats", "--bools", "true", "false"]));
    assert_eq!(out["all_true"], false);

    let out = run_json(cli().args(["stats", "--bools"]));
    assert_eq!(out["all_true"], true);

    cli()
        .args(["stats", "--bools", "yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a boolean"));
}

#[test]
fn stats_rejects_non_numbers() {
    cli()
        .args(["stats", "1", "two"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a number"));
}
