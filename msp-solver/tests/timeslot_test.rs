#![cfg(test)]

mod helpers;

use helpers::run_solver;

#[test]
fn meetings_without_a_common_attendee_share_a_slot() {
    let run = run_solver("disjoint_attendance.msp", &[], "disjoint");

    assert!(run.status.success());
    assert_eq!(run.schedule(), vec![(0, 0), (1, 0)]);
    assert!(run.stdout.ends_with("----------\n==========\n"));
}

#[test]
fn shared_attendee_needs_a_strict_gap() {
    let run = run_solver("shared_pair.msp", &[], "shared-strict");

    assert!(run.status.success());
    let schedule = run.schedule();
    assert_eq!(schedule.len(), 2);
    assert!((schedule[0].1 - schedule[1].1).abs() >= 4);
    assert_eq!(run.makespan(), 4);
    assert!(run.stdout.ends_with("==========\n"));
}

#[test]
fn at_least_gap_equals_the_distance() {
    let run = run_solver(
        "shared_pair.msp",
        &["--gap-rule", "at-least"],
        "shared-at-least",
    );

    assert!(run.status.success());
    assert_eq!(run.makespan(), 3);
}

#[test]
fn chain_reaches_the_optimal_makespan() {
    let run = run_solver("chain.msp", &[], "chain");

    assert!(run.status.success());
    let schedule = run.schedule();
    let slot = |meeting: usize| schedule[meeting].1;

    assert!((slot(0) - slot(1)).abs() > 2);
    assert!((slot(1) - slot(2)).abs() > 2);
    assert_eq!(run.makespan(), 3);
    assert!(run.stdout.ends_with("==========\n"));
}

#[test]
fn too_short_header_horizon_is_unsatisfiable() {
    let run = run_solver("short_horizon.msp", &["--header-bound"], "short-horizon");

    assert!(run.status.success());
    assert!(run.schedule().is_empty());
    assert!(run.stdout.ends_with("=====UNSATISFIABLE=====\n"));
}

#[test]
fn computed_bound_makes_the_same_instance_feasible() {
    let run = run_solver("short_horizon.msp", &[], "long-horizon");

    assert!(run.status.success());
    assert_eq!(run.makespan(), 11);
}

#[test]
fn negative_header_does_not_affect_the_computed_bound() {
    let run = run_solver("negative_header.msp", &[], "negative-header");

    assert!(run.status.success(), "{}", run.stdout);
    assert_eq!(run.makespan(), 4);
}

#[test]
fn negative_header_cannot_be_the_horizon() {
    let run = run_solver(
        "negative_header.msp",
        &["--header-bound"],
        "negative-header-bound",
    );

    assert!(!run.status.success());
    assert!(run.stdout.contains("the horizon must not be negative, got -4"));
}

#[test]
fn satisfy_mode_stops_at_the_first_schedule() {
    let run = run_solver("chain.msp", &["--mode", "satisfy"], "chain-satisfy");

    assert!(run.status.success());
    assert_eq!(run.schedule().len(), 3);
    assert!(run.stdout.ends_with("----------\n"));
    assert!(!run.stdout.contains("=========="));
}

#[test]
fn statistics_are_printed_on_request() {
    let run = run_solver("chain.msp", &["--log-statistics"], "chain-statistics");

    assert!(run.status.success());
    assert!(run.stdout.contains("%% objective=3\n"));
    assert!(run.stdout.contains("%% nodes="));
}

#[test]
fn malformed_instance_fails() {
    let run = run_solver("malformed.msp", &[], "malformed");

    assert!(!run.status.success());
    assert!(run.stdout.contains("Execution failed"));
    assert!(run.stdout.contains("not symmetric"));
}
