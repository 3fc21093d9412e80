//! Runs the engine on a built model, within an optional time limit.
use std::time::Duration;
use std::time::Instant;

use log::debug;
use log::info;
use pumpkin_core::branching::Brancher;
use pumpkin_core::branching::BrancherEvent;
use pumpkin_core::branching::SelectionContext;
use pumpkin_core::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_core::optimisation::solution_callback::SolutionCallback;
use pumpkin_core::optimisation::OptimisationDirection;
use pumpkin_core::predicates::Predicate;
use pumpkin_core::results::OptimisationResult;
use pumpkin_core::results::ProblemSolution;
use pumpkin_core::results::SatisfactionResult;
use pumpkin_core::results::Solution;
use pumpkin_core::results::SolutionReference;
use pumpkin_core::statistics::StatisticLogger;
use pumpkin_core::termination::TerminationCondition;
use pumpkin_core::termination::TimeBudget;
use pumpkin_core::variables::DomainId;
use pumpkin_core::Solver;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMode {
    /// Stop at the first solution.
    FirstFeasible,
    /// Minimise the objective with linear SAT-UNSAT search.
    MinimiseMakespan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveOptions {
    pub mode: SolveMode,
    /// The wall-clock budget of the whole search. `None` searches until the question is answered.
    pub time_limit: Option<Duration>,
}

#[derive(Debug)]
pub enum SolveOutcome {
    /// A solution, found without an objective.
    Feasible(Solution),
    /// A solution with a proven optimal objective value.
    Optimal(Solution),
    /// The best solution found before the time limit; it is not proven optimal.
    BestFound(Solution),
    Infeasible,
    /// The time limit was hit before any solution was found.
    Unknown,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Feasible(solution)
            | SolveOutcome::Optimal(solution)
            | SolveOutcome::BestFound(solution) => Some(solution),
            SolveOutcome::Infeasible | SolveOutcome::Unknown => None,
        }
    }
}

/// What the search did to reach its outcome. The engine logs its own counters with
/// `--log-statistics`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    /// The number of decisions, which is the number of explored nodes.
    pub decisions: u64,
    pub conflicts: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct SolveReport {
    pub outcome: SolveOutcome,
    pub statistics: SearchStatistics,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("minimising the makespan requires a model with a makespan variable")]
    MissingObjective,
}

/// Searches for a solution of the model in `solver`, branching with `brancher`.
///
/// In [`SolveMode::MinimiseMakespan`], `objective` is minimised and has to be present.
pub fn solve<B: Brancher>(
    solver: &mut Solver,
    brancher: &mut B,
    objective: Option<DomainId>,
    options: &SolveOptions,
) -> Result<SolveReport, DriverError> {
    let mut termination = options.time_limit.map(TimeBudget::starting_now);
    solve_until(solver, brancher, objective, options.mode, &mut termination)
}

fn solve_until<B: Brancher, T: TerminationCondition>(
    solver: &mut Solver,
    brancher: &mut B,
    objective: Option<DomainId>,
    mode: SolveMode,
    termination: &mut T,
) -> Result<SolveReport, DriverError> {
    let start = Instant::now();
    let mut monitor = SearchMonitor::new(brancher);

    let outcome = match mode {
        SolveMode::FirstFeasible => {
            info!("Searching for a feasible solution");
            match solver.satisfy(&mut monitor, termination) {
                SatisfactionResult::Satisfiable(satisfiable) => {
                    SolveOutcome::Feasible(satisfiable.solution().into())
                }
                SatisfactionResult::Unsatisfiable(_, _) => SolveOutcome::Infeasible,
                SatisfactionResult::Unknown(_, _) => SolveOutcome::Unknown,
            }
        }
        SolveMode::MinimiseMakespan => {
            let objective = objective.ok_or(DriverError::MissingObjective)?;
            info!("Minimising the makespan");

            let procedure = LinearSatUnsat::new(
                OptimisationDirection::Minimise,
                objective,
                LogImprovement { objective },
            );

            match solver.optimise(&mut monitor, termination, procedure) {
                OptimisationResult::Optimal(solution) => SolveOutcome::Optimal(solution),
                OptimisationResult::Satisfiable(solution) => SolveOutcome::BestFound(solution),
                OptimisationResult::Unsatisfiable => SolveOutcome::Infeasible,
                OptimisationResult::Unknown => SolveOutcome::Unknown,
            }
        }
    };

    let statistics = SearchStatistics {
        decisions: monitor.decisions,
        conflicts: monitor.conflicts,
        elapsed: start.elapsed(),
    };

    Ok(SolveReport {
        outcome,
        statistics,
    })
}

struct LogImprovement {
    objective: DomainId,
}

impl<B: Brancher> SolutionCallback<B> for LogImprovement {
    fn on_solution_callback(&self, _: &Solver, solution: SolutionReference, _: &B) {
        debug!(
            "Improved the makespan to {}",
            solution.get_integer_value(self.objective)
        );
    }
}

/// Forwards to the model's brancher while counting its decisions and the conflicts it is told
/// about.
struct SearchMonitor<'a, B> {
    brancher: &'a mut B,
    decisions: u64,
    conflicts: u64,
}

impl<'a, B> SearchMonitor<'a, B> {
    fn new(brancher: &'a mut B) -> Self {
        SearchMonitor {
            brancher,
            decisions: 0,
            conflicts: 0,
        }
    }
}

impl<B: Brancher> Brancher for SearchMonitor<'_, B> {
    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.brancher.log_statistics(statistic_logger);
    }

    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
        let decision = self.brancher.next_decision(context);
        if decision.is_some() {
            self.decisions += 1;
        }
        decision
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
        self.brancher.on_conflict();
    }

    fn on_backtrack(&mut self) {
        self.brancher.on_backtrack();
    }

    fn on_solution(&mut self, solution: SolutionReference) {
        self.brancher.on_solution(solution);
    }

    fn on_unassign_integer(&mut self, variable: DomainId, value: i32) {
        self.brancher.on_unassign_integer(variable, value);
    }

    fn on_appearance_in_conflict_predicate(&mut self, predicate: Predicate) {
        self.brancher.on_appearance_in_conflict_predicate(predicate);
    }

    fn on_restart(&mut self) {
        self.brancher.on_restart();
    }

    fn synchronise(&mut self, context: &mut SelectionContext) {
        self.brancher.synchronise(context);
    }

    fn is_restart_pointless(&mut self) -> bool {
        self.brancher.is_restart_pointless()
    }

    fn subscribe_to_events(&self) -> Vec<BrancherEvent> {
        let mut events = self.brancher.subscribe_to_events();
        if !events.contains(&BrancherEvent::Conflict) {
            events.push(BrancherEvent::Conflict);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pumpkin_core::constraints;

    use super::*;

    fn options(mode: SolveMode) -> SolveOptions {
        SolveOptions {
            mode,
            time_limit: None,
        }
    }

    /// Wraps a brancher and raises a flag once the search reports a solution to it.
    struct FlagSolutions<B> {
        brancher: B,
        found: Rc<Cell<bool>>,
    }

    impl<B: Brancher> Brancher for FlagSolutions<B> {
        fn next_decision(&mut self, context: &mut SelectionContext) -> Option<Predicate> {
            self.brancher.next_decision(context)
        }

        fn on_conflict(&mut self) {
            self.brancher.on_conflict();
        }

        fn on_backtrack(&mut self) {
            self.brancher.on_backtrack();
        }

        fn on_solution(&mut self, solution: SolutionReference) {
            self.found.set(true);
            self.brancher.on_solution(solution);
        }

        fn on_unassign_integer(&mut self, variable: DomainId, value: i32) {
            self.brancher.on_unassign_integer(variable, value);
        }

        fn on_appearance_in_conflict_predicate(&mut self, predicate: Predicate) {
            self.brancher.on_appearance_in_conflict_predicate(predicate);
        }

        fn on_restart(&mut self) {
            self.brancher.on_restart();
        }

        fn synchronise(&mut self, context: &mut SelectionContext) {
            self.brancher.synchronise(context);
        }

        fn is_restart_pointless(&mut self) -> bool {
            self.brancher.is_restart_pointless()
        }

        fn subscribe_to_events(&self) -> Vec<BrancherEvent> {
            let mut events = self.brancher.subscribe_to_events();
            if !events.contains(&BrancherEvent::Solution) {
                events.push(BrancherEvent::Solution);
            }
            events
        }
    }

    /// Stops the search as soon as the flag is raised.
    struct StopOnFlag(Rc<Cell<bool>>);

    impl TerminationCondition for StopOnFlag {
        fn should_stop(&mut self) -> bool {
            self.0.get()
        }
    }

    #[test]
    fn first_feasible_stops_at_a_solution() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 5);
        let tag = solver.new_constraint_tag();
        solver
            .add_constraint(constraints::greater_than_or_equals([x], 2, tag))
            .post()
            .expect("feasible at the root");

        let mut brancher = solver.default_brancher();
        let report = solve(
            &mut solver,
            &mut brancher,
            None,
            &options(SolveMode::FirstFeasible),
        )
        .expect("no objective is needed");

        let SolveOutcome::Feasible(solution) = &report.outcome else {
            panic!("expected a solution, got {:?}", report.outcome);
        };
        assert!(solution.get_integer_value(x) >= 2);
    }

    #[test]
    fn minimising_proves_the_optimum() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 10);
        let makespan = solver.new_bounded_integer(0, 10);
        let tag = solver.new_constraint_tag();
        solver
            .add_constraint(constraints::greater_than_or_equals([x], 4, tag))
            .post()
            .expect("feasible at the root");
        solver
            .add_constraint(constraints::binary_less_than_or_equals(x, makespan, tag))
            .post()
            .expect("feasible at the root");

        let mut brancher = solver.default_brancher();
        let report = solve(
            &mut solver,
            &mut brancher,
            Some(makespan),
            &options(SolveMode::MinimiseMakespan),
        )
        .expect("the objective is present");

        let SolveOutcome::Optimal(solution) = &report.outcome else {
            panic!("expected an optimum, got {:?}", report.outcome);
        };
        assert_eq!(solution.get_integer_value(makespan), 4);
        assert!(report.outcome.solution().is_some());
    }

    #[test]
    fn interrupted_minimisation_keeps_the_best_solution() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 10);
        let makespan = solver.new_bounded_integer(0, 10);
        let tag = solver.new_constraint_tag();
        solver
            .add_constraint(constraints::greater_than_or_equals([x], 4, tag))
            .post()
            .expect("feasible at the root");
        solver
            .add_constraint(constraints::binary_less_than_or_equals(x, makespan, tag))
            .post()
            .expect("feasible at the root");

        let found = Rc::new(Cell::new(false));
        let mut brancher = FlagSolutions {
            brancher: solver.default_brancher(),
            found: Rc::clone(&found),
        };
        let report = solve_until(
            &mut solver,
            &mut brancher,
            Some(makespan),
            SolveMode::MinimiseMakespan,
            &mut StopOnFlag(found),
        )
        .expect("the objective is present");

        let SolveOutcome::BestFound(solution) = &report.outcome else {
            panic!("expected an unproven solution, got {:?}", report.outcome);
        };
        assert!(solution.get_integer_value(makespan) >= 4);
        assert!(solution.get_integer_value(x) <= solution.get_integer_value(makespan));
    }

    #[test]
    fn decisions_are_counted() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 5);
        let y = solver.new_bounded_integer(0, 5);
        let tag = solver.new_constraint_tag();
        solver
            .add_constraint(constraints::binary_less_than_or_equals(x, y, tag))
            .post()
            .expect("feasible at the root");

        let mut brancher = solver.default_brancher();
        let report = solve(
            &mut solver,
            &mut brancher,
            None,
            &options(SolveMode::FirstFeasible),
        )
        .expect("no objective is needed");

        assert!(matches!(report.outcome, SolveOutcome::Feasible(_)));
        assert!(report.statistics.decisions > 0);
    }

    #[test]
    fn minimising_without_objective_is_an_error() {
        let mut solver = Solver::default();
        let _ = solver.new_bounded_integer(0, 1);

        let mut brancher = solver.default_brancher();
        let result = solve(
            &mut solver,
            &mut brancher,
            None,
            &options(SolveMode::MinimiseMakespan),
        );

        assert!(matches!(result, Err(DriverError::MissingObjective)));
    }

    #[test]
    fn infeasible_model_is_an_outcome() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 3);
        let tag = solver.new_constraint_tag();
        let _ = solver
            .add_constraint(constraints::greater_than_or_equals([x], 5, tag))
            .post();

        for mode in [SolveMode::FirstFeasible, SolveMode::MinimiseMakespan] {
            let mut brancher = solver.default_brancher();
            let report = solve(&mut solver, &mut brancher, Some(x), &options(mode))
                .expect("the objective is present");

            assert!(matches!(report.outcome, SolveOutcome::Infeasible));
            assert!(report.outcome.solution().is_none());
        }
    }

    #[test]
    fn exhausted_time_limit_is_unknown() {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 3);

        let mut brancher = solver.default_brancher();
        let report = solve(
            &mut solver,
            &mut brancher,
            Some(x),
            &SolveOptions {
                mode: SolveMode::MinimiseMakespan,
                time_limit: Some(Duration::ZERO),
            },
        )
        .expect("the objective is present");

        assert!(matches!(report.outcome, SolveOutcome::Unknown));
    }
}
