//! # msp-solver
//! Solves the Meeting Scheduling Problem ([CSPLib #46](https://www.csplib.org/Problems/prob046/)):
//! every meeting gets a timeslot such that no agent has to attend two meetings it cannot travel
//! between in time.
//!
//! An instance is compiled into a finite-domain model for the [`pumpkin_core`] solver, in one of
//! two encodings:
//! * [`model::TimeslotModel`] has one variable per meeting holding its timeslot, and can minimise
//!   the makespan.
//! * [`model::CalendarModel`] has one variable per agent and slot holding the meeting the agent
//!   attends in that slot.
//!
//! ```rust
//! # use pumpkin_core::Solver;
//! # use msp_solver::bound::estimate_horizon;
//! # use msp_solver::conflicts::ConflictSet;
//! # use msp_solver::driver::{solve, SolveMode, SolveOptions, SolveOutcome};
//! # use msp_solver::instance::parse_instance;
//! # use msp_solver::model::{TimeslotModel, TimeslotOptions};
//! # use msp_solver::report::Schedule;
//! let source = "2 1 10\n0: 1 1\n0: 0 3\n1: 3 0\n";
//! let instance = parse_instance(source.as_bytes()).expect("valid instance");
//! let conflicts = ConflictSet::from_attendance(instance.attendance());
//! let bound = estimate_horizon(instance.distances());
//!
//! let mut solver = Solver::default();
//! let options = TimeslotOptions::default();
//! let model = TimeslotModel::build(&mut solver, &instance, &conflicts, bound, &options)
//!     .expect("the bound fits");
//!
//! let mut brancher = model.brancher(&solver);
//! let report = solve(
//!     &mut solver,
//!     &mut brancher,
//!     model.makespan(),
//!     &SolveOptions {
//!         mode: SolveMode::MinimiseMakespan,
//!         time_limit: None,
//!     },
//! )
//! .expect("the model has an objective");
//!
//! let SolveOutcome::Optimal(solution) = report.outcome else {
//!     panic!("the instance is feasible");
//! };
//! let schedule = Schedule::from_solution(&model, &solution);
//! assert_eq!(schedule.makespan(), 4);
//! ```
pub mod bound;
pub mod conflicts;
pub mod convert;
pub mod driver;
pub mod instance;
pub mod model;
pub mod report;
