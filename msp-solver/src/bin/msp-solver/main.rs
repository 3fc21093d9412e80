mod result;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::ValueEnum;
use log::error;
use log::info;
use log::warn;
use log::LevelFilter;
use msp_solver::bound::estimate_horizon;
use msp_solver::conflicts::ConflictSet;
use msp_solver::driver::solve;
use msp_solver::driver::SolveMode;
use msp_solver::driver::SolveOptions;
use msp_solver::driver::SolveOutcome;
use msp_solver::driver::SolveReport;
use msp_solver::instance::InstanceModel;
use msp_solver::model::CalendarModel;
use msp_solver::model::CalendarOptions;
use msp_solver::model::GapRule;
use msp_solver::model::TimeslotModel;
use msp_solver::model::TimeslotOptions;
use msp_solver::report::AgentCalendars;
use msp_solver::report::Schedule;
use pumpkin_core::convert_case::Case;
use pumpkin_core::statistics::configure_statistic_logging;
use pumpkin_core::statistics::should_log_statistics;
use pumpkin_core::Solver;
use result::MspError;
use result::MspResult;

const MSG_UNSATISFIABLE: &str = "=====UNSATISFIABLE=====";
const MSG_UNKNOWN: &str = "=====UNKNOWN=====";
const MSG_NOT_PROVEN: &str = "% best found, optimality not proven";

#[derive(Debug, Parser)]
#[command(
    help_template = "\
{before-help}{name} {version}
Authors: {author}
About: {about}

{usage-heading}\n{tab}{usage}

{all-args}{after-help}
",
    author,
    version,
    about,
    arg_required_else_help = true
)]
struct Args {
    /// The instance to solve, in the format
    ///
    ///   nMeetings mAgents timeslots
    ///   <label> b_0 ... b_{n-1}      (one row per agent)
    ///   <label> d_0 ... d_{n-1}      (one row per meeting)
    #[clap(verbatim_doc_comment)]
    instance_path: PathBuf,

    /// The time budget for the solver, given in seconds.
    ///
    /// Possible values: u64 (Optional)
    #[arg(verbatim_doc_comment)]
    time_limit: Option<u64>,

    /// How the instance is turned into a model.
    ///
    /// - "timeslot" gives every meeting a timeslot, and can minimise the makespan
    /// - "calendar" gives every agent a calendar with a fixed number of slots
    #[arg(short = 'e', long, value_enum, default_value_t, verbatim_doc_comment)]
    encoding: Encoding,

    /// Whether to minimise the makespan or stop at the first schedule.
    ///
    /// Defaults to "optimise" for the timeslot encoding. The calendar encoding only supports
    /// "satisfy".
    #[arg(short = 'm', long, value_enum, verbatim_doc_comment)]
    mode: Option<Mode>,

    /// How many timeslots two meetings with a common attendee have to be apart, given their
    /// travel distance d.
    ///
    /// - "strict" requires more than d slots (default for the timeslot encoding)
    /// - "at-least" requires d slots (default for the calendar encoding)
    #[arg(short = 'g', long, value_enum, verbatim_doc_comment)]
    gap_rule: Option<GapRule>,

    /// Uses the timeslot field of the instance header as the largest timeslot, instead of the
    /// bound computed from the distances.
    ///
    /// Only applies to the timeslot encoding.
    #[arg(long, verbatim_doc_comment)]
    header_bound: bool,

    /// The number of slots in every calendar, instead of the timeslot field of the instance
    /// header.
    ///
    /// Only applies to the calendar encoding.
    ///
    /// Possible values: u32 (Optional)
    #[arg(long, verbatim_doc_comment)]
    timeslots: Option<u32>,

    /// Enables log message output from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 'v', long = "verbose", verbatim_doc_comment)]
    verbose: bool,

    /// Enables logging of statistics from the solver.
    ///
    /// Possible values: bool
    #[arg(short = 's', long = "log-statistics", verbatim_doc_comment)]
    log_statistics: bool,
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Encoding {
    /// One variable per meeting.
    #[default]
    Timeslot,
    /// One variable per agent and slot.
    Calendar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Minimise the makespan.
    Optimise,
    /// Stop at the first schedule.
    Satisfy,
}

impl From<Mode> for SolveMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Optimise => SolveMode::MinimiseMakespan,
            Mode::Satisfy => SolveMode::FirstFeasible,
        }
    }
}

fn configure_logging(verbose: bool, log_statistics: bool) {
    if log_statistics {
        configure_statistic_logging("%%", None, Some(Case::Camel), None);
    }
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "% ")?;

            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {e}");
            std::process::exit(1);
        }
    }
}

fn run() -> MspResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose, args.log_statistics);

    let instance = InstanceModel::from_file(&args.instance_path)?;
    info!(
        "Loaded {} with {} meetings and {} agents",
        args.instance_path.display(),
        instance.num_meetings(),
        instance.num_agents()
    );

    let time_limit = args.time_limit.map(Duration::from_secs);

    match args.encoding {
        Encoding::Timeslot => solve_timeslots(&args, &instance, time_limit),
        Encoding::Calendar => solve_calendars(&args, &instance, time_limit),
    }
}

fn solve_timeslots(
    args: &Args,
    instance: &InstanceModel,
    time_limit: Option<Duration>,
) -> MspResult<()> {
    if args.timeslots.is_some() {
        warn!("The number of timeslots only applies to the calendar encoding, ignoring it");
    }

    let conflicts = ConflictSet::from_attendance(instance.attendance());
    let bound = if args.header_bound {
        i64::from(instance.header_timeslots())
    } else {
        estimate_horizon(instance.distances())
    };
    info!("Using {bound} as the largest timeslot");

    let mode = args.mode.unwrap_or(Mode::Optimise);
    let options = TimeslotOptions {
        minimise_makespan: mode == Mode::Optimise,
        gap_rule: args.gap_rule.unwrap_or(GapRule::Strict),
    };

    let mut solver = Solver::default();
    let model = TimeslotModel::build(&mut solver, instance, &conflicts, bound, &options)?;
    let mut brancher = model.brancher(&solver);
    let report = solve(
        &mut solver,
        &mut brancher,
        model.makespan(),
        &SolveOptions {
            mode: mode.into(),
            time_limit,
        },
    )?;
    log_search(&report);

    if let Some(solution) = report.outcome.solution() {
        let schedule = Schedule::from_solution(&model, solution);
        schedule.validate(instance, &conflicts, options.gap_rule)?;

        print!("{schedule}");
        println!("----------");
        if should_log_statistics() {
            solver.log_statistics_with_objective(
                Some(&brancher),
                i64::from(schedule.makespan()),
                false,
            );
        }
    } else if should_log_statistics() {
        solver.log_statistics(Some(&brancher), false);
    }

    print_status(&report.outcome);
    Ok(())
}

fn solve_calendars(
    args: &Args,
    instance: &InstanceModel,
    time_limit: Option<Duration>,
) -> MspResult<()> {
    if args.mode == Some(Mode::Optimise) {
        return Err(MspError::CalendarOptimisation);
    }
    if args.header_bound {
        warn!("The header bound only applies to the timeslot encoding, ignoring it");
    }

    let timeslots = match args.timeslots {
        Some(timeslots) => timeslots,
        None => CalendarOptions::for_instance(instance)?.timeslots,
    };
    let options = CalendarOptions {
        timeslots,
        gap_rule: args.gap_rule.unwrap_or(GapRule::AtLeast),
    };
    info!("Using calendars of {} slots", options.timeslots);

    let mut solver = Solver::default();
    let model = CalendarModel::build(&mut solver, instance, &options)?;
    let mut brancher = model.brancher(&solver);
    let report = solve(
        &mut solver,
        &mut brancher,
        None,
        &SolveOptions {
            mode: SolveMode::FirstFeasible,
            time_limit,
        },
    )?;
    log_search(&report);

    if let Some(solution) = report.outcome.solution() {
        let calendars = AgentCalendars::from_solution(&model, solution);
        calendars.validate(instance, options.gap_rule)?;

        print!("{calendars}");
        println!("----------");
    }
    if should_log_statistics() {
        solver.log_statistics(Some(&brancher), false);
    }

    print_status(&report.outcome);
    Ok(())
}

fn log_search(report: &SolveReport) {
    let statistics = report.statistics;
    info!(
        "Search finished after {:?}: {} decisions, {} conflicts",
        statistics.elapsed, statistics.decisions, statistics.conflicts
    );
}

fn print_status(outcome: &SolveOutcome) {
    if matches!(outcome, SolveOutcome::BestFound(_)) {
        warn!("The time limit was reached before the makespan was proven optimal");
    }
    if let Some(line) = status_line(outcome) {
        println!("{line}");
    }
}

/// The line closing the output of a search, if its outcome has one.
fn status_line(outcome: &SolveOutcome) -> Option<&'static str> {
    match outcome {
        SolveOutcome::Optimal(_) => Some("=========="),
        SolveOutcome::BestFound(_) => Some(MSG_NOT_PROVEN),
        SolveOutcome::Feasible(_) => None,
        SolveOutcome::Infeasible => Some(MSG_UNSATISFIABLE),
        SolveOutcome::Unknown => Some(MSG_UNKNOWN),
    }
}

#[cfg(test)]
mod tests {
    use pumpkin_core::results::Solution;

    use super::*;

    #[test]
    fn unproven_makespan_is_flagged() {
        assert_eq!(
            status_line(&SolveOutcome::BestFound(Solution::default())),
            Some(MSG_NOT_PROVEN)
        );
    }

    #[test]
    fn only_a_feasible_outcome_has_no_status_line() {
        assert_eq!(
            status_line(&SolveOutcome::Optimal(Solution::default())),
            Some("==========")
        );
        assert_eq!(status_line(&SolveOutcome::Feasible(Solution::default())), None);
        assert_eq!(status_line(&SolveOutcome::Infeasible), Some(MSG_UNSATISFIABLE));
        assert_eq!(status_line(&SolveOutcome::Unknown), Some(MSG_UNKNOWN));
    }
}
