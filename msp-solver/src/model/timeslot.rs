use log::debug;
use pumpkin_core::branching::branchers::dynamic_brancher::DynamicBrancher;
use pumpkin_core::branching::branchers::independent_variable_value_brancher::IndependentVariableValueBrancher;
use pumpkin_core::branching::value_selection::InDomainMin;
use pumpkin_core::branching::variable_selection::FirstFail;
use pumpkin_core::branching::variable_selection::InputOrder;
use pumpkin_core::constraints;
use pumpkin_core::variables::DomainId;
use pumpkin_core::variables::Literal;
use pumpkin_core::variables::TransformableVariable;
use pumpkin_core::ConstraintOperationError;
use pumpkin_core::Solver;

use super::log_root_failure;
use super::GapRule;
use super::ModelError;
use crate::conflicts::ConflictSet;
use crate::instance::InstanceModel;
use crate::instance::MeetingId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeslotOptions {
    /// Whether to create a makespan variable which bounds every timeslot from above.
    pub minimise_makespan: bool,
    pub gap_rule: GapRule,
}

impl Default for TimeslotOptions {
    fn default() -> Self {
        TimeslotOptions {
            minimise_makespan: true,
            gap_rule: GapRule::Strict,
        }
    }
}

/// The meeting-indexed encoding: `t[m]` in `[0, bound]` is the timeslot of meeting `m`.
///
/// For every pair of conflicting meetings `m1, m2` at distance `d`, a fresh literal `l` selects
/// the order in which they are held:
/// ```text
///  l -> t[m2] - t[m1] <= -gap(d)
/// !l -> t[m1] - t[m2] <= -gap(d)
/// ```
/// where `gap(d)` is [`GapRule::minimum_gap`].
#[derive(Clone, Debug)]
pub struct TimeslotModel {
    schedule: Box<[DomainId]>,
    makespan: Option<DomainId>,
    bound: i32,
    gap_rule: GapRule,
}

impl TimeslotModel {
    /// Creates the variables and posts the constraints of the encoding in `solver`, using `bound`
    /// as the largest timeslot.
    pub fn build(
        solver: &mut Solver,
        instance: &InstanceModel,
        conflicts: &ConflictSet,
        bound: i64,
        options: &TimeslotOptions,
    ) -> Result<TimeslotModel, ModelError> {
        if bound < 0 {
            return Err(ModelError::NegativeHorizon(bound));
        }
        // Gaps are posted as `-(bound + 1)` at worst, which has to fit as well.
        let bound = i32::try_from(bound)
            .ok()
            .filter(|&bound| bound < i32::MAX)
            .ok_or(ModelError::HorizonTooLarge(bound))?;

        let schedule = instance
            .meetings()
            .map(|_| solver.new_bounded_integer(0, bound))
            .collect::<Box<[_]>>();
        let order_literals = conflicts
            .pairs()
            .map(|_| solver.new_literal())
            .collect::<Vec<_>>();
        let makespan = options
            .minimise_makespan
            .then(|| solver.new_bounded_integer(0, bound));

        let model = TimeslotModel {
            schedule,
            makespan,
            bound,
            gap_rule: options.gap_rule,
        };
        log_root_failure(
            model.post(solver, instance, conflicts, &order_literals),
            "timeslot",
        );

        debug!(
            "Timeslot model: {} meetings in [0, {bound}], {} ordered pairs, makespan {}",
            model.schedule.len(),
            order_literals.len(),
            if makespan.is_some() { "minimised" } else { "free" }
        );

        Ok(model)
    }

    fn post(
        &self,
        solver: &mut Solver,
        instance: &InstanceModel,
        conflicts: &ConflictSet,
        order_literals: &[Literal],
    ) -> Result<(), ConstraintOperationError> {
        for ((first, second), &first_is_later) in conflicts.pairs().zip(order_literals) {
            let distance = instance.distances().get(first, second);
            // No two timeslots are more than `bound` apart, so larger gaps are equally infeasible.
            let gap = self
                .gap_rule
                .minimum_gap(distance)
                .min(i64::from(self.bound) + 1) as i32;

            let first_slot = self.schedule_variable(first);
            let second_slot = self.schedule_variable(second);
            let tag = solver.new_constraint_tag();

            solver
                .add_constraint(constraints::less_than_or_equals(
                    [second_slot.scaled(1), first_slot.scaled(-1)],
                    -gap,
                    tag,
                ))
                .implied_by(first_is_later)?;
            solver
                .add_constraint(constraints::less_than_or_equals(
                    [first_slot.scaled(1), second_slot.scaled(-1)],
                    -gap,
                    tag,
                ))
                .implied_by(!first_is_later)?;
        }

        if let Some(makespan) = self.makespan {
            let tag = solver.new_constraint_tag();
            for &slot in self.schedule.iter() {
                solver
                    .add_constraint(constraints::binary_less_than_or_equals(
                        slot, makespan, tag,
                    ))
                    .post()?;
            }
        }

        Ok(())
    }

    pub fn schedule_variable(&self, meeting: MeetingId) -> DomainId {
        self.schedule[meeting.index()]
    }

    pub fn schedule_variables(&self) -> &[DomainId] {
        &self.schedule
    }

    /// The makespan variable, if the model was built to minimise it.
    pub fn makespan(&self) -> Option<DomainId> {
        self.makespan
    }

    pub fn bound(&self) -> i32 {
        self.bound
    }

    pub fn gap_rule(&self) -> GapRule {
        self.gap_rule
    }

    /// A brancher which decides the timeslots first, smallest domain first, then fixes the
    /// makespan to its lower bound, and leaves the order literals to the default search of
    /// `solver`.
    pub fn brancher(&self, solver: &Solver) -> DynamicBrancher {
        let mut brancher = DynamicBrancher::new(vec![Box::new(
            IndependentVariableValueBrancher::new(
                FirstFail::new(self.schedule_variables()),
                InDomainMin,
            ),
        )]);
        if let Some(makespan) = self.makespan {
            brancher.add_brancher(Box::new(IndependentVariableValueBrancher::new(
                InputOrder::new(&[makespan]),
                InDomainMin,
            )));
        }
        brancher.add_brancher(Box::new(solver.default_brancher()));
        brancher
    }
}
