use fnv::FnvHashMap;
use log::debug;
use pumpkin_core::branching::branchers::dynamic_brancher::DynamicBrancher;
use pumpkin_core::branching::branchers::independent_variable_value_brancher::IndependentVariableValueBrancher;
use pumpkin_core::branching::value_selection::InDomainMin;
use pumpkin_core::branching::variable_selection::FirstFail;
use pumpkin_core::constraints;
use pumpkin_core::predicate;
use pumpkin_core::variables::DomainId;
use pumpkin_core::variables::Literal;
use pumpkin_core::ConstraintOperationError;
use pumpkin_core::Solver;

use super::log_root_failure;
use super::GapRule;
use super::ModelError;
use crate::instance::AgentId;
use crate::instance::InstanceModel;
use crate::instance::MeetingId;

/// The value of a calendar slot in which the agent has no meeting.
pub const FREE_SLOT: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarOptions {
    /// The length of every calendar.
    pub timeslots: u32,
    pub gap_rule: GapRule,
}

impl CalendarOptions {
    /// Calendars as long as the timeslot field of the instance header, where the slot gap between
    /// two meetings must be at least their travel distance. A negative header field is an error.
    pub fn for_instance(instance: &InstanceModel) -> Result<CalendarOptions, ModelError> {
        let header = instance.header_timeslots();
        let timeslots = u32::try_from(header).map_err(|_| ModelError::NegativeTimeslots(header))?;

        Ok(CalendarOptions {
            timeslots,
            gap_rule: GapRule::AtLeast,
        })
    }
}

/// The agent-calendar encoding: `cal[a][s]` is the meeting agent `a` attends in slot `s`, or
/// [`FREE_SLOT`].
///
/// * Every meeting of an agent occurs exactly once in its row, and [`FREE_SLOT`] fills the
///   remaining slots.
/// * All attendees of a meeting hold it in the same slot.
/// * When an agent goes from `m1` in slot `j` to `m2` in slot `k`, with only free slots in
///   between, `k - j` respects the travel distance between `m1` and `m2`.
///
/// Each of these is posted over the literals `[cal[a][s] == v]`, one for every value `v` in the
/// domain of a slot.
#[derive(Clone, Debug)]
pub struct CalendarModel {
    calendars: Box<[Box<[DomainId]>]>,
    holds: FnvHashMap<(AgentId, usize, i32), Literal>,
    timeslots: usize,
    gap_rule: GapRule,
}

impl CalendarModel {
    pub fn build(
        solver: &mut Solver,
        instance: &InstanceModel,
        options: &CalendarOptions,
    ) -> Result<CalendarModel, ModelError> {
        let timeslots = i32::try_from(options.timeslots)
            .map_err(|_| ModelError::TooManyTimeslots(options.timeslots))?;
        let attendance = instance.attendance();
        let tag = solver.new_constraint_tag();

        // The domain of a slot is restricted to the meetings of its agent at creation.
        let mut calendars = Vec::with_capacity(instance.num_agents());
        let mut holds = FnvHashMap::default();
        for agent in instance.agents() {
            let values = std::iter::once(FREE_SLOT)
                .chain(attendance.meetings_of(agent).map(MeetingId::as_value))
                .collect::<Vec<_>>();

            let mut row = Vec::with_capacity(options.timeslots as usize);
            for slot in 0..options.timeslots as usize {
                let cell = solver.new_sparse_integer(values.clone());
                for &value in &values {
                    let literal = solver.new_literal_for_predicate(predicate!(cell == value), tag);
                    let _ = holds.insert((agent, slot, value), literal);
                }
                row.push(cell);
            }
            calendars.push(row.into_boxed_slice());
        }

        let model = CalendarModel {
            calendars: calendars.into(),
            holds,
            timeslots: options.timeslots as usize,
            gap_rule: options.gap_rule,
        };

        let mut num_travel_clauses = 0;
        let result = model
            .post_occurrences(solver, instance, timeslots)
            .and_then(|_| model.post_synchronisation(solver, instance))
            .and_then(|_| {
                num_travel_clauses = model.post_travel(solver, instance)?;
                Ok(())
            });
        log_root_failure(result, "calendar");

        debug!(
            "Calendar model: {} agents with {timeslots} slots, {num_travel_clauses} travel clauses",
            instance.num_agents()
        );

        Ok(model)
    }

    fn post_occurrences(
        &self,
        solver: &mut Solver,
        instance: &InstanceModel,
        timeslots: i32,
    ) -> Result<(), ConstraintOperationError> {
        let tag = solver.new_constraint_tag();

        for agent in instance.agents() {
            for meeting in instance.attendance().meetings_of(agent) {
                let occurrences = self.column(agent, meeting.as_value());
                solver
                    .add_constraint(constraints::equals(occurrences, 1, tag))
                    .post()?;
            }

            let num_attended = instance.attendance().num_attended(agent) as i32;
            solver
                .add_constraint(constraints::equals(
                    self.column(agent, FREE_SLOT),
                    timeslots - num_attended,
                    tag,
                ))
                .post()?;
        }

        Ok(())
    }

    /// Chains `cal[a_i][s] = m -> cal[a_{i+1}][s] = m` over the attendees of every shared meeting,
    /// closing the chain back to the first attendee.
    fn post_synchronisation(
        &self,
        solver: &mut Solver,
        instance: &InstanceModel,
    ) -> Result<(), ConstraintOperationError> {
        let tag = solver.new_constraint_tag();

        for meeting in instance.meetings() {
            let attendees = instance
                .attendance()
                .attendees_of(meeting)
                .collect::<Vec<_>>();
            if attendees.len() < 2 {
                continue;
            }

            for slot in 0..self.timeslots {
                let holds_meeting = attendees
                    .iter()
                    .map(|&agent| self.holds(agent, slot, meeting.as_value()))
                    .collect::<Vec<_>>();

                for (index, &current) in holds_meeting.iter().enumerate() {
                    let next = holds_meeting[(index + 1) % holds_meeting.len()];
                    solver
                        .add_constraint(constraints::clause([!current, next], tag))
                        .post()?;
                }
            }
        }

        Ok(())
    }

    /// Posts, for every agent, slots `j < k` and meetings `m1 != m2` whose distance forbids a gap
    /// of `k - j`, the clause `cal[a][j] != m1 \/ cal[a][k] != m2 \/ (some slot in between is
    /// occupied)`. Returns the number of clauses.
    fn post_travel(
        &self,
        solver: &mut Solver,
        instance: &InstanceModel,
    ) -> Result<usize, ConstraintOperationError> {
        let tag = solver.new_constraint_tag();
        let mut num_clauses = 0;

        for agent in instance.agents() {
            let meetings = instance
                .attendance()
                .meetings_of(agent)
                .collect::<Vec<_>>();
            let Some(largest_gap) = meetings
                .iter()
                .flat_map(|&first| {
                    meetings
                        .iter()
                        .filter(move |&&second| second != first)
                        .map(move |&second| instance.distances().get(first, second))
                })
                .map(|distance| self.gap_rule.minimum_gap(distance))
                .max()
            else {
                continue;
            };

            for first_slot in 0..self.timeslots {
                let last_slot = (first_slot as i64 + largest_gap).min(self.timeslots as i64);
                for second_slot in first_slot + 1..last_slot as usize {
                    let gap = (second_slot - first_slot) as i64;

                    for &first in &meetings {
                        for &second in meetings.iter().filter(|&&second| second != first) {
                            let distance = instance.distances().get(first, second);
                            if self.gap_rule.allows(gap, distance) {
                                continue;
                            }

                            let mut literals = vec![
                                !self.holds(agent, first_slot, first.as_value()),
                                !self.holds(agent, second_slot, second.as_value()),
                            ];
                            literals.extend(
                                (first_slot + 1..second_slot)
                                    .map(|between| !self.holds(agent, between, FREE_SLOT)),
                            );

                            solver
                                .add_constraint(constraints::clause(literals, tag))
                                .post()?;
                            num_clauses += 1;
                        }
                    }
                }
            }
        }

        Ok(num_clauses)
    }

    /// The literal `[cal[agent][slot] == value]`, for a value in the domain of that slot.
    fn holds(&self, agent: AgentId, slot: usize, value: i32) -> Literal {
        self.holds[&(agent, slot, value)]
    }

    /// The literals `[cal[agent][s] == value]` for every slot `s`, in order.
    fn column(&self, agent: AgentId, value: i32) -> Vec<Literal> {
        (0..self.timeslots)
            .map(|slot| self.holds(agent, slot, value))
            .collect()
    }

    pub fn calendar_variable(&self, agent: AgentId, slot: usize) -> DomainId {
        self.calendars[agent.index()][slot]
    }

    /// The slots of `agent`, in order.
    pub fn row(&self, agent: AgentId) -> &[DomainId] {
        &self.calendars[agent.index()]
    }

    pub fn num_agents(&self) -> usize {
        self.calendars.len()
    }

    pub fn timeslots(&self) -> usize {
        self.timeslots
    }

    pub fn gap_rule(&self) -> GapRule {
        self.gap_rule
    }

    /// A brancher over the calendar slots, smallest domain first, free before any meeting. The
    /// default search of `solver` fixes whatever the slots leave open.
    pub fn brancher(&self, solver: &Solver) -> DynamicBrancher {
        let cells = self.calendars.iter().flatten().copied().collect::<Vec<_>>();

        let mut brancher = DynamicBrancher::new(vec![]);
        if !cells.is_empty() {
            brancher.add_brancher(Box::new(IndependentVariableValueBrancher::new(
                FirstFail::new(&cells),
                InDomainMin,
            )));
        }
        brancher.add_brancher(Box::new(solver.default_brancher()));
        brancher
    }
}
