//! Extracts schedules and calendars from solutions, checks them against the instance, and renders
//! them.
use std::fmt::Display;
use std::fmt::Formatter;

use pumpkin_core::results::ProblemSolution;
use thiserror::Error;

use crate::conflicts::ConflictSet;
use crate::instance::AgentId;
use crate::instance::InstanceModel;
use crate::instance::MeetingId;
use crate::model::CalendarModel;
use crate::model::GapRule;
use crate::model::TimeslotModel;
use crate::model::FREE_SLOT;

/// A solution which contradicts the instance it was built from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {expected} entries but the solution has {actual}")]
    WrongShape { expected: usize, actual: usize },

    #[error("meetings {first} and {second} are {gap} slots apart, but {distance} apart in travel")]
    TravelGap {
        first: MeetingId,
        second: MeetingId,
        gap: i64,
        distance: i32,
    },

    #[error("agent {agent} holds {value} in slot {slot}, which is not one of its meetings")]
    ForeignMeeting {
        agent: AgentId,
        slot: usize,
        value: i32,
    },

    #[error("agent {agent} holds meeting {meeting} {count} times instead of once")]
    MeetingOccurrences {
        agent: AgentId,
        meeting: MeetingId,
        count: usize,
    },

    #[error("agents {first} and {second} hold meeting {meeting} in different slots")]
    Unsynchronised {
        meeting: MeetingId,
        first: AgentId,
        second: AgentId,
    },

    #[error(
        "agent {agent} goes from {first} to {second} in {gap} slots, but they are {distance} apart"
    )]
    CalendarTravel {
        agent: AgentId,
        first: MeetingId,
        second: MeetingId,
        gap: i64,
        distance: i32,
    },
}

/// The timeslot of every meeting, taken from a solution of a [`TimeslotModel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    timeslots: Box<[i32]>,
    makespan: i32,
}

impl Schedule {
    /// The makespan is the value of the objective if the model has one, otherwise the latest
    /// timeslot.
    pub fn from_solution(model: &TimeslotModel, solution: &impl ProblemSolution) -> Schedule {
        let timeslots = model
            .schedule_variables()
            .iter()
            .map(|&slot| solution.get_integer_value(slot))
            .collect::<Box<[_]>>();
        let makespan = match model.makespan() {
            Some(makespan) => solution.get_integer_value(makespan),
            None => timeslots.iter().copied().max().unwrap_or(0),
        };

        Schedule {
            timeslots,
            makespan,
        }
    }

    pub fn timeslot(&self, meeting: MeetingId) -> i32 {
        self.timeslots[meeting.index()]
    }

    pub fn timeslots(&self) -> &[i32] {
        &self.timeslots
    }

    pub fn makespan(&self) -> i32 {
        self.makespan
    }

    /// Checks that every pair of conflicting meetings is separated according to `gap_rule`.
    pub fn validate(
        &self,
        instance: &InstanceModel,
        conflicts: &ConflictSet,
        gap_rule: GapRule,
    ) -> Result<(), ValidationError> {
        if self.timeslots.len() != instance.num_meetings() {
            return Err(ValidationError::WrongShape {
                expected: instance.num_meetings(),
                actual: self.timeslots.len(),
            });
        }

        for (first, second) in conflicts.pairs() {
            let gap = i64::from(self.timeslot(second)) - i64::from(self.timeslot(first));
            let distance = instance.distances().get(first, second);

            if !gap_rule.allows(gap, distance) {
                return Err(ValidationError::TravelGap {
                    first,
                    second,
                    gap: gap.abs(),
                    distance,
                });
            }
        }

        Ok(())
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (meeting, timeslot) in self.timeslots.iter().enumerate() {
            writeln!(f, "{meeting} {timeslot}")?;
        }
        Ok(())
    }
}

/// The slot-by-slot calendar of every agent, taken from a solution of a [`CalendarModel`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentCalendars {
    rows: Box<[Box<[i32]>]>,
}

impl AgentCalendars {
    pub fn from_solution(model: &CalendarModel, solution: &impl ProblemSolution) -> AgentCalendars {
        let rows = (0..model.num_agents())
            .map(|agent| {
                model
                    .row(AgentId::new(agent))
                    .iter()
                    .map(|&slot| solution.get_integer_value(slot))
                    .collect()
            })
            .collect();

        AgentCalendars { rows }
    }

    /// The meeting in every slot of `agent`'s calendar, or `-1` for a free slot.
    pub fn row(&self, agent: AgentId) -> &[i32] {
        &self.rows[agent.index()]
    }

    /// Checks that every agent holds each of its meetings exactly once and nothing else, that
    /// attendees agree on the slot of a meeting, and that consecutive meetings of an agent are
    /// separated according to `gap_rule`.
    pub fn validate(
        &self,
        instance: &InstanceModel,
        gap_rule: GapRule,
    ) -> Result<(), ValidationError> {
        if self.rows.len() != instance.num_agents() {
            return Err(ValidationError::WrongShape {
                expected: instance.num_agents(),
                actual: self.rows.len(),
            });
        }

        for agent in instance.agents() {
            self.validate_row(instance, agent, gap_rule)?;
        }

        for meeting in instance.meetings() {
            let mut attendees = instance.attendance().attendees_of(meeting);
            let Some(first) = attendees.next() else {
                continue;
            };
            let slot = self.slot_of(first, meeting);

            if let Some(second) = attendees.find(|&other| self.slot_of(other, meeting) != slot) {
                return Err(ValidationError::Unsynchronised {
                    meeting,
                    first,
                    second,
                });
            }
        }

        Ok(())
    }

    fn validate_row(
        &self,
        instance: &InstanceModel,
        agent: AgentId,
        gap_rule: GapRule,
    ) -> Result<(), ValidationError> {
        let row = self.row(agent);
        let attendance = instance.attendance();

        let mut occupied = Vec::new();
        for (slot, &value) in row.iter().enumerate() {
            if value == FREE_SLOT {
                continue;
            }

            let meeting = usize::try_from(value)
                .ok()
                .filter(|&index| index < instance.num_meetings())
                .map(MeetingId::new)
                .filter(|&meeting| attendance.attends(agent, meeting))
                .ok_or(ValidationError::ForeignMeeting { agent, slot, value })?;
            occupied.push((slot, meeting));
        }

        for meeting in attendance.meetings_of(agent) {
            let count = occupied
                .iter()
                .filter(|&&(_, held)| held == meeting)
                .count();
            if count != 1 {
                return Err(ValidationError::MeetingOccurrences {
                    agent,
                    meeting,
                    count,
                });
            }
        }

        for window in occupied.windows(2) {
            let (first_slot, first) = window[0];
            let (second_slot, second) = window[1];
            let gap = (second_slot - first_slot) as i64;
            let distance = instance.distances().get(first, second);

            if !gap_rule.allows(gap, distance) {
                return Err(ValidationError::CalendarTravel {
                    agent,
                    first,
                    second,
                    gap,
                    distance,
                });
            }
        }

        Ok(())
    }

    fn slot_of(&self, agent: AgentId, meeting: MeetingId) -> Option<usize> {
        self.row(agent)
            .iter()
            .position(|&value| value == meeting.as_value())
    }
}

impl Display for AgentCalendars {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (agent, row) in self.rows.iter().enumerate() {
            write!(f, "agent: {agent}: |")?;
            for value in row.iter() {
                write!(f, "{value}|")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
