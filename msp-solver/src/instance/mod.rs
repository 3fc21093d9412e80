//! The in-memory representation of a Meeting Scheduling Problem instance.
//!
//! An [`InstanceModel`] is immutable once constructed. Both matrices are validated on
//! construction, so the rest of the crate can index them without further checks.
mod parser;

use std::fmt::Display;
use std::fs::File;
use std::path::Path;

pub use parser::parse_instance;
use thiserror::Error;

/// An agent, identified by its row in the attendance matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

/// A meeting, identified by its column in the attendance matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeetingId(u32);

impl AgentId {
    pub fn new(index: usize) -> Self {
        AgentId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MeetingId {
    pub fn new(index: usize) -> Self {
        MeetingId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The value which represents this meeting in a calendar variable.
    pub fn as_value(self) -> i32 {
        self.0 as i32
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("failed to read instance file")]
    Io(#[from] std::io::Error),

    #[error("the instance ended while reading {0}")]
    Truncated(String),

    #[error("'{token}' is not a valid {expected}")]
    InvalidToken {
        token: String,
        expected: &'static str,
    },

    #[error("the number of meetings must be positive, got {0}")]
    NoMeetings(i32),

    #[error("the number of agents must be positive, got {0}")]
    NoAgents(i32),

    #[error("attendance of agent {agent} at meeting {meeting} is {value}, expected 0 or 1")]
    InvalidAttendance {
        agent: usize,
        meeting: usize,
        value: i32,
    },

    #[error("the distance between meetings {first} and {second} is negative ({distance})")]
    NegativeDistance {
        first: usize,
        second: usize,
        distance: i32,
    },

    #[error("the distance from meeting {meeting} to itself is {distance}, expected 0")]
    NonZeroDiagonal { meeting: usize, distance: i32 },

    #[error(
        "the distance matrix is not symmetric: d({first}, {second}) = {forward} but d({second}, {first}) = {backward}"
    )]
    AsymmetricDistance {
        first: usize,
        second: usize,
        forward: i32,
        backward: i32,
    },

    #[error("expected a {expected_rows}x{expected_columns} matrix for {matrix}")]
    WrongDimensions {
        matrix: &'static str,
        expected_rows: usize,
        expected_columns: usize,
    },

    #[error("unexpected token '{0}' after the distance matrix")]
    TrailingTokens(String),
}

/// Which agent attends which meeting, stored row-major by agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendanceMatrix {
    num_agents: usize,
    num_meetings: usize,
    attends: Box<[bool]>,
}

impl AttendanceMatrix {
    pub fn num_agents(&self) -> usize {
        self.num_agents
    }

    pub fn num_meetings(&self) -> usize {
        self.num_meetings
    }

    pub fn attends(&self, agent: AgentId, meeting: MeetingId) -> bool {
        assert!(meeting.index() < self.num_meetings);
        self.attends[agent.index() * self.num_meetings + meeting.index()]
    }

    /// The meetings attended by `agent`, in increasing order.
    pub fn meetings_of(&self, agent: AgentId) -> impl Iterator<Item = MeetingId> + '_ {
        let row = &self.attends[agent.index() * self.num_meetings..][..self.num_meetings];
        row.iter()
            .enumerate()
            .filter(|&(_, &attends)| attends)
            .map(|(index, _)| MeetingId::new(index))
    }

    /// The agents attending `meeting`, in increasing order.
    pub fn attendees_of(&self, meeting: MeetingId) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.num_agents)
            .map(AgentId::new)
            .filter(move |&agent| self.attends(agent, meeting))
    }

    pub fn num_attended(&self, agent: AgentId) -> usize {
        self.meetings_of(agent).count()
    }

    /// Returns `true` if some agent attends both meetings. This checks every agent, see
    /// [`crate::conflicts::ConflictSet`] for the precomputed version.
    pub fn share_attendee(&self, first: MeetingId, second: MeetingId) -> bool {
        (0..self.num_agents)
            .map(AgentId::new)
            .any(|agent| self.attends(agent, first) && self.attends(agent, second))
    }
}

/// The travel distances between meetings. Symmetric, non-negative and zero on the diagonal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    num_meetings: usize,
    distances: Box<[i32]>,
}

impl DistanceMatrix {
    pub fn num_meetings(&self) -> usize {
        self.num_meetings
    }

    pub fn get(&self, first: MeetingId, second: MeetingId) -> i32 {
        assert!(second.index() < self.num_meetings);
        self.distances[first.index() * self.num_meetings + second.index()]
    }

    /// The largest distance between any two meetings.
    pub fn max_distance(&self) -> i32 {
        self.distances.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceModel {
    attendance: AttendanceMatrix,
    distances: DistanceMatrix,
    header_timeslots: i32,
}

impl InstanceModel {
    /// Creates an instance from its rows, validating both matrices.
    ///
    /// `attendance` has one row per agent with a 0/1 entry per meeting; `distances` has one row
    /// per meeting.
    pub fn from_rows(
        header_timeslots: i32,
        attendance: &[Vec<i32>],
        distances: &[Vec<i32>],
    ) -> Result<InstanceModel, InstanceError> {
        let num_agents = attendance.len();
        let num_meetings = distances.len();

        if num_meetings == 0 {
            return Err(InstanceError::NoMeetings(0));
        }
        if num_agents == 0 {
            return Err(InstanceError::NoAgents(0));
        }

        if attendance.iter().any(|row| row.len() != num_meetings) {
            return Err(InstanceError::WrongDimensions {
                matrix: "the attendance",
                expected_rows: num_agents,
                expected_columns: num_meetings,
            });
        }
        if distances.iter().any(|row| row.len() != num_meetings) {
            return Err(InstanceError::WrongDimensions {
                matrix: "the distances",
                expected_rows: num_meetings,
                expected_columns: num_meetings,
            });
        }

        let mut attends = Vec::with_capacity(num_agents * num_meetings);
        for (agent, row) in attendance.iter().enumerate() {
            for (meeting, &value) in row.iter().enumerate() {
                match value {
                    0 => attends.push(false),
                    1 => attends.push(true),
                    _ => {
                        return Err(InstanceError::InvalidAttendance {
                            agent,
                            meeting,
                            value,
                        })
                    }
                }
            }
        }

        for (first, row) in distances.iter().enumerate() {
            for (second, &distance) in row.iter().enumerate() {
                if distance < 0 {
                    return Err(InstanceError::NegativeDistance {
                        first,
                        second,
                        distance,
                    });
                }
                if first == second && distance != 0 {
                    return Err(InstanceError::NonZeroDiagonal {
                        meeting: first,
                        distance,
                    });
                }
                let backward = distances[second][first];
                if backward != distance {
                    return Err(InstanceError::AsymmetricDistance {
                        first,
                        second,
                        forward: distance,
                        backward,
                    });
                }
            }
        }

        Ok(InstanceModel {
            attendance: AttendanceMatrix {
                num_agents,
                num_meetings,
                attends: attends.into(),
            },
            distances: DistanceMatrix {
                num_meetings,
                distances: distances.iter().flatten().copied().collect(),
            },
            header_timeslots,
        })
    }

    /// Reads and parses the instance stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<InstanceModel, InstanceError> {
        parse_instance(File::open(path)?)
    }

    pub fn num_meetings(&self) -> usize {
        self.attendance.num_meetings
    }

    pub fn num_agents(&self) -> usize {
        self.attendance.num_agents
    }

    pub fn meetings(&self) -> impl Iterator<Item = MeetingId> {
        (0..self.num_meetings()).map(MeetingId::new)
    }

    pub fn agents(&self) -> impl Iterator<Item = AgentId> {
        (0..self.num_agents()).map(AgentId::new)
    }

    pub fn attendance(&self) -> &AttendanceMatrix {
        &self.attendance
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// The third field of the header: the number of timeslots for the calendar encoding, or a
    /// horizon for the timeslot encoding. It is read as is; the encodings which use it reject a
    /// negative value.
    pub fn header_timeslots(&self) -> i32 {
        self.header_timeslots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_instance() -> InstanceModel {
        InstanceModel::from_rows(
            6,
            &[vec![1, 1, 0], vec![0, 1, 1]],
            &[vec![0, 2, 2], vec![2, 0, 2], vec![2, 2, 0]],
        )
        .expect("valid instance")
    }

    #[test]
    fn attendance_is_queried_per_agent_and_meeting() {
        let instance = chain_instance();
        let attendance = instance.attendance();

        assert!(attendance.attends(AgentId::new(0), MeetingId::new(0)));
        assert!(!attendance.attends(AgentId::new(0), MeetingId::new(2)));
        assert_eq!(
            attendance.meetings_of(AgentId::new(1)).collect::<Vec<_>>(),
            vec![MeetingId::new(1), MeetingId::new(2)]
        );
        assert_eq!(
            attendance.attendees_of(MeetingId::new(1)).collect::<Vec<_>>(),
            vec![AgentId::new(0), AgentId::new(1)]
        );
        assert_eq!(attendance.num_attended(AgentId::new(0)), 2);
    }

    #[test]
    fn share_attendee_checks_every_agent() {
        let instance = chain_instance();
        let attendance = instance.attendance();

        assert!(attendance.share_attendee(MeetingId::new(0), MeetingId::new(1)));
        assert!(attendance.share_attendee(MeetingId::new(2), MeetingId::new(1)));
        assert!(!attendance.share_attendee(MeetingId::new(0), MeetingId::new(2)));
    }

    #[test]
    fn asymmetric_distances_are_rejected() {
        let result = InstanceModel::from_rows(3, &[vec![1, 1]], &[vec![0, 2], vec![3, 0]]);

        assert!(matches!(
            result,
            Err(InstanceError::AsymmetricDistance {
                first: 0,
                second: 1,
                forward: 2,
                backward: 3
            })
        ));
    }

    #[test]
    fn non_zero_diagonal_is_rejected() {
        let result = InstanceModel::from_rows(3, &[vec![1, 1]], &[vec![1, 2], vec![2, 0]]);

        assert!(matches!(
            result,
            Err(InstanceError::NonZeroDiagonal {
                meeting: 0,
                distance: 1
            })
        ));
    }

    #[test]
    fn attendance_must_be_binary() {
        let result = InstanceModel::from_rows(3, &[vec![1, 2]], &[vec![0, 2], vec![2, 0]]);

        assert!(matches!(
            result,
            Err(InstanceError::InvalidAttendance {
                agent: 0,
                meeting: 1,
                value: 2
            })
        ));
    }

    #[test]
    fn empty_dimensions_are_rejected() {
        assert!(matches!(
            InstanceModel::from_rows(3, &[], &[vec![0]]),
            Err(InstanceError::NoAgents(0))
        ));
        assert!(matches!(
            InstanceModel::from_rows(3, &[vec![]], &[]),
            Err(InstanceError::NoMeetings(0))
        ));
    }

    #[test]
    fn negative_header_field_is_kept_as_read() {
        let instance = InstanceModel::from_rows(-2, &[vec![1, 1]], &[vec![0, 2], vec![2, 0]])
            .expect("the header field is not validated when reading");

        assert_eq!(instance.header_timeslots(), -2);
    }

    #[test]
    fn max_distance_is_the_largest_entry() {
        assert_eq!(chain_instance().distances().max_distance(), 2);
    }
}
