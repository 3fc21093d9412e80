//! Derives which meetings may share a timeslot.
use fnv::FnvHashSet;
use log::debug;

use crate::instance::AgentId;
use crate::instance::AttendanceMatrix;
use crate::instance::MeetingId;

/// The unordered pairs of meetings which have at least one attendee in common, and can therefore
/// not be held in parallel.
#[derive(Clone, Debug, Default)]
pub struct ConflictSet {
    /// Every pair `(first, second)` with `first < second`, sorted.
    pairs: Vec<(MeetingId, MeetingId)>,
    lookup: FnvHashSet<(MeetingId, MeetingId)>,
}

impl ConflictSet {
    /// Builds the set by listing the meetings of every agent and recording all pairs within each
    /// list.
    pub fn from_attendance(attendance: &AttendanceMatrix) -> ConflictSet {
        let mut lookup = FnvHashSet::default();

        for agent in (0..attendance.num_agents()).map(AgentId::new) {
            let meetings = attendance.meetings_of(agent).collect::<Vec<_>>();
            for (index, &first) in meetings.iter().enumerate() {
                for &second in &meetings[index + 1..] {
                    let _ = lookup.insert((first, second));
                }
            }
        }

        let mut pairs = lookup.iter().copied().collect::<Vec<_>>();
        pairs.sort_unstable();

        debug!("Found {} pairs of meetings which cannot run in parallel", pairs.len());
        ConflictSet { pairs, lookup }
    }

    /// Returns `false` iff at least one agent attends both meetings.
    ///
    /// # Panics
    /// If `first == second`; a meeting is neither parallel nor in conflict with itself.
    pub fn can_run_in_parallel(&self, first: MeetingId, second: MeetingId) -> bool {
        assert_ne!(
            first, second,
            "parallelism is only defined for distinct meetings"
        );
        !self.lookup.contains(&ordered(first, second))
    }

    /// The conflicting pairs, each with the smaller meeting first, in increasing order.
    pub fn pairs(&self) -> impl Iterator<Item = (MeetingId, MeetingId)> + '_ {
        self.pairs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn ordered(first: MeetingId, second: MeetingId) -> (MeetingId, MeetingId) {
    if first < second {
        (first, second)
    } else {
        (second, first)
    }
}
