//! An upper bound on the number of timeslots a schedule needs.
use crate::instance::DistanceMatrix;
use crate::instance::MeetingId;

/// Returns `Σ (distance[i][i + 1] + 1)` over consecutive meetings.
///
/// When the distances obey the triangle inequality, holding the meetings one after the other in
/// index order, each separated by the travel distance to the next, is a valid schedule, so the
/// result bounds the makespan from above. It is not tight. The sum is computed in 64 bits; callers
/// decide whether it fits their domains.
pub fn estimate_horizon(distances: &DistanceMatrix) -> i64 {
    (1..distances.num_meetings())
        .map(|index| {
            let distance = distances.get(MeetingId::new(index - 1), MeetingId::new(index));
            i64::from(distance) + 1
        })
        .sum()
}
