use std::io::Read;
use std::str::SplitWhitespace;

use log::debug;

use super::InstanceError;
use super::InstanceModel;

/// Parses an instance in the whitespace-separated format
///
/// ```text
/// nMeetings mAgents timeslots
/// <label> b_0 ... b_{n-1}        (one row per agent)
/// <label> d_0 ... d_{n-1}        (one row per meeting)
/// ```
///
/// Labels are skipped without being interpreted. Anything after the distance matrix is an error.
pub fn parse_instance(mut source: impl Read) -> Result<InstanceModel, InstanceError> {
    let mut contents = String::new();
    let _ = source.read_to_string(&mut contents)?;

    let mut tokens = Tokens {
        inner: contents.split_whitespace(),
    };

    let num_meetings = tokens.next_integer("the number of meetings")?;
    let num_agents = tokens.next_integer("the number of agents")?;
    let header_timeslots = tokens.next_integer("the number of timeslots")?;

    if num_meetings <= 0 {
        return Err(InstanceError::NoMeetings(num_meetings));
    }
    if num_agents <= 0 {
        return Err(InstanceError::NoAgents(num_agents));
    }

    let attendance = (0..num_agents)
        .map(|agent| tokens.next_row(num_meetings, || format!("the attendance of agent {agent}")))
        .collect::<Result<Vec<_>, _>>()?;
    let distances = (0..num_meetings)
        .map(|meeting| {
            tokens.next_row(num_meetings, || {
                format!("the distances from meeting {meeting}")
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(token) = tokens.inner.next() {
        return Err(InstanceError::TrailingTokens(token.to_owned()));
    }

    debug!("Parsed an instance with {num_meetings} meetings and {num_agents} agents");
    InstanceModel::from_rows(header_timeslots, &attendance, &distances)
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next_token(&mut self, reading: impl FnOnce() -> String) -> Result<&'a str, InstanceError> {
        self.inner
            .next()
            .ok_or_else(|| InstanceError::Truncated(reading()))
    }

    fn next_integer(&mut self, reading: &'static str) -> Result<i32, InstanceError> {
        let token = self.next_token(|| reading.to_owned())?;
        token.parse().map_err(|_| InstanceError::InvalidToken {
            token: token.to_owned(),
            expected: "integer",
        })
    }

    /// Reads a label followed by `length` integers.
    fn next_row(
        &mut self,
        length: i32,
        reading: impl Fn() -> String,
    ) -> Result<Vec<i32>, InstanceError> {
        let _label = self.next_token(&reading)?;
        (0..length)
            .map(|_| {
                let token = self.next_token(&reading)?;
                token.parse().map_err(|_| InstanceError::InvalidToken {
                    token: token.to_owned(),
                    expected: "integer",
                })
            })
            .collect()
    }
}
