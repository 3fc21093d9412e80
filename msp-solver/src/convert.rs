//! Converts the CSPLib distribution format of the problem into the instance format read by
//! [`parse_instance`](crate::instance::parse_instance).
//!
//! A CSPLib file holds several instances back to back. Every instance is a fixed sequence of
//! labels and numbers; only the numbers are read, the labels are skipped by position:
//!
//! ```text
//! <2 tokens>                       title
//! <2 tokens> n                     number of meetings
//! <2 tokens> m                     number of agents
//! <2 tokens> k                     number of meetings per agent
//! <8 tokens> domain                domain size
//! <2 tokens>                       attendance header
//! <2 tokens> j_1 .. j_k            meetings of each agent, m times
//! <3 + n tokens>                   distance header
//! <1 token> d_1 .. d_n             distances from each meeting, n times
//! <3 tokens>                       trailer
//! ```
use std::fmt::Display;
use std::fmt::Formatter;
use std::fs;
use std::io::Read;
use std::iter::Peekable;
use std::path::Path;
use std::path::PathBuf;
use std::str::SplitWhitespace;

use log::debug;
use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read or write an instance file")]
    Io(#[from] std::io::Error),

    #[error("instance {instance} ended while reading {reading}")]
    Truncated { instance: usize, reading: String },

    #[error("instance {instance}: '{token}' is not a valid number")]
    InvalidNumber { instance: usize, token: String },

    #[error("instance {instance}: {reading} must not be negative, got {value}")]
    NegativeCount {
        instance: usize,
        reading: &'static str,
        value: i32,
    },

    #[error(
        "instance {instance}: agent {agent} attends meeting {meeting}, but there are only {num_meetings} meetings"
    )]
    MeetingOutOfRange {
        instance: usize,
        agent: usize,
        meeting: i32,
        num_meetings: usize,
    },
}

/// One instance read from a CSPLib file. Its [`Display`] implementation renders it in the
/// instance format of this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsplibInstance {
    domain_size: i32,
    attendance: Box<[Box<[bool]>]>,
    distances: Box<[Box<[i32]>]>,
}

impl CsplibInstance {
    pub fn num_meetings(&self) -> usize {
        self.distances.len()
    }

    pub fn num_agents(&self) -> usize {
        self.attendance.len()
    }

    pub fn domain_size(&self) -> i32 {
        self.domain_size
    }
}

impl Display for CsplibInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {} {}",
            self.num_meetings(),
            self.num_agents(),
            self.domain_size
        )?;

        writeln!(f)?;
        for (agent, row) in self.attendance.iter().enumerate() {
            write!(f, "{agent}:")?;
            for &attends in row.iter() {
                write!(f, " {}", u8::from(attends))?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        for (meeting, row) in self.distances.iter().enumerate() {
            write!(f, "{meeting}:")?;
            for distance in row.iter() {
                write!(f, " {distance}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Reads every instance in a CSPLib file.
pub fn read_csplib(mut source: impl Read) -> Result<Vec<CsplibInstance>, ConvertError> {
    let mut contents = String::new();
    let _ = source.read_to_string(&mut contents)?;

    let mut tokens = contents.split_whitespace().peekable();
    let mut instances = Vec::new();

    while tokens.peek().is_some() {
        let mut reader = InstanceReader {
            tokens: &mut tokens,
            instance: instances.len() + 1,
        };
        instances.push(reader.read()?);
    }

    debug!("Read {} instances", instances.len());
    Ok(instances)
}

/// Writes every instance to `problem<k>.txt` in `directory`, with `k` counting from 1. Returns
/// the written paths in order.
pub fn write_instances(
    instances: &[CsplibInstance],
    directory: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ConvertError> {
    instances
        .iter()
        .enumerate()
        .map(|(index, instance)| {
            let path = directory.as_ref().join(format!("problem{}.txt", index + 1));
            fs::write(&path, instance.to_string())?;
            info!("Wrote {}", path.display());
            Ok(path)
        })
        .collect()
}

struct InstanceReader<'a, 'b> {
    tokens: &'a mut Peekable<SplitWhitespace<'b>>,
    /// The 1-based position of the instance in the file.
    instance: usize,
}

impl InstanceReader<'_, '_> {
    fn read(&mut self) -> Result<CsplibInstance, ConvertError> {
        self.skip(2, "the title")?;
        let num_meetings = self.count_after(2, "the number of meetings")?;
        let num_agents = self.count_after(2, "the number of agents")?;
        let meetings_per_agent = self.count_after(2, "the number of meetings per agent")?;
        self.skip(8, "the domain size")?;
        let domain_size = self.integer("the domain size")?;

        self.skip(2, "the attendance header")?;
        let mut attendance = vec![vec![false; num_meetings].into_boxed_slice(); num_agents];
        for (agent, row) in attendance.iter_mut().enumerate() {
            self.skip(2, "an agent label")?;
            for _ in 0..meetings_per_agent {
                let meeting = self.integer("the meetings of an agent")?;
                let index = usize::try_from(meeting)
                    .ok()
                    .filter(|&index| index < num_meetings)
                    .ok_or(ConvertError::MeetingOutOfRange {
                        instance: self.instance,
                        agent,
                        meeting,
                        num_meetings,
                    })?;
                row[index] = true;
            }
        }

        self.skip(3 + num_meetings, "the distance header")?;
        let mut distances = Vec::with_capacity(num_meetings);
        for _ in 0..num_meetings {
            self.skip(1, "a meeting label")?;
            let row = (0..num_meetings)
                .map(|_| self.integer("the distances"))
                .collect::<Result<Box<[_]>, _>>()?;
            distances.push(row);
        }
        self.skip(3, "the trailer")?;

        debug!(
            "Instance {}: {num_meetings} meetings, {num_agents} agents, domain size {domain_size}",
            self.instance
        );

        Ok(CsplibInstance {
            domain_size,
            attendance: attendance.into(),
            distances: distances.into(),
        })
    }

    fn next_token(&mut self, reading: &str) -> Result<&str, ConvertError> {
        self.tokens.next().ok_or_else(|| ConvertError::Truncated {
            instance: self.instance,
            reading: reading.to_owned(),
        })
    }

    fn skip(&mut self, count: usize, reading: &str) -> Result<(), ConvertError> {
        for _ in 0..count {
            let _ = self.next_token(reading)?;
        }
        Ok(())
    }

    fn integer(&mut self, reading: &str) -> Result<i32, ConvertError> {
        let instance = self.instance;
        let token = self.next_token(reading)?;
        token.parse().map_err(|_| ConvertError::InvalidNumber {
            instance,
            token: token.to_owned(),
        })
    }

    /// Skips `labels` tokens and reads a non-negative count.
    fn count_after(&mut self, labels: usize, reading: &'static str) -> Result<usize, ConvertError> {
        self.skip(labels, reading)?;
        let value = self.integer(reading)?;
        usize::try_from(value).map_err(|_| ConvertError::NegativeCount {
            instance: self.instance,
            reading,
            value,
        })
    }
}
