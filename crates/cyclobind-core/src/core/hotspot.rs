use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum HotspotError {
    #[error("Empty entry at position {position} in hotspot list '{input}'")]
    EmptyEntry { input: String, position: usize },

    #[error("Invalid residue number '{token}' in hotspot list")]
    InvalidNumber { token: String },

    #[error("Reversed range {start}-{end} in hotspot list")]
    ReversedRange { start: u32, end: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotspotRange {
    pub start: u32,
    pub end: u32, // inclusive
}

impl HotspotRange {
    pub(crate) fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

impl fmt::Display for HotspotRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Target residues the interface loss is restricted to, written as `"36,37,39-42"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HotspotSpec {
    ranges: Vec<HotspotRange>,
}

impl HotspotSpec {
    /// Parses a hotspot list. A blank string means "no hotspot restriction".
    pub fn parse(input: &str) -> Result<Option<Self>, HotspotError> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let mut ranges = Vec::new();
        for (position, entry) in input.split(',').enumerate() {
            let entry = entry.trim();
            if entry.is_empty() {
                return Err(HotspotError::EmptyEntry {
                    input: input.to_string(),
                    position,
                });
            }
            ranges.push(parse_entry(entry)?);
        }
        Ok(Some(Self { ranges }))
    }

    pub fn ranges(&self) -> &[HotspotRange] {
        &self.ranges
    }

    pub fn residues(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|r| r.start..=r.end)
    }

    pub fn residue_count(&self) -> usize {
        self.ranges.iter().map(HotspotRange::len).sum()
    }
}

fn parse_entry(entry: &str) -> Result<HotspotRange, HotspotError> {
    let number = |token: &str| {
        let token = token.trim();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(HotspotError::InvalidNumber {
                token: token.to_string(),
            });
        }
        token.parse::<u32>().map_err(|_| HotspotError::InvalidNumber {
            token: token.to_string(),
        })
    };

    match entry.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (number(start)?, number(end)?);
            if start > end {
                return Err(HotspotError::ReversedRange { start, end });
            }
            Ok(HotspotRange { start, end })
        }
        None => {
            let n = number(entry)?;
            Ok(HotspotRange { start: n, end: n })
        }
    }
}

impl FromStr for HotspotSpec {
    type Err = HotspotError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)?.ok_or(HotspotError::EmptyEntry {
            input: s.to_string(),
            position: 0,
        })
    }
}

impl fmt::Display for HotspotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl Serialize for HotspotSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HotspotSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
