use phf::{Set, phf_set};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

static CANONICAL_RESIDUES: Set<char> = phf_set! {
    'A', 'R', 'N', 'D', 'C', 'Q', 'E', 'G', 'H', 'I',
    'L', 'K', 'M', 'F', 'P', 'S', 'T', 'W', 'Y', 'V',
};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SequenceError {
    #[error("Non-canonical residue '{residue}' at position {position} in seed sequence")]
    NonCanonical { residue: char, position: usize },
}

/// One-letter binder sequence used to initialize a design instead of a random start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SeedSequence(String);

impl SeedSequence {
    /// Upper-cases `raw` and drops everything outside `A-Z`.
    ///
    /// Returns `None` when nothing is left, which callers treat as "no seed".
    pub fn sanitize(raw: &str) -> Result<Option<Self>, SequenceError> {
        let cleaned: String = raw
            .chars()
            .map(|c| c.to_ascii_uppercase())
            .filter(char::is_ascii_uppercase)
            .collect();

        if cleaned.is_empty() {
            return Ok(None);
        }
        if let Some((position, residue)) = cleaned
            .chars()
            .enumerate()
            .find(|(_, c)| !CANONICAL_RESIDUES.contains(c))
        {
            return Err(SequenceError::NonCanonical { residue, position });
        }
        Ok(Some(Self(cleaned)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SeedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_uppercases_and_strips_non_letters() {
        let seq = SeedSequence::sanitize(" acdE-fg 12\nhik").unwrap().unwrap();
        assert_eq!(seq.as_str(), "ACDEFGHIK");
        assert_eq!(seq.len(), 9);
    }

    #[test]
    fn sanitize_returns_none_for_blank_input() {
        assert_eq!(SeedSequence::sanitize("").unwrap(), None);
        assert_eq!(SeedSequence::sanitize(" 1-2 ").unwrap(), None);
    }

    #[test]
    fn sanitize_rejects_non_canonical_letters() {
        assert_eq!(
            SeedSequence::sanitize("ACXD"),
            Err(SequenceError::NonCanonical {
                residue: 'X',
                position: 2
            })
        );
    }
}
