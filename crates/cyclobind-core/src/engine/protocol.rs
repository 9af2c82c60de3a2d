use crate::core::hotspot::HotspotSpec;
use crate::core::offset::{
    ChainLayout, OffsetError, OffsetMatrix, SignConvention, apply_cyclic_offset, linear_offset,
};
use crate::engine::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Fixbb,
    Hallucination,
    #[default]
    Binder,
    Partial,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Fixbb => "fixbb",
            Protocol::Hallucination => "hallucination",
            Protocol::Binder => "binder",
            Protocol::Partial => "partial",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine needs to prepare inputs, and the key the preparation cache
/// compares between trials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PrepRequest {
    pub pdb: String,                  // Path to a PDB file, or a PDB/UniProt code
    pub chain: String,                // Target chain id(s)
    pub binder_len: usize,            // Number of binder residues to hallucinate
    pub hotspot: Option<HotspotSpec>, // Target residues the interface loss is restricted to
    pub use_multimer: bool,           // Use AlphaFold-Multimer weights
    pub rm_target_seq: bool,          // Let the target backbone flex
}

/// Preparation state reported by the engine after `prep_inputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInputs {
    protocol: Protocol,
    target_len: usize,
    binder_len: usize,
    residue_index: Vec<i64>,
    offset: OffsetMatrix,
}

impl PreparedInputs {
    pub fn new(
        protocol: Protocol,
        target_len: usize,
        binder_len: usize,
        residue_index: Vec<i64>,
    ) -> Result<Self, EngineError> {
        let layout = ChainLayout::new(target_len, binder_len);
        if residue_index.len() != layout.total_len() {
            return Err(EngineError::Preparation(format!(
                "engine reported {} residue indices for a complex of {} target + {} binder residues",
                residue_index.len(),
                target_len,
                binder_len
            )));
        }
        let offset = linear_offset(&residue_index);
        Ok(Self {
            protocol,
            target_len,
            binder_len,
            residue_index,
            offset,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn binder_len(&self) -> usize {
        self.binder_len
    }

    pub fn residue_index(&self) -> &[i64] {
        &self.residue_index
    }

    pub fn layout(&self) -> ChainLayout {
        ChainLayout::new(self.target_len, self.binder_len)
    }

    /// Linear offset derived from the raw residue indices.
    pub fn linear_offset(&self) -> &OffsetMatrix {
        &self.offset
    }

    /// Returns a copy of the linear offset with the binder block replaced by the cyclic one.
    ///
    /// The linear offset held here is never modified, so repeated calls with the same
    /// arguments return identical matrices.
    pub fn cyclic_offset(
        &self,
        binder_len: usize,
        convention: SignConvention,
    ) -> Result<OffsetMatrix, OffsetError> {
        if self.protocol != Protocol::Binder {
            return Err(OffsetError::NoBinderSegment {
                protocol: self.protocol.as_str(),
            });
        }
        let mut offset = self.offset.clone();
        apply_cyclic_offset(&mut offset, self.layout(), binder_len, convention)?;
        Ok(offset)
    }
}
