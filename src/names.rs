//! Positional placeholder names used when handing a block to an external tool.
//!
//! MAF source names (`hg38.chr1`) contain characters that many aligners
//! mangle or truncate, so every row is sent as `seq0`, `seq1`, ... in block
//! order and mapped back by position afterwards.

use crate::alignment::{AlignedSequence, Alignment};
use crate::block::AlignmentBlock;
use crate::error::{RealignError, Result};
use crate::types::{HashSet, HashSetExt, RowIdx};

const PREFIX: &str = "seq";

pub fn synthetic_name(idx: RowIdx) -> String {
    format!("{PREFIX}{idx}")
}

/// Block-scoped mapping between row positions, original names and synthetic names.
#[derive(Debug, Clone)]
pub struct NameMap {
    originals: Vec<String>,
}

impl NameMap {
    pub fn for_block(block: &AlignmentBlock) -> Self {
        Self { originals: block.sequences.iter().map(|s| s.src.clone()).collect() }
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    pub fn synthetic(&self, idx: RowIdx) -> String {
        synthetic_name(idx)
    }

    pub fn synthetic_names(&self) -> Vec<String> {
        (0..self.originals.len()).map(synthetic_name).collect()
    }

    /// Row index of a synthetic name, if it belongs to this block.
    pub fn index_of(&self, name: &str) -> Option<RowIdx> {
        let digits = name.strip_prefix(PREFIX)?;
        // Reject "seq01" and "seq+1": only the canonical spelling maps back.
        if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
            return None;
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let idx: RowIdx = digits.parse().ok()?;
        (idx < self.originals.len()).then_some(idx)
    }

    pub fn original(&self, name: &str) -> Option<&str> {
        self.index_of(name).map(|idx| self.originals[idx].as_str())
    }

    /// Build the renamed alignment for `block`. The block itself is not touched.
    pub fn rename(&self, block: &AlignmentBlock) -> Result<Alignment> {
        if block.len() != self.len() {
            return Err(RealignError::format_mismatch(format!(
                "name map covers {} sequences, block has {}",
                self.len(),
                block.len()
            )));
        }
        let rows = block
            .sequences
            .iter()
            .enumerate()
            .map(|(idx, seq)| AlignedSequence::new(synthetic_name(idx), seq.text.clone()))
            .collect();
        Alignment::new(rows)
    }

    /// Check that `result` holds exactly one row per synthetic name of this block.
    pub fn check_composition(&self, result: &Alignment, pass: &str) -> Result<()> {
        if result.len() != self.len() {
            return Err(RealignError::format_mismatch(format!(
                "{pass} pass returned {} sequences, expected {}",
                result.len(),
                self.len()
            )));
        }
        let mut seen = HashSet::with_capacity(result.len());
        for name in result.names() {
            match self.index_of(name) {
                Some(idx) => {
                    seen.insert(idx);
                }
                None => {
                    return Err(RealignError::format_mismatch(format!(
                        "{pass} pass returned unexpected sequence '{name}'"
                    )));
                }
            }
        }
        if let Some(missing) = (0..self.len()).find(|idx| !seen.contains(idx)) {
            return Err(RealignError::format_mismatch(format!(
                "{pass} pass is missing sequence '{}' ({})",
                synthetic_name(missing),
                self.originals[missing]
            )));
        }
        Ok(())
    }
}
