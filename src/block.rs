use crate::alignment::Alphabet;
use crate::error::{RealignError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// One `s` line of a MAF block together with its optional `i` and `q` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MafSequence {
    /// Source name, usually `species.chromosome`.
    pub src: String,
    /// 0-based start on the given strand.
    pub start: u64,
    /// Number of residues (non-gap symbols) in `text`.
    pub size: u64,
    pub strand: Strand,
    pub src_size: u64,
    /// Gapped alignment text.
    pub text: Vec<u8>,
    /// Fields of the `i` line following this sequence, kept verbatim.
    pub info: Option<String>,
    /// Per-column quality string from a `q` line.
    pub quality: Option<Vec<u8>>,
}

impl MafSequence {
    /// Copy of every metadata field with empty content.
    ///
    /// The `q` line is not carried over: it is indexed by column and has no
    /// meaning once the content is realigned.
    pub fn clone_meta(&self) -> Self {
        Self {
            src: self.src.clone(),
            start: self.start,
            size: self.size,
            strand: self.strand,
            src_size: self.src_size,
            text: Vec::new(),
            info: self.info.clone(),
            quality: None,
        }
    }

    pub fn set_content(&mut self, text: Vec<u8>) {
        self.text = text;
    }

    pub fn residue_count(&self) -> usize {
        self.text.iter().filter(|&&s| !Alphabet::is_gap(s)).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentBlock {
    pub score: Option<f64>,
    /// `a` line key/value pairs other than `score`, in input order.
    pub attributes: Vec<(String, String)>,
    pub sequences: Vec<MafSequence>,
    /// `e` lines, kept verbatim (without the leading `e`).
    pub empty_lines: Vec<String>,
}

impl AlignmentBlock {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Column count of the first sequence (0 for an empty block).
    pub fn width(&self) -> usize {
        self.sequences.first().map_or(0, |s| s.text.len())
    }

    /// Check that every sequence spans the same number of columns and that
    /// its declared size matches its residue count.
    pub fn validate(&self) -> Result<()> {
        let width = self.width();
        for seq in &self.sequences {
            if seq.text.len() != width {
                return Err(RealignError::malformed(format!(
                    "sequence '{}' spans {} columns, block has {}",
                    seq.src,
                    seq.text.len(),
                    width
                )));
            }
            if seq.residue_count() as u64 != seq.size {
                return Err(RealignError::malformed(format!(
                    "sequence '{}' declares size {} but holds {} residues",
                    seq.src,
                    seq.size,
                    seq.residue_count()
                )));
            }
            if let Some(q) = &seq.quality {
                if q.len() != width {
                    return Err(RealignError::malformed(format!(
                        "quality line of '{}' spans {} columns, block has {}",
                        seq.src,
                        q.len(),
                        width
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn replace_sequences(&mut self, sequences: Vec<MafSequence>) {
        self.sequences = sequences;
    }
}
