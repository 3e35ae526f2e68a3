use crate::error::{RealignError, Result};
use crate::types::{HashMap, HashMapExt};

/// Symbol alphabet used to validate alignments read back from the external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Alphabet {
    #[default]
    Dna,
    Protein,
}

impl Alphabet {
    pub fn is_gap(symbol: u8) -> bool {
        symbol == b'-' || symbol == b'.'
    }

    pub fn is_nucleotide(self) -> bool {
        matches!(self, Alphabet::Dna)
    }

    /// True if `symbol` is a residue or gap of this alphabet (case-insensitive).
    pub fn validate(self, symbol: u8) -> bool {
        if Self::is_gap(symbol) {
            return true;
        }
        match self {
            Alphabet::Dna => complement_dna(symbol).is_some(),
            Alphabet::Protein => matches!(
                symbol.to_ascii_uppercase(),
                b'A'..=b'Z' | b'*'
            ),
        }
    }

    /// Complement of a nucleotide symbol; `None` for protein alphabets or unknown symbols.
    pub fn complement(self, symbol: u8) -> Option<u8> {
        match self {
            Alphabet::Dna if Self::is_gap(symbol) => Some(symbol),
            Alphabet::Dna => complement_dna(symbol),
            Alphabet::Protein => None,
        }
    }
}

// IUPAC complement table. Every entry maps back onto itself when applied twice.
fn complement_dna(symbol: u8) -> Option<u8> {
    let upper = match symbol.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' => b'S',
        b'W' => b'W',
        b'N' => b'N',
        b'X' => b'X',
        b'?' => b'?',
        _ => return None,
    };
    Some(if symbol.is_ascii_lowercase() { upper.to_ascii_lowercase() } else { upper })
}

/// Reverse `symbols`, complementing each one when `complement` is set and the
/// alphabet supports it. Applying this twice returns the input unchanged.
pub fn invert_sequence(symbols: &[u8], alphabet: Alphabet, complement: bool) -> Vec<u8> {
    let complement = complement && alphabet.is_nucleotide();
    symbols
        .iter()
        .rev()
        .map(|&s| {
            if complement {
                alphabet.complement(s).unwrap_or(s)
            } else {
                s
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSequence {
    pub name: String,
    pub symbols: Vec<u8>,
}

impl AlignedSequence {
    pub fn new(name: impl Into<String>, symbols: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), symbols: symbols.into() }
    }

    pub fn residue_count(&self) -> usize {
        self.symbols.iter().filter(|&&s| !Alphabet::is_gap(s)).count()
    }
}

/// An ordered set of uniquely named rows sharing one column count.
#[derive(Debug, Clone)]
pub struct Alignment {
    rows: Vec<AlignedSequence>,
    by_name: HashMap<String, usize>,
    width: usize,
}

impl Alignment {
    pub fn new(rows: Vec<AlignedSequence>) -> Result<Self> {
        let width = rows.first().map_or(0, |r| r.symbols.len());
        let mut by_name = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            if row.symbols.len() != width {
                return Err(RealignError::malformed(format!(
                    "sequence '{}' has {} columns, expected {}",
                    row.name,
                    row.symbols.len(),
                    width
                )));
            }
            if by_name.insert(row.name.clone(), idx).is_some() {
                return Err(RealignError::malformed(format!(
                    "duplicate sequence name '{}'",
                    row.name
                )));
            }
        }
        Ok(Self { rows, by_name, width })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[AlignedSequence] {
        &self.rows
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&AlignedSequence> {
        self.by_name.get(name).map(|&idx| &self.rows[idx])
    }

    /// Fails on the first symbol that is neither a residue nor a gap of `alphabet`.
    pub fn validate_alphabet(&self, alphabet: Alphabet) -> Result<()> {
        for row in &self.rows {
            if let Some(pos) = row.symbols.iter().position(|&s| !alphabet.validate(s)) {
                return Err(RealignError::malformed(format!(
                    "sequence '{}' has invalid {:?} symbol '{}' at column {}",
                    row.name,
                    alphabet,
                    row.symbols[pos].escape_ascii(),
                    pos + 1
                )));
            }
        }
        Ok(())
    }

    /// Copy with every row reversed (and complemented when requested).
    pub fn inverted(&self, alphabet: Alphabet, complement: bool) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| AlignedSequence {
                name: r.name.clone(),
                symbols: invert_sequence(&r.symbols, alphabet, complement),
            })
            .collect();
        Self { rows, by_name: self.by_name.clone(), width: self.width }
    }

    /// Rows rearranged to follow `names`. Every name must be present.
    pub fn reordered<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for name in names {
            let row = self.get(name).ok_or_else(|| {
                RealignError::format_mismatch(format!("sequence '{name}' missing from alignment"))
            })?;
            rows.push(row.clone());
        }
        Self::new(rows)
    }
}
