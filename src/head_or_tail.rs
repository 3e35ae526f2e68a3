//! Head-or-tail alignment consistency scoring.
//!
//! The same sequences are aligned once as given and once reversed. After
//! the second result is reversed back, both alignments cover identical
//! residues, and the fraction of residue pairs they place in a common column
//! estimates how reliable the forward alignment is (1.0 = fully consistent).

use crate::alignment::{Alignment, Alphabet};
use crate::error::{RealignError, Result};

/// Residue ordinals per alignment cell plus, per row, the column of each residue.
#[derive(Debug, Clone)]
pub struct PositionMatrix {
    /// `cells[row][col]` is the 1-based ordinal of the residue in that cell, or 0 for a gap.
    cells: Vec<Vec<usize>>,
    /// `columns[row][k]` is the column holding residue `k + 1` of `row`.
    columns: Vec<Vec<usize>>,
    width: usize,
}

impl PositionMatrix {
    pub fn from_alignment(alignment: &Alignment) -> Self {
        let mut cells = Vec::with_capacity(alignment.len());
        let mut columns = Vec::with_capacity(alignment.len());
        for row in alignment.rows() {
            let mut ordinal = 0;
            let mut row_cells = Vec::with_capacity(row.symbols.len());
            let mut row_columns = Vec::new();
            for (col, &symbol) in row.symbols.iter().enumerate() {
                if Alphabet::is_gap(symbol) {
                    row_cells.push(0);
                } else {
                    ordinal += 1;
                    row_cells.push(ordinal);
                    row_columns.push(col);
                }
            }
            cells.push(row_cells);
            columns.push(row_columns);
        }
        Self { cells, columns, width: alignment.width() }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, col: usize) -> usize {
        self.cells[row][col]
    }

    pub fn residues(&self, row: usize) -> usize {
        self.columns[row].len()
    }

    /// Column of the residue with 1-based `ordinal` in `row`.
    pub fn column_of(&self, row: usize, ordinal: usize) -> Option<usize> {
        ordinal.checked_sub(1).and_then(|k| self.columns[row].get(k).copied())
    }
}

fn check_comparable(test: &PositionMatrix, reference: &PositionMatrix) -> Result<()> {
    if test.rows() != reference.rows() {
        return Err(RealignError::format_mismatch(format!(
            "alignments to compare have {} and {} sequences",
            test.rows(),
            reference.rows()
        )));
    }
    for row in 0..test.rows() {
        if test.residues(row) != reference.residues(row) {
            return Err(RealignError::format_mismatch(format!(
                "sequence {} has {} residues in one alignment and {} in the other",
                row,
                test.residues(row),
                reference.residues(row)
            )));
        }
    }
    Ok(())
}

/// Sum-of-pairs score of every column of `test` measured against `reference`.
///
/// For each column, every pair of rows with a residue there is counted, and
/// the score is the share of those pairs `reference` also aligns. Columns
/// with fewer than two residues have no pairs and score `None`.
pub fn sum_of_pairs_scores(
    test: &PositionMatrix,
    reference: &PositionMatrix,
) -> Result<Vec<Option<f64>>> {
    check_comparable(test, reference)?;
    let mut scores = Vec::with_capacity(test.width());
    let mut present: Vec<(usize, usize)> = Vec::with_capacity(test.rows());
    for col in 0..test.width() {
        present.clear();
        present.extend(
            (0..test.rows())
                .map(|row| (row, test.cell(row, col)))
                .filter(|&(_, ordinal)| ordinal > 0),
        );
        let mut total = 0usize;
        let mut aligned = 0usize;
        for (i, &(row_a, ord_a)) in present.iter().enumerate() {
            let col_a = reference.column_of(row_a, ord_a);
            for &(row_b, ord_b) in &present[i + 1..] {
                total += 1;
                if col_a.is_some() && col_a == reference.column_of(row_b, ord_b) {
                    aligned += 1;
                }
            }
        }
        scores.push((total > 0).then(|| aligned as f64 / total as f64));
    }
    Ok(scores)
}

/// Arithmetic mean of the defined column scores.
pub fn mean_score(scores: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = scores
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, n), &s| (sum + s, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Score a forward alignment against the reversed-back result of the reverse pass.
///
/// Both alignments must list the same sequences in the same order. A block
/// where no column pairs two residues (a single sequence, or rows that never
/// overlap) scores 0.0.
pub fn head_or_tail_score(forward: &Alignment, reverse_back: &Alignment) -> Result<f64> {
    if forward.len() != reverse_back.len() {
        return Err(RealignError::format_mismatch(format!(
            "forward pass has {} sequences, reverse pass has {}",
            forward.len(),
            reverse_back.len()
        )));
    }
    for (f, r) in forward.rows().iter().zip(reverse_back.rows()) {
        if f.name != r.name {
            return Err(RealignError::format_mismatch(format!(
                "sequence order differs between passes: '{}' vs '{}'",
                f.name, r.name
            )));
        }
        if f.residue_count() == 0 {
            return Err(RealignError::degenerate(format!("sequence '{}' is empty", f.name)));
        }
    }

    let reference = PositionMatrix::from_alignment(forward);
    let test = PositionMatrix::from_alignment(reverse_back);
    let scores = sum_of_pairs_scores(&test, &reference)?;
    Ok(mean_score(&scores).unwrap_or(0.0))
}
