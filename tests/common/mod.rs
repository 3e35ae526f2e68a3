#![allow(dead_code)]
use maf_realign::{AlignmentBlock, MafSequence, Strand};

pub fn seq(src: &str, start: u64, strand: Strand, text: &str) -> MafSequence {
    let size = text.bytes().filter(|&b| b != b'-').count() as u64;
    MafSequence {
        src: src.to_string(),
        start,
        size,
        strand,
        src_size: 10_000,
        text: text.as_bytes().to_vec(),
        info: None,
        quality: None,
    }
}

/// Block with forward-strand rows named after their species, starting at 100.
pub fn block(score: Option<f64>, rows: &[(&str, &str)]) -> AlignmentBlock {
    AlignmentBlock {
        score,
        attributes: Vec::new(),
        sequences: rows
            .iter()
            .enumerate()
            .map(|(i, (src, text))| seq(src, 100 + i as u64, Strand::Forward, text))
            .collect(),
        empty_lines: Vec::new(),
    }
}

pub fn texts(block: &AlignmentBlock) -> Vec<String> {
    block
        .sequences
        .iter()
        .map(|s| String::from_utf8_lossy(&s.text).into_owned())
        .collect()
}
