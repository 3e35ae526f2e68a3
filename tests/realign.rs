mod common;

use common::{block, seq, texts};
use maf_realign::{
    realign_block, AlignedSequence, Alignment, AlignmentBlock, BlockRealigner, RealignConfig,
    RealignError, Result, Strand,
};
use std::cell::{Cell, RefCell};

fn identity(aln: &Alignment) -> Result<Alignment> {
    Ok(aln.clone())
}

/// Pads every row with one trailing gap column, as an aligner might.
fn pad_right(aln: &Alignment) -> Result<Alignment> {
    Alignment::new(
        aln.rows()
            .iter()
            .map(|r| {
                let mut symbols = r.symbols.clone();
                symbols.push(b'-');
                AlignedSequence::new(r.name.clone(), symbols)
            })
            .collect(),
    )
}

fn hot() -> RealignConfig {
    RealignConfig { consistency_test: true, ..Default::default() }
}

#[test]
fn metadata_and_order_survive_realignment() {
    let mut input = AlignmentBlock {
        score: Some(12.5),
        attributes: vec![("pass".to_string(), "2".to_string())],
        sequences: vec![
            seq("hg38.chr1", 1000, Strand::Forward, "ACG-T"),
            seq("mm10.chr4", 52, Strand::Reverse, "AC-GT"),
            seq("rn6.chr2", 7, Strand::Forward, "ACGGT"),
        ],
        empty_lines: vec!["galGal6.chr3 100 20 + 5000 I".to_string()],
    };
    input.sequences[0].info = Some("C 0 I 12".to_string());
    input.sequences[1].quality = Some(b"99-99".to_vec());

    let out = realign_block(input.clone(), &pad_right, &RealignConfig::default()).expect("realign");

    assert_eq!(out.len(), 3);
    assert_eq!(texts(&out), vec!["ACG-T-", "AC-GT-", "ACGGT-"]);
    for (before, after) in input.sequences.iter().zip(&out.sequences) {
        assert_eq!(after.src, before.src);
        assert_eq!(after.start, before.start);
        assert_eq!(after.size, before.size);
        assert_eq!(after.strand, before.strand);
        assert_eq!(after.src_size, before.src_size);
        assert_eq!(after.info, before.info);
        assert_eq!(after.quality, None, "column qualities are dropped");
    }
    assert_eq!(out.attributes, input.attributes);
    assert_eq!(out.empty_lines, input.empty_lines);
    assert_eq!(out.score, Some(12.5));
    out.validate().expect("realigned block is well formed");
}

#[test]
fn result_order_does_not_matter() {
    let reversed_order = |aln: &Alignment| -> Result<Alignment> {
        Alignment::new(aln.rows().iter().rev().cloned().collect())
    };
    let input = block(None, &[("a", "AC-T"), ("b", "ACGT"), ("c", "A-GT")]);
    let out = realign_block(input, &reversed_order, &RealignConfig::default()).expect("realign");
    assert_eq!(texts(&out), vec!["AC-T", "ACGT", "A-GT"]);
    assert_eq!(out.sequences[0].src, "a");
}

#[test]
fn score_is_untouched_without_consistency_test() {
    let calls = Cell::new(0);
    let counting = |aln: &Alignment| -> Result<Alignment> {
        calls.set(calls.get() + 1);
        Ok(aln.clone())
    };
    let out = realign_block(block(Some(42.0), &[("a", "ACGT"), ("b", "ACGT")]), &counting, &RealignConfig::default())
        .expect("realign");
    assert_eq!(out.score, Some(42.0));
    assert_eq!(calls.get(), 1);

    let out = realign_block(block(None, &[("a", "ACGT"), ("b", "ACGT")]), &counting, &RealignConfig::default())
        .expect("realign");
    assert_eq!(out.score, None);
}

#[test]
fn tool_sees_only_synthetic_names() {
    let seen = RefCell::new(Vec::new());
    let recording = |aln: &Alignment| -> Result<Alignment> {
        seen.borrow_mut().extend(aln.names().map(str::to_string));
        Ok(aln.clone())
    };
    realign_block(block(None, &[("hg38.chr1", "AC"), ("mm10.chr4", "AC")]), &recording, &RealignConfig::default())
        .expect("realign");
    assert_eq!(*seen.borrow(), vec!["seq0", "seq1"]);
}

#[test]
fn consistent_passes_score_one() {
    let calls = Cell::new(0);
    let counting = |aln: &Alignment| -> Result<Alignment> {
        calls.set(calls.get() + 1);
        Ok(aln.clone())
    };
    let out = realign_block(block(Some(7.0), &[("a", "AC-GT"), ("b", "ACTGT"), ("c", "A--GT")]), &counting, &hot())
        .expect("realign");
    assert_eq!(calls.get(), 2);
    let score = out.score.expect("score assigned");
    assert!((score - 1.0).abs() < 1e-12, "score = {score}");
    assert_eq!(texts(&out), vec!["AC-GT", "ACTGT", "A--GT"]);
}

#[test]
fn reverse_pass_receives_reversed_sequences() {
    let inputs = RefCell::new(Vec::new());
    let recording = |aln: &Alignment| -> Result<Alignment> {
        inputs.borrow_mut().push(aln.clone());
        Ok(aln.clone())
    };
    let config = RealignConfig { consistency_test: true, complement: true, ..Default::default() };
    realign_block(block(None, &[("a", "AAC-G"), ("b", "ATCCG")]), &recording, &config).expect("realign");

    let inputs = inputs.borrow();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].get("seq0").expect("seq0").symbols, b"AAC-G".to_vec());
    assert_eq!(inputs[1].get("seq0").expect("seq0").symbols, b"C-GTT".to_vec());
    assert_eq!(inputs[1].get("seq1").expect("seq1").symbols, b"CGGAT".to_vec());
}

#[test]
fn extra_gap_on_reverse_pass_lowers_score() {
    let calls = Cell::new(0);
    let shifting = |aln: &Alignment| -> Result<Alignment> {
        calls.set(calls.get() + 1);
        if calls.get() == 1 {
            return Ok(aln.clone());
        }
        // Reverse pass: the middle sequence lands one column to the right.
        let rows = aln
            .rows()
            .iter()
            .map(|r| {
                let mut symbols = r.symbols.clone();
                if r.name == "seq1" {
                    symbols.insert(0, b'-');
                } else {
                    symbols.push(b'-');
                }
                AlignedSequence::new(r.name.clone(), symbols)
            })
            .collect();
        Alignment::new(rows)
    };
    let out = realign_block(block(Some(99.0), &[("a", "ACGT"), ("b", "ACGT"), ("c", "ACGT")]), &shifting, &hot())
        .expect("realign");
    let score = out.score.expect("score assigned");
    assert!(score > 0.0 && score < 1.0, "score = {score}");
    assert!((score - 0.5).abs() < 1e-12, "score = {score}");
    // The forward result is what ends up in the block.
    assert_eq!(texts(&out), vec!["ACGT", "ACGT", "ACGT"]);
}

#[test]
fn missing_sequence_is_a_format_mismatch() {
    let drop_last = |aln: &Alignment| -> Result<Alignment> {
        Alignment::new(aln.rows()[..aln.len() - 1].to_vec())
    };
    let err = realign_block(block(None, &[("a", "AC"), ("b", "AC"), ("c", "AC")]), &drop_last, &RealignConfig::default())
        .unwrap_err();
    assert!(matches!(err, RealignError::FormatMismatch { .. }), "got {err}");
}

#[test]
fn missing_sequence_on_reverse_pass_is_a_format_mismatch() {
    let calls = Cell::new(0);
    let flaky = |aln: &Alignment| -> Result<Alignment> {
        calls.set(calls.get() + 1);
        if calls.get() == 1 {
            Ok(aln.clone())
        } else {
            Alignment::new(aln.rows()[1..].to_vec())
        }
    };
    let err = realign_block(block(None, &[("a", "AC"), ("b", "AC")]), &flaky, &hot()).unwrap_err();
    assert!(matches!(err, RealignError::FormatMismatch { .. }), "got {err}");
}

#[test]
fn renamed_result_is_a_format_mismatch() {
    let rename = |aln: &Alignment| -> Result<Alignment> {
        Alignment::new(
            aln.rows()
                .iter()
                .map(|r| AlignedSequence::new(format!("{}_aligned", r.name), r.symbols.clone()))
                .collect(),
        )
    };
    let err = realign_block(block(None, &[("a", "AC"), ("b", "AC")]), &rename, &RealignConfig::default()).unwrap_err();
    assert!(matches!(err, RealignError::FormatMismatch { .. }), "got {err}");
}

#[test]
fn altered_residues_are_a_format_mismatch() {
    let truncate = |aln: &Alignment| -> Result<Alignment> {
        Alignment::new(
            aln.rows()
                .iter()
                .map(|r| {
                    let mut symbols = r.symbols.clone();
                    symbols[0] = b'-';
                    AlignedSequence::new(r.name.clone(), symbols)
                })
                .collect(),
        )
    };
    let err = realign_block(block(None, &[("a", "ACGT"), ("b", "ACGT")]), &truncate, &RealignConfig::default())
        .unwrap_err();
    assert!(matches!(err, RealignError::FormatMismatch { .. }), "got {err}");
}

#[test]
fn ragged_block_never_reaches_the_tool() {
    let calls = Cell::new(0);
    let counting = |aln: &Alignment| -> Result<Alignment> {
        calls.set(calls.get() + 1);
        Ok(aln.clone())
    };
    let err = realign_block(block(None, &[("a", "ACGT"), ("b", "ACG")]), &counting, &RealignConfig::default())
        .unwrap_err();
    assert!(matches!(err, RealignError::MalformedInput { .. }), "got {err}");
    assert_eq!(calls.get(), 0);
}

#[test]
fn empty_block_is_rejected() {
    let err = realign_block(AlignmentBlock::default(), &identity, &RealignConfig::default()).unwrap_err();
    assert!(matches!(err, RealignError::MalformedInput { .. }), "got {err}");
}

#[test]
fn all_gap_sequence_fails_consistency_test_only() {
    let input = block(None, &[("a", "ACGT"), ("b", "----")]);
    assert!(realign_block(input.clone(), &identity, &RealignConfig::default()).is_ok());
    let err = realign_block(input, &identity, &hot()).unwrap_err();
    assert!(matches!(err, RealignError::DegenerateScore { .. }), "got {err}");
}

#[test]
fn tool_errors_propagate_unchanged() {
    let failing = |_: &Alignment| -> Result<Alignment> {
        Err(RealignError::MalformedInput { message: "unreadable output".to_string() })
    };
    let err = realign_block(block(None, &[("a", "AC"), ("b", "AC")]), &failing, &RealignConfig::default())
        .unwrap_err();
    assert!(err.to_string().contains("unreadable output"), "got {err}");
}

#[test]
fn stream_halts_after_first_failure() {
    let blocks: Vec<Result<AlignmentBlock>> = vec![
        Ok(block(None, &[("a", "AC"), ("b", "AC")])),
        Ok(block(None, &[("a", "ACGT"), ("b", "ACG")])),
        Ok(block(None, &[("a", "AC"), ("b", "AC")])),
    ];
    let mut stage = BlockRealigner::new(blocks.into_iter(), identity, RealignConfig::default());
    assert!(stage.next().expect("first block").is_ok());
    assert!(stage.next().expect("second block").is_err());
    assert!(stage.next().is_none(), "no block is emitted after a failure");
    assert_eq!(stage.stats().blocks, 1);
}

#[test]
fn stream_passes_source_errors_through() {
    let blocks: Vec<Result<AlignmentBlock>> = vec![
        Err(RealignError::MalformedInput { message: "line 3: bad strand".to_string() }),
        Ok(block(None, &[("a", "AC"), ("b", "AC")])),
    ];
    let results: Vec<_> = BlockRealigner::new(blocks.into_iter(), identity, RealignConfig::default()).collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn stream_scores_single_sequence_blocks_and_continues() {
    let blocks: Vec<Result<AlignmentBlock>> = vec![
        Ok(block(None, &[("hg38.chr1", "ACGT")])),
        Ok(block(None, &[("a", "AC"), ("b", "AC")])),
    ];
    let mut stage = BlockRealigner::new(blocks.into_iter(), identity, hot());
    let out: Vec<AlignmentBlock> = stage.by_ref().collect::<Result<_>>().expect("both blocks realign");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].score, Some(0.0));
    assert_eq!(out[1].score, Some(1.0));
    assert_eq!(stage.stats().scored_blocks, 2);
}

#[test]
fn stream_collects_stats() {
    let blocks: Vec<Result<AlignmentBlock>> = vec![
        Ok(block(None, &[("a", "AC"), ("b", "AC")])),
        Ok(block(None, &[("a", "ACG"), ("b", "ACG"), ("c", "A-G")])),
    ];
    let mut stage = BlockRealigner::new(blocks.into_iter(), identity, hot());
    let out: Vec<AlignmentBlock> = stage.by_ref().collect::<Result<_>>().expect("all blocks");
    assert_eq!(out.len(), 2);
    let stats = stage.stats();
    assert_eq!((stats.blocks, stats.sequences, stats.scored_blocks), (2, 5, 2));
    assert_eq!(stats.mean_score(), Some(1.0));
}
