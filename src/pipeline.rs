use crate::alignment::{Alignment, Alphabet};
use crate::block::AlignmentBlock;
use crate::cli::Args;
use crate::error::{RealignError, Result};
use crate::head_or_tail::head_or_tail_score;
use crate::maf::{self, MafWriter};
use crate::names::NameMap;
use crate::tool::{Aligner, SystemCallAligner, Workspace};
use anyhow::Context;
use std::fs::File;
use std::io::BufWriter;

#[derive(Debug, Clone, Copy, Default)]
pub struct RealignConfig {
    /// Run the head-or-tail test and store its result as the block score.
    pub consistency_test: bool,
    /// Reverse-complement rather than just reverse for the second pass.
    pub complement: bool,
    pub alphabet: Alphabet,
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub blocks: u64,
    pub sequences: u64,
    pub scored_blocks: u64,
    pub score_sum: f64,
}

impl Stats {
    fn record(&mut self, block: &AlignmentBlock, scored: bool) {
        self.blocks += 1;
        self.sequences += block.len() as u64;
        if scored {
            if let Some(score) = block.score {
                self.scored_blocks += 1;
                self.score_sum += score;
            }
        }
    }

    pub fn mean_score(&self) -> Option<f64> {
        (self.scored_blocks > 0).then(|| self.score_sum / self.scored_blocks as f64)
    }
}

// Every row of `result` must hold the residues it was sent with; otherwise the
// realigned text no longer matches the MAF coordinates of its sequence.
fn check_residues(request: &Alignment, result: &Alignment, pass: &str) -> Result<()> {
    for (sent, got) in request.rows().iter().zip(result.rows()) {
        if sent.residue_count() != got.residue_count() {
            return Err(RealignError::format_mismatch(format!(
                "{pass} pass changed the residue count of '{}' from {} to {}",
                sent.name,
                sent.residue_count(),
                got.residue_count()
            )));
        }
    }
    Ok(())
}

/// Realign one block with `aligner`.
///
/// Sequence count, order and metadata are preserved; only the alignment
/// text changes, plus the block score when the consistency test is on.
/// Any inconsistency in the tool's output aborts the block.
pub fn realign_block<A: Aligner + ?Sized>(
    mut block: AlignmentBlock,
    aligner: &A,
    config: &RealignConfig,
) -> Result<AlignmentBlock> {
    if block.is_empty() {
        return Err(RealignError::malformed("block has no sequences"));
    }

    let names = NameMap::for_block(&block);
    let request = names.rename(&block)?;

    let forward = aligner.align(&request)?;
    names.check_composition(&forward, "forward")?;
    let forward = forward.reordered(request.names())?;
    check_residues(&request, &forward, "forward")?;

    if config.consistency_test {
        let reversed = request.inverted(config.alphabet, config.complement);
        let reverse = aligner.align(&reversed)?;
        names.check_composition(&reverse, "reverse")?;
        let reverse_back = reverse
            .reordered(request.names())?
            .inverted(config.alphabet, config.complement);
        let score = head_or_tail_score(&forward, &reverse_back)?;
        block.score = Some(score);
    }

    let mut sequences = Vec::with_capacity(block.len());
    for (idx, original) in block.sequences.iter().enumerate() {
        let name = names.synthetic(idx);
        let row = forward.get(&name).ok_or_else(|| {
            RealignError::format_mismatch(format!(
                "realigned output has no sequence '{name}' ({})",
                original.src
            ))
        })?;
        let mut seq = original.clone_meta();
        seq.set_content(row.symbols.clone());
        sequences.push(seq);
    }

    tracing::debug!(
        sequences = sequences.len(),
        columns_before = block.width(),
        columns_after = forward.width(),
        score = ?block.score,
        "block realigned"
    );
    block.replace_sequences(sequences);
    Ok(block)
}

/// Pull-based realignment stage over a stream of blocks.
///
/// The first error is yielded and ends the stream: no later block is read.
pub struct BlockRealigner<S, A> {
    source: S,
    aligner: A,
    config: RealignConfig,
    stats: Stats,
    halted: bool,
}

impl<S, A> BlockRealigner<S, A>
where
    S: Iterator<Item = Result<AlignmentBlock>>,
    A: Aligner,
{
    pub fn new(source: S, aligner: A, config: RealignConfig) -> Self {
        Self { source, aligner, config, stats: Stats::default(), halted: false }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

impl<S, A> Iterator for BlockRealigner<S, A>
where
    S: Iterator<Item = Result<AlignmentBlock>>,
    A: Aligner,
{
    type Item = Result<AlignmentBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let result = self
            .source
            .next()?
            .and_then(|block| realign_block(block, &self.aligner, &self.config));
        match &result {
            Ok(block) => self.stats.record(block, self.config.consistency_test),
            Err(e) => {
                tracing::error!(block = self.stats.blocks + 1, error = %e, "realignment failed");
                self.halted = true;
            }
        }
        Some(result)
    }
}

/// Build the external aligner described by the command line.
pub fn build_aligner(args: &Args) -> SystemCallAligner {
    let workspace = match (&args.input_path, &args.output_path) {
        (Some(input), Some(output)) => {
            Workspace::Fixed { input: input.clone(), output: output.clone() }
        }
        _ => Workspace::Scratch,
    };
    SystemCallAligner::new(args.command.clone(), workspace)
        .with_writer(args.input_format.writer())
        .with_reader(args.output_format.reader())
        .with_alphabet(args.alphabet)
}

pub fn run(args: &Args) -> anyhow::Result<Stats> {
    let config = RealignConfig {
        consistency_test: args.hot,
        complement: args.hot_complement,
        alphabet: args.alphabet,
    };
    let aligner = build_aligner(args);
    tracing::info!(
        command = aligner.command(),
        workspace = ?aligner.workspace(),
        consistency_test = config.consistency_test,
        "realigning blocks"
    );

    let source = maf::open_maf(&args.in_maf)?;
    let out_file = File::create(&args.out_maf)
        .with_context(|| format!("failed to create {}", args.out_maf.display()))?;
    let mut writer = MafWriter::new(BufWriter::new(out_file));
    writer.write_header()?;

    let mut realigner = BlockRealigner::new(source, aligner, config);
    for block in realigner.by_ref() {
        let block = block?;
        writer.write_block(&block)?;
    }
    writer.finish()?;
    Ok(realigner.stats().clone())
}
