//! maf-realign: realign multiple-alignment blocks with an external tool.
//!
//! Each block is renamed to positional placeholders, handed to an
//! [`Aligner`], and rebuilt from the result with its original metadata.
//! Optionally the block is scored with the head-or-tail test, which aligns
//! the reversed sequences a second time and measures how many residue pairs
//! both alignments agree on.
//!
//! # Library usage
//!
//! ```no_run
//! use maf_realign::{BlockRealigner, RealignConfig, SystemCallAligner, Workspace};
//! use maf_realign::maf::open_maf;
//!
//! # fn main() -> Result<(), maf_realign::RealignError> {
//! let blocks = open_maf("in.maf".as_ref())?;
//! let aligner = SystemCallAligner::new("mafft --quiet {input} > {output}", Workspace::Scratch);
//! let config = RealignConfig { consistency_test: true, ..Default::default() };
//! for block in BlockRealigner::new(blocks, aligner, config) {
//!     let block = block?;
//!     println!("{:?}", block.score);
//! }
//! # Ok(())
//! # }
//! ```

// Internal modules; their public items are re-exported below.
pub(crate) mod alignment;
pub(crate) mod block;
pub(crate) mod cli;
pub(crate) mod error;
pub(crate) mod names;
pub(crate) mod pipeline;
pub(crate) mod tool;
pub(crate) mod types;

// Public modules: stable API surface.
pub mod formats;
pub mod head_or_tail;
pub mod maf;

pub use alignment::{invert_sequence, AlignedSequence, Alignment, Alphabet};
pub use block::{AlignmentBlock, MafSequence, Strand};
pub use cli::Args;
pub use error::{RealignError, Result};
pub use names::{synthetic_name, NameMap};
pub use pipeline::{build_aligner, realign_block, run, BlockRealigner, RealignConfig, Stats};
pub use tool::{render_command, Aligner, SystemCallAligner, Workspace};
