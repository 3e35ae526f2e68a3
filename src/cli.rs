use crate::alignment::Alphabet;
use crate::formats::AlignmentFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "maf-realign",
    about = "Realign MAF blocks with an external multiple sequence aligner",
    version
)]
pub struct Args {
    /// Input MAF (optionally gzip-compressed, detected by a .gz extension)
    pub in_maf: PathBuf,

    /// Output MAF path
    #[arg(short = 'o', long = "out", value_name = "MAF")]
    pub out_maf: PathBuf,

    /// Shell command running the aligner; `{input}` and `{output}` are replaced by file paths
    #[arg(short = 'c', long = "command", value_name = "CMD")]
    pub command: String,

    /// Fixed path the aligner reads its input from (default: a fresh scratch file per call)
    #[arg(long, value_name = "PATH", requires = "output_path")]
    pub input_path: Option<PathBuf>,

    /// Fixed path the aligner writes its output to (default: a fresh scratch file per call)
    #[arg(long, value_name = "PATH", requires = "input_path")]
    pub output_path: Option<PathBuf>,

    /// Format written for the aligner
    #[arg(long, value_enum, default_value_t = AlignmentFormat::Fasta)]
    pub input_format: AlignmentFormat,

    /// Format the aligner writes
    #[arg(long, value_enum, default_value_t = AlignmentFormat::Fasta)]
    pub output_format: AlignmentFormat,

    /// Alphabet the aligner output is validated against
    #[arg(long, value_enum, default_value_t = Alphabet::Dna)]
    pub alphabet: Alphabet,

    /// Score each block with the head-or-tail test (runs the aligner twice)
    #[arg(long)]
    pub hot: bool,

    /// Reverse-complement instead of reversing for the head-or-tail test
    #[arg(long, requires = "hot")]
    pub hot_complement: bool,

    /// Set logging level to WARN
    #[arg(short = 'q', long)]
    pub quiet: bool,
}
