use crate::alignment::{AlignedSequence, Alignment, Alphabet};
use crate::error::{RealignError, Result};
use crate::types::{HashMap, HashMapExt};
use needletail::parse_fastx_file;
use noodles::fasta;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Renders an alignment into the file format the external tool expects.
pub trait AlignmentWriter {
    /// Write `alignment` to `path`. With `overwrite` unset an existing file is an error.
    fn write_alignment(&self, path: &Path, alignment: &Alignment, overwrite: bool) -> Result<()>;

    /// File extension used for scratch files in this format.
    fn extension(&self) -> &'static str;
}

/// Parses the external tool's output back into an alignment.
pub trait AlignmentReader {
    fn read_alignment(&self, path: &Path, alphabet: Alphabet) -> Result<Alignment>;

    fn extension(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AlignmentFormat {
    Fasta,
    Clustal,
}

impl AlignmentFormat {
    pub fn reader(self) -> Box<dyn AlignmentReader + Send + Sync> {
        match self {
            AlignmentFormat::Fasta => Box::new(FastaFormat),
            AlignmentFormat::Clustal => Box::new(ClustalFormat),
        }
    }

    pub fn writer(self) -> Box<dyn AlignmentWriter + Send + Sync> {
        match self {
            AlignmentFormat::Fasta => Box::new(FastaFormat),
            AlignmentFormat::Clustal => Box::new(ClustalFormat),
        }
    }
}

pub fn detect_format(path: &Path) -> Result<AlignmentFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "fa" | "fasta" | "fas" | "fna" | "faa" | "afa" | "mfa" => Ok(AlignmentFormat::Fasta),
        "aln" | "clustal" | "clw" => Ok(AlignmentFormat::Clustal),
        _ => Err(RealignError::malformed(format!(
            "unable to detect alignment format from extension: .{ext}"
        ))),
    }
}

fn create_output(path: &Path, overwrite: bool) -> Result<BufWriter<File>> {
    if !overwrite && path.exists() {
        return Err(RealignError::io(
            format!("creating {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "file exists"),
        ));
    }
    let file = File::create(path)
        .map_err(|e| RealignError::io(format!("creating {}", path.display()), e))?;
    Ok(BufWriter::new(file))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FastaFormat;

impl AlignmentWriter for FastaFormat {
    fn write_alignment(&self, path: &Path, alignment: &Alignment, overwrite: bool) -> Result<()> {
        let context = || format!("writing FASTA {}", path.display());
        let mut out = create_output(path, overwrite)?;
        {
            let mut writer = fasta::io::Writer::new(&mut out);
            for row in alignment.rows() {
                let record = fasta::Record::new(
                    fasta::record::Definition::new(row.name.as_str(), None),
                    fasta::record::Sequence::from(row.symbols.clone()),
                );
                writer
                    .write_record(&record)
                    .map_err(|e| RealignError::io(context(), e))?;
            }
        }
        out.flush().map_err(|e| RealignError::io(context(), e))
    }

    fn extension(&self) -> &'static str {
        "fasta"
    }
}

impl AlignmentReader for FastaFormat {
    fn read_alignment(&self, path: &Path, alphabet: Alphabet) -> Result<Alignment> {
        let mut reader = parse_fastx_file(path).map_err(|e| {
            RealignError::malformed(format!("failed to open FASTA {}: {}", path.display(), e))
        })?;
        let mut rows = Vec::new();
        while let Some(result) = reader.next() {
            let record = result
                .map_err(|e| RealignError::malformed(format!("failed to parse FASTA record: {e}")))?;
            // The identifier is the first word of the header line.
            let id = std::str::from_utf8(record.id())
                .map_err(|_| RealignError::malformed("FASTA header is not valid UTF-8"))?;
            let name = id.split_whitespace().next().unwrap_or("");
            rows.push(AlignedSequence::new(name, record.seq().to_vec()));
        }
        let alignment = Alignment::new(rows)?;
        alignment.validate_alphabet(alphabet)?;
        Ok(alignment)
    }

    fn extension(&self) -> &'static str {
        "fasta"
    }
}

/// Interleaved Clustal output (clustalw, muscle `-clw`, mafft `--clustalout`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ClustalFormat;

const CLUSTAL_LINE_WIDTH: usize = 60;

impl ClustalFormat {
    fn parse<R: BufRead>(&self, input: R, alphabet: Alphabet) -> Result<Alignment> {
        let mut order: Vec<String> = Vec::new();
        let mut symbols: HashMap<String, Vec<u8>> = HashMap::new();
        let mut saw_header = false;

        for (lineno, line) in input.lines().enumerate() {
            let line = line.map_err(|e| RealignError::io("reading Clustal alignment", e))?;
            if !saw_header {
                if line.trim().is_empty() {
                    continue;
                }
                let head = line.trim_start().to_ascii_uppercase();
                if !(head.starts_with("CLUSTAL") || head.starts_with("MUSCLE")) {
                    return Err(RealignError::malformed(format!(
                        "line {}: missing CLUSTAL header",
                        lineno + 1
                    )));
                }
                saw_header = true;
                continue;
            }
            // Conservation lines start with whitespace.
            if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(name), Some(chunk)) = (fields.next(), fields.next()) else {
                return Err(RealignError::malformed(format!(
                    "line {}: expected '<name> <symbols>'",
                    lineno + 1
                )));
            };
            if let Some(count) = fields.next() {
                if count.parse::<u64>().is_err() {
                    return Err(RealignError::malformed(format!(
                        "line {}: trailing field '{count}' is not a residue count",
                        lineno + 1
                    )));
                }
            }
            let row = symbols.entry(name.to_string()).or_insert_with(|| {
                order.push(name.to_string());
                Vec::new()
            });
            row.extend_from_slice(chunk.as_bytes());
        }

        if !saw_header {
            return Err(RealignError::malformed("empty Clustal alignment"));
        }
        let rows = order
            .into_iter()
            .map(|name| {
                let seq = symbols.remove(&name).unwrap_or_default();
                AlignedSequence::new(name, seq)
            })
            .collect();
        let alignment = Alignment::new(rows)?;
        alignment.validate_alphabet(alphabet)?;
        Ok(alignment)
    }
}

impl AlignmentWriter for ClustalFormat {
    fn write_alignment(&self, path: &Path, alignment: &Alignment, overwrite: bool) -> Result<()> {
        let context = || format!("writing Clustal {}", path.display());
        let mut out = create_output(path, overwrite)?;
        let pad = alignment.names().map(str::len).max().unwrap_or(0) + 4;
        let mut body = String::from("CLUSTAL W multiple sequence alignment\n\n");
        let mut offset = 0;
        while offset < alignment.width() {
            let end = (offset + CLUSTAL_LINE_WIDTH).min(alignment.width());
            for row in alignment.rows() {
                let chunk = String::from_utf8_lossy(&row.symbols[offset..end]);
                body.push_str(&format!("{:<pad$}{}\n", row.name, chunk));
            }
            body.push('\n');
            offset = end;
        }
        out.write_all(body.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| RealignError::io(context(), e))
    }

    fn extension(&self) -> &'static str {
        "aln"
    }
}

impl AlignmentReader for ClustalFormat {
    fn read_alignment(&self, path: &Path, alphabet: Alphabet) -> Result<Alignment> {
        let file = File::open(path)
            .map_err(|e| RealignError::io(format!("opening {}", path.display()), e))?;
        self.parse(BufReader::new(file), alphabet)
    }

    fn extension(&self) -> &'static str {
        "aln"
    }
}
