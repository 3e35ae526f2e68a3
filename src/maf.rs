//! Streaming MAF reader and writer.
//!
//! Only the line types that carry alignment data are interpreted (`a`, `s`,
//! `i`, `e`, `q`); header and comment lines are skipped on input.

use crate::block::{AlignmentBlock, MafSequence, Strand};
use crate::error::{RealignError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub struct MafReader<R> {
    input: R,
    line_no: usize,
    buf: String,
    /// An `a` line read while the previous block had no trailing blank line.
    pending: Option<String>,
    done: bool,
}

pub fn open_maf(path: &Path) -> Result<MafReader<Box<dyn BufRead>>> {
    let file = File::open(path)
        .map_err(|e| RealignError::io(format!("opening {}", path.display()), e))?;
    let gz = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    let input: Box<dyn BufRead> = if gz {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(MafReader::new(input))
}

fn parse_u64(field: &str, what: &str, line_no: usize) -> Result<u64> {
    field.parse().map_err(|_| {
        RealignError::malformed(format!("line {line_no}: invalid {what} '{field}'"))
    })
}

impl<R: BufRead> MafReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, line_no: 0, buf: String::new(), pending: None, done: false }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        self.buf.clear();
        let n = self
            .input
            .read_line(&mut self.buf)
            .map_err(|e| RealignError::io(format!("reading MAF line {}", self.line_no + 1), e))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn parse_a_line(&self, rest: &str) -> Result<AlignmentBlock> {
        let mut block = AlignmentBlock::default();
        for field in rest.split_whitespace() {
            let Some((key, value)) = field.split_once('=') else {
                return Err(RealignError::malformed(format!(
                    "line {}: expected key=value, found '{field}'",
                    self.line_no
                )));
            };
            if key == "score" {
                let score = value.parse::<f64>().map_err(|_| {
                    RealignError::malformed(format!(
                        "line {}: invalid score '{value}'",
                        self.line_no
                    ))
                })?;
                block.score = Some(score);
            } else {
                block.attributes.push((key.to_string(), value.to_string()));
            }
        }
        Ok(block)
    }

    fn parse_s_line(&self, rest: &str) -> Result<MafSequence> {
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let [src, start, size, strand, src_size, text] = fields[..] else {
            return Err(RealignError::malformed(format!(
                "line {}: 's' line needs 6 fields, found {}",
                self.line_no,
                fields.len()
            )));
        };
        let strand = Strand::parse(strand).ok_or_else(|| {
            RealignError::malformed(format!("line {}: invalid strand '{strand}'", self.line_no))
        })?;
        Ok(MafSequence {
            src: src.to_string(),
            start: parse_u64(start, "start", self.line_no)?,
            size: parse_u64(size, "size", self.line_no)?,
            strand,
            src_size: parse_u64(src_size, "source size", self.line_no)?,
            text: text.as_bytes().to_vec(),
            info: None,
            quality: None,
        })
    }

    /// The sequence an `i` or `q` line refers to: the last `s` line, which must share its source.
    fn last_sequence<'b>(
        &self,
        block: &'b mut AlignmentBlock,
        kind: char,
        src: &str,
    ) -> Result<&'b mut MafSequence> {
        let line_no = self.line_no;
        match block.sequences.last_mut() {
            Some(seq) if seq.src == src => Ok(seq),
            _ => Err(RealignError::malformed(format!(
                "line {line_no}: '{kind}' line for '{src}' does not follow its 's' line"
            ))),
        }
    }

    fn read_block(&mut self) -> Result<Option<AlignmentBlock>> {
        let mut current: Option<AlignmentBlock> = None;
        while let Some(line) = self.next_line()? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if current.is_some() {
                    break;
                }
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }
            if !trimmed.is_char_boundary(1) {
                return Err(RealignError::malformed(format!(
                    "line {}: unrecognised line type",
                    self.line_no
                )));
            }
            let (kind, rest) = trimmed.split_at(1);
            if kind == "a" {
                if current.is_some() {
                    self.pending = Some(line);
                    break;
                }
                current = Some(self.parse_a_line(rest)?);
                continue;
            }
            let Some(block) = current.as_mut() else {
                return Err(RealignError::malformed(format!(
                    "line {}: '{kind}' line outside of an alignment block",
                    self.line_no
                )));
            };
            match kind {
                "s" => {
                    let seq = self.parse_s_line(rest)?;
                    block.sequences.push(seq);
                }
                "i" => {
                    let rest = rest.trim_start();
                    let (src, info) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                    let seq = self.last_sequence(block, 'i', src)?;
                    seq.info = Some(info.trim().to_string());
                }
                "q" => {
                    let fields: Vec<&str> = rest.split_whitespace().collect();
                    let [src, quality] = fields[..] else {
                        return Err(RealignError::malformed(format!(
                            "line {}: 'q' line needs 2 fields",
                            self.line_no
                        )));
                    };
                    let seq = self.last_sequence(block, 'q', src)?;
                    seq.quality = Some(quality.as_bytes().to_vec());
                }
                "e" => block.empty_lines.push(rest.trim().to_string()),
                _ => {
                    tracing::warn!(line = self.line_no, kind, "skipping unknown MAF line type");
                }
            }
        }
        if let Some(block) = &current {
            block.validate()?;
        }
        Ok(current)
    }
}

impl<R: BufRead> Iterator for MafReader<R> {
    type Item = Result<AlignmentBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub struct MafWriter<W: Write> {
    out: W,
}

impl<W: Write> MafWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_header(&mut self) -> Result<()> {
        writeln!(self.out, "##maf version=1 program=maf-realign\n")
            .map_err(|e| RealignError::io("writing MAF header", e))
    }

    pub fn write_block(&mut self, block: &AlignmentBlock) -> Result<()> {
        self.render_block(block).map_err(|e| RealignError::io("writing MAF block", e))
    }

    fn render_block(&mut self, block: &AlignmentBlock) -> std::io::Result<()> {
        let mut a_line = String::from("a");
        if let Some(score) = block.score {
            a_line.push_str(&format!(" score={score:.6}"));
        }
        for (key, value) in &block.attributes {
            a_line.push_str(&format!(" {key}={value}"));
        }
        writeln!(self.out, "{a_line}")?;

        let w_src = block.sequences.iter().map(|s| s.src.len()).max().unwrap_or(0);
        let w_start = block.sequences.iter().map(|s| s.start.to_string().len()).max().unwrap_or(0);
        let w_size = block.sequences.iter().map(|s| s.size.to_string().len()).max().unwrap_or(0);
        let w_total =
            block.sequences.iter().map(|s| s.src_size.to_string().len()).max().unwrap_or(0);

        for seq in &block.sequences {
            let prefix = format!(
                "s {:<w_src$} {:>w_start$} {:>w_size$} {} {:>w_total$} ",
                seq.src,
                seq.start,
                seq.size,
                seq.strand.as_char(),
                seq.src_size,
            );
            writeln!(self.out, "{prefix}{}", String::from_utf8_lossy(&seq.text))?;
            if let Some(quality) = &seq.quality {
                let head = format!("q {:<w_src$}", seq.src);
                writeln!(
                    self.out,
                    "{head:<width$}{}",
                    String::from_utf8_lossy(quality),
                    width = prefix.len()
                )?;
            }
            if let Some(info) = &seq.info {
                writeln!(self.out, "i {:<w_src$} {info}", seq.src)?;
            }
        }
        for empty in &block.empty_lines {
            writeln!(self.out, "e {empty}")?;
        }
        writeln!(self.out)
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush().map_err(|e| RealignError::io("flushing MAF output", e))?;
        Ok(self.out)
    }
}
