use crate::alignment::{Alignment, Alphabet};
use crate::error::{RealignError, Result};
use crate::formats::{AlignmentReader, AlignmentWriter, FastaFormat};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Anything that can turn an alignment into a realigned one.
///
/// Implemented by [`SystemCallAligner`] for real command-line tools and by
/// plain closures, which is how in-memory aligners are supplied in tests.
pub trait Aligner {
    fn align(&self, input: &Alignment) -> Result<Alignment>;
}

impl<F> Aligner for F
where
    F: Fn(&Alignment) -> Result<Alignment>,
{
    fn align(&self, input: &Alignment) -> Result<Alignment> {
        self(input)
    }
}

/// Where the tool's input and output files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workspace {
    /// The same two paths are overwritten on every call. Callers must make
    /// sure nothing else uses them while a block is being processed.
    Fixed { input: PathBuf, output: PathBuf },
    /// A fresh temporary directory per call, removed when the call returns.
    Scratch,
}

/// Runs a shell command over an alignment written to disk.
///
/// `{input}` and `{output}` in the command are replaced by the (shell-quoted)
/// paths of the current call. A command without placeholders runs verbatim
/// and must know the paths itself.
pub struct SystemCallAligner {
    command: String,
    workspace: Workspace,
    writer: Box<dyn AlignmentWriter + Send + Sync>,
    reader: Box<dyn AlignmentReader + Send + Sync>,
    alphabet: Alphabet,
}

impl SystemCallAligner {
    pub fn new(command: impl Into<String>, workspace: Workspace) -> Self {
        Self {
            command: command.into(),
            workspace,
            writer: Box::new(FastaFormat),
            reader: Box::new(FastaFormat),
            alphabet: Alphabet::Dna,
        }
    }

    pub fn with_writer(mut self, writer: Box<dyn AlignmentWriter + Send + Sync>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_reader(mut self, reader: Box<dyn AlignmentReader + Send + Sync>) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn run(&self, alignment: &Alignment, input: &Path, output: &Path) -> Result<Alignment> {
        // A leftover file from an earlier call must never be read as this call's
        // result. Removed before the request is written, as an in-place tool
        // shares one path for both.
        match std::fs::remove_file(output) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(RealignError::io(format!("removing stale {}", output.display()), e))
            }
        }
        self.writer.write_alignment(input, alignment, true)?;

        let command = render_command(&self.command, input, output);
        tracing::debug!(
            command = %command,
            sequences = alignment.len(),
            columns = alignment.width(),
            "invoking external aligner"
        );
        let status = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .map_err(|source| RealignError::ToolLaunch { command: command.clone(), source })?;
        if !status.success() {
            return Err(RealignError::ExternalToolFailure { command, status });
        }

        if !output.exists() {
            return Err(RealignError::io(
                format!("reading {}", output.display()),
                std::io::Error::new(ErrorKind::NotFound, "external command wrote no output"),
            ));
        }
        self.reader.read_alignment(output, self.alphabet)
    }
}

impl Aligner for SystemCallAligner {
    fn align(&self, input: &Alignment) -> Result<Alignment> {
        match &self.workspace {
            Workspace::Fixed { input: in_path, output: out_path } => {
                self.run(input, in_path, out_path)
            }
            Workspace::Scratch => {
                let dir = tempfile::Builder::new()
                    .prefix("maf-realign-")
                    .tempdir()
                    .map_err(|e| RealignError::io("creating scratch directory", e))?;
                let in_path = dir.path().join(format!("input.{}", self.writer.extension()));
                let out_path = dir.path().join(format!("output.{}", self.reader.extension()));
                self.run(input, &in_path, &out_path)
            }
        }
    }
}

/// Substitute `{input}` / `{output}` placeholders with quoted paths.
pub fn render_command(template: &str, input: &Path, output: &Path) -> String {
    template
        .replace("{input}", &shell_quote(input))
        .replace("{output}", &shell_quote(output))
}

fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    let plain = !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"/._-+,:=@%".contains(&b));
    if plain {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
