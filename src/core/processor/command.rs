use crate::core::error::ProcessError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const OUTPUT_CAPTURE_LIMIT_BYTES: usize = 1_048_576;

/// Resolved converter invocation: program path plus argument vector. The
/// program has already been located on the search path; the args are passed
/// through verbatim with no further shell interpretation.
#[derive(Clone, Debug)]
pub struct ConvertRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ConvertOutput {
    pub exit_code: i32,
    /// Combined stdout and stderr, capped per stream at 1 MiB.
    pub output: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, request: &ConvertRequest) -> Result<ConvertOutput, ProcessError>;
}

/// Production runner backed by `tokio::process`.
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, request: &ConvertRequest) -> Result<ConvertOutput, ProcessError> {
        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().await.map_err(|err| {
            ProcessError::new(
                ErrorCategory::ConversionFailed,
                format!(
                    "failed to execute {}: {}",
                    request.program.display(),
                    err
                ),
            )
            .with_code("PROC-CMD-002")
        })?;

        let mut merged = limit_bytes(&output.stdout);
        merged.push_str(&limit_bytes(&output.stderr));

        Ok(ConvertOutput {
            exit_code: output.status.code().unwrap_or(-1),
            output: merged,
        })
    }
}

fn limit_bytes(bytes: &[u8]) -> String {
    let limit = OUTPUT_CAPTURE_LIMIT_BYTES.min(bytes.len());
    String::from_utf8_lossy(&bytes[..limit]).into_owned()
}

/// Template tokenization failure.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("unbalanced quote in command template")]
    UnbalancedQuote,
    #[error("command template is empty")]
    Empty,
}

/// Split a command-line string into tokens.
///
/// Contract: tokens are separated by unquoted whitespace; single and double
/// quotes group text (including spaces) into one token and are stripped; there
/// are no escape sequences. This deliberately stays a simple splitter, not a
/// shell; callers needing exact argument control use the argv transform shape.
pub fn split_command_line(line: &str) -> Result<Vec<String>, SplitError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(open) if ch == open => {
                quote = None;
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                has_token = true;
            }
            None if ch.is_whitespace() => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            None => {
                current.push(ch);
                has_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(SplitError::UnbalancedQuote);
    }
    if has_token {
        tokens.push(current);
    }
    if tokens.is_empty() {
        return Err(SplitError::Empty);
    }
    Ok(tokens)
}

/// Locate `program` on the search path.
///
/// Checked before every spawn so a misconfigured host fails with a message
/// naming the missing converter instead of a generic spawn error.
pub fn resolve_program(program: &str) -> Result<PathBuf, ProcessError> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
    } else if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let resolved = dir.join(program);
            if resolved.is_file() {
                return Ok(resolved);
            }
        }
    }

    Err(ProcessError::new(
        ErrorCategory::MissingExecutable,
        format!("executable `{}` was not found on the search path", program),
    )
    .with_code("PROC-CMD-001"))
}
