#![allow(clippy::result_large_err)] // Pipeline entry points return ProcessError directly to surface structured diagnostics without boxing.

pub mod command;

pub use command::{CommandRunner, ConvertOutput, ConvertRequest, TokioCommandRunner};

use crate::core::definition::{Definition, TransformContext};
use crate::core::error::ProcessError;
use crate::core::file::FileHandle;
use crate::core::transform::Transform;
use crate::core::types::{ErrorCategory, Version};
use crate::utils::files;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing;

/// Derives one named version of one file per invocation.
///
/// Stateless between invocations; the temp directory and command runner are
/// the only construction-time configuration. Concurrent invocations are safe:
/// every call allocates its own uniquely named temp paths.
pub struct Processor {
    temp_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl Processor {
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            runner: Arc::new(TokioCommandRunner),
        }
    }

    /// Override the directory used for materialized sources and converter
    /// outputs. Defaults to the platform temp path.
    pub fn with_temp_dir<T: Into<PathBuf>>(mut self, temp_dir: T) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Derive `version` of `file` according to `definition`.
    ///
    /// Returns `Ok(Some(handle))` with the derived file, `Ok(None)` when the
    /// version is skipped, or a structured error. The source file is never
    /// written to; outputs land on fresh temp paths owned by the caller
    /// afterwards.
    pub async fn process(
        &self,
        definition: &dyn Definition,
        version: &Version,
        file: &FileHandle,
        scope: Option<&str>,
    ) -> Result<Option<FileHandle>, ProcessError> {
        let ctx = TransformContext { file, scope };
        let transform = definition.transform(version, &ctx);
        tracing::debug!(
            version = %version,
            transform = transform.kind(),
            file = %file.file_name,
            "resolved transform"
        );

        match transform {
            Transform::NoAction => Ok(Some(file.clone())),
            Transform::Skip => Ok(None),
            Transform::Convert {
                template,
                extension,
            } => {
                let input = self.materialize(file)?;
                let output_path = self.allocate_output_path(file, extension.as_deref());
                let tokens = command::split_command_line(&template).map_err(|err| {
                    ProcessError::new(
                        ErrorCategory::ValidationError,
                        format!("invalid convert template `{}`: {}", template, err),
                    )
                    .with_code("PROC-EXEC-003")
                })?;
                // Paths enter the argv as whole elements and are never re-split,
                // which keeps space-containing file names intact.
                let mut args = Vec::with_capacity(tokens.len() + 1);
                args.push(input.to_string_lossy().into_owned());
                args.extend(tokens[1..].iter().cloned());
                args.push(output_path.to_string_lossy().into_owned());
                self.run_converter(&tokens[0], args, &output_path, file)
                    .await
                    .map(Some)
            }
            Transform::ConvertWith { build, extension } => {
                let input = self.materialize(file)?;
                let output_path = self.allocate_output_path(file, extension.as_deref());
                let line = (*build)(&input, &output_path);
                let tokens = command::split_command_line(&line).map_err(|err| {
                    ProcessError::new(
                        ErrorCategory::ValidationError,
                        format!("invalid built command `{}`: {}", line, err),
                    )
                    .with_code("PROC-EXEC-003")
                })?;
                self.run_converter(&tokens[0], tokens[1..].to_vec(), &output_path, file)
                    .await
                    .map(Some)
            }
            Transform::ConvertArgv { build, extension } => {
                let input = self.materialize(file)?;
                let output_path = self.allocate_output_path(file, extension.as_deref());
                let argv = (*build)(&input, &output_path);
                let (program, rest) = argv.split_first().ok_or_else(|| {
                    ProcessError::new(
                        ErrorCategory::ValidationError,
                        "convert argv builder returned an empty vector",
                    )
                    .with_code("PROC-EXEC-003")
                })?;
                self.run_converter(program, rest.to_vec(), &output_path, file)
                    .await
                    .map(Some)
            }
            Transform::Custom {
                name,
                apply,
                params,
            } => {
                let source = self.materialized_handle(file)?;
                tracing::debug!(custom = %name, file = %file.file_name, "invoking custom transform");
                (*apply)(&source, &params).map(Some)
            }
            #[allow(unreachable_patterns)]
            other => Err(ProcessError::new(
                ErrorCategory::UnrecognizedTransform,
                format!("transform shape `{}` is not supported", other.kind()),
            )
            .with_code("PROC-EXEC-004")),
        }
    }

    /// Ensure the source is readable from a local path. Binary-backed handles
    /// get exactly one uniquely named temp file; path-backed handles are
    /// returned as-is with no copy.
    fn materialize(&self, file: &FileHandle) -> Result<PathBuf, ProcessError> {
        if let Some(path) = &file.path {
            return Ok(path.clone());
        }
        let bytes = file.binary.as_ref().ok_or_else(|| {
            ProcessError::new(
                ErrorCategory::ValidationError,
                format!(
                    "file `{}` has neither a path nor binary content",
                    file.file_name
                ),
            )
            .with_code("PROC-SRC-002")
        })?;

        let path = self.temp_dir.join(files::unique_file_name(&file.file_name));
        fs::write(&path, bytes).map_err(|err| {
            ProcessError::new(
                ErrorCategory::SourceIo,
                format!(
                    "failed to materialize `{}` to {}: {}",
                    file.file_name,
                    path.display(),
                    err
                ),
            )
            .with_code("PROC-SRC-001")
        })?;
        tracing::debug!(file = %file.file_name, path = %path.display(), "materialized binary source");
        Ok(path)
    }

    /// Handle passed to custom callbacks: same as the source but guaranteed to
    /// carry a local path.
    fn materialized_handle(&self, file: &FileHandle) -> Result<FileHandle, ProcessError> {
        if file.path.is_some() {
            return Ok(file.clone());
        }
        let path = self.materialize(file)?;
        Ok(FileHandle {
            path: Some(path),
            binary: file.binary.clone(),
            file_name: file.file_name.clone(),
            is_temp: true,
        })
    }

    /// Fresh output path with a unique basename; extension comes from the
    /// override when set, otherwise from the source.
    fn allocate_output_path(&self, file: &FileHandle, extension: Option<&str>) -> PathBuf {
        let extension = extension.or_else(|| file.extension());
        let base = uuid::Uuid::new_v4().to_string();
        match extension {
            Some(ext) => self.temp_dir.join(format!("{}.{}", base, ext)),
            None => self.temp_dir.join(base),
        }
    }

    async fn run_converter(
        &self,
        program: &str,
        args: Vec<String>,
        output_path: &Path,
        source: &FileHandle,
    ) -> Result<FileHandle, ProcessError> {
        let resolved = command::resolve_program(program)?;
        tracing::debug!(
            program = %resolved.display(),
            args = ?args,
            output = %output_path.display(),
            "spawning converter"
        );

        let start = Instant::now();
        let output = self
            .runner
            .run(&ConvertRequest {
                program: resolved,
                args,
            })
            .await?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if output.exit_code != 0 {
            let mut err = ProcessError::new(
                ErrorCategory::ConversionFailed,
                format!(
                    "converter `{}` exited with status {}",
                    program, output.exit_code
                ),
            )
            .with_code("PROC-EXEC-001");
            err.add_context("output", &output.output);
            err.add_context("duration_ms", &duration_ms.to_string());
            return Err(err);
        }

        tracing::debug!(program = %program, duration_ms, "conversion finished");
        let file_name = files::replace_extension(
            &source.file_name,
            output_path.extension().and_then(|ext| ext.to_str()),
        );
        Ok(FileHandle {
            path: Some(output_path.to_path_buf()),
            binary: None,
            file_name,
            is_temp: true,
        })
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}
