use remaster::core::{
    Definition, ErrorCategory, FileHandle, ProcessError, Processor, Transform, TransformContext,
    Version,
};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Definition used across the suite; version names map to each transform
/// shape the pipeline supports, driven by tools present on any POSIX host.
struct NoteDefinition;

impl Definition for NoteDefinition {
    fn versions(&self) -> Vec<Version> {
        [
            "original", "hidden", "copy", "upper", "jpeg", "raw", "broken", "missing", "stamp",
            "reject",
        ]
        .iter()
        .map(|name| Version::new(*name))
        .collect()
    }

    fn transform(&self, version: &Version, _ctx: &TransformContext<'_>) -> Transform {
        match version.as_str() {
            "original" => Transform::NoAction,
            "hidden" => Transform::Skip,
            "copy" => Transform::Convert {
                template: "cp".to_string(),
                extension: None,
            },
            "upper" => Transform::ConvertArgv {
                build: Arc::new(|input, output| {
                    vec![
                        "sh".to_string(),
                        "-c".to_string(),
                        "tr a-z A-Z < \"$0\" > \"$1\"".to_string(),
                        input.to_string_lossy().into_owned(),
                        output.to_string_lossy().into_owned(),
                    ]
                }),
                extension: None,
            },
            "jpeg" => Transform::ConvertWith {
                build: Arc::new(|input, output| {
                    format!("cp \"{}\" \"{}\"", input.display(), output.display())
                }),
                extension: Some("jpg".to_string()),
            },
            "raw" => Transform::ConvertArgv {
                build: Arc::new(|input, output| {
                    vec![
                        "cp".to_string(),
                        input.to_string_lossy().into_owned(),
                        output.to_string_lossy().into_owned(),
                    ]
                }),
                extension: Some("dat".to_string()),
            },
            "broken" => Transform::ConvertArgv {
                build: Arc::new(|_input, _output| {
                    vec![
                        "sh".to_string(),
                        "-c".to_string(),
                        "echo unknown option --bogus >&2; exit 64".to_string(),
                    ]
                }),
                extension: None,
            },
            "missing" => Transform::Convert {
                template: "remaster-missing-converter-9c4e -v".to_string(),
                extension: None,
            },
            "stamp" => {
                let mut params = Map::new();
                params.insert(
                    "suffix".to_string(),
                    Value::String("-stamped".to_string()),
                );
                Transform::Custom {
                    name: "stamp".to_string(),
                    apply: Arc::new(|handle, params| {
                        let path = handle.local_path().ok_or_else(|| {
                            ProcessError::new(
                                ErrorCategory::ValidationError,
                                "stamp needs a materialized path",
                            )
                        })?;
                        let mut bytes = fs::read(path).map_err(ProcessError::from)?;
                        let suffix = params.get("suffix").and_then(Value::as_str).unwrap_or("");
                        bytes.extend_from_slice(suffix.as_bytes());
                        Ok(FileHandle {
                            path: None,
                            binary: Some(bytes),
                            file_name: handle.file_name.clone(),
                            is_temp: false,
                        })
                    }),
                    params,
                }
            }
            "reject" => Transform::Custom {
                name: "reject".to_string(),
                apply: Arc::new(|_handle, _params| {
                    Err(ProcessError::new(
                        ErrorCategory::InternalError,
                        "rejected by policy",
                    ))
                }),
                params: Map::new(),
            },
            _ => Transform::Skip,
        }
    }
}

fn write_source(dir: &TempDir, name: &str, content: &str) -> FileHandle {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write source");
    FileHandle::from_path(path)
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

#[tokio::test]
async fn test_no_action_returns_the_original_path() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "original content");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("original"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(result.path, source.path);
    assert!(!result.is_temp);
    let on_disk = fs::read_to_string(source.local_path().unwrap()).expect("read source");
    assert_eq!(on_disk, "original content");
}

#[tokio::test]
async fn test_skip_yields_no_output() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "anything");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("hidden"), &source, None)
        .await
        .expect("process");

    assert!(result.is_none());
}

#[tokio::test]
async fn test_convert_copies_to_a_fresh_temp_path() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "copy me");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("copy"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    let output_path = result.local_path().expect("output path");
    assert_ne!(Some(output_path), source.local_path());
    assert!(output_path.starts_with(dir.path()));
    assert!(result.is_temp);
    assert_eq!(extension_of(output_path), Some("txt"));
    assert_eq!(fs::read_to_string(output_path).expect("read output"), "copy me");
    assert_eq!(
        fs::read_to_string(source.local_path().unwrap()).expect("read source"),
        "copy me"
    );
}

#[tokio::test]
async fn test_template_fn_extension_override() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "photo.png", "fake pixels");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("jpeg"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    let output_path = result.local_path().expect("output path");
    assert_eq!(extension_of(output_path), Some("jpg"));
    assert_eq!(result.file_name, "photo.jpg");
    assert_eq!(
        fs::read_to_string(output_path).expect("read output"),
        "fake pixels"
    );
}

#[tokio::test]
async fn test_argv_extension_override() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "bytes");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("raw"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(extension_of(result.local_path().unwrap()), Some("dat"));
    assert_eq!(result.file_name, "note.dat");
}

#[tokio::test]
async fn test_argv_transform_rewrites_content_and_keeps_source() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "quiet words");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("upper"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(
        fs::read_to_string(result.local_path().unwrap()).expect("read output"),
        "QUIET WORDS"
    );
    assert_eq!(
        fs::read_to_string(source.local_path().unwrap()).expect("read source"),
        "quiet words"
    );
}

#[tokio::test]
async fn test_failing_converter_reports_diagnostics() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "bytes");
    let processor = Processor::new().with_temp_dir(dir.path());

    let err = processor
        .process(&NoteDefinition, &Version::new("broken"), &source, None)
        .await
        .expect_err("conversion should fail");

    assert_eq!(err.category, ErrorCategory::ConversionFailed);
    assert!(!err.is_fatal());
    assert!(err.message.contains("64"), "message: {}", err.message);
    let output = err.captured_output().expect("captured output");
    assert!(output.contains("unknown option"), "output: {}", output);
}

#[tokio::test]
async fn test_missing_executable_is_fatal_and_named() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "bytes");
    let processor = Processor::new().with_temp_dir(dir.path());

    let err = processor
        .process(&NoteDefinition, &Version::new("missing"), &source, None)
        .await
        .expect_err("missing converter should fail");

    assert_eq!(err.category, ErrorCategory::MissingExecutable);
    assert!(err.is_fatal());
    assert!(
        err.message.contains("remaster-missing-converter-9c4e"),
        "message: {}",
        err.message
    );
}

#[tokio::test]
async fn test_custom_callback_returns_binary_payload() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "hello");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("stamp"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(result.binary.as_deref(), Some(&b"hello-stamped"[..]));
    assert_eq!(result.file_name, "note.txt");
    assert_eq!(
        fs::read_to_string(source.local_path().unwrap()).expect("read source"),
        "hello"
    );
}

#[tokio::test]
async fn test_custom_callback_error_passes_through() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "hello");
    let processor = Processor::new().with_temp_dir(dir.path());

    let err = processor
        .process(&NoteDefinition, &Version::new("reject"), &source, None)
        .await
        .expect_err("callback error should propagate");

    assert_eq!(err.category, ErrorCategory::InternalError);
    assert_eq!(err.message, "rejected by policy");
}

#[tokio::test]
async fn test_spaced_file_name_survives_conversion() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "holiday photo.txt", "beach");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("copy"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(
        fs::read_to_string(result.local_path().unwrap()).expect("read output"),
        "beach"
    );

    let upper = processor
        .process(&NoteDefinition, &Version::new("upper"), &source, None)
        .await
        .expect("process")
        .expect("handle");
    assert_eq!(
        fs::read_to_string(upper.local_path().unwrap()).expect("read output"),
        "BEACH"
    );
}

#[tokio::test]
async fn test_processing_twice_yields_independent_outputs() {
    let dir = TempDir::new().expect("temp dir");
    let source = write_source(&dir, "note.txt", "same bytes");
    let processor = Processor::new().with_temp_dir(dir.path());

    let first = processor
        .process(&NoteDefinition, &Version::new("copy"), &source, None)
        .await
        .expect("process")
        .expect("handle");
    let second = processor
        .process(&NoteDefinition, &Version::new("copy"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_ne!(first.path, second.path);
    assert_eq!(
        fs::read_to_string(first.local_path().unwrap()).expect("read first"),
        fs::read_to_string(second.local_path().unwrap()).expect("read second")
    );
}

#[tokio::test]
async fn test_binary_source_is_materialized_before_conversion() {
    let dir = TempDir::new().expect("temp dir");
    let source = FileHandle::from_binary(b"hello world".to_vec(), "note.txt");
    let processor = Processor::new().with_temp_dir(dir.path());

    let result = processor
        .process(&NoteDefinition, &Version::new("upper"), &source, None)
        .await
        .expect("process")
        .expect("handle");

    assert_eq!(
        fs::read_to_string(result.local_path().unwrap()).expect("read output"),
        "HELLO WORLD"
    );
    // The materialized copy keeps the source name (and extension) in its
    // unique basename and lands in the injected temp dir.
    let materialized = fs::read_dir(dir.path())
        .expect("read temp dir")
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_name().to_string_lossy().ends_with("-note.txt"));
    assert!(materialized);
}
