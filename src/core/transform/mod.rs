use crate::core::error::ProcessError;
use crate::core::file::FileHandle;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Builds the full command-line string for a converter, given the input and
/// output paths. The first token of the returned string is the program name;
/// the function owns path placement and quoting.
pub type CommandTemplateFn = Arc<dyn Fn(&Path, &Path) -> String + Send + Sync>;

/// Builds the argument vector directly; the first element is the program name
/// and the function inserts the input/output paths itself. No tokenization is
/// applied, so paths never need quoting. Preferred over the string shapes.
pub type CommandArgvFn = Arc<dyn Fn(&Path, &Path) -> Vec<String> + Send + Sync>;

/// Custom processing callback, invoked with the materialized source handle and
/// the transform's params map. Its return value is the final result; errors
/// pass through to the caller unchanged.
pub type CustomTransformFn =
    Arc<dyn Fn(&FileHandle, &Map<String, Value>) -> Result<FileHandle, ProcessError> + Send + Sync>;

/// What to do for one (definition, version) pair.
///
/// The convert shapes all carry an optional target extension; when set, the
/// generated output path uses it instead of the source's extension.
#[non_exhaustive]
pub enum Transform {
    /// Output equals input; no copy is made and the returned handle keeps the
    /// original path.
    NoAction,
    /// No output at all. Distinct from failure.
    Skip,
    /// Literal argument template, e.g. `"convert -strip -thumbnail 10x10"`.
    /// The first token is the program; the input path is inserted as the first
    /// positional argument and the generated output path as the last.
    Convert {
        template: String,
        extension: Option<String>,
    },
    /// Template function producing the full command-line string. Tokenized
    /// with the same quote-aware splitter as `Convert`; kept as a
    /// compatibility shim for callers that already build command strings.
    ConvertWith {
        build: CommandTemplateFn,
        extension: Option<String>,
    },
    /// Argument-vector function; the primary supported converter shape.
    ConvertArgv {
        build: CommandArgvFn,
        extension: Option<String>,
    },
    /// First-class callback with a params map. `name` only labels logs and
    /// diagnostics.
    Custom {
        name: String,
        apply: CustomTransformFn,
        params: Map<String, Value>,
    },
}

impl Transform {
    /// Stable label used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Transform::NoAction => "no_action",
            Transform::Skip => "skip",
            Transform::Convert { .. } => "convert",
            Transform::ConvertWith { .. } => "convert_with",
            Transform::ConvertArgv { .. } => "convert_argv",
            Transform::Custom { .. } => "custom",
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Convert {
                template,
                extension,
            } => f
                .debug_struct("Convert")
                .field("template", template)
                .field("extension", extension)
                .finish(),
            Transform::ConvertWith { extension, .. } => f
                .debug_struct("ConvertWith")
                .field("extension", extension)
                .finish_non_exhaustive(),
            Transform::ConvertArgv { extension, .. } => f
                .debug_struct("ConvertArgv")
                .field("extension", extension)
                .finish_non_exhaustive(),
            Transform::Custom { name, params, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("params", params)
                .finish_non_exhaustive(),
            other => f.write_str(other.kind()),
        }
    }
}
