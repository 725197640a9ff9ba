use crate::core::file::FileHandle;
use crate::core::transform::Transform;
use crate::core::types::Version;

/// Context handed to a definition while resolving a version's transform.
///
/// `scope` is opaque to the pipeline; it correlates related versions (for
/// example a parent record key) and is threaded through unchanged.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    pub file: &'a FileHandle,
    pub scope: Option<&'a str>,
}

/// Strategy contract consumed by the pipeline.
///
/// A definition declares the versions it derives and maps each version to a
/// [`Transform`]. Resolution must be side-effect free; the pipeline calls it
/// once per invocation.
pub trait Definition: Send + Sync + 'static {
    /// Versions this definition derives.
    fn versions(&self) -> Vec<Version>;

    /// Transform bound to `version` for the given source context.
    fn transform(&self, version: &Version, ctx: &TransformContext<'_>) -> Transform;
}
