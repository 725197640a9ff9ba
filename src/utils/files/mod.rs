use std::path::Path;

/// Extension of a bare file name, without the leading dot. Follows
/// `Path::extension` semantics: `archive.tar.gz` yields `gz`, dotfiles yield
/// nothing.
pub fn extension_of(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|ext| ext.to_str())
}

/// File name without its extension.
pub fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Swap (or strip) the extension of a bare file name.
pub fn replace_extension(file_name: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{}.{}", stem_of(file_name), ext),
        None => file_name.to_string(),
    }
}

/// Unique basename derived from `file_name`, preserving its extension so
/// downstream converters can sniff the type from the path.
pub fn unique_file_name(file_name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4(), file_name)
}
