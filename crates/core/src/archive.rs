//! Constants and pure logic for validating an uploaded photo archive.
//!
//! This module has zero external dependencies (no zip parsing, no I/O).
//! It provides:
//!
//! - Configuration ceilings shared by the pipeline and its tests.
//! - The ZIP container signature check.
//! - Entry filtering: directories, OS metadata files, and unsupported
//!   extensions are excluded; the survivors are sorted so that processing
//!   order is identical across invocations.

// ── Constants ────────────────────────────────────────────────────────

/// Leading bytes of a ZIP local file header (`PK\x03\x04`).
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Image file extensions accepted inside an archive.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

// ── Container checks ─────────────────────────────────────────────────

/// Returns `true` if `bytes` starts with the ZIP local file header.
///
/// Rejects renamed non-archives before any entry parsing happens.
pub fn has_zip_signature(bytes: &[u8]) -> bool {
    bytes.len() >= ZIP_SIGNATURE.len() && bytes[..ZIP_SIGNATURE.len()] == ZIP_SIGNATURE
}

// ── Entry filtering ──────────────────────────────────────────────────

/// Returns `true` if the file name represents a hidden or OS-generated file.
pub fn is_hidden_or_system(file_name: &str) -> bool {
    file_name.starts_with('.')
        || file_name.starts_with("._")
        || file_name == "Thumbs.db"
        || file_name == "desktop.ini"
}

/// Returns `true` if the entry path names a directory (trailing slash) or
/// lives under an OS metadata subtree such as `__MACOSX/`.
pub fn is_skippable_path(entry_name: &str) -> bool {
    if entry_name.ends_with('/') || entry_name.ends_with('\\') {
        return true;
    }
    entry_name
        .split(['/', '\\'])
        .any(|component| component == "__MACOSX" || is_hidden_or_system(component))
}

/// Lowercase extension of an entry name, without the dot.
pub fn entry_extension(entry_name: &str) -> Option<String> {
    let base = entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name);
    match base.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < base.len() => Some(base[pos + 1..].to_lowercase()),
        _ => None,
    }
}

/// Returns `true` if the extension is one of the accepted image types.
pub fn is_supported_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Filter raw archive entry names down to the processable image entries.
///
/// Excludes directories, OS metadata/hidden files, and entries whose
/// extension is not a supported image type. The result is sorted
/// lexicographically so that the processing order is deterministic across
/// invocations.
pub fn filter_entries<S: AsRef<str>>(entry_names: &[S]) -> Vec<String> {
    let mut entries: Vec<String> = entry_names
        .iter()
        .map(|n| n.as_ref())
        .filter(|name| !is_skippable_path(name))
        .filter(|name| {
            entry_extension(name)
                .map(|ext| is_supported_extension(&ext))
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect();
    entries.sort();
    entries
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_signature_matches() {
        assert!(has_zip_signature(b"PK\x03\x04rest-of-archive"));
    }

    #[test]
    fn test_zip_signature_rejects_other_bytes() {
        assert!(!has_zip_signature(b"\x89PNG\r\n\x1a\n"));
        assert!(!has_zip_signature(b"PK\x05\x06")); // empty central directory only
        assert!(!has_zip_signature(b"PK"));
        assert!(!has_zip_signature(b""));
    }

    #[test]
    fn test_hidden_files() {
        assert!(is_hidden_or_system(".DS_Store"));
        assert!(is_hidden_or_system("._portrait.jpg"));
        assert!(is_hidden_or_system("Thumbs.db"));
        assert!(is_hidden_or_system("desktop.ini"));
        assert!(!is_hidden_or_system("portrait.jpg"));
    }

    #[test]
    fn test_skippable_paths() {
        assert!(is_skippable_path("photos/"));
        assert!(is_skippable_path("__MACOSX/photos/a.jpg"));
        assert!(is_skippable_path("photos/.hidden.jpg"));
        assert!(!is_skippable_path("photos/a.jpg"));
    }

    #[test]
    fn test_entry_extension() {
        assert_eq!(entry_extension("a/b/photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(entry_extension("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(entry_extension("noext"), None);
        assert_eq!(entry_extension(".hidden"), None);
        assert_eq!(entry_extension("trailingdot."), None);
    }

    #[test]
    fn test_supported_extensions() {
        for ext in IMAGE_EXTENSIONS {
            assert!(is_supported_extension(ext), "ext: {ext}");
        }
        assert!(is_supported_extension("JPG"));
        assert!(!is_supported_extension("tiff"));
        assert!(!is_supported_extension("exe"));
        assert!(!is_supported_extension(""));
    }

    #[test]
    fn test_filter_excludes_and_sorts() {
        let raw = [
            "zebra.jpg",
            "photos/",
            "__MACOSX/._a.jpg",
            ".DS_Store",
            "alpha.png",
            "readme.txt",
            "middle.webp",
        ];
        let filtered = filter_entries(&raw);
        assert_eq!(filtered, vec!["alpha.png", "middle.webp", "zebra.jpg"]);
    }

    #[test]
    fn test_filter_empty_input() {
        let raw: [&str; 0] = [];
        assert!(filter_entries(&raw).is_empty());
    }

    #[test]
    fn test_filter_is_deterministic() {
        let a = ["b.jpg", "a.jpg", "c.jpg"];
        let b = ["c.jpg", "b.jpg", "a.jpg"];
        assert_eq!(filter_entries(&a), filter_entries(&b));
    }
}
