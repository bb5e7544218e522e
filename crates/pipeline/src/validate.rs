//! Container and entry validation.
//!
//! Container-level checks are job-fatal; entry-level checks fail only the
//! entry they belong to. Pure byte/name predicates live in `gala-core`;
//! this module adds the ZIP parsing around them.

use std::io::{Cursor, Read};

use gala_core::archive::{filter_entries, has_zip_signature};
use gala_core::sniff::{sniff_image, ImageKind};

use crate::config::PipelineConfig;
use crate::error::{EntryFailure, PipelineError};

/// A ZIP archive held fully in memory for one invocation.
pub type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// Open downloaded archive bytes for entry access.
pub fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, PipelineError> {
    if !has_zip_signature(bytes) {
        return Err(PipelineError::BadArchiveSignature);
    }
    zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::ArchiveUnreadable(e.to_string()))
}

/// Parse the archive's entry table into the ordered, filtered entry list
/// and enforce the entry-count ceilings.
///
/// This runs once per job, during extraction; the result is persisted as
/// the resume checkpoint so later invocations never re-derive it.
pub fn extract_entry_list(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<Vec<String>, PipelineError> {
    let archive = open_archive(bytes)?;
    let names: Vec<String> = archive.file_names().map(String::from).collect();
    let entries = filter_entries(&names);

    if entries.is_empty() {
        return Err(PipelineError::NoEntries);
    }
    if entries.len() > config.max_entries {
        return Err(PipelineError::TooManyEntries {
            count: entries.len(),
            limit: config.max_entries,
        });
    }
    Ok(entries)
}

/// Read one entry's bytes out of the archive, enforcing the per-entry
/// size ceiling before the payload is pulled into memory.
pub fn read_entry(
    archive: &mut Archive<'_>,
    entry_name: &str,
    max_entry_bytes: u64,
) -> Result<Vec<u8>, EntryFailure> {
    let mut file = archive
        .by_name(entry_name)
        .map_err(|_| EntryFailure::Missing)?;

    if file.size() > max_entry_bytes {
        return Err(EntryFailure::TooLarge {
            size: file.size(),
            limit: max_entry_bytes,
        });
    }

    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)
        .map_err(|e| EntryFailure::Decode(e.to_string()))?;
    Ok(bytes)
}

/// Sniff the raster format of extracted entry bytes.
///
/// The claimed extension got the entry past filtering; the bytes decide
/// whether it is actually processable.
pub fn sniff_entry(bytes: &[u8]) -> Result<ImageKind, EntryFailure> {
    sniff_image(bytes).ok_or(EntryFailure::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const JPEG_STUB: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn test_open_rejects_non_zip_bytes() {
        let err = open_archive(b"\x89PNG\r\n\x1a\nnot-a-zip").unwrap_err();
        assert!(matches!(err, PipelineError::BadArchiveSignature));
    }

    #[test]
    fn test_extract_filters_and_sorts() {
        let bytes = build_zip(&[
            ("b.jpg", JPEG_STUB),
            ("notes.txt", b"hello"),
            ("a.jpg", JPEG_STUB),
            (".DS_Store", b"junk"),
        ]);
        let entries = extract_entry_list(&bytes, &PipelineConfig::default()).unwrap();
        assert_eq!(entries, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_extract_rejects_empty_archive() {
        let bytes = build_zip(&[("readme.txt", b"no images here")]);
        let err = extract_entry_list(&bytes, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::NoEntries));
    }

    #[test]
    fn test_extract_enforces_entry_ceiling() {
        let names: Vec<String> = (0..5).map(|i| format!("photo-{i}.jpg")).collect();
        let entries: Vec<(&str, &[u8])> =
            names.iter().map(|n| (n.as_str(), JPEG_STUB)).collect();
        let bytes = build_zip(&entries);

        let config = PipelineConfig {
            max_entries: 3,
            ..PipelineConfig::default()
        };
        let err = extract_entry_list(&bytes, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TooManyEntries { count: 5, limit: 3 }
        ));
    }

    #[test]
    fn test_read_entry_round_trip() {
        let bytes = build_zip(&[("a.jpg", JPEG_STUB)]);
        let mut archive = open_archive(&bytes).unwrap();
        let entry = read_entry(&mut archive, "a.jpg", 1024).unwrap();
        assert_eq!(entry, JPEG_STUB);
    }

    #[test]
    fn test_read_entry_enforces_size_ceiling() {
        let big = vec![0xAB; 2048];
        let bytes = build_zip(&[("big.jpg", big.as_slice())]);
        let mut archive = open_archive(&bytes).unwrap();
        let err = read_entry(&mut archive, "big.jpg", 1024).unwrap_err();
        assert!(matches!(err, EntryFailure::TooLarge { size: 2048, .. }));
    }

    #[test]
    fn test_read_entry_missing() {
        let bytes = build_zip(&[("a.jpg", JPEG_STUB)]);
        let mut archive = open_archive(&bytes).unwrap();
        let err = read_entry(&mut archive, "ghost.jpg", 1024).unwrap_err();
        assert!(matches!(err, EntryFailure::Missing));
    }

    #[test]
    fn test_sniff_entry_rejects_mislabeled_bytes() {
        // Extension said .jpg, bytes say plain text.
        let err = sniff_entry(b"plain text pretending").unwrap_err();
        assert!(matches!(err, EntryFailure::UnknownFormat));
    }

    #[test]
    fn test_sniff_entry_accepts_jpeg() {
        assert_eq!(sniff_entry(JPEG_STUB).unwrap(), ImageKind::Jpeg);
    }
}
