//! Raster format detection by leading magic bytes.
//!
//! Sniffing is independent of the claimed file extension: an entry named
//! `photo.jpg` whose bytes are not a known raster format is rejected by the
//! validator regardless of its name.

use serde::{Deserialize, Serialize};

/// A raster format recognised by its byte signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageKind {
    /// Canonical lowercase extension for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// MIME content type used when storing original bytes.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Identify the raster format of `bytes`, or `None` if no supported
/// signature matches.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageKind::Jpeg);
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageKind::Png);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageKind::WebP);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(ImageKind::Gif);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_jpeg() {
        assert_eq!(
            sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]),
            Some(ImageKind::Jpeg)
        );
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(
            sniff_image(b"\x89PNG\r\n\x1a\n-----"),
            Some(ImageKind::Png)
        );
    }

    #[test]
    fn test_sniff_webp() {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(b"WEBPVP8 ");
        assert_eq!(sniff_image(&bytes), Some(ImageKind::WebP));
    }

    #[test]
    fn test_sniff_gif() {
        assert_eq!(sniff_image(b"GIF89a----"), Some(ImageKind::Gif));
        assert_eq!(sniff_image(b"GIF87a----"), Some(ImageKind::Gif));
    }

    #[test]
    fn test_sniff_rejects_unknown() {
        assert_eq!(sniff_image(b"PK\x03\x04"), None);
        assert_eq!(sniff_image(b"plain text"), None);
        assert_eq!(sniff_image(b""), None);
        // RIFF container that is not WebP (e.g. WAV)
        let mut wav = b"RIFF".to_vec();
        wav.extend_from_slice(&[0x10, 0x00, 0x00, 0x00]);
        wav.extend_from_slice(b"WAVEfmt ");
        assert_eq!(sniff_image(&wav), None);
    }

    #[test]
    fn test_sniff_truncated_header() {
        assert_eq!(sniff_image(&[0xFF, 0xD8]), None);
        assert_eq!(sniff_image(b"RIFF1234"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ImageKind::Jpeg.content_type(), "image/jpeg");
        assert_eq!(ImageKind::Png.content_type(), "image/png");
        assert_eq!(ImageKind::WebP.content_type(), "image/webp");
        assert_eq!(ImageKind::Gif.content_type(), "image/gif");
    }
}
