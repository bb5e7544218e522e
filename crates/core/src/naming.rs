//! File name sanitization for user-supplied archive entries.
//!
//! Entry names come straight out of an uploaded archive and may contain
//! control characters, path separators, or arbitrary length. The catalog
//! only ever stores the sanitized form.

/// Maximum length (in characters) of a sanitized file name.
pub const MAX_FILE_NAME_LEN: usize = 120;

/// Characters that are unsafe in a stored file name.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Sanitize a raw entry name.
///
/// - Strips control characters and path-unsafe characters.
/// - Collapses runs of whitespace into a single space and runs of dots
///   into a single dot.
/// - Trims leading/trailing whitespace and dots.
/// - Truncates to [`MAX_FILE_NAME_LEN`], preserving the extension when
///   one exists.
///
/// Returns `None` when nothing survives; callers treat that as a
/// per-entry failure.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(raw.len());
    let mut prev_space = false;
    let mut prev_dot = false;

    for c in raw.chars() {
        if c.is_control() || UNSAFE_CHARS.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            if !prev_space {
                cleaned.push(' ');
            }
            prev_space = true;
            prev_dot = false;
            continue;
        }
        if c == '.' {
            if !prev_dot {
                cleaned.push('.');
            }
            prev_dot = true;
            prev_space = false;
            continue;
        }
        cleaned.push(c);
        prev_space = false;
        prev_dot = false;
    }

    let trimmed = cleaned
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string();
    if trimmed.is_empty() {
        return None;
    }

    Some(truncate_preserving_extension(&trimmed, MAX_FILE_NAME_LEN))
}

/// Truncate `name` to at most `max_len` characters, keeping the extension
/// (including its dot) intact when one exists and at least one stem
/// character can survive.
fn truncate_preserving_extension(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let ext = match name.rfind('.') {
        Some(pos) if pos > 0 && pos + 1 < name.len() => &name[pos..],
        _ => "",
    };

    let ext_len = ext.chars().count();
    if ext_len == 0 || ext_len >= max_len {
        return name.chars().take(max_len).collect();
    }

    let stem: String = name.chars().take(max_len - ext_len).collect();
    format!("{stem}{ext}")
}
