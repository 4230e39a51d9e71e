//! Upload file-name checks: extension allowlist and name sanitization.

use unicode_normalization::UnicodeNormalization;

use crate::defaults::{ALLOWED_EXTENSIONS, FILENAME_MAX_LENGTH, UNNAMED_FILE};

/// Lower-cased extension after the last `.`, if the name has one.
///
/// `"report.PDF"` yields `Some("pdf")`, `"report"` yields `None`, and
/// `"report."` yields `Some("")`.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check the file name against the upload allowlist (case-insensitive).
pub fn is_allowed_extension(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Sanitize filename for safe storage.
///
/// Strips directory components, folds accents to plain ASCII (NFKD, then
/// non-ASCII dropped), joins whitespace runs with `_`, removes anything
/// outside `[A-Za-z0-9._-]`, and trims `.`/`_` from both ends so the
/// result can never name a hidden file or climb out of a directory.
pub fn sanitize_filename(filename: &str) -> String {
    // Remove path components
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let sanitized: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let sanitized = sanitized.trim_matches(['.', '_']);
    if sanitized.is_empty() {
        return UNNAMED_FILE.to_string();
    }

    // Truncate if too long (preserve extension); ASCII-only so byte slicing is safe
    if sanitized.len() > FILENAME_MAX_LENGTH {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            if ext.len() < FILENAME_MAX_LENGTH {
                let stem = &sanitized[..FILENAME_MAX_LENGTH - ext.len()];
                return format!("{}{}", stem, ext);
            }
        }
        return sanitized[..FILENAME_MAX_LENGTH].to_string();
    }

    sanitized.to_string()
}
