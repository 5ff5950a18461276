//! Path sanitization — the security boundary between user-supplied
//! paths and object keys.
//!
//! `sanitize_path` runs on every user-supplied path component (upload
//! filename, folder name, rename destination) before it is concatenated
//! into an object key. It is never applied to keys that came back from
//! a listing; those are already store-side values.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid path `{path}`: {reason}")]
pub struct InvalidPathError {
    pub path: String,
    pub reason: &'static str,
}

impl InvalidPathError {
    fn new(path: &str, reason: &'static str) -> Self {
        Self {
            path: path.to_string(),
            reason,
        }
    }
}

/// Validate and normalize a user-supplied relative path into an object
/// key.
///
/// Rejections, checked in order:
/// 1. any `..` substring (traversal). The check is substring-based, not
///    segment-based, so legitimate names like `my..file.txt` are also
///    rejected; that trade-off is intentional and kept conservative.
/// 2. NUL bytes.
/// 3. the Windows-reserved characters `< > : " | ? *`.
///
/// Normalization: leading `/` stripped, `\` converted to `/` (any
/// leading separators that conversion uncovers are stripped as well, so
/// a key never starts with `/`), runs of `/` collapsed. A trailing `/` is preserved (exactly one) only when
/// the original input ended with `/` — that is how a folder-marker key
/// is spelled.
pub fn sanitize_path(path: &str) -> Result<String, InvalidPathError> {
    if path.contains("..") {
        return Err(InvalidPathError::new(path, "must not contain `..`"));
    }
    if path.contains('\0') {
        return Err(InvalidPathError::new(path, "must not contain NUL bytes"));
    }
    if path
        .chars()
        .any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
    {
        return Err(InvalidPathError::new(
            path,
            "must not contain any of `< > : \" | ? *`",
        ));
    }

    // Leading separators are stripped again after the backslash
    // conversion so `\foo` cannot sneak in a leading slash.
    let converted = path.trim_start_matches('/').replace('\\', "/");
    let converted = converted.trim_start_matches('/');

    let mut key = String::with_capacity(converted.len());
    let mut prev_was_slash = false;
    for c in converted.chars() {
        if c == '/' {
            if prev_was_slash {
                continue;
            }
            prev_was_slash = true;
        } else {
            prev_was_slash = false;
        }
        key.push(c);
    }

    if path.ends_with('/') {
        if !key.ends_with('/') {
            key.push('/');
        }
    } else {
        while key.ends_with('/') {
            key.pop();
        }
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal() {
        assert!(sanitize_path("../../etc/passwd").is_err());
        assert!(sanitize_path("a/../b").is_err());
        // Substring check is deliberately conservative.
        assert!(sanitize_path("my..file.txt").is_err());
    }

    #[test]
    fn rejects_nul_and_reserved_characters() {
        assert!(sanitize_path("a\0b").is_err());
        for c in ['<', '>', ':', '"', '|', '?', '*'] {
            assert!(sanitize_path(&format!("file{c}name")).is_err(), "{c}");
        }
    }

    #[test]
    fn strips_leading_slashes() {
        assert_eq!(sanitize_path("///a/b.txt").unwrap(), "a/b.txt");
    }

    #[test]
    fn leading_backslashes_never_become_a_leading_slash() {
        assert_eq!(sanitize_path("\\foo").unwrap(), "foo");
        assert_eq!(sanitize_path("/\\foo/bar").unwrap(), "foo/bar");
        let once = sanitize_path("\\foo").unwrap();
        assert_eq!(sanitize_path(&once).unwrap(), once);
    }

    #[test]
    fn converts_backslashes_and_collapses_runs() {
        assert_eq!(sanitize_path("a\\b\\c.txt").unwrap(), "a/b/c.txt");
        assert_eq!(sanitize_path("a//b///c.txt").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn preserves_folder_marker_suffix() {
        assert_eq!(sanitize_path("a/b/").unwrap(), "a/b/");
        assert_eq!(sanitize_path("a/b//").unwrap(), "a/b/");
        assert_eq!(sanitize_path("a/b").unwrap(), "a/b");
    }

    #[test]
    fn idempotent_on_clean_input() {
        for input in ["a/b/c.txt", "folder/", "single.txt"] {
            let once = sanitize_path(input).unwrap();
            let twice = sanitize_path(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_path("").unwrap(), "");
    }
}
