//! Filesystem-safe name sanitization
//!
//! Shared by `codetriever-meta-data` (clone directory naming) and
//! `codetriever-indexing` (job registry keys) so a repo name maps to
//! the same safe string everywhere it's used.

/// Maximum length of a sanitized repo name.
pub const MAX_REPO_NAME_LEN: usize = 100;

/// Characters that are never safe in a path component across platforms.
const UNSAFE_CHARS: [char; 8] = ['<', '>', ':', '"', '/', '\\', '|', '?'];

/// Replace unsafe characters and control characters with `_`, then
/// truncate to [`MAX_REPO_NAME_LEN`] characters.
///
/// This is the canonical `RepoName` transform from spec.md §3/§4.5: a
/// filesystem-safe string used both as the clone directory name and as
/// the unique key in the job registry and search filters.
pub fn sanitize_repo_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if UNSAFE_CHARS.contains(&c) || c == '*' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    replaced.chars().take(MAX_REPO_NAME_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unsafe_characters() {
        assert_eq!(sanitize_repo_name("foo/bar:baz"), "foo_bar_baz");
        assert_eq!(sanitize_repo_name("a<b>c\"d|e?f*g"), "a_b_c_d_e_f_g");
    }

    #[test]
    fn replaces_control_characters() {
        let input = "name\n\twith\0control";
        let sanitized = sanitize_repo_name(input);
        assert!(!sanitized.chars().any(char::is_control));
    }

    #[test]
    fn truncates_to_max_length() {
        let long = "a".repeat(500);
        let sanitized = sanitize_repo_name(&long);
        assert_eq!(sanitized.len(), MAX_REPO_NAME_LEN);
    }

    #[test]
    fn leaves_safe_names_untouched() {
        assert_eq!(sanitize_repo_name("my-repo_123"), "my-repo_123");
    }
}
