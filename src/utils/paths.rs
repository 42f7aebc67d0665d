//! Output path handling
//!
//! Expands `$NAME` and `${NAME}` references the way shells do, leaving
//! references to unset variables untouched.

use std::path::PathBuf;

/// Environment variable expansion for user-supplied paths
pub struct PathExpander;

impl PathExpander {
    /// Expand variables from the process environment
    #[must_use]
    pub fn expand_env_vars(input: &str) -> String {
        Self::expand_with(input, |name| std::env::var(name).ok())
    }

    /// Expand variables and convert to a path
    #[must_use]
    pub fn expand_path(input: &str) -> PathBuf {
        PathBuf::from(Self::expand_env_vars(input))
    }

    /// Expand variables using `lookup` to resolve names
    pub fn expand_with<F>(input: &str, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(dollar) = rest.find('$') {
            out.push_str(&rest[..dollar]);
            let after = &rest[dollar + 1..];

            let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => ("", 0),
                }
            } else {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            };

            let reference = &rest[dollar..dollar + 1 + consumed];
            match (name.is_empty(), lookup(name)) {
                (false, Some(value)) => out.push_str(&value),
                _ if consumed == 0 => out.push('$'),
                _ => out.push_str(reference),
            }
            rest = &rest[dollar + 1 + consumed..];
        }

        out.push_str(rest);
        out
    }
}
