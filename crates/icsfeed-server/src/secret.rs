//! Secret reference resolver.
//!
//! Feed secrets and the source token in `config.toml` can point at values
//! stored outside the file:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME` from the environment
//! - `file::/path/to/secret` reads the first line of the file
//! - anything else is returned as-is (plain text)

use std::path::Path;

use crate::error::{ServerError, ServerResult};

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> ServerResult<String> {
    if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var).map_err(|message| ServerError::secret(value, message))
    } else if let Some(path) = value.strip_prefix("file::") {
        resolve_file(Path::new(path)).map_err(|message| ServerError::secret(value, message))
    } else {
        Ok(value.to_string())
    }
}

/// Reads an environment variable.
fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

/// Returns the first line of a file, without its line ending.
fn resolve_file(path: &Path) -> Result<String, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read `{}`: {}", path.display(), e))?;
    content
        .lines()
        .next()
        .map(|line| line.trim_end().to_string())
        .ok_or_else(|| format!("`{}` is empty", path.display()))
}
