//! Host inventory from an OpenSSH client config.
//!
//! The fleet is whatever the experiment's ssh_config names: every `Host`
//! alias, in file order. Pattern entries (`*`, `?`, negations) are match
//! rules rather than hosts and are skipped.

use std::path::Path;
use submit_core::ConfigError;

/// Read every `Host` alias from the OpenSSH config at `path`.
pub fn read_hostnames(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_hostnames(&text))
}

/// Extract `Host` aliases from OpenSSH config text, in file order.
fn parse_hostnames(text: &str) -> Vec<String> {
    let mut names = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        if let Some(keyword) = tokens.next() {
            if !keyword.eq_ignore_ascii_case("host") {
                continue;
            }
            for alias in tokens {
                if alias.contains('*') || alias.contains('?') || alias.starts_with('!') {
                    continue;
                }
                names.push(alias.to_string());
            }
        }
    }

    names
}
