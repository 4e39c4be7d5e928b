//! `.env` file support
//!
//! Each non-blank, non-comment line is `KEY=VALUE`, optionally prefixed with
//! `export `. Values wrapped in matching single or double quotes are
//! unquoted. Variables already present in the environment win.

use std::fs;
use std::io;
use std::path::Path;

/// Load `path` into the process environment
///
/// Returns the names of the variables that were set. A missing file is not
/// an error.
pub fn load(path: &Path) -> io::Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut applied = Vec::new();
    for (key, value) in parse(&content) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        std::env::set_var(&key, value);
        applied.push(key);
    }
    Ok(applied)
}

/// Parse `.env` content into key/value pairs, in file order
pub fn parse(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").map(str::trim).unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
