//! Path pattern matching
//!
//! Patterns are matched one `/`-separated segment at a time. Each segment is
//! a shell glob (`*`, `?`, `[...]`) compiled with the `glob` crate; a segment
//! that is exactly `**` matches zero or more whole path segments. Inside any
//! other segment a run of stars means the same as a single `*`.

use glob::Pattern;
use thiserror::Error;

/// Errors produced when compiling a pattern
#[derive(Debug, Error)]
pub enum PatternError {
    /// A segment is not a valid glob
    #[error("Invalid pattern '{pattern}': {reason}")]
    Invalid { pattern: String, reason: String },
}

#[derive(Debug, Clone)]
enum Segment {
    /// `**`
    AnyDepth,
    Glob(Pattern),
}

/// A compiled path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern; backslashes are treated as separators
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let source = normalize(pattern);
        if source.is_empty() {
            return Ok(Self {
                source,
                segments: Vec::new(),
            });
        }

        let segments = source
            .split('/')
            .map(|segment| {
                if segment == "**" {
                    return Ok(Segment::AnyDepth);
                }
                Pattern::new(&collapse_stars(segment))
                    .map(Segment::Glob)
                    .map_err(|e| PatternError::Invalid {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { source, segments })
    }

    /// Whether the pattern contains a directory separator
    pub fn has_separator(&self) -> bool {
        self.source.contains('/')
    }

    /// Match a relative path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        if self.segments.is_empty() {
            return path.is_empty();
        }
        let targets: Vec<&str> = path.split('/').collect();
        match_segments(&self.segments, &targets)
    }
}

/// Compile `pattern` and match it against `path` in one step
pub fn match_path(pattern: &str, path: &str) -> Result<bool, PatternError> {
    Ok(PathPattern::new(pattern)?.matches(path))
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

// `glob` only accepts `**` as a whole path component.
fn collapse_stars(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == '*' && out.ends_with('*') {
            continue;
        }
        out.push(c);
    }
    out
}

fn match_segments(patterns: &[Segment], targets: &[&str]) -> bool {
    let Some((first, rest)) = patterns.split_first() else {
        return targets.is_empty();
    };

    match first {
        Segment::AnyDepth => {
            // Either `**` matches nothing, or it swallows one more segment.
            if match_segments(rest, targets) {
                return true;
            }
            (0..targets.len()).any(|i| match_segments(patterns, &targets[i + 1..]))
        }
        Segment::Glob(glob) => match targets.split_first() {
            Some((target, remaining)) => glob.matches(target) && match_segments(rest, remaining),
            None => false,
        },
    }
}

/// Exclusion rules for one build target
///
/// Entries containing `/` are matched against the whole relative path;
/// entries without one are matched against the file name only, in any
/// directory.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<PathPattern>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self, PatternError> {
        let patterns = entries
            .iter()
            .map(|entry| PathPattern::new(entry.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether `rel_path` is excluded by any entry
    pub fn excludes(&self, rel_path: &str) -> bool {
        let rel_path = normalize(rel_path);
        let base_name = rel_path.rsplit('/').next().unwrap_or(&rel_path);
        self.patterns.iter().any(|pattern| {
            if pattern.has_separator() {
                pattern.matches(&rel_path)
            } else {
                pattern.matches(base_name)
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
