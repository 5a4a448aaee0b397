//! Dotted path parsing and navigation over TOML trees
//!
//! Paths address nodes in a resolved configuration tree. They are used by
//! every `get` lookup and by the `node` field of import declarations.
//!
//! Supported syntax:
//!
//! - Dot notation: `library.stages.preprocessing`
//! - Quoted keys: `servers."eu.west".host` or `servers["eu.west"].host`
//! - Array indices: `stages[0].tool`

use std::fmt;

use toml::{Table, Value};

/// A single step in a node path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named key for table members
    Key(String),
    /// A numeric index for array elements
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) if is_bare_key(key) => write!(f, "{}", key),
            PathSegment::Key(key) => write!(f, "{:?}", key),
            PathSegment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parse a path string into segments
///
/// Unquoted keys are trimmed, so `a . b` and `a.b` are the same path. An
/// empty or whitespace-only string yields no segments.
///
/// # Examples
///
/// ```
/// use toml_repo::path::{parse_path, PathSegment};
///
/// let segments = parse_path("stages[1].tool");
/// assert_eq!(
///     segments,
///     vec![
///         PathSegment::Key("stages".to_string()),
///         PathSegment::Index(1),
///         PathSegment::Key("tool".to_string()),
///     ]
/// );
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = path.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '.' => flush_key(&mut current, &mut quoted, &mut segments),
            '"' | '\'' => {
                quoted = true;
                while let Some(next) = chars.next() {
                    if next == ch {
                        break;
                    }
                    if next == '\\' && ch == '"' {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                        continue;
                    }
                    current.push(next);
                }
            }
            '[' => {
                flush_key(&mut current, &mut quoted, &mut segments);

                let mut content = String::new();
                for next in chars.by_ref() {
                    if next == ']' {
                        break;
                    }
                    content.push(next);
                }

                let content = content.trim();
                let unquoted = content
                    .strip_prefix('"')
                    .and_then(|c| c.strip_suffix('"'))
                    .or_else(|| {
                        content
                            .strip_prefix('\'')
                            .and_then(|c| c.strip_suffix('\''))
                    });

                if let Some(key) = unquoted {
                    segments.push(PathSegment::Key(key.to_string()));
                } else if let Ok(idx) = content.parse::<usize>() {
                    segments.push(PathSegment::Index(idx));
                } else if !content.is_empty() {
                    segments.push(PathSegment::Key(content.to_string()));
                }
            }
            _ => current.push(ch),
        }
    }

    flush_key(&mut current, &mut quoted, &mut segments);
    segments
}

fn flush_key(current: &mut String, quoted: &mut bool, segments: &mut Vec<PathSegment>) {
    if *quoted {
        segments.push(PathSegment::Key(std::mem::take(current)));
    } else {
        let key = current.trim();
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }
        current.clear();
    }
    *quoted = false;
}

/// Render segments back into a path string accepted by [`parse_path`].
pub fn format_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        if matches!(segment, PathSegment::Key(_)) && !out.is_empty() {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

/// Follow one segment from `value`.
pub fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (segment, value) {
        (PathSegment::Key(key), Value::Table(table)) => table.get(key),
        (PathSegment::Index(idx), Value::Array(array)) => array.get(*idx),
        _ => None,
    }
}

/// Navigate `value` along `segments`, returning `None` if any step is missing.
pub fn lookup<'a>(value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| step(current, segment))
}

/// Navigate from a root table along `segments`.
///
/// An empty path has no value: the root table itself is not addressable.
pub fn lookup_in_table<'a>(table: &'a Table, segments: &[PathSegment]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    match first {
        PathSegment::Key(key) => lookup(table.get(key)?, rest),
        PathSegment::Index(_) => None,
    }
}

/// Mutable counterpart of [`lookup_in_table`].
pub fn lookup_in_table_mut<'a>(
    table: &'a mut Table,
    segments: &[PathSegment],
) -> Option<&'a mut Value> {
    let (first, rest) = segments.split_first()?;
    let PathSegment::Key(key) = first else {
        return None;
    };
    let mut current = table.get_mut(key)?;
    for segment in rest {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Table(table)) => table.get_mut(key)?,
            (PathSegment::Index(idx), Value::Array(array)) => array.get_mut(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}
