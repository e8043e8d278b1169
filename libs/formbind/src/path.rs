use std::fmt;

use serde::Serialize;

// ═══════════════════════════════════════════════════════════════
//  Key-path grammar
//
//    key     := segment ("." segment)*
//    segment := identifier ("[" (digits | ε) "]")*
// ═══════════════════════════════════════════════════════════════

/// One unit of a parameter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PathSegment {
    Field(String),
    Index(usize),
    /// Empty brackets: `name[]`.
    Append,
}

/// Ordered segments of one parameter key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedPath(Vec<PathSegment>);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("unterminated '[' at byte {0}")]
    Unterminated(usize),

    #[error("invalid index {0:?}")]
    InvalidIndex(String),

    #[error("empty field name at byte {0}")]
    EmptyField(usize),

    #[error("unexpected {0:?} at byte {1}")]
    Unexpected(char, usize),
}

impl ParsedPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the part of `key` that follows `prefix`.
    ///
    /// Returns `None` when `key` is not under `prefix` (a key `ab` is not
    /// under the prefix `a`). An empty prefix matches every key.
    pub fn relative(key: &str, prefix: &str) -> Option<Result<ParsedPath, PathError>> {
        if prefix.is_empty() {
            return Some(parse(key));
        }
        let rest = key.strip_prefix(prefix)?;
        match rest.as_bytes().first() {
            None => Some(Ok(ParsedPath::default())),
            Some(b'.') => Some(parse(&rest[1..])),
            Some(b'[') => Some(parse(rest)),
            Some(_) => None,
        }
    }
}

impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
                PathSegment::Append => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

/// Tokenize one parameter key.
pub fn parse(key: &str) -> Result<ParsedPath, PathError> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < key.len() {
        let rest = &key[pos..];
        match rest.as_bytes()[0] {
            b'[' => {
                let (subscript, tail) = split_subscript(rest).map_err(|e| shift(e, pos))?;
                segments.push(match subscript {
                    Subscript::Index { value, .. } => PathSegment::Index(value),
                    Subscript::Append => PathSegment::Append,
                });
                pos = key.len() - tail.len();
            }
            b'.' => {
                if segments.is_empty() {
                    return Err(PathError::EmptyField(pos));
                }
                let start = pos + 1;
                let end = field_end(key, start);
                if end == start {
                    return Err(PathError::EmptyField(start));
                }
                segments.push(PathSegment::Field(key[start..end].to_string()));
                pos = end;
            }
            _ => {
                let end = field_end(key, pos);
                if !segments.is_empty() || end == pos {
                    let c = rest.chars().next().unwrap_or_default();
                    return Err(PathError::Unexpected(c, pos));
                }
                segments.push(PathSegment::Field(key[pos..end].to_string()));
                pos = end;
            }
        }
    }

    Ok(ParsedPath(segments))
}

fn field_end(key: &str, start: usize) -> usize {
    key[start..]
        .find(['.', '[', ']'])
        .map_or(key.len(), |i| start + i)
}

fn shift(err: PathError, by: usize) -> PathError {
    match err {
        PathError::Unterminated(p) => PathError::Unterminated(p + by),
        other => other,
    }
}

// ═══════════════════════════════════════════════════════════════
//  Subscripts (shared with sequence discovery)
// ═══════════════════════════════════════════════════════════════

/// Bracket content at the head of a key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Subscript<'a> {
    /// `[digits]`; `raw` keeps the spelling (`01` and `1` differ).
    Index { value: usize, raw: &'a str },
    /// `[]`
    Append,
}

/// Split `"[3].name"` into `(Index 3, ".name")`. `suffix` must start with `[`.
pub(crate) fn split_subscript(suffix: &str) -> Result<(Subscript<'_>, &str), PathError> {
    debug_assert!(suffix.starts_with('['));
    let close = suffix.find(']').ok_or(PathError::Unterminated(0))?;
    let inner = &suffix[1..close];
    let tail = &suffix[close + 1..];

    if inner.is_empty() {
        return Ok((Subscript::Append, tail));
    }
    if !inner.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidIndex(inner.to_string()));
    }
    let value = inner
        .parse::<usize>()
        .map_err(|_| PathError::InvalidIndex(inner.to_string()))?;
    Ok((Subscript::Index { value, raw: inner }, tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    #[test]
    fn parses_dotted_and_bracketed_segments() {
        let path = parse("user.Phones[1].Label").unwrap();
        assert_eq!(
            path.segments(),
            &[field("user"), field("Phones"), PathSegment::Index(1), field("Label")]
        );
    }

    #[test]
    fn parses_adjacent_brackets() {
        let path = parse("grid[0][]").unwrap();
        assert_eq!(
            path.segments(),
            &[field("grid"), PathSegment::Index(0), PathSegment::Append]
        );
        assert_eq!(path.to_string(), "grid[0][]");
    }

    #[test]
    fn rejects_malformed_brackets() {
        assert_eq!(parse("ids[x]"), Err(PathError::InvalidIndex("x".into())));
        assert_eq!(parse("ids[-1]"), Err(PathError::InvalidIndex("-1".into())));
        assert_eq!(parse("ids[2"), Err(PathError::Unterminated(3)));
        assert_eq!(parse("a..b"), Err(PathError::EmptyField(2)));
        assert_eq!(parse("a[0]b"), Err(PathError::Unexpected('b', 4)));
        assert_eq!(parse("a]"), Err(PathError::Unexpected(']', 1)));
    }

    #[test]
    fn empty_key_is_empty_path() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn relative_strips_prefix_on_boundaries_only() {
        let rel = ParsedPath::relative("pets[0].Name", "pets").unwrap().unwrap();
        assert_eq!(rel.segments(), &[PathSegment::Index(0), field("Name")]);

        let rel = ParsedPath::relative("user.Name", "user").unwrap().unwrap();
        assert_eq!(rel.segments(), &[field("Name")]);

        assert!(ParsedPath::relative("petsCount", "pets").is_none());
        assert!(ParsedPath::relative("pets", "pets").unwrap().unwrap().is_empty());
    }

    #[test]
    fn subscript_keeps_raw_spelling() {
        let (sub, tail) = split_subscript("[007].x").unwrap();
        assert_eq!(sub, Subscript::Index { value: 7, raw: "007" });
        assert_eq!(tail, ".x");
    }

    #[test]
    fn serializes_as_tagged_segments() {
        let path = parse("a[0][]").unwrap();
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!([
                {"kind": "field", "value": "a"},
                {"kind": "index", "value": 0},
                {"kind": "append"},
            ])
        );
    }
}
