//! Operation path grammar.
//!
//! Paths address a location in a YAML document:
//!
//! - `/key` a mapping key
//! - `/0` a sequence index
//! - `/-` the position after the last sequence element
//! - `/name=value` the sequence element whose `name` field equals `value`
//!
//! A `?` suffix marks a segment optional. Optionality carries over to every
//! following segment: optional segments are created when missing (`add`,
//! `replace`) and a missing optional target makes `remove` a no-op.
//! `~1` and `~0` escape `/` and `~` inside a segment.

use std::fmt;
use std::str::FromStr;

/// What a single path segment addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
    Append,
    Match { field: String, value: String },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{}", key),
            Segment::Index(index) => write!(f, "{}", index),
            Segment::Append => write!(f, "-"),
            Segment::Match { field, value } => write!(f, "{}={}", field, value),
        }
    }
}

/// A segment together with its effective optionality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub segment: Segment,
    pub optional: bool,
}

/// A parsed operation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl OpsPath {
    /// Segments from the document root. Empty for the root path `/`.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for OpsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for OpsPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| "paths must start with '/'".to_string())?;

        let mut segments = Vec::new();
        if rest.is_empty() {
            return Ok(Self {
                raw: s.to_string(),
                segments,
            });
        }

        let mut optional = false;
        for token in rest.split('/') {
            let (token, marked) = match token.strip_suffix('?') {
                Some(stripped) => (stripped, true),
                None => (token, false),
            };
            optional |= marked;

            if token.is_empty() {
                return Err("empty path segment".to_string());
            }

            segments.push(PathSegment {
                segment: parse_segment(token)?,
                optional,
            });
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }
}

fn parse_segment(token: &str) -> Result<Segment, String> {
    if token == "-" {
        return Ok(Segment::Append);
    }

    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse()
            .map(Segment::Index)
            .map_err(|e| format!("invalid index '{}': {}", token, e));
    }

    if let Some((field, value)) = token.split_once('=') {
        if field.is_empty() {
            return Err(format!("matcher '{}' has no field name", token));
        }
        return Ok(Segment::Match {
            field: unescape(field),
            value: unescape(value),
        });
    }

    Ok(Segment::Key(unescape(token)))
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
