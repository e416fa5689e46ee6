//! # Binding Paths
//!
//! Slash-delimited addresses into the data store, rooted at `/`. Segments
//! follow JSON Pointer escaping: `~1` stands for `/` and `~0` for `~`.

use crate::error::BindingError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One step of a binding path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key
    Key(String),
    /// Canonical decimal index (no leading zeros)
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let canonical = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw == "0" || !raw.starts_with('0'));
        match raw.parse::<usize>() {
            Ok(index) if canonical => Segment::Index(index),
            _ => Segment::Key(raw.to_string()),
        }
    }

    /// The segment as a mapping key. Indices address maps by their digits.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingPath {
    raw: String,
    segments: Vec<Segment>,
}

impl BindingPath {
    /// The root path `/`
    pub fn root() -> Self {
        Self {
            raw: "/".to_string(),
            segments: Vec::new(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, BindingError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(BindingError::NotAbsolute {
                path: raw.to_string(),
            });
        };
        if rest.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for (position, part) in rest.split('/').enumerate() {
            if part.is_empty() {
                return Err(BindingError::EmptySegment {
                    path: raw.to_string(),
                    position,
                });
            }
            let unescaped = unescape(part).ok_or_else(|| BindingError::InvalidEscape {
                path: raw.to_string(),
                segment: part.to_string(),
            })?;
            segments.push(Segment::parse(&unescaped));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when `self` is a strict prefix of `other`
    pub fn is_ancestor_of(&self, other: &BindingPath) -> bool {
        self.depth() < other.depth() && other.segments.starts_with(&self.segments)
    }
}

fn unescape(part: &str) -> Option<String> {
    if !part.contains('~') {
        return Some(part.to_string());
    }
    let mut out = String::with_capacity(part.len());
    let mut chars = part.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for BindingPath {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BindingPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for BindingPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
