//! A small path query language over JSON trees.
//!
//! A query is a sequence of segments:
//!
//!   * `name`: look up a key in an object,
//!   * `[N]`: index into an array,
//!   * `[*]`: project, apply the rest of the query to every array element,
//!   * `[]`: flatten, like `[*]`, but nested arrays are spliced one level.
//!
//! Segments after the first are separated by `.` unless they are bracketed.
//! Projections drop `null` and missing results, so `cells[].outputs[].data`
//! yields the `data` of every output of every cell, skipping cells without
//! outputs.
//!
//! ```rust
//! use nbsite::query::Query;
//! use serde_json::json;
//!
//! let doc = json!({ "cells": [{ "source": ["# Title\n", "body"] }] });
//! let query = Query::parse("cells[0].source[0]").unwrap();
//! assert_eq!(query.search(&doc), Some(json!("# Title\n")));
//!
//! let query = Query::parse("cells[1].source").unwrap();
//! assert_eq!(query.search(&doc), None);
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ErrorDetail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Project,
    Flatten,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub query: String,
    pub position: usize,
    pub reason: &'static str,
}

/// Intermediate evaluation state: either one node or a projection of many.
enum Cursor<'v> {
    One(&'v Value),
    Many(Vec<&'v Value>),
}

impl Query {
    pub fn parse(source: &str) -> Result<Query, QueryError> {
        let fail = |position, reason| QueryError { query: source.into(), position, reason };

        let bytes = source.as_bytes();
        let mut segments = vec![];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'[' => {
                    let close = source[i..].find(']')
                        .map(|j| i + j)
                        .ok_or_else(|| fail(i, "unterminated `[`"))?;

                    let inner = source[i + 1..close].trim();
                    segments.push(match inner {
                        "" => Segment::Flatten,
                        "*" => Segment::Project,
                        n => n.parse().map(Segment::Index)
                            .map_err(|_| fail(i + 1, "expected index, `*`, or nothing"))?,
                    });

                    i = close + 1;
                }
                b'.' if segments.is_empty()
                    || matches!(bytes.get(i + 1), None | Some(b'.' | b'[' | b']')) =>
                {
                    return Err(fail(i, "`.` must separate two segments"));
                }
                b'.' => i += 1,
                b']' => return Err(fail(i, "unmatched `]`")),
                _ => {
                    let end = source[i..].find(|c| matches!(c, '.' | '[' | ']'))
                        .map_or(source.len(), |j| i + j);

                    let name = &source[i..end];
                    if name.trim().is_empty() || name.trim() != name {
                        return Err(fail(i, "field names must be non-empty and unpadded"));
                    }

                    if !segments.is_empty() && bytes[i - 1] != b'.' {
                        return Err(fail(i, "expected `.` before field name"));
                    }

                    segments.push(Segment::Field(name.into()));
                    i = end;
                }
            }
        }

        if segments.is_empty() {
            return Err(fail(0, "query is empty"));
        }

        Ok(Query { source: source.into(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Runs the query against `root`.
    ///
    /// Returns `None` when nothing was found: a missing key, an index out of
    /// bounds, a segment applied to a node of the wrong type, a `null`, or a
    /// projection that collected nothing.
    pub fn search(&self, root: &Value) -> Option<Value> {
        let mut cursor = Cursor::One(root);
        for segment in &self.segments {
            cursor = match (cursor, segment) {
                (Cursor::One(value), Segment::Project) => match value {
                    Value::Array(items) => Cursor::Many(items.iter().collect()),
                    _ => return None,
                },
                (Cursor::One(value), Segment::Flatten) => match value {
                    Value::Array(items) => Cursor::Many(flatten(items.iter())),
                    _ => return None,
                },
                (Cursor::One(value), segment) => Cursor::One(step(value, segment)?),
                (Cursor::Many(items), Segment::Flatten) => Cursor::Many(flatten(items)),
                (Cursor::Many(items), Segment::Project) => Cursor::Many(items),
                (Cursor::Many(items), segment) => Cursor::Many(items.into_iter()
                    .filter_map(|item| step(item, segment))
                    .collect()),
            };
        }

        match cursor {
            Cursor::One(Value::Null) => None,
            Cursor::One(Value::Array(items)) if items.is_empty() => None,
            Cursor::One(value) => Some(value.clone()),
            Cursor::Many(items) if items.is_empty() => None,
            Cursor::Many(items) => Some(Value::Array(items.into_iter().cloned().collect())),
        }
    }
}

fn step<'v>(value: &'v Value, segment: &Segment) -> Option<&'v Value> {
    let next = match (value, segment) {
        (Value::Object(map), Segment::Field(name)) => map.get(name)?,
        (Value::Array(items), Segment::Index(i)) => items.get(*i)?,
        _ => return None,
    };

    (!next.is_null()).then_some(next)
}

fn flatten<'v, I: IntoIterator<Item = &'v Value>>(items: I) -> Vec<&'v Value> {
    let mut flat = vec![];
    for item in items {
        match item {
            Value::Array(inner) => flat.extend(inner),
            Value::Null => {},
            other => flat.push(other),
        }
    }

    flat
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid query `{}`: {}", self.query, self.reason)
    }
}

impl ErrorDetail for QueryError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let pointer = format!("{}\n{}^", self.query, " ".repeat(self.position));
        vec![(Some("at".into()), pointer)]
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn notebook() -> Value {
        json!({
            "cells": [
                { "source": ["# Title\n"], "outputs": [] },
                { "source": ["text"] },
                { "source": [], "outputs": [
                    { "data": { "text/plain": "1" } },
                    { "name": "stdout" },
                    { "data": { "image/png": "AAAA" } },
                ]},
                { "outputs": [{ "data": { "image/svg+xml": ["<svg>", "</svg>"] } }] },
            ]
        })
    }

    #[test]
    fn parses_segments() {
        let query = Query::parse("cells[0].source[]").unwrap();
        assert_eq!(query.segments(), &[
            Segment::Field("cells".into()),
            Segment::Index(0),
            Segment::Field("source".into()),
            Segment::Flatten,
        ]);

        let query: Query = "cells[*].source".parse().unwrap();
        assert_eq!(query.segments()[1], Segment::Project);
    }

    #[test]
    fn rejects_malformed_queries() {
        for bad in ["", "cells[0", "cells]", ".cells", "cells.", "cells[x]", "a..b", "a[0]b"] {
            assert!(Query::parse(bad).is_err(), "{bad:?} should not parse");
        }

        let error = Query::parse("cells[x]").unwrap_err();
        assert_eq!(error.position, 6);
    }

    #[test]
    fn indexes_and_fields() {
        let doc = notebook();
        let title = Query::parse("cells[0].source[0]").unwrap();
        assert_eq!(title.search(&doc), Some(json!("# Title\n")));

        let missing = Query::parse("cells[9].source[0]").unwrap();
        assert_eq!(missing.search(&doc), None);

        let mismatched = Query::parse("cells.source").unwrap();
        assert_eq!(mismatched.search(&doc), None);

        let empty = Query::parse("cells[2].source").unwrap();
        assert_eq!(empty.search(&doc), None);
    }

    #[test]
    fn flattens_outputs_across_cells() {
        let doc = notebook();
        let query = Query::parse("cells[].outputs[].data").unwrap();
        assert_eq!(query.search(&doc), Some(json!([
            { "text/plain": "1" },
            { "image/png": "AAAA" },
            { "image/svg+xml": ["<svg>", "</svg>"] },
        ])));
    }

    #[test]
    fn projection_keeps_nesting() {
        let doc = notebook();
        let query = Query::parse("cells[*].source").unwrap();
        assert_eq!(query.search(&doc), Some(json!([["# Title\n"], ["text"], []])));

        let nothing = Query::parse("cells[].missing").unwrap();
        assert_eq!(nothing.search(&doc), None);
    }

    #[test]
    fn results_are_owned_copies_of_the_located_nodes() {
        let doc = notebook();
        let query = Query::parse("cells[2].outputs[2].data").unwrap();
        let mut data = query.search(&doc).unwrap();
        assert_eq!(data, json!({ "image/png": "AAAA" }));

        data["image/png"] = json!("BBBB");
        assert_eq!(doc["cells"][2]["outputs"][2]["data"]["image/png"], "AAAA");
        assert_eq!(query.search(&doc), Some(json!({ "image/png": "AAAA" })));
    }
}
