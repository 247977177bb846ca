//! JSONPath-style, read-only query evaluator (spec §4.5).
//!
//! [`evaluate`] never mutates the tree it walks; every match is an owned
//! clone of a node, and a query that matches nothing yields an empty
//! `Vec`, not an error. Only malformed path *syntax* is an error.

use crate::error::{Error, ErrorKind};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(String),
    Wildcard,
    Index(i64),
    Slice(Option<i64>, Option<i64>),
    AllElements,
    Filter(FilterExpr),
}

#[derive(Debug, Clone, PartialEq)]
struct FilterExpr {
    field: String,
    op: FilterOp,
    value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FilterOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// Evaluate `path` against `root`. `$` (optional, implicit) is the root;
/// `.name` descends into an object field; `..` is accepted syntactically as
/// a no-op rather than true recursive descent (spec §4.5's scoped-down
/// variant); `.*` and `[*]` fan out over every child; `[n]` indexes an
/// array (negative counts from the end); `[start:end]` slices with clamped
/// bounds; `[?(@.field OP value)]` filters an array of objects, `OP` being
/// `==` or `!=`.
pub fn evaluate(root: &Value, path: &str) -> Result<Vec<Value>, Error> {
    let segments = parse_path(path).map_err(Error::record)?;
    let mut current = vec![root.clone()];
    for segment in &segments {
        let mut next = Vec::new();
        for value in &current {
            apply_segment(value, segment, &mut next);
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

fn parse_path(path: &str) -> Result<Vec<Segment>, Error> {
    let bytes = path.as_bytes();
    let mut pos = if bytes.first() == Some(&b'$') { 1 } else { 0 };
    let mut segments = Vec::new();

    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                pos += 1;
                if bytes.get(pos) == Some(&b'.') {
                    pos += 1;
                    continue;
                }
                if bytes.get(pos) == Some(&b'*') {
                    pos += 1;
                    segments.push(Segment::Wildcard);
                    continue;
                }
                let start = pos;
                while pos < bytes.len() && is_ident_byte(bytes[pos]) {
                    pos += 1;
                }
                if pos == start {
                    return Err(Error::new(
                        ErrorKind::InvalidSyntax,
                        "expected a field name after '.'",
                    ));
                }
                segments.push(Segment::Child(path[start..pos].to_string()));
            }
            b'[' => {
                pos += 1;
                let close = bytes[pos..]
                    .iter()
                    .position(|&b| b == b']')
                    .ok_or_else(|| Error::new(ErrorKind::InvalidSyntax, "unterminated '[' in path"))?
                    + pos;
                segments.push(parse_bracket(&path[pos..close])?);
                pos = close + 1;
            }
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidSyntax,
                    format!("unexpected character '{}' in path", other as char),
                ));
            }
        }
    }
    Ok(segments)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn parse_bracket(inner: &str) -> Result<Segment, Error> {
    let trimmed = inner.trim();
    if trimmed == "*" {
        return Ok(Segment::AllElements);
    }
    if let Some(expr) = trimmed.strip_prefix("?(").and_then(|s| s.strip_suffix(')')) {
        return Ok(Segment::Filter(parse_filter(expr)?));
    }
    if let Some(colon) = trimmed.find(':') {
        let start = parse_opt_index(trimmed[..colon].trim())?;
        let end = parse_opt_index(trimmed[colon + 1..].trim())?;
        return Ok(Segment::Slice(start, end));
    }
    trimmed
        .parse::<i64>()
        .map(Segment::Index)
        .map_err(|_| Error::new(ErrorKind::InvalidSyntax, format!("invalid index '{trimmed}'")))
}

fn parse_opt_index(s: &str) -> Result<Option<i64>, Error> {
    if s.is_empty() {
        Ok(None)
    } else {
        s.parse::<i64>()
            .map(Some)
            .map_err(|_| Error::new(ErrorKind::InvalidSyntax, format!("invalid slice bound '{s}'")))
    }
}

fn parse_filter(expr: &str) -> Result<FilterExpr, Error> {
    let expr = expr.trim();
    let rest = expr
        .strip_prefix("@.")
        .ok_or_else(|| Error::new(ErrorKind::InvalidSyntax, "filter must reference '@.field'"))?;

    let (op, op_at) = if let Some(at) = rest.find("==") {
        (FilterOp::Eq, at)
    } else if let Some(at) = rest.find("!=") {
        (FilterOp::Ne, at)
    } else {
        return Err(Error::new(
            ErrorKind::InvalidSyntax,
            "filter must use '==' or '!='",
        ));
    };

    let field = rest[..op_at].trim().to_string();
    if field.is_empty() {
        return Err(Error::new(ErrorKind::InvalidSyntax, "filter field name is empty"));
    }
    let value = parse_filter_value(rest[op_at + 2..].trim())?;
    Ok(FilterExpr { field, op, value })
}

fn parse_filter_value(s: &str) -> Result<FilterValue, Error> {
    if let Some(inner) = s
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Ok(FilterValue::String(inner.to_string()));
    }
    if let Some(inner) = s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        return Ok(FilterValue::String(inner.to_string()));
    }
    match s {
        "true" => return Ok(FilterValue::Bool(true)),
        "false" => return Ok(FilterValue::Bool(false)),
        "null" => return Ok(FilterValue::Null),
        _ => {}
    }
    s.parse::<f64>()
        .map(FilterValue::Number)
        .map_err(|_| Error::new(ErrorKind::InvalidSyntax, format!("invalid filter literal '{s}'")))
}

fn apply_segment(value: &Value, segment: &Segment, out: &mut Vec<Value>) {
    match segment {
        Segment::Child(name) => {
            if let Some(found) = value.as_object().and_then(|object| object.get(name)) {
                out.push(found.clone());
            }
        }
        Segment::Wildcard => {
            if let Some(object) = value.as_object() {
                out.extend(object.iter().map(|(_, v)| v.clone()));
            }
        }
        Segment::Index(index) => {
            if let Some(items) = value.as_array() {
                if let Some(resolved) = resolve_index(*index, items.len()) {
                    out.push(items[resolved].clone());
                }
            }
        }
        Segment::Slice(start, end) => {
            if let Some(items) = value.as_array() {
                let (from, to) = resolve_slice(*start, *end, items.len());
                out.extend(items[from..to].iter().cloned());
            }
        }
        Segment::AllElements => {
            if let Some(items) = value.as_array() {
                out.extend(items.iter().cloned());
            }
        }
        Segment::Filter(filter) => {
            if let Some(items) = value.as_array() {
                out.extend(items.iter().filter(|item| filter_matches(item, filter)).cloned());
            }
        }
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    (resolved >= 0 && resolved < len).then_some(resolved as usize)
}

fn resolve_slice(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len_i = len as i64;
    let normalize = |value: i64| -> i64 {
        if value < 0 {
            (len_i + value).max(0)
        } else {
            value.min(len_i)
        }
    };
    let from = start.map(normalize).unwrap_or(0).clamp(0, len_i) as usize;
    let to = end.map(normalize).unwrap_or(len_i).clamp(0, len_i) as usize;
    if from > to {
        (from, from)
    } else {
        (from, to)
    }
}

/// Type mismatches between the filter literal and the field's actual value
/// are simply "not a match" for either `==` or `!=` — there is no implicit
/// coercion.
fn filter_matches(item: &Value, filter: &FilterExpr) -> bool {
    let Some(found) = item.as_object().and_then(|object| object.get(&filter.field)) else {
        return false;
    };
    let comparison = match (&filter.value, found) {
        (FilterValue::String(expected), Value::String(actual)) => Some(expected == actual),
        (FilterValue::Number(expected), Value::Number(actual)) => Some(expected == actual),
        (FilterValue::Bool(expected), Value::Bool(actual)) => Some(expected == actual),
        (FilterValue::Null, Value::Null) => Some(true),
        _ => None,
    };
    match comparison {
        None => false,
        Some(equal) => match filter.op {
            FilterOp::Eq => equal,
            FilterOp::Ne => !equal,
        },
    }
}
