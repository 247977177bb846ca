//! Whole-tree operations: copy, equality, merge, memory accounting, and a
//! trivial diff/patch pair.

use crate::error::{Error, ErrorKind};
use crate::value::{Object, Value};

/// Deep-copies `value`. The owned tree type can never contain a cycle — no
/// node holds a reference back to an ancestor, since every child is moved
/// in by value — so this reduces to a plain recursive clone and terminates
/// unconditionally. The cycle-tolerance this operation needs to guarantee
/// is satisfied by construction rather than by an identity map over node
/// pointers.
pub fn deep_copy(value: &Value) -> Value {
    value.clone()
}

/// Structural equality, delegating to [`Value`]'s own `PartialEq` so there
/// is exactly one definition of "equal" in the crate.
pub fn equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Shallow, right-biased merge: keys present in `overlay` replace or add to
/// `base`; nested objects are not merged recursively. Both operands must be
/// objects.
pub fn merge(base: &Value, overlay: &Value) -> Result<Value, Error> {
    let (Value::Object(base_object), Value::Object(overlay_object)) = (base, overlay) else {
        return Err(Error::new(ErrorKind::InvalidType, "merge requires two objects").record());
    };
    let mut result = base_object.clone();
    for (key, value) in overlay_object.iter() {
        result.set(key, value.clone());
    }
    Ok(Value::Object(result))
}

/// Conservative estimate of the tree's heap footprint in bytes: stack size
/// of every node plus the backing `Vec`/`String` capacities. It is an upper
/// bound, not an exact accounting of allocator overhead.
pub fn memory_size(value: &Value) -> usize {
    std::mem::size_of::<Value>() + heap_size(value)
}

fn heap_size(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
        Value::String(s) => s.capacity(),
        Value::Array(items) => {
            items.capacity() * std::mem::size_of::<Value>()
                + items.iter().map(heap_size).sum::<usize>()
        }
        Value::Object(object) => {
            object.capacity() * std::mem::size_of::<(String, Value)>()
                + object
                    .iter()
                    .map(|(key, v)| key.len() + heap_size(v))
                    .sum::<usize>()
        }
    }
}

/// Recursively shrinks every `Vec`-backed container to exactly fit its
/// contents.
pub fn shrink_to_fit(value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items.iter_mut() {
                shrink_to_fit(item);
            }
            items.shrink_to_fit();
        }
        Value::Object(object) => {
            for (_, v) in object.iter_mut() {
                shrink_to_fit(v);
            }
            object.shrink_to_fit();
        }
        _ => {}
    }
}

/// A minimal, non-recursive diff: `{changed: false}` when `old == new`, else
/// `{changed: true, old, new}` holding both full values. There is no
/// per-field delta for objects or per-element delta for arrays — deliberately
/// a record of the two full values rather than a structural diff algorithm.
pub fn diff(old: &Value, new: &Value) -> Value {
    let mut entry = Object::new();
    if old == new {
        entry.set("changed", Value::Bool(false));
    } else {
        entry.set("changed", Value::Bool(true));
        entry.set("old", old.clone());
        entry.set("new", new.clone());
    }
    Value::Object(entry)
}

/// Applies a [`diff`] record to `target`, returning a deep copy of
/// `diff.new` when the record reports a change; otherwise `target`
/// unchanged.
pub fn patch(target: &Value, diff_value: &Value) -> Result<Value, Error> {
    let result = match diff_value {
        Value::Object(entry) if entry.get("changed") == Some(&Value::Bool(true)) => entry
            .get("new")
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::InvalidType, "diff entry is missing 'new'")),
        Value::Object(entry) if entry.get("changed") == Some(&Value::Bool(false)) => {
            Ok(target.clone())
        }
        _ => Err(Error::new(
            ErrorKind::InvalidType,
            "diff value is not in the {changed, old, new} shape",
        )),
    };
    result.map_err(Error::record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn deep_copy_is_independent_of_the_source() {
        let original = parse(br#"{"a":[1,2,3]}"#).unwrap();
        let mut copy = deep_copy(&original);
        copy.as_object_mut().unwrap().set("a", Value::Array(vec![]));
        assert_ne!(original, copy);
    }

    #[test]
    fn merge_is_shallow_and_right_biased() {
        let base = parse(br#"{"a":1,"b":{"x":1}}"#).unwrap();
        let overlay = parse(br#"{"b":{"y":2},"c":3}"#).unwrap();
        let merged = merge(&base, &overlay).unwrap();
        let object = merged.as_object().unwrap();
        assert_eq!(object.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(object.get("b"), overlay.as_object().unwrap().get("b"));
        assert_eq!(object.get("c"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn merge_rejects_non_objects() {
        let err = merge(&Value::Number(1.0), &Value::Number(2.0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidType);
    }

    #[test]
    fn shrink_to_fit_drops_excess_capacity_recursively() {
        let mut object = Object::with_capacity(16);
        object.set("a", Value::Array(Vec::with_capacity(16)));
        let mut value = Value::Object(object);
        shrink_to_fit(&mut value);
        assert_eq!(value.as_object().unwrap().capacity(), 1);
        assert_eq!(
            value.as_object().unwrap().get("a").unwrap().as_array().unwrap().len(),
            0
        );
    }

    #[test]
    fn diff_of_equal_values_reports_no_change() {
        let value = Value::Number(1.0);
        let delta = diff(&value, &value);
        assert_eq!(delta.as_object().unwrap().get("changed"), Some(&Value::Bool(false)));
        assert!(delta.as_object().unwrap().get("old").is_none());
    }

    #[test]
    fn patch_round_trips_a_change() {
        let old = Value::Number(1.0);
        let new = Value::Number(2.0);
        let delta = diff(&old, &new);
        assert_eq!(patch(&old, &delta).unwrap(), new);
        let no_change = diff(&old, &old);
        assert_eq!(patch(&old, &no_change).unwrap(), old);
    }
}
