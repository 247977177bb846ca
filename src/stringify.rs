//! Linearizes a [`Value`] tree to JSON bytes (spec §4.3).

use crate::value::{Object, Value};

/// Tunable knobs for [`stringify_with_config`] (spec §4.3, §4.8).
#[derive(Debug, Clone, Copy)]
pub struct StringifyConfig {
    pub pretty: bool,
    pub indent_width: usize,
}

impl Default for StringifyConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            indent_width: 2,
        }
    }
}

pub fn stringify(value: &Value) -> String {
    stringify_with_config(value, StringifyConfig::default())
}

pub fn stringify_pretty(value: &Value) -> String {
    stringify_with_config(
        value,
        StringifyConfig {
            pretty: true,
            ..StringifyConfig::default()
        },
    )
}

pub fn stringify_with_config(value: &Value, config: StringifyConfig) -> String {
    let mut out = String::new();
    write_value(value, &mut out, &config, 0);
    if config.pretty && matches!(value, Value::Array(_) | Value::Object(_)) {
        out.push('\n');
    }
    out
}

fn write_value(value: &Value, out: &mut String, config: &StringifyConfig, depth: usize) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(*n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => write_array(items, out, config, depth),
        Value::Object(object) => write_object(object, out, config, depth),
    }
}

/// Exact integer form when the value round-trips through `i64`; otherwise
/// Rust's `Display` for `f64`, which already emits the shortest decimal
/// string that round-trips back to the same bits — the property the
/// spec's `%.17g` fallback exists to guarantee. NaN/Inf (unreachable
/// through normal construction, spec §3) fall back to `null`.
fn write_number(n: f64, out: &mut String) {
    if !n.is_finite() {
        out.push_str("null");
    } else if n == 0.0 {
        out.push_str(if n.is_sign_negative() { "-0" } else { "0" });
    } else if (n as i64 as f64) == n {
        out.push_str(&(n as i64).to_string());
    } else {
        out.push_str(&n.to_string());
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_array(items: &[Value], out: &mut String, config: &StringifyConfig, depth: usize) {
    out.push('[');
    if items.is_empty() {
        out.push(']');
        return;
    }
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if config.pretty {
            out.push('\n');
            push_indent(out, config, depth + 1);
        }
        write_value(item, out, config, depth + 1);
    }
    if config.pretty {
        out.push('\n');
        push_indent(out, config, depth);
    }
    out.push(']');
}

fn write_object(object: &Object, out: &mut String, config: &StringifyConfig, depth: usize) {
    out.push('{');
    if object.is_empty() {
        out.push('}');
        return;
    }
    for (index, (key, value)) in object.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        if config.pretty {
            out.push('\n');
            push_indent(out, config, depth + 1);
        }
        write_string(key, out);
        out.push(':');
        if config.pretty {
            out.push(' ');
        }
        write_value(value, out, config, depth + 1);
    }
    if config.pretty {
        out.push('\n');
        push_indent(out, config, depth);
    }
    out.push('}');
}

fn push_indent(out: &mut String, config: &StringifyConfig, depth: usize) {
    for _ in 0..depth * config.indent_width {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn compact_round_trips_the_four_pair_example() {
        let input = r#"{"name":"Test","value":123,"active":true,"data":null}"#;
        let value = parse(input.as_bytes()).unwrap();
        assert_eq!(stringify(&value), input);
    }

    #[test]
    fn pretty_begins_with_expected_preamble() {
        let input = r#"{"name":"Test","value":123,"active":true,"data":null}"#;
        let value = parse(input.as_bytes()).unwrap();
        let pretty = stringify_pretty(&value);
        assert!(pretty.starts_with("{\n  \"name\": \"Test\","));
        assert!(pretty.ends_with('\n'));
    }

    #[test]
    fn escapes_control_bytes_and_passes_through_multibyte_utf8() {
        let value = Value::String("a\"\\\n\u{1}\u{1F600}".into());
        let out = stringify(&value);
        assert_eq!(out, "\"a\\\"\\\\\\n\\u0001\u{1F600}\"");
    }

    #[test]
    fn integral_numbers_print_without_a_decimal_point() {
        assert_eq!(stringify(&Value::Number(-0.0)), "-0");
        assert_eq!(stringify(&Value::Number(42.0)), "42");
        assert_eq!(stringify(&Value::Number(1.5)), "1.5");
    }

    #[test]
    fn empty_containers_have_no_interior_whitespace_even_pretty() {
        assert_eq!(stringify_pretty(&Value::Array(vec![])), "[]\n");
        assert_eq!(
            stringify_pretty(&Value::Object(Object::new())),
            "{}\n"
        );
    }
}
