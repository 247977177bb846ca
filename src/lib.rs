//! A strict JSON codec and in-memory value tree: a hand-rolled lexer and
//! recursive-descent parser, a stringifier, an incremental stream driver
//! for chunked input, a small JSONPath-style query evaluator, and a handful
//! of whole-tree operations (copy, merge, diff/patch).
//!
//! ```
//! let value = vtjson::parse(br#"{"name":"Ada","langs":["rust","ocaml"]}"#).unwrap();
//! assert_eq!(
//!     value.as_object().unwrap().get("name"),
//!     Some(&vtjson::Value::String("Ada".into()))
//! );
//! assert_eq!(vtjson::stringify(&value), r#"{"name":"Ada","langs":["rust","ocaml"]}"#);
//! ```

mod algebra;
mod error;
mod external;
mod lexer;
mod parser;
mod path;
mod position;
mod stream;
mod stringify;
mod value;

pub use algebra::{deep_copy, diff, equals, memory_size, merge, patch, shrink_to_fit};
pub use error::{last_error, Error, ErrorKind, Result};
pub use external::{
    read_document, read_document_with_config, write_document, write_document_with_config,
    EmbeddingAdapter, RelationalAdapter, TreeCodec,
};
pub use parser::{parse, parse_with_config, Parser, ParserConfig};
pub use path::evaluate;
pub use position::Position;
pub use stream::{Control, StreamConfig, StreamDriver, StreamEvent};
pub use stringify::{stringify, stringify_pretty, stringify_with_config, StringifyConfig};
pub use value::{Object, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_parse_query_and_stringify() {
        let value = parse(
            br#"{"users":[{"name":"Ada","active":true},{"name":"Linus","active":false}]}"#,
        )
        .unwrap();

        let active_names = evaluate(&value, "$.users[?(@.active==true)].name").unwrap();
        assert_eq!(active_names, vec![Value::String("Ada".into())]);

        let copy = deep_copy(&value);
        assert!(equals(&value, &copy));
        assert_eq!(stringify(&copy), stringify(&value));
    }
}
