//! External interfaces. The file adapter is a real, thin `std::fs` wrapper;
//! the relational, embedding, and peripheral-codec adapters are trait-only
//! seams with no shipped implementation — each is an explicit non-goal, not
//! an oversight.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, ErrorKind};
use crate::parser::{self, ParserConfig};
use crate::stringify::{self, StringifyConfig};
use crate::value::Value;

const MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

pub fn read_document(path: impl AsRef<Path>) -> Result<Value, Error> {
    read_document_with_config(path, ParserConfig::default())
}

pub fn read_document_with_config(
    path: impl AsRef<Path>,
    config: ParserConfig,
) -> Result<Value, Error> {
    read_document_inner(path.as_ref(), config).map_err(Error::record)
}

fn read_document_inner(path: &Path, config: ParserConfig) -> Result<Value, Error> {
    let metadata = fs::metadata(path).map_err(|err| map_read_error(path, err))?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(Error::new(
            ErrorKind::OutOfMemory,
            format!(
                "'{}' is {} bytes, exceeding the {} byte file ceiling",
                path.display(),
                metadata.len(),
                MAX_FILE_BYTES
            ),
        ));
    }
    let bytes = fs::read(path).map_err(|err| map_read_error(path, err))?;
    parser::parse_with_config(&bytes, config)
}

pub fn write_document(path: impl AsRef<Path>, value: &Value) -> Result<(), Error> {
    write_document_with_config(path, value, StringifyConfig::default())
}

pub fn write_document_with_config(
    path: impl AsRef<Path>,
    value: &Value,
    config: StringifyConfig,
) -> Result<(), Error> {
    let path = path.as_ref();
    let text = stringify::stringify_with_config(value, config);
    fs::write(path, text).map_err(|err| {
        Error::new(
            ErrorKind::FileWriteError,
            format!("failed to write '{}': {}", path.display(), err),
        )
        .record()
    })
}

fn map_read_error(path: &Path, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::new(
            ErrorKind::FileNotFound,
            format!("'{}' does not exist", path.display()),
        )
    } else {
        Error::new(
            ErrorKind::FileReadError,
            format!("failed to read '{}': {}", path.display(), err),
        )
    }
}

/// Mirrors a tabular Value (an array of objects with uniform keys) to a SQL
/// store: `open`/`close` bracket a connection handle, `exec` runs a single
/// parameterized statement. No implementation ships here (non-goal:
/// table/column inference, identifier validation, and value binding are
/// all a SQL backend's responsibility, not this crate's); the
/// trait exists so a peripheral crate can plug one in against the same
/// `Value`/`Error` types.
pub trait RelationalAdapter {
    type Handle;

    fn open(&self, path: &str) -> Result<Self::Handle, Error>;
    fn close(&self, handle: Self::Handle) -> Result<(), Error>;
    fn exec(&self, handle: &Self::Handle, statement: &str, params: &[Value]) -> Result<Value, Error>;
}

/// Exposes the core tree operations through opaque handles bound to a host
/// runtime's object model. A handle returned as an owning root must run its
/// destructor on release; a handle returned from a sub-value accessor (e.g.
/// an array element) is a non-owning borrow, and the embedder must not
/// release the parent while one is outstanding — enforcing that lifetime
/// rule is the embedder's job, this trait only names the two handle kinds.
/// Interface-only, same rationale as [`RelationalAdapter`].
pub trait EmbeddingAdapter {
    type Handle;

    fn root(&self, value: Value) -> Self::Handle;
    fn borrow_child(&self, parent: &Self::Handle, key_or_index: &str) -> Result<Self::Handle, Error>;
    fn release(&self, handle: Self::Handle);
}

/// A codec for a tree-shaped serialization format other than JSON (XML,
/// YAML, CSV, INI, ...). No grammar for any of these ships in this crate
/// (spec §6 non-goal); a peripheral crate implements `TreeCodec` per
/// format.
pub trait TreeCodec {
    fn decode(&self, input: &[u8]) -> Result<Value, Error>;
    fn encode(&self, value: &Value) -> Result<Vec<u8>, Error>;
}
