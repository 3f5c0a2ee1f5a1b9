//! Schema catalog for flatdb data files
//!
//! Every data file starts with a header describing its record layout: a magic
//! number, the total record width and an ordered list of named fixed-width
//! fields. The header is parsed once at open time into a [`SchemaCatalog`]
//! which stays immutable for the life of the store.

mod header;
mod types;

pub(crate) use header::{decode_latin1, encode_latin1};
pub use types::{FieldDescriptor, SchemaCatalog, DELETED_FLAG_WIDTH, MAGIC_COOKIE};
