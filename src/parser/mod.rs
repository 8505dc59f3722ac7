//! Go source parsing on top of tree-sitter.

pub mod comments;
pub mod extractor;
pub mod handlers;
pub mod helpers;
pub mod scope;
pub mod structs;

pub use extractor::{extract_file, is_go_file, parse_go, FileExtraction};
pub use handlers::{handler_key, HandlerIndex, HandlerInfo};
pub use structs::{FieldDef, FieldType, StructDef, TypeRef};
