// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `jsonpool` stores `JSON` and `MessagePack` documents in a memory pool owned by the document. Parsing, querying, mutating and serializing all work on the pool directly, with no intermediate tree.
//!
//! ## Features
//!
//! - Bounded memory: a [`Document`] created with [`Document::with_capacity`] never allocates past its capacity. Running out of room is reported, never a panic.
//! - Two formats, one tree: JSON text and MessagePack are read into and written from the same representation, so converting between them is a parse followed by a serialize.
//! - Filtering: a [`Filter`] document selects which members of the input are kept. Dropped subtrees cost no pool memory.
//! - Zero-copy strings: static strings are linked instead of copied, and copied strings are deduplicated.
//!
//! ## Memory layout
//!
//! The pool holds two tables.
//!
//! - Slots. Every value of the tree occupies one fixed-size slot: its content, its key when it is an object member, and the index of its next sibling. Arrays and objects store the indices of their first and last child. Slots refer to each other by index, never by address, so the table can grow, shrink or be compacted in one pass. Slot `0` is the root and is not charged.
//! - Strings. Owned strings, keys and raw fragments live in a reference-counted table. Saving a string equal to one already stored shares the existing record.
//!
//! [`Document::memory_usage`] charges [`SLOT_SIZE`] bytes per slot and `4 + len` bytes per string. [`sizeof_array`], [`sizeof_object`] and [`sizeof_string`] compute the capacity a known tree needs.
//!
//! #### An example
//!
//! ```text
//! // JSON value
//! {"k":["v",10]}
//!
//! // slots
//! 0  object  head=1 tail=1
//! 1  array   key="k" head=2 tail=3
//! 2  string  "v"  next=3
//! 3  uint    10
//!
//! // strings
//! "k" refs=1
//! "v" refs=1
//!
//! // memory usage
//! 3 * SLOT_SIZE + (4 + 1) + (4 + 1)
//! ```
//!
//! ## Usage
//!
//! ```
//! use jsonpool::Document;
//!
//! let mut doc = Document::from_json(br#"{"sensor":"gps","time":1351824120}"#).unwrap();
//! doc.root_mut().insert("valid", true);
//!
//! let bytes = doc.to_msgpack_vec();
//! let copy = Document::from_msgpack(&bytes).unwrap();
//! assert_eq!(copy.to_json_string(), r#"{"sensor":"gps","time":1351824120,"valid":true}"#);
//! ```

#![allow(clippy::uninlined_format_args)]

mod constants;
mod document;
mod error;
mod filter;
pub mod json;
pub mod msgpack;
mod number;
mod options;
mod pool;
mod reader;
mod ser;
mod util;
mod value;
mod variant;
mod writer;

pub use constants::DEFAULT_NESTING_LIMIT;
pub use document::Document;
pub use error::Error;
pub use error::Result;
pub use filter::Filter;
pub use json::measure_json;
pub use json::measure_json_pretty;
pub use json::parse_json;
pub use json::parse_json_with;
pub use json::serialize_json;
pub use json::serialize_json_pretty;
pub use json::serialize_json_with;
pub use msgpack::measure_msgpack;
pub use msgpack::parse_msgpack;
pub use msgpack::parse_msgpack_with;
pub use msgpack::serialize_msgpack;
pub use number::Number;
pub use options::*;
pub use pool::sizeof_array;
pub use pool::sizeof_object;
pub use pool::sizeof_string;
pub use pool::Capacity;
pub use pool::SLOT_SIZE;
pub use reader::*;
pub use ser::to_document;
pub use ser::to_variant;
pub use value::*;
pub use writer::*;
