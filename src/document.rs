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

use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::Result;
use crate::json::parse_json;
use crate::msgpack::parse_msgpack;
use crate::msgpack::serialize_msgpack;
use crate::pool::Capacity;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::value::VariantMut;
use crate::value::VariantRef;

/// A tree of values together with the memory pool that stores it.
///
/// Every slot and owned string of the tree lives in the document's pool.
/// Views returned by [`Document::root`] and [`Document::root_mut`] borrow the
/// document, so they cannot outlive it.
///
/// ```
/// use jsonpool::Document;
///
/// let doc = Document::from_json(br#"{"sensor":"gps","data":[48.75,2.30]}"#).unwrap();
/// assert_eq!(doc.get("sensor").as_str(), Some("gps"));
/// assert_eq!(doc.get("data").at(1).as_float::<f64>(), 2.3);
/// ```
#[derive(Clone, Debug)]
pub struct Document {
    pool: MemoryPool,
}

impl Document {
    /// Creates an empty document whose pool grows on demand.
    pub fn new() -> Document {
        Document {
            pool: MemoryPool::new(Capacity::Elastic),
        }
    }

    /// Creates an empty document whose pool never exceeds `bytes`.
    ///
    /// Use [`crate::sizeof_array`], [`crate::sizeof_object`] and
    /// [`crate::sizeof_string`] to compute the size a tree needs.
    pub fn with_capacity(bytes: usize) -> Document {
        Document {
            pool: MemoryPool::new(Capacity::Fixed(bytes)),
        }
    }

    pub fn from_json(input: &[u8]) -> Result<Document> {
        let mut doc = Document::new();
        parse_json(&mut doc, input)?;
        Ok(doc)
    }

    pub fn from_msgpack(input: &[u8]) -> Result<Document> {
        let mut doc = Document::new();
        parse_msgpack(&mut doc, input)?;
        Ok(doc)
    }

    pub(crate) fn pool_mut(&mut self) -> &mut MemoryPool {
        &mut self.pool
    }

    pub fn root(&self) -> VariantRef<'_> {
        VariantRef::new(&self.pool, Some(SlotId::ROOT))
    }

    pub fn root_mut(&mut self) -> VariantMut<'_> {
        VariantMut::new(&mut self.pool, SlotId::ROOT)
    }

    /// Shorthand for `root().get(key)`.
    pub fn get(&self, key: &str) -> VariantRef<'_> {
        self.root().get(key)
    }

    /// Shorthand for `root().at(index)`.
    pub fn at(&self, index: usize) -> VariantRef<'_> {
        self.root().at(index)
    }

    /// Pool bytes used by the tree, including garbage left by removals.
    pub fn memory_usage(&self) -> usize {
        self.pool.memory_usage()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Whether an allocation failed since the document was last cleared.
    /// Values that could not be stored read as null.
    pub fn overflowed(&self) -> bool {
        self.pool.overflowed()
    }

    pub fn nesting(&self) -> usize {
        self.root().nesting()
    }

    /// Releases the whole tree at once. The root becomes null.
    pub fn clear(&mut self) {
        self.pool.clear();
    }

    /// Reclaims removed values and releases unused memory. A document
    /// created with a fixed capacity keeps exactly what it uses.
    pub fn shrink_to_fit(&mut self) {
        self.pool.shrink_to_fit();
    }

    pub fn to_json_string(&self) -> String {
        self.root().to_json_string()
    }

    pub fn to_msgpack_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        serialize_msgpack(self.root(), &mut buf);
        buf
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root() == other.root()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.root(), f)
    }
}
