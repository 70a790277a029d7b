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

use crate::document::Document;
use crate::value::VariantRef;

const WILDCARD: &[u8] = b"*";

/// Decides, while parsing, which parts of the input end up in the document.
///
/// A filter is itself a document:
///
/// - `true` keeps the whole subtree;
/// - `false`, `null` or a missing member drops it;
/// - an object keeps only the listed members, each with its own sub-filter,
///   and a `"*"` member applies to every key not listed;
/// - an array applies its first element to every element of the input
///   array, whatever its length.
///
/// Dropped subtrees are still read and validated, so the parse result is
/// the same error or success it would be without a filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter<'f> {
    // `None` keeps everything.
    variant: Option<VariantRef<'f>>,
}

impl<'f> Filter<'f> {
    pub fn new(variant: VariantRef<'f>) -> Filter<'f> {
        Filter {
            variant: Some(variant),
        }
    }

    pub fn allow_all() -> Filter<'f> {
        Filter { variant: None }
    }

    fn is_true(&self) -> bool {
        match &self.variant {
            None => true,
            Some(v) => v.is_bool() && v.as_bool(),
        }
    }

    /// Whether anything at this position is kept.
    pub fn allow(&self) -> bool {
        match &self.variant {
            None => true,
            Some(v) => v.as_bool(),
        }
    }

    pub fn allow_array(&self) -> bool {
        self.is_true() || self.variant.is_some_and(|v| v.is_array())
    }

    pub fn allow_object(&self) -> bool {
        self.is_true() || self.variant.is_some_and(|v| v.is_object())
    }

    /// Whether a scalar at this position is kept.
    pub fn allow_value(&self) -> bool {
        self.is_true()
    }

    /// The filter applied to the member `key` of an object.
    pub fn member(&self, key: &[u8]) -> Filter<'f> {
        if self.is_true() {
            return *self;
        }
        let Some(v) = self.variant else {
            return *self;
        };
        let member = v.get_bytes(key);
        if member.is_null() {
            Filter::new(v.get_bytes(WILDCARD))
        } else {
            Filter::new(member)
        }
    }

    /// The filter applied to every element of an array.
    pub fn element(&self) -> Filter<'f> {
        if self.is_true() {
            return *self;
        }
        let Some(v) = self.variant else {
            return *self;
        };
        let element = v.at(0);
        if element.is_null() {
            Filter::new(v.get_bytes(WILDCARD))
        } else {
            Filter::new(element)
        }
    }
}

impl<'f> From<VariantRef<'f>> for Filter<'f> {
    fn from(variant: VariantRef<'f>) -> Self {
        Filter::new(variant)
    }
}

impl<'f> From<&'f Document> for Filter<'f> {
    fn from(doc: &'f Document) -> Self {
        Filter::new(doc.root())
    }
}
