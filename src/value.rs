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

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;

use num_traits::NumCast;

use crate::json::serialize_json;
use crate::number::parse_number;
use crate::number::Number;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::variant::Children;
use crate::variant::Content;
use crate::variant::KeyRef;

/// A read-only view of one value in a document.
///
/// A view may be *unbound*: looking up a missing member or an out-of-range
/// element yields a view that reads as null, so lookups can be chained
/// without checking every step.
#[derive(Clone, Copy)]
pub struct VariantRef<'a> {
    pool: &'a MemoryPool,
    slot: Option<SlotId>,
}

impl<'a> VariantRef<'a> {
    pub(crate) fn new(pool: &'a MemoryPool, slot: Option<SlotId>) -> VariantRef<'a> {
        VariantRef { pool, slot }
    }

    pub(crate) fn pool(&self) -> &'a MemoryPool {
        self.pool
    }

    pub(crate) fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    fn content(&self) -> Content {
        match self.slot {
            Some(slot) => self.pool.content(slot),
            None => Content::Null,
        }
    }

    /// Whether the view points at an existing value.
    pub fn is_bound(&self) -> bool {
        self.slot.is_some()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.content(), Content::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.content(), Content::Bool(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.content(), Content::Int(_) | Content::UInt(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.content(), Content::Float(_))
    }

    pub fn is_number(&self) -> bool {
        self.number().is_some()
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self.content(),
            Content::LinkedString(_) | Content::OwnedString(_)
        )
    }

    /// Whether the value is a preformatted fragment written verbatim.
    pub fn is_raw(&self) -> bool {
        matches!(self.content(), Content::LinkedRaw(_) | Content::OwnedRaw(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.content(), Content::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.content(), Content::Object(_))
    }

    /// Truthiness of the value: `false`, zero and null are false, strings
    /// and containers are true.
    pub fn as_bool(&self) -> bool {
        match self.content() {
            Content::Null => false,
            Content::Bool(v) => v,
            Content::Int(v) => v != 0,
            Content::UInt(v) => v != 0,
            Content::Float(v) => v != 0.0,
            _ => true,
        }
    }

    pub fn number(&self) -> Option<Number> {
        match self.content() {
            Content::Int(v) => Some(Number::Int64(v)),
            Content::UInt(v) => Some(Number::UInt64(v)),
            Content::Float(v) => Some(Number::Float64(v)),
            _ => None,
        }
    }

    // Numbers, booleans, and strings holding a number literal.
    fn to_number(&self) -> Option<Number> {
        match self.content() {
            Content::Bool(v) => Some(Number::UInt64(v as u64)),
            Content::LinkedString(_) | Content::OwnedString(_) => {
                self.as_bytes().and_then(|s| parse_number(s, false))
            }
            _ => self.number(),
        }
    }

    /// Converts the value to an integer type.
    ///
    /// Floats are truncated. Strings holding a number are parsed. Values
    /// that do not fit in `T`, or are not numeric, give zero.
    pub fn as_integral<T: NumCast + Default>(&self) -> T {
        self.to_number()
            .and_then(|n| n.cast::<T>())
            .unwrap_or_default()
    }

    /// Converts the value to a float type. Non-numeric values give zero.
    pub fn as_float<T: NumCast + Default>(&self) -> T {
        self.to_number()
            .and_then(|n| T::from(n.as_f64()))
            .unwrap_or_default()
    }

    /// Returns the text of a string value, or `None` for other types and
    /// for strings that are not valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.content() {
            Content::LinkedString(s) => Some(s),
            Content::OwnedString(id) => std::str::from_utf8(self.pool.string(id)).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match self.content() {
            Content::LinkedString(s) => Some(s.as_bytes()),
            Content::OwnedString(id) => Some(self.pool.string(id)),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&'a [u8]> {
        match self.content() {
            Content::LinkedRaw(s) => Some(s),
            Content::OwnedRaw(id) => Some(self.pool.string(id)),
            _ => None,
        }
    }

    /// Number of elements or members. Zero for scalars.
    pub fn len(&self) -> usize {
        match self.slot {
            Some(slot) => self.pool.size(slot),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the deepest nested container. Zero for scalars.
    pub fn nesting(&self) -> usize {
        match self.slot {
            Some(slot) => self.pool.nesting(slot),
            None => 0,
        }
    }

    pub fn get(&self, key: &str) -> VariantRef<'a> {
        self.get_bytes(key.as_bytes())
    }

    pub(crate) fn get_bytes(&self, key: &[u8]) -> VariantRef<'a> {
        let slot = self.slot.and_then(|slot| self.pool.get_member(slot, key));
        VariantRef::new(self.pool, slot)
    }

    pub fn at(&self, index: usize) -> VariantRef<'a> {
        let slot = self
            .slot
            .and_then(|slot| self.pool.get_element(slot, index));
        VariantRef::new(self.pool, slot)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_bound()
    }

    /// Iterates the elements of an array. Empty for other types.
    pub fn elements(&self) -> Elements<'a> {
        let children = match self.content() {
            Content::Array(_) => self.slot.map(|slot| self.pool.children(slot)),
            _ => None,
        };
        Elements {
            pool: self.pool,
            children,
        }
    }

    /// Iterates the members of an object in insertion order. Empty for other
    /// types.
    pub fn members(&self) -> Members<'a> {
        let children = match self.content() {
            Content::Object(_) => self.slot.map(|slot| self.pool.children(slot)),
            _ => None,
        };
        Members {
            pool: self.pool,
            children,
        }
    }

    /// Renders compact JSON.
    pub fn to_json_string(&self) -> String {
        let mut buf = Vec::new();
        serialize_json(*self, &mut buf);
        match String::from_utf8(buf) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

/// Iterator over the elements of an array.
pub struct Elements<'a> {
    pool: &'a MemoryPool,
    children: Option<Children<'a>>,
}

impl<'a> Iterator for Elements<'a> {
    type Item = VariantRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.children.as_mut()?.next()?;
        Some(VariantRef::new(self.pool, Some(slot)))
    }
}

/// Iterator over the `(key, value)` members of an object.
pub struct Members<'a> {
    pool: &'a MemoryPool,
    children: Option<Children<'a>>,
}

impl<'a> Iterator for Members<'a> {
    type Item = (&'a str, VariantRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slot = self.children.as_mut()?.next()?;
            // keys are validated as UTF-8 when stored
            let Some(key) = self
                .pool
                .slot_key(slot)
                .and_then(|k| std::str::from_utf8(k).ok())
            else {
                continue;
            };
            return Some((key, VariantRef::new(self.pool, Some(slot))));
        }
    }
}

impl PartialEq for VariantRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.content(), other.content()) {
            (Content::Null, Content::Null) => true,
            (Content::Bool(a), Content::Bool(b)) => a == b,
            (Content::Array(_), Content::Array(_)) => {
                self.len() == other.len() && self.elements().eq(other.elements())
            }
            (Content::Object(_), Content::Object(_)) => {
                self.len() == other.len()
                    && self.members().all(|(key, value)| {
                        let theirs = other.get(key);
                        theirs.is_bound() && value == theirs
                    })
            }
            _ if self.is_string() && other.is_string() => self.as_bytes() == other.as_bytes(),
            _ if self.is_raw() && other.is_raw() => self.as_raw() == other.as_raw(),
            _ => match (self.number(), other.number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Display for VariantRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl Debug for VariantRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VariantRef")
            .field(&format_args!("{}", self))
            .finish()
    }
}

/// A value assigned through [`VariantMut::set`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'s> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Copied into the document.
    Str(&'s str),
    /// Referenced, never copied.
    Linked(&'static str),
    /// Copied into the document and written verbatim by the serializers.
    Raw(&'s [u8]),
    /// Referenced, never copied, written verbatim by the serializers.
    LinkedRaw(&'static [u8]),
}

macro_rules! impl_scalar_from {
    ($variant:ident, $target:ty, $($t:ty),+) => {
        $(
            impl From<$t> for Scalar<'_> {
                fn from(v: $t) -> Self {
                    Scalar::$variant(v as $target)
                }
            }
        )+
    };
}

impl_scalar_from!(Int, i64, i8, i16, i32, i64, isize);
impl_scalar_from!(UInt, u64, u8, u16, u32, u64, usize);
impl_scalar_from!(Float, f64, f32, f64);

impl From<bool> for Scalar<'_> {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<()> for Scalar<'_> {
    fn from(_: ()) -> Self {
        Scalar::Null
    }
}

impl<'s> From<&'s str> for Scalar<'s> {
    fn from(v: &'s str) -> Self {
        Scalar::Str(v)
    }
}

impl<'s> From<&'s String> for Scalar<'s> {
    fn from(v: &'s String) -> Self {
        Scalar::Str(v.as_str())
    }
}

impl From<Number> for Scalar<'_> {
    fn from(v: Number) -> Self {
        match v {
            Number::Int64(v) => Scalar::Int(v),
            Number::UInt64(v) => Scalar::UInt(v),
            Number::Float64(v) => Scalar::Float(v),
        }
    }
}

impl<'s, T: Into<Scalar<'s>>> From<Option<T>> for Scalar<'s> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Scalar::Null,
        }
    }
}

/// A mutable view of one value in a document.
///
/// Navigation methods create what is missing: [`VariantMut::member_mut`]
/// turns a null value into an object and adds the member. They return
/// `None` when the value has another type or the pool is out of memory.
pub struct VariantMut<'a> {
    pool: &'a mut MemoryPool,
    slot: SlotId,
}

impl<'a> VariantMut<'a> {
    pub(crate) fn new(pool: &'a mut MemoryPool, slot: SlotId) -> VariantMut<'a> {
        VariantMut { pool, slot }
    }

    pub fn view(&self) -> VariantRef<'_> {
        VariantRef::new(self.pool, Some(self.slot))
    }

    pub fn into_ref(self) -> VariantRef<'a> {
        VariantRef::new(self.pool, Some(self.slot))
    }

    pub(crate) fn parts(&mut self) -> (&mut MemoryPool, SlotId) {
        (&mut *self.pool, self.slot)
    }

    /// Replaces the value. Returns `false` when a string could not be
    /// stored, in which case the value becomes null.
    pub fn set<'s>(&mut self, value: impl Into<Scalar<'s>>) -> bool {
        let slot = self.slot;
        match value.into() {
            Scalar::Null => self.pool.set_null(slot),
            Scalar::Bool(v) => self.pool.set_bool(slot, v),
            Scalar::Int(v) => self.pool.set_integer(slot, v),
            Scalar::UInt(v) => self.pool.set_unsigned(slot, v),
            Scalar::Float(v) => self.pool.set_float(slot, v),
            Scalar::Str(v) => return self.pool.set_string(slot, v.as_bytes()),
            Scalar::Linked(v) => self.pool.set_linked_string(slot, v),
            Scalar::Raw(v) => return self.pool.set_raw(slot, v),
            Scalar::LinkedRaw(v) => self.pool.set_linked_raw(slot, v),
        }
        true
    }

    /// Replaces the value with a deep copy of `src`, which may belong to
    /// another document. Returns `false` if the copy ran out of memory.
    pub fn set_variant(&mut self, src: VariantRef<'_>) -> bool {
        match src.slot() {
            Some(src_slot) => self.pool.copy_variant(self.slot, src.pool(), src_slot),
            None => {
                self.pool.set_null(self.slot);
                true
            }
        }
    }

    /// Releases the value and its subtree. The value becomes null.
    pub fn clear(&mut self) {
        self.pool.clear_variant(self.slot);
    }

    /// Replaces the value with an empty array.
    pub fn to_array(&mut self) {
        self.pool.to_array(self.slot);
    }

    /// Replaces the value with an empty object.
    pub fn to_object(&mut self) {
        self.pool.to_object(self.slot);
    }

    /// Appends a null element. A null value becomes an array first.
    pub fn add_element(&mut self) -> Option<VariantMut<'_>> {
        let slot = self.pool.add_element(self.slot)?;
        Some(VariantMut::new(self.pool, slot))
    }

    /// Appends an element holding `value`.
    pub fn push<'s>(&mut self, value: impl Into<Scalar<'s>>) -> bool {
        match self.add_element() {
            Some(mut element) => element.set(value),
            None => false,
        }
    }

    pub fn element_mut(&mut self, index: usize) -> Option<VariantMut<'_>> {
        let slot = self.pool.get_element(self.slot, index)?;
        Some(VariantMut::new(self.pool, slot))
    }

    /// Returns the member `key`, adding it if missing. The key is copied.
    pub fn member_mut(&mut self, key: &str) -> Option<VariantMut<'_>> {
        let slot = self
            .pool
            .get_or_add_member(self.slot, KeyRef::Copied(key.as_bytes()))?;
        Some(VariantMut::new(self.pool, slot))
    }

    /// Same as [`VariantMut::member_mut`], but the key is referenced instead
    /// of copied.
    pub fn member_linked(&mut self, key: &'static str) -> Option<VariantMut<'_>> {
        let slot = self.pool.get_or_add_member(self.slot, KeyRef::Linked(key))?;
        Some(VariantMut::new(self.pool, slot))
    }

    /// Sets the member `key` to `value`, adding it if missing.
    pub fn insert<'s>(&mut self, key: &str, value: impl Into<Scalar<'s>>) -> bool {
        match self.member_mut(key) {
            Some(mut member) => member.set(value),
            None => false,
        }
    }

    /// Removes a member and releases its subtree.
    pub fn remove_member(&mut self, key: &str) -> bool {
        self.pool.remove_member(self.slot, key.as_bytes())
    }

    /// Removes an element and releases its subtree.
    pub fn remove_element(&mut self, index: usize) -> bool {
        self.pool.remove_element(self.slot, index)
    }
}

impl Debug for VariantMut<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VariantMut")
            .field(&format_args!("{}", self.view()))
            .finish()
    }
}
