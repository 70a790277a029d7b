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

use std::borrow::Cow;

use serde::ser;
use serde::ser::Impossible;
use serde::ser::Serialize;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;

use crate::document::Document;
use crate::error::Error;
use crate::error::Result;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::value::VariantMut;
use crate::value::VariantRef;
use crate::variant::Content;
use crate::variant::KeyRef;

/// Replaces the content of `doc` with `value`.
///
/// Sequences become arrays, maps and structs become objects, and enum
/// variants carrying data become single-member objects named after the
/// variant. Struct field names and unit variant names are linked, not
/// copied.
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Reading {
///     sensor: String,
///     values: Vec<f64>,
/// }
///
/// let reading = Reading {
///     sensor: "gps".to_string(),
///     values: vec![48.75, 2.3],
/// };
/// let mut doc = jsonpool::Document::new();
/// jsonpool::to_document(&reading, &mut doc).unwrap();
/// assert_eq!(doc.to_json_string(), r#"{"sensor":"gps","values":[48.75,2.3]}"#);
/// ```
pub fn to_document<T: ?Sized + Serialize>(value: &T, doc: &mut Document) -> Result<()> {
    doc.clear();
    to_variant(value, &mut doc.root_mut())
}

/// Replaces the value behind `target` with `value`.
pub fn to_variant<T: ?Sized + Serialize>(value: &T, target: &mut VariantMut<'_>) -> Result<()> {
    let (pool, slot) = target.parts();
    value.serialize(SlotSerializer::new(pool, slot))
}

/// `SlotSerializer` writes one value into a pool slot, allocating the
/// children of arrays and objects as they are serialized.
struct SlotSerializer<'a> {
    pool: &'a mut MemoryPool,
    slot: SlotId,
}

impl<'a> SlotSerializer<'a> {
    fn new(pool: &'a mut MemoryPool, slot: SlotId) -> SlotSerializer<'a> {
        SlotSerializer { pool, slot }
    }

    fn set_string(self, v: &[u8]) -> Result<()> {
        if self.pool.set_string(self.slot, v) {
            Ok(())
        } else {
            Err(Error::NoMemory)
        }
    }

    // Turns the slot into `{variant: null}` and returns the member.
    fn variant_member(self, variant: &'static str) -> Result<SlotSerializer<'a>> {
        self.pool.to_object(self.slot);
        let member = self
            .pool
            .get_or_add_member(self.slot, KeyRef::Linked(variant))
            .ok_or(Error::NoMemory)?;
        Ok(SlotSerializer::new(self.pool, member))
    }

    fn into_array(self) -> ArraySerializer<'a> {
        self.pool.to_array(self.slot);
        ArraySerializer {
            pool: self.pool,
            slot: self.slot,
        }
    }

    fn into_object(self) -> ObjectSerializer<'a> {
        self.pool.to_object(self.slot);
        ObjectSerializer {
            pool: self.pool,
            slot: self.slot,
            member: None,
        }
    }
}

impl<'a> ser::Serializer for SlotSerializer<'a> {
    type Ok = ();

    type Error = Error;

    type SerializeSeq = ArraySerializer<'a>;

    type SerializeTuple = ArraySerializer<'a>;

    type SerializeTupleStruct = ArraySerializer<'a>;

    type SerializeTupleVariant = ArraySerializer<'a>;

    type SerializeMap = ObjectSerializer<'a>;

    type SerializeStruct = ObjectSerializer<'a>;

    type SerializeStructVariant = ObjectSerializer<'a>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.pool.set_bool(self.slot, v);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.pool.set_integer(self.slot, v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.pool.set_unsigned(self.slot, v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.pool.set_float(self.slot, v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.set_string(v.encode_utf8(&mut buf).as_bytes())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.set_string(v.as_bytes())
    }

    // Bytes become an array of integers.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let mut seq = self.into_array();
        for byte in v {
            seq.serialize_element(byte)?;
        }
        SerializeSeq::end(seq)
    }

    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.pool.set_null(self.slot);
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.pool.set_linked_string(self.slot, variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self.variant_member(variant)?)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(self.into_array())
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(self.variant_member(variant)?.into_array())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(self.into_object())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self.into_object())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(self.variant_member(variant)?.into_object())
    }
}

pub struct ArraySerializer<'a> {
    pool: &'a mut MemoryPool,
    slot: SlotId,
}

impl ArraySerializer<'_> {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let element = self.pool.add_element(self.slot).ok_or(Error::NoMemory)?;
        value.serialize(SlotSerializer::new(&mut *self.pool, element))
    }
}

impl ser::SerializeSeq for ArraySerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for ArraySerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for ArraySerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for ArraySerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

pub struct ObjectSerializer<'a> {
    pool: &'a mut MemoryPool,
    slot: SlotId,
    // member added by the last `serialize_key`
    member: Option<SlotId>,
}

impl ObjectSerializer<'_> {
    fn insert<T: ?Sized + Serialize>(&mut self, key: KeyRef<'_>, value: &T) -> Result<()> {
        let member = self
            .pool
            .get_or_add_member(self.slot, key)
            .ok_or(Error::NoMemory)?;
        value.serialize(SlotSerializer::new(&mut *self.pool, member))
    }
}

impl ser::SerializeMap for ObjectSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        let key = key.serialize(KeySerializer)?;
        let member = self
            .pool
            .get_or_add_member(self.slot, KeyRef::Copied(key.as_bytes()))
            .ok_or(Error::NoMemory)?;
        self.member = Some(member);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let Some(member) = self.member.take() else {
            return Err(ser::Error::custom("object value without a key"));
        };
        value.serialize(SlotSerializer::new(&mut *self.pool, member))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStruct for ObjectSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.insert(KeyRef::Linked(key), value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for ObjectSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.insert(KeyRef::Linked(key), value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

fn key_must_be_a_string() -> Error {
    ser::Error::custom("object key must be a string")
}

/// Accepts strings, chars, integers and unit variants as object keys.
struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = String;

    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;

    type SerializeTuple = Impossible<String, Error>;

    type SerializeTupleStruct = Impossible<String, Error>;

    type SerializeTupleVariant = Impossible<String, Error>;

    type SerializeMap = Impossible<String, Error>;

    type SerializeStruct = Impossible<String, Error>;

    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(itoa::Buffer::new().format(v).to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(itoa::Buffer::new().format(v).to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_none(self) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(key_must_be_a_string())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_a_string())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_a_string())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_a_string())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_a_string())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_a_string())
    }
}

impl Serialize for VariantRef<'_> {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let Some(slot) = self.slot() else {
            return serializer.serialize_unit();
        };
        let pool = self.pool();
        match pool.content(slot) {
            Content::Null => serializer.serialize_unit(),
            Content::Bool(v) => serializer.serialize_bool(v),
            Content::Int(v) => serializer.serialize_i64(v),
            Content::UInt(v) => serializer.serialize_u64(v),
            Content::Float(v) => serializer.serialize_f64(v),
            Content::LinkedString(s) => serializer.serialize_str(s),
            Content::LinkedRaw(bytes) => serialize_text(bytes, serializer),
            Content::OwnedString(id) | Content::OwnedRaw(id) => {
                serialize_text(pool.string(id), serializer)
            }
            Content::Array(_) => {
                let mut seq = serializer.serialize_seq(Some(pool.size(slot)))?;
                for child in pool.children(slot) {
                    seq.serialize_element(&VariantRef::new(pool, Some(child)))?;
                }
                seq.end()
            }
            Content::Object(_) => {
                let mut map = serializer.serialize_map(Some(pool.size(slot)))?;
                for child in pool.children(slot) {
                    let key = pool.slot_key(child).unwrap_or_default();
                    map.serialize_entry(
                        &String::from_utf8_lossy(key),
                        &VariantRef::new(pool, Some(child)),
                    )?;
                }
                map.end()
            }
        }
    }
}

// Strings and raw fragments go out as text when they are valid UTF-8.
fn serialize_text<S: ser::Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => serializer.serialize_str(s),
        Cow::Owned(_) => serializer.serialize_bytes(bytes),
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        self.root().serialize(serializer)
    }
}
