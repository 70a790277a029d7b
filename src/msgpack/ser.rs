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

use byteorder::BigEndian;
use byteorder::ByteOrder;

use super::constants::*;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::value::VariantRef;
use crate::variant::Content;
use crate::writer::CountingWriter;
use crate::writer::DiscardWriter;
use crate::writer::Writer;

/// Writes `value` as MessagePack and returns the number of bytes written.
///
/// Every number uses the narrowest format that holds it exactly. Raw
/// fragments are written unchanged.
pub fn serialize_msgpack<W: Writer>(value: VariantRef<'_>, writer: W) -> usize {
    let mut serializer = MsgPackSerializer {
        writer: CountingWriter::new(writer),
    };
    serializer.write_value(value.pool(), value.slot());
    serializer.writer.count()
}

/// Length of the MessagePack encoding of `value`.
pub fn measure_msgpack(value: VariantRef<'_>) -> usize {
    serialize_msgpack(value, DiscardWriter)
}

struct MsgPackSerializer<W> {
    writer: CountingWriter<W>,
}

impl<W: Writer> MsgPackSerializer<W> {
    fn write_value(&mut self, pool: &MemoryPool, slot: Option<SlotId>) {
        let Some(slot) = slot else {
            self.writer.write_byte(NIL);
            return;
        };
        match pool.content(slot) {
            Content::Null => {
                self.writer.write_byte(NIL);
            }
            Content::Bool(v) => {
                self.writer.write_byte(if v { TRUE } else { FALSE });
            }
            Content::Int(v) => self.write_integer(v),
            Content::UInt(v) => self.write_unsigned(v),
            Content::Float(v) => self.write_float(v),
            Content::LinkedString(s) => self.write_string(s.as_bytes()),
            Content::OwnedString(id) => self.write_string(pool.string(id)),
            Content::LinkedRaw(raw) => {
                self.writer.write_bytes(raw);
            }
            Content::OwnedRaw(id) => {
                self.writer.write_bytes(pool.string(id));
            }
            Content::Array(_) => {
                self.write_length(pool.size(slot), FIXARRAY, FIXARRAY_MAX_LEN, ARRAY16, ARRAY32);
                for child in pool.children(slot) {
                    self.write_value(pool, Some(child));
                }
            }
            Content::Object(_) => {
                self.write_length(pool.size(slot), FIXMAP, FIXMAP_MAX_LEN, MAP16, MAP32);
                for child in pool.children(slot) {
                    self.write_string(pool.slot_key(child).unwrap_or_default());
                    self.write_value(pool, Some(child));
                }
            }
        }
    }

    fn write_unsigned(&mut self, v: u64) {
        if v <= POSITIVE_FIXINT_MAX as u64 {
            self.writer.write_byte(v as u8);
        } else if v <= u8::MAX as u64 {
            self.writer.write_bytes(&[UINT8, v as u8]);
        } else if v <= u16::MAX as u64 {
            self.write_u16(UINT16, v as u16);
        } else if v <= u32::MAX as u64 {
            self.write_u32(UINT32, v as u32);
        } else {
            self.write_u64(UINT64, v);
        }
    }

    fn write_integer(&mut self, v: i64) {
        if v >= 0 {
            self.write_unsigned(v as u64);
        } else if v >= -32 {
            self.writer.write_byte(v as i8 as u8);
        } else if v >= i8::MIN as i64 {
            self.writer.write_bytes(&[INT8, v as i8 as u8]);
        } else if v >= i16::MIN as i64 {
            self.write_u16(INT16, v as i16 as u16);
        } else if v >= i32::MIN as i64 {
            self.write_u32(INT32, v as i32 as u32);
        } else {
            self.write_u64(INT64, v as u64);
        }
    }

    fn write_float(&mut self, v: f64) {
        let narrow = v as f32;
        if narrow as f64 == v || v.is_nan() {
            let mut buf = [FLOAT32, 0, 0, 0, 0];
            BigEndian::write_f32(&mut buf[1..], narrow);
            self.writer.write_bytes(&buf);
        } else {
            let mut buf = [FLOAT64, 0, 0, 0, 0, 0, 0, 0, 0];
            BigEndian::write_f64(&mut buf[1..], v);
            self.writer.write_bytes(&buf);
        }
    }

    fn write_string(&mut self, s: &[u8]) {
        let len = s.len();
        if len <= FIXSTR_MAX_LEN {
            self.writer.write_byte(FIXSTR | len as u8);
        } else if len <= u8::MAX as usize {
            self.writer.write_bytes(&[STR8, len as u8]);
        } else if len <= u16::MAX as usize {
            self.write_u16(STR16, len as u16);
        } else {
            self.write_u32(STR32, len as u32);
        }
        self.writer.write_bytes(s);
    }

    fn write_length(&mut self, len: usize, fixed: u8, fixed_max: usize, tag16: u8, tag32: u8) {
        if len <= fixed_max {
            self.writer.write_byte(fixed | len as u8);
        } else if len <= u16::MAX as usize {
            self.write_u16(tag16, len as u16);
        } else {
            self.write_u32(tag32, len as u32);
        }
    }

    fn write_u16(&mut self, code: u8, v: u16) {
        let mut buf = [code, 0, 0];
        BigEndian::write_u16(&mut buf[1..], v);
        self.writer.write_bytes(&buf);
    }

    fn write_u32(&mut self, code: u8, v: u32) {
        let mut buf = [code, 0, 0, 0, 0];
        BigEndian::write_u32(&mut buf[1..], v);
        self.writer.write_bytes(&buf);
    }

    fn write_u64(&mut self, code: u8, v: u64) {
        let mut buf = [code, 0, 0, 0, 0, 0, 0, 0, 0];
        BigEndian::write_u64(&mut buf[1..], v);
        self.writer.write_bytes(&buf);
    }
}
