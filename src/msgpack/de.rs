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
use log::debug;
use log::trace;

use super::constants::*;
use crate::document::Document;
use crate::error::Error;
use crate::error::Result;
use crate::filter::Filter;
use crate::options::DeserializeOptions;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::reader::Reader;
use crate::reader::SliceReader;

/// Parses a MessagePack value into `doc` with the default options.
///
/// The document is cleared first. Bytes after the first complete value are
/// left unread.
pub fn parse_msgpack(doc: &mut Document, input: &[u8]) -> Result<()> {
    parse_msgpack_with(doc, SliceReader::new(input), &DeserializeOptions::default())
}

/// Parses one MessagePack value read from `reader` into `doc`.
///
/// `bin` and `ext` values are stored as raw fragments holding their complete
/// encoding, so serializing the document writes them back unchanged.
pub fn parse_msgpack_with<R: Reader>(
    doc: &mut Document,
    reader: R,
    options: &DeserializeOptions<'_>,
) -> Result<()> {
    doc.clear();
    let mut parser = Parser::new(doc.pool_mut(), reader);
    let result = parser.parse(options.filter, options.nesting_limit);
    if let Err(err) = &result {
        debug!("msgpack parse aborted: {}", err);
    }
    result
}

// As in the JSON parser, a `None` slot means the value is read and
// validated but not stored.
struct Parser<'a, R> {
    pool: &'a mut MemoryPool,
    reader: R,
}

impl<'a, R: Reader> Parser<'a, R> {
    fn new(pool: &'a mut MemoryPool, reader: R) -> Parser<'a, R> {
        Self { pool, reader }
    }

    fn parse(&mut self, filter: Filter<'_>, nesting_limit: u8) -> Result<()> {
        let code = self.reader.read().ok_or(Error::EmptyInput)?;
        self.parse_code(code, Some(SlotId::ROOT), filter, nesting_limit)
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        self.reader.read().ok_or(Error::IncompleteInput)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.reader.read_bytes(buf) < buf.len() {
            return Err(Error::IncompleteInput);
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    // Reads a big-endian length of `width` bytes, copying the encoded bytes
    // into the string builder when `store` is set.
    fn read_length(&mut self, width: usize, store: bool) -> Result<usize> {
        let mut bytes = [0u8; 4];
        let bytes = &mut bytes[..width];
        self.read_exact(bytes)?;
        self.append(store, bytes)?;
        usize::try_from(BigEndian::read_uint(bytes, width)).map_err(|_| Error::NoMemory)
    }

    #[inline]
    fn append(&mut self, store: bool, bytes: &[u8]) -> Result<()> {
        if store && !bytes.is_empty() && !self.pool.append_string(bytes) {
            return Err(Error::NoMemory);
        }
        Ok(())
    }

    // Moves `len` payload bytes into the string builder, or drops them.
    fn read_payload(&mut self, store: bool, len: usize) -> Result<()> {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(CHUNK_LEN);
            self.read_exact(&mut chunk[..n])?;
            self.append(store, &chunk[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    fn parse_variant(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
    ) -> Result<()> {
        let code = self.read_byte()?;
        self.parse_code(code, slot, filter, nesting_limit)
    }

    fn parse_code(
        &mut self,
        code: u8,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
    ) -> Result<()> {
        let value = slot.filter(|_| filter.allow_value());
        match code {
            0x00..=POSITIVE_FIXINT_MAX => {
                if let Some(slot) = value {
                    self.pool.set_unsigned(slot, code as u64);
                }
            }
            FIXMAP..=0x8F => {
                let size = (code & 0x0F) as usize;
                return self.parse_object(slot, filter, nesting_limit, size);
            }
            FIXARRAY..=0x9F => {
                let size = (code & 0x0F) as usize;
                return self.parse_array(slot, filter, nesting_limit, size);
            }
            FIXSTR..=0xBF => return self.parse_string(value, (code & 0x1F) as usize),
            NIL => {
                if let Some(slot) = value {
                    self.pool.set_null(slot);
                }
            }
            NEVER_USED => return Err(Error::InvalidInput),
            FALSE | TRUE => {
                if let Some(slot) = value {
                    self.pool.set_bool(slot, code == TRUE);
                }
            }
            BIN8 | BIN16 | BIN32 | EXT8 | EXT16 | EXT32 | FIXEXT1..=FIXEXT16 => {
                return self.parse_binary(value, code);
            }
            FLOAT32 => {
                let v = BigEndian::read_f32(&self.read_array::<4>()?);
                if let Some(slot) = value {
                    self.pool.set_float(slot, v as f64);
                }
            }
            FLOAT64 => {
                let v = BigEndian::read_f64(&self.read_array::<8>()?);
                if let Some(slot) = value {
                    self.pool.set_float(slot, v);
                }
            }
            UINT8 | UINT16 | UINT32 | UINT64 => {
                let v = match code {
                    UINT8 => self.read_byte()? as u64,
                    UINT16 => BigEndian::read_u16(&self.read_array::<2>()?) as u64,
                    UINT32 => BigEndian::read_u32(&self.read_array::<4>()?) as u64,
                    _ => BigEndian::read_u64(&self.read_array::<8>()?),
                };
                if let Some(slot) = value {
                    self.pool.set_unsigned(slot, v);
                }
            }
            INT8 | INT16 | INT32 | INT64 => {
                let v = match code {
                    INT8 => self.read_byte()? as i8 as i64,
                    INT16 => BigEndian::read_i16(&self.read_array::<2>()?) as i64,
                    INT32 => BigEndian::read_i32(&self.read_array::<4>()?) as i64,
                    _ => BigEndian::read_i64(&self.read_array::<8>()?),
                };
                if let Some(slot) = value {
                    self.pool.set_integer(slot, v);
                }
            }
            STR8 | STR16 | STR32 => {
                let len = self.read_length(length_width(code), false)?;
                return self.parse_string(value, len);
            }
            ARRAY16 | ARRAY32 => {
                let size = self.read_length(length_width(code), false)?;
                return self.parse_array(slot, filter, nesting_limit, size);
            }
            MAP16 | MAP32 => {
                let size = self.read_length(length_width(code), false)?;
                return self.parse_object(slot, filter, nesting_limit, size);
            }
            NEGATIVE_FIXINT..=0xFF => {
                if let Some(slot) = value {
                    self.pool.set_integer(slot, code as i8 as i64);
                }
            }
        }
        Ok(())
    }

    fn parse_string(&mut self, slot: Option<SlotId>, len: usize) -> Result<()> {
        let store = slot.is_some();
        if store {
            self.pool.start_string();
        }
        self.read_payload(store, len)?;
        if let Some(slot) = slot {
            if !self.pool.set_built_string(slot, false) {
                return Err(Error::NoMemory);
            }
        }
        Ok(())
    }

    // Captures a `bin` or `ext` value with its tag, length and type bytes.
    fn parse_binary(&mut self, slot: Option<SlotId>, code: u8) -> Result<()> {
        let store = slot.is_some();
        if store {
            self.pool.start_string();
        }
        self.append(store, &[code])?;
        let len = match code {
            FIXEXT1 => 1,
            FIXEXT2 => 2,
            FIXEXT4 => 4,
            FIXEXT8 => 8,
            FIXEXT16 => 16,
            _ => self.read_length(length_width(code), store)?,
        };
        if !matches!(code, BIN8 | BIN16 | BIN32) {
            let ext_type = self.read_byte()?;
            self.append(store, &[ext_type])?;
        }
        self.read_payload(store, len)?;
        if let Some(slot) = slot {
            if !self.pool.set_built_string(slot, true) {
                return Err(Error::NoMemory);
            }
        }
        Ok(())
    }

    fn parse_array(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
        size: usize,
    ) -> Result<()> {
        if nesting_limit == 0 {
            return Err(Error::TooDeep);
        }
        let slot = slot.filter(|_| filter.allow_array());
        if let Some(slot) = slot {
            self.pool.to_array(slot);
        }

        let element_filter = filter.element();
        for _ in 0..size {
            let element = match slot {
                Some(array) if element_filter.allow() => {
                    Some(self.pool.add_element(array).ok_or(Error::NoMemory)?)
                }
                Some(_) => {
                    trace!("skipping filtered array element");
                    None
                }
                None => None,
            };
            self.parse_variant(element, element_filter, nesting_limit - 1)?;
        }
        Ok(())
    }

    fn parse_object(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
        size: usize,
    ) -> Result<()> {
        if nesting_limit == 0 {
            return Err(Error::TooDeep);
        }
        let slot = slot.filter(|_| filter.allow_object());
        if let Some(slot) = slot {
            self.pool.to_object(slot);
        }

        for _ in 0..size {
            self.parse_key(slot.is_some())?;

            let (member, member_filter) = match slot {
                Some(object) => {
                    let member_filter = filter.member(self.pool.built_string());
                    if member_filter.allow() {
                        if std::str::from_utf8(self.pool.built_string()).is_err() {
                            return Err(Error::InvalidInput);
                        }
                        let member = self
                            .pool
                            .get_or_add_member_from_builder(object)
                            .ok_or(Error::NoMemory)?;
                        (Some(member), member_filter)
                    } else {
                        trace!(
                            "skipping filtered member {:?}",
                            String::from_utf8_lossy(self.pool.built_string())
                        );
                        (None, member_filter)
                    }
                }
                None => (None, filter),
            };
            self.parse_variant(member, member_filter, nesting_limit - 1)?;
        }
        Ok(())
    }

    // Keys are strings or binaries. The bytes land in the string builder
    // when `store` is set.
    fn parse_key(&mut self, store: bool) -> Result<()> {
        let code = self.read_byte()?;
        let len = match code {
            FIXSTR..=0xBF => (code & 0x1F) as usize,
            STR8 | STR16 | STR32 | BIN8 | BIN16 | BIN32 => {
                self.read_length(length_width(code), false)?
            }
            _ => return Err(Error::InvalidInput),
        };
        if store {
            self.pool.start_string();
        }
        self.read_payload(store, len)
    }
}

// Number of bytes holding the length that follows a sized tag.
fn length_width(code: u8) -> usize {
    match code {
        BIN8 | EXT8 | STR8 => 1,
        BIN16 | EXT16 | STR16 | ARRAY16 | MAP16 => 2,
        _ => 4,
    }
}
