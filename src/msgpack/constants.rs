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

// Single-byte formats
pub(crate) const NIL: u8 = 0xC0;
pub(crate) const NEVER_USED: u8 = 0xC1;
pub(crate) const FALSE: u8 = 0xC2;
pub(crate) const TRUE: u8 = 0xC3;

// Fixed-size formats, the low bits carry the value or the length
pub(crate) const POSITIVE_FIXINT_MAX: u8 = 0x7F;
pub(crate) const FIXMAP: u8 = 0x80;
pub(crate) const FIXMAP_MAX_LEN: usize = 0x0F;
pub(crate) const FIXARRAY: u8 = 0x90;
pub(crate) const FIXARRAY_MAX_LEN: usize = 0x0F;
pub(crate) const FIXSTR: u8 = 0xA0;
pub(crate) const FIXSTR_MAX_LEN: usize = 0x1F;
pub(crate) const NEGATIVE_FIXINT: u8 = 0xE0;

pub(crate) const BIN8: u8 = 0xC4;
pub(crate) const BIN16: u8 = 0xC5;
pub(crate) const BIN32: u8 = 0xC6;
pub(crate) const EXT8: u8 = 0xC7;
pub(crate) const EXT16: u8 = 0xC8;
pub(crate) const EXT32: u8 = 0xC9;
pub(crate) const FLOAT32: u8 = 0xCA;
pub(crate) const FLOAT64: u8 = 0xCB;
pub(crate) const UINT8: u8 = 0xCC;
pub(crate) const UINT16: u8 = 0xCD;
pub(crate) const UINT32: u8 = 0xCE;
pub(crate) const UINT64: u8 = 0xCF;
pub(crate) const INT8: u8 = 0xD0;
pub(crate) const INT16: u8 = 0xD1;
pub(crate) const INT32: u8 = 0xD2;
pub(crate) const INT64: u8 = 0xD3;
pub(crate) const FIXEXT1: u8 = 0xD4;
pub(crate) const FIXEXT2: u8 = 0xD5;
pub(crate) const FIXEXT4: u8 = 0xD6;
pub(crate) const FIXEXT8: u8 = 0xD7;
pub(crate) const FIXEXT16: u8 = 0xD8;
pub(crate) const STR8: u8 = 0xD9;
pub(crate) const STR16: u8 = 0xDA;
pub(crate) const STR32: u8 = 0xDB;
pub(crate) const ARRAY16: u8 = 0xDC;
pub(crate) const ARRAY32: u8 = 0xDD;
pub(crate) const MAP16: u8 = 0xDE;
pub(crate) const MAP32: u8 = 0xDF;

// Payload bytes are copied or skipped through a stack buffer of this size.
pub(crate) const CHUNK_LEN: usize = 64;
