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

use crate::constants::*;
use crate::number::FloatBuffer;
use crate::options::FloatFormat;
use crate::options::PrettyOptions;
use crate::options::SerializeOptions;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::util::escape_char;
use crate::util::hex_digit;
use crate::value::VariantRef;
use crate::variant::Content;
use crate::writer::CountingWriter;
use crate::writer::DiscardWriter;
use crate::writer::Writer;

/// Writes `value` as compact JSON and returns the number of bytes written.
pub fn serialize_json<W: Writer>(value: VariantRef<'_>, writer: W) -> usize {
    serialize_json_with(value, writer, &SerializeOptions::default())
}

pub fn serialize_json_with<W: Writer>(
    value: VariantRef<'_>,
    writer: W,
    options: &SerializeOptions,
) -> usize {
    let mut serializer = JsonSerializer::new(writer, *options, None);
    serializer.write_value(value.pool(), value.slot());
    serializer.writer.count()
}

/// Writes `value` as indented JSON and returns the number of bytes written.
/// Empty arrays and objects stay on one line.
pub fn serialize_json_pretty<W: Writer>(
    value: VariantRef<'_>,
    writer: W,
    options: &PrettyOptions<'_>,
) -> usize {
    let mut serializer = JsonSerializer::new(writer, options.serialize, Some(options.indent));
    serializer.write_value(value.pool(), value.slot());
    serializer.writer.count()
}

/// Length of the compact JSON text of `value`.
pub fn measure_json(value: VariantRef<'_>) -> usize {
    serialize_json(value, DiscardWriter)
}

/// Length of the pretty JSON text of `value` with the default layout.
pub fn measure_json_pretty(value: VariantRef<'_>) -> usize {
    serialize_json_pretty(value, DiscardWriter, &PrettyOptions::default())
}

struct JsonSerializer<'i, W> {
    writer: CountingWriter<W>,
    options: SerializeOptions,
    indent: Option<&'i str>,
    level: usize,
}

impl<'i, W: Writer> JsonSerializer<'i, W> {
    fn new(writer: W, options: SerializeOptions, indent: Option<&'i str>) -> Self {
        Self {
            writer: CountingWriter::new(writer),
            options,
            indent,
            level: 0,
        }
    }

    fn write_value(&mut self, pool: &MemoryPool, slot: Option<SlotId>) {
        let content = match slot {
            Some(slot) => pool.content(slot),
            None => Content::Null,
        };
        match content {
            Content::Null => self.write_str(TYPE_NULL),
            Content::Bool(true) => self.write_str(TYPE_TRUE),
            Content::Bool(false) => self.write_str(TYPE_FALSE),
            Content::Int(v) => {
                let mut buffer = itoa::Buffer::new();
                self.write_str(buffer.format(v));
            }
            Content::UInt(v) => {
                let mut buffer = itoa::Buffer::new();
                self.write_str(buffer.format(v));
            }
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
                let Some(slot) = slot else { return };
                self.writer.write_byte(b'[');
                self.level += 1;
                let mut len = 0;
                for child in pool.children(slot) {
                    self.begin_item(len);
                    self.write_value(pool, Some(child));
                    len += 1;
                }
                self.end_collection(b']', len);
            }
            Content::Object(_) => {
                let Some(slot) = slot else { return };
                self.writer.write_byte(b'{');
                self.level += 1;
                let mut len = 0;
                for child in pool.children(slot) {
                    self.begin_item(len);
                    self.write_string(pool.slot_key(child).unwrap_or_default());
                    self.writer.write_byte(b':');
                    if self.indent.is_some() {
                        self.writer.write_byte(b' ');
                    }
                    self.write_value(pool, Some(child));
                    len += 1;
                }
                self.end_collection(b'}', len);
            }
        }
    }

    #[inline]
    fn write_str(&mut self, s: &str) {
        self.writer.write_bytes(s.as_bytes());
    }

    fn write_float(&mut self, v: f64) {
        if !v.is_finite() {
            if !self.options.allow_nan {
                self.write_str(TYPE_NULL);
            } else if v.is_nan() {
                self.write_str(TYPE_NAN);
            } else {
                if v < 0.0 {
                    self.writer.write_byte(b'-');
                }
                self.write_str(TYPE_INFINITY);
            }
            return;
        }
        match self.options.float_format {
            FloatFormat::Normalized => {
                let mut buffer = FloatBuffer::new();
                self.write_str(buffer.format(v));
            }
            FloatFormat::Shortest => {
                let mut buffer = ryu::Buffer::new();
                self.write_str(buffer.format_finite(v));
            }
        }
    }

    fn write_string(&mut self, s: &[u8]) {
        self.writer.write_byte(b'"');
        let mut start = 0;
        for (i, c) in s.iter().enumerate() {
            let escape = escape_char(*c);
            if escape.is_none() && *c >= 0x20 {
                continue;
            }
            self.writer.write_bytes(&s[start..i]);
            start = i + 1;
            match escape {
                Some(e) => {
                    self.writer.write_bytes(&[b'\\', e]);
                }
                None => {
                    self.writer
                        .write_bytes(&[b'\\', b'u', b'0', b'0', hex_digit(c >> 4), hex_digit(*c)]);
                }
            }
        }
        self.writer.write_bytes(&s[start..]);
        self.writer.write_byte(b'"');
    }

    fn begin_item(&mut self, index: usize) {
        if index > 0 {
            self.writer.write_byte(b',');
        }
        self.write_line_break();
    }

    fn end_collection(&mut self, close: u8, len: usize) {
        self.level -= 1;
        // empty collections stay on one line
        if len > 0 {
            self.write_line_break();
        }
        self.writer.write_byte(close);
    }

    fn write_line_break(&mut self) {
        if let Some(indent) = self.indent {
            self.writer.write_byte(b'\n');
            for _ in 0..self.level {
                self.writer.write_bytes(indent.as_bytes());
            }
        }
    }
}
