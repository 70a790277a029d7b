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

use std::io::Write;

use byteorder::WriteBytesExt;

/// A sink for the bytes produced by the serializers.
///
/// Writes report how many bytes were accepted. A sink that runs out of room
/// returns a short count; the serializers keep going and the total they
/// return is what actually reached the sink.
pub trait Writer {
    fn write_byte(&mut self, byte: u8) -> usize;

    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let mut n = 0;
        for byte in bytes {
            if self.write_byte(*byte) == 0 {
                break;
            }
            n += 1;
        }
        n
    }
}

impl<W: Writer + ?Sized> Writer for &mut W {
    #[inline]
    fn write_byte(&mut self, byte: u8) -> usize {
        (**self).write_byte(byte)
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        (**self).write_bytes(bytes)
    }
}

impl Writer for Vec<u8> {
    #[inline]
    fn write_byte(&mut self, byte: u8) -> usize {
        self.push(byte);
        1
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        self.extend_from_slice(bytes);
        bytes.len()
    }
}

/// Writes into a fixed buffer and drops whatever does not fit.
#[derive(Debug)]
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> SliceWriter<'a> {
        SliceWriter { buf, len: 0 }
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Writer for SliceWriter<'_> {
    fn write_byte(&mut self, byte: u8) -> usize {
        match self.buf.get_mut(self.len) {
            Some(slot) => {
                *slot = byte;
                self.len += 1;
                1
            }
            None => 0,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.buf.len() - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }
}

/// Adapts any [`std::io::Write`]. A failed write counts as zero bytes.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: W,
}

impl<W: Write> IoWriter<W> {
    pub fn new(inner: W) -> IoWriter<W> {
        IoWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Writer for IoWriter<W> {
    fn write_byte(&mut self, byte: u8) -> usize {
        match self.inner.write_u8(byte) {
            Ok(()) => 1,
            Err(_) => 0,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        match self.inner.write_all(bytes) {
            Ok(()) => bytes.len(),
            Err(_) => 0,
        }
    }
}

/// Forwards to another sink and counts the bytes it accepted.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    count: usize,
}

impl<W: Writer> CountingWriter<W> {
    pub fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, count: 0 }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Writer> Writer for CountingWriter<W> {
    #[inline]
    fn write_byte(&mut self, byte: u8) -> usize {
        let n = self.inner.write_byte(byte);
        self.count += n;
        n
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = self.inner.write_bytes(bytes);
        self.count += n;
        n
    }
}

/// Accepts and discards everything. Used to measure output length.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardWriter;

impl Writer for DiscardWriter {
    #[inline]
    fn write_byte(&mut self, _byte: u8) -> usize {
        1
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        bytes.len()
    }
}
