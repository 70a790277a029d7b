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

use std::io::Read;

use byteorder::ReadBytesExt;

/// A source of bytes consumed by the parsers.
///
/// Both parsers pull one byte at a time and never look back, so any
/// forward-only source can implement this trait.
pub trait Reader {
    /// Returns the next byte, or `None` once the input is exhausted.
    fn read(&mut self) -> Option<u8>;

    /// Fills `buf` as far as possible and returns the number of bytes read.
    /// A short count means the input is exhausted.
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        for (i, byte) in buf.iter_mut().enumerate() {
            match self.read() {
                Some(b) => *byte = b,
                None => return i,
            }
        }
        buf.len()
    }
}

impl<R: Reader + ?Sized> Reader for &mut R {
    #[inline]
    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    #[inline]
    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        (**self).read_bytes(buf)
    }
}

/// Reads from a byte slice held in memory.
#[derive(Clone, Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> SliceReader<'a> {
        SliceReader { data, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl Reader for SliceReader<'_> {
    #[inline]
    fn read(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let remaining = self.remaining();
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        n
    }
}

/// Adapts any [`std::io::Read`]. I/O errors are reported as end of input.
#[derive(Debug)]
pub struct IoReader<R> {
    inner: R,
}

impl<R: Read> IoReader<R> {
    pub fn new(inner: R) -> IoReader<R> {
        IoReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Reader for IoReader<R> {
    #[inline]
    fn read(&mut self) -> Option<u8> {
        self.inner.read_u8().ok()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        filled
    }
}
