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

use log::debug;
use log::trace;

use crate::constants::*;
use crate::document::Document;
use crate::error::Error;
use crate::error::Result;
use crate::filter::Filter;
use crate::number::parse_number;
use crate::number::Number;
use crate::options::DeserializeOptions;
use crate::options::JsonOptions;
use crate::pool::MemoryPool;
use crate::pool::SlotId;
use crate::reader::Reader;
use crate::reader::SliceReader;
use crate::util::unescape_char;
use crate::util::Utf16Decoder;

/// Parses JSON text into `doc` with the default options.
///
/// The document is cleared first. On error, whatever was stored before the
/// error stays in the document.
pub fn parse_json(doc: &mut Document, input: &[u8]) -> Result<()> {
    parse_json_with(doc, SliceReader::new(input), &DeserializeOptions::default())
}

/// Parses JSON text read from `reader` into `doc`.
///
/// Reading stops right after the closing bracket of a top-level array or
/// object, so several documents can be read from one stream. After any
/// other top-level value, strings included, only whitespace may follow.
pub fn parse_json_with<R: Reader>(
    doc: &mut Document,
    reader: R,
    options: &DeserializeOptions<'_>,
) -> Result<()> {
    doc.clear();
    let mut parser = Parser::new(doc.pool_mut(), reader, options.json);
    let result = parser.parse(options.filter, options.nesting_limit);
    if let Err(err) = &result {
        debug!("json parse aborted: {}", err);
    }
    result
}

// Letters, digits and `_+-.` make up numbers, keywords and unquoted tokens.
#[inline]
fn can_be_in_non_quoted_string(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'+' | b'-' | b'.')
}

#[inline]
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

// The parser reads one byte ahead. A NUL byte counts as the end of input.
//
// Every `parse_*` method takes the destination slot as `Option<SlotId>`;
// `None` means the value is read and validated but not stored.
struct Parser<'a, R> {
    pool: &'a mut MemoryPool,
    reader: R,
    current: u8,
    loaded: bool,
    found_something: bool,
    options: JsonOptions,
}

impl<'a, R: Reader> Parser<'a, R> {
    fn new(pool: &'a mut MemoryPool, reader: R, options: JsonOptions) -> Parser<'a, R> {
        Self {
            pool,
            reader,
            current: 0,
            loaded: false,
            found_something: false,
            options,
        }
    }

    fn parse(&mut self, filter: Filter<'_>, nesting_limit: u8) -> Result<()> {
        let first = self.skip_spaces_and_comments()?;
        self.parse_json_value(Some(SlotId::ROOT), filter, nesting_limit)?;
        let enclosed = matches!(first, b'[' | b'{');
        if !enclosed && self.skip_trivia()? {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }

    #[inline]
    fn current(&mut self) -> u8 {
        if !self.loaded {
            self.current = self.reader.read().unwrap_or(0);
            self.loaded = true;
        }
        self.current
    }

    #[inline]
    fn step(&mut self) {
        self.current();
        self.loaded = false;
    }

    #[inline]
    fn eat(&mut self, c: u8) -> bool {
        if self.current() == c {
            self.step();
            true
        } else {
            false
        }
    }

    // Skips whitespace and, if enabled, comments. Returns whether a token
    // follows; `false` means the end of input was reached.
    fn skip_trivia(&mut self) -> Result<bool> {
        loop {
            match self.current() {
                0 => return Ok(false),
                c if is_space(c) => self.step(),
                b'/' if self.options.allow_comments => {
                    self.step();
                    match self.current() {
                        b'*' => {
                            self.step();
                            let mut was_star = false;
                            loop {
                                let c = self.current();
                                if c == 0 {
                                    self.found_something = true;
                                    return Err(Error::IncompleteInput);
                                }
                                self.step();
                                if c == b'/' && was_star {
                                    break;
                                }
                                was_star = c == b'*';
                            }
                        }
                        b'/' => loop {
                            self.step();
                            match self.current() {
                                0 => return Ok(false),
                                b'\n' => break,
                                _ => {}
                            }
                        },
                        _ => {
                            self.found_something = true;
                            return Err(Error::InvalidInput);
                        }
                    }
                }
                _ => {
                    self.found_something = true;
                    return Ok(true);
                }
            }
        }
    }

    // Skips to the next token and returns its first byte. Reaching the end
    // of input is an error.
    fn skip_spaces_and_comments(&mut self) -> Result<u8> {
        if self.skip_trivia()? {
            Ok(self.current())
        } else if self.found_something {
            Err(Error::IncompleteInput)
        } else {
            Err(Error::EmptyInput)
        }
    }

    fn parse_json_value(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
    ) -> Result<()> {
        let c = self.skip_spaces_and_comments()?;
        match c {
            b'[' => {
                let slot = slot.filter(|_| filter.allow_array());
                if let Some(slot) = slot {
                    self.pool.to_array(slot);
                }
                self.parse_json_array(slot, filter, nesting_limit)
            }
            b'{' => {
                let slot = slot.filter(|_| filter.allow_object());
                if let Some(slot) = slot {
                    self.pool.to_object(slot);
                }
                self.parse_json_object(slot, filter, nesting_limit)
            }
            b'"' => self.parse_json_string(slot.filter(|_| filter.allow_value())),
            b'\'' if self.options.allow_single_quotes => {
                self.parse_json_string(slot.filter(|_| filter.allow_value()))
            }
            b't' => {
                if let Some(slot) = slot.filter(|_| filter.allow_value()) {
                    self.pool.set_bool(slot, true);
                }
                self.skip_keyword(TYPE_TRUE)
            }
            b'f' => {
                if let Some(slot) = slot.filter(|_| filter.allow_value()) {
                    self.pool.set_bool(slot, false);
                }
                self.skip_keyword(TYPE_FALSE)
            }
            b'n' => {
                if let Some(slot) = slot.filter(|_| filter.allow_value()) {
                    self.pool.set_null(slot);
                }
                self.skip_keyword(TYPE_NULL)
            }
            _ => self.parse_json_number(slot.filter(|_| filter.allow_value())),
        }
    }

    fn skip_keyword(&mut self, keyword: &str) -> Result<()> {
        for expected in keyword.bytes() {
            let c = self.current();
            if c == 0 {
                return Err(Error::IncompleteInput);
            }
            if c != expected {
                return Err(Error::InvalidInput);
            }
            self.step();
        }
        Ok(())
    }

    fn parse_json_array(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
    ) -> Result<()> {
        if nesting_limit == 0 {
            return Err(Error::TooDeep);
        }
        // Skip opening bracket
        self.step();
        self.skip_spaces_and_comments()?;
        if self.eat(b']') {
            return Ok(());
        }

        let element_filter = filter.element();
        loop {
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
            self.parse_json_value(element, element_filter, nesting_limit - 1)?;

            self.skip_spaces_and_comments()?;
            if self.eat(b']') {
                return Ok(());
            }
            if !self.eat(b',') {
                return Err(Error::InvalidInput);
            }
        }
    }

    fn parse_json_object(
        &mut self,
        slot: Option<SlotId>,
        filter: Filter<'_>,
        nesting_limit: u8,
    ) -> Result<()> {
        if nesting_limit == 0 {
            return Err(Error::TooDeep);
        }
        // Skip opening brace
        self.step();
        self.skip_spaces_and_comments()?;
        if self.eat(b'}') {
            return Ok(());
        }

        loop {
            self.parse_json_key(slot.is_some())?;
            self.skip_spaces_and_comments()?;
            if !self.eat(b':') {
                return Err(Error::InvalidInput);
            }

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
            self.parse_json_value(member, member_filter, nesting_limit - 1)?;

            self.skip_spaces_and_comments()?;
            if self.eat(b'}') {
                return Ok(());
            }
            if !self.eat(b',') {
                return Err(Error::InvalidInput);
            }
            self.skip_spaces_and_comments()?;
        }
    }

    // Reads a key into the string builder when `store` is set.
    fn parse_json_key(&mut self, store: bool) -> Result<()> {
        let c = self.current();
        if c == b'"' || (c == b'\'' && self.options.allow_single_quotes) {
            return self.parse_quoted_string(store);
        }
        if !self.options.allow_unquoted_keys {
            return Err(Error::InvalidInput);
        }
        if store {
            self.pool.start_string();
        }
        let mut len = 0;
        loop {
            let c = self.current();
            if !can_be_in_non_quoted_string(c) {
                break;
            }
            self.append(store, &[c])?;
            self.step();
            len += 1;
        }
        if len == 0 {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }

    fn parse_json_string(&mut self, slot: Option<SlotId>) -> Result<()> {
        self.parse_quoted_string(slot.is_some())?;
        if let Some(slot) = slot {
            if !self.pool.set_built_string(slot, false) {
                return Err(Error::NoMemory);
            }
        }
        Ok(())
    }

    #[inline]
    fn append(&mut self, store: bool, bytes: &[u8]) -> Result<()> {
        if store && !bytes.is_empty() && !self.pool.append_string(bytes) {
            return Err(Error::NoMemory);
        }
        Ok(())
    }

    // Decodes a quoted string into the string builder when `store` is set,
    // otherwise only validates it.
    fn parse_quoted_string(&mut self, store: bool) -> Result<()> {
        let stop = self.current();
        self.step();
        if store {
            self.pool.start_string();
        }

        let mut decoder = Utf16Decoder::default();
        loop {
            let c = self.current();
            if c == 0 {
                return Err(Error::IncompleteInput);
            }
            self.step();
            if c == stop {
                break;
            }
            if c != b'\\' {
                let pending = decoder.flush();
                self.append(store, pending.as_bytes())?;
                self.append(store, &[c])?;
                continue;
            }

            let c = self.current();
            if c == 0 {
                return Err(Error::IncompleteInput);
            }
            self.step();
            if c == b'u' && self.options.decode_unicode {
                let mut numbers = [0u8; UNICODE_LEN];
                for number in numbers.iter_mut() {
                    let c = self.current();
                    if c == 0 {
                        return Err(Error::IncompleteInput);
                    }
                    self.step();
                    *number = c;
                }
                let decoded = decoder.push(&numbers)?;
                self.append(store, decoded.as_bytes())?;
                continue;
            }

            let pending = decoder.flush();
            self.append(store, pending.as_bytes())?;
            if c == b'u' {
                // kept verbatim, the hex digits follow as plain characters
                self.append(store, b"\\u")?;
                continue;
            }
            match unescape_char(c) {
                Some(byte) => self.append(store, &[byte])?,
                None => return Err(Error::InvalidInput),
            }
        }

        let pending = decoder.flush();
        self.append(store, pending.as_bytes())
    }

    fn parse_json_number(&mut self, slot: Option<SlotId>) -> Result<()> {
        let mut buffer = [0u8; NUMBER_BUFFER_LEN];
        let mut len = 0;
        loop {
            let c = self.current();
            if !can_be_in_non_quoted_string(c) {
                break;
            }
            if len == NUMBER_BUFFER_LEN - 1 {
                return Err(Error::InvalidInput);
            }
            buffer[len] = c;
            len += 1;
            self.step();
        }
        let literal = &buffer[..len];

        match parse_number(literal, self.options.allow_nan) {
            Some(number) => {
                if let Some(slot) = slot {
                    match number {
                        Number::Int64(v) => self.pool.set_integer(slot, v),
                        Number::UInt64(v) => self.pool.set_unsigned(slot, v),
                        Number::Float64(v) => self.pool.set_float(slot, v),
                    }
                }
                Ok(())
            }
            None if len > 0 && self.options.allow_unquoted_values => {
                if let Some(slot) = slot {
                    if !self.pool.set_raw(slot, literal) {
                        return Err(Error::NoMemory);
                    }
                }
                Ok(())
            }
            None => Err(Error::InvalidInput),
        }
    }
}
