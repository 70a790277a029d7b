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

use super::constants::*;
use super::error::Error;
use super::error::Result;

#[allow(clippy::zero_prefixed_literal)]
static HEX: [u8; 256] = {
    const __: u8 = 255; // not a hex digit
    [
        //   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 0
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 1
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 2
        00, 01, 02, 03, 04, 05, 06, 07, 08, 09, __, __, __, __, __, __, // 3
        __, 10, 11, 12, 13, 14, 15, __, __, __, __, __, __, __, __, __, // 4
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 5
        __, 10, 11, 12, 13, 14, 15, __, __, __, __, __, __, __, __, __, // 6
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 7
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 8
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // 9
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // A
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // B
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // C
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // D
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // E
        __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, __, // F
    ]
};

static HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Maps the character following a backslash to the byte it stands for.
#[inline]
pub(crate) fn unescape_char(c: u8) -> Option<u8> {
    match c {
        b'\\' => Some(BS),
        b'"' => Some(QU),
        b'/' => Some(SD),
        b'b' => Some(BB),
        b'f' => Some(FF),
        b'n' => Some(NN),
        b'r' => Some(RR),
        b't' => Some(TT),
        _ => None,
    }
}

/// Maps a byte that must be escaped in JSON output to its escape letter.
/// Other control characters are written as `\u00XX`.
#[inline]
pub(crate) fn escape_char(c: u8) -> Option<u8> {
    match c {
        BS => Some(b'\\'),
        QU => Some(b'"'),
        BB => Some(b'b'),
        FF => Some(b'f'),
        NN => Some(b'n'),
        RR => Some(b'r'),
        TT => Some(b't'),
        _ => None,
    }
}

#[inline]
pub(crate) fn hex_digit(n: u8) -> u8 {
    HEX_DIGITS[(n & 0x0F) as usize]
}

#[inline]
fn decode_hex_val(val: u8) -> Option<u16> {
    let n = HEX[val as usize] as u16;
    if n == 255 {
        None
    } else {
        Some(n)
    }
}

#[inline]
pub(crate) fn decode_hex_escape(numbers: &[u8; UNICODE_LEN]) -> Result<u16> {
    let mut n = 0;
    for number in numbers {
        match decode_hex_val(*number) {
            Some(hex) => n = (n << 4) + hex,
            None => return Err(Error::InvalidInput),
        }
    }
    Ok(n)
}

const DECODED_LEN: usize = 2 * (UNICODE_LEN + 2);

/// The UTF-8 bytes produced by one `\uXXXX` escape.
pub(crate) struct Decoded {
    bytes: [u8; DECODED_LEN],
    len: usize,
}

impl Decoded {
    fn new() -> Decoded {
        Decoded {
            bytes: [0; DECODED_LEN],
            len: 0,
        }
    }

    fn push_char(&mut self, c: char) {
        let n = c.encode_utf8(&mut self.bytes[self.len..]).len();
        self.len += n;
    }

    // https://datatracker.ietf.org/doc/html/rfc8259#section-8.2
    // RFC8259 allow invalid Unicode, the escape is kept as written
    fn push_invalid_unicode(&mut self, numbers: &[u8; UNICODE_LEN]) {
        self.bytes[self.len] = b'\\';
        self.bytes[self.len + 1] = b'u';
        self.bytes[self.len + 2..self.len + 2 + UNICODE_LEN].copy_from_slice(numbers);
        self.len += UNICODE_LEN + 2;
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Turns a stream of `\uXXXX` code units into UTF-8.
///
/// Non-BMP characters are encoded as a sequence of two hex escapes,
/// representing UTF-16 surrogates. A high surrogate is held back until the
/// next code unit arrives; surrogates that do not pair up are kept verbatim.
#[derive(Default)]
pub(crate) struct Utf16Decoder {
    high: Option<(u16, [u8; UNICODE_LEN])>,
}

impl Utf16Decoder {
    pub(crate) fn push(&mut self, numbers: &[u8; UNICODE_LEN]) -> Result<Decoded> {
        let unit = decode_hex_escape(numbers)?;
        let mut out = Decoded::new();

        if let Some((n1, high_numbers)) = self.high.take() {
            if (0xDC00..=0xDFFF).contains(&unit) {
                #[allow(clippy::precedence)]
                let n = (((n1 - 0xD800) as u32) << 10 | (unit - 0xDC00) as u32) + 0x1_0000;
                match char::from_u32(n) {
                    Some(c) => out.push_char(c),
                    None => {
                        out.push_invalid_unicode(&high_numbers);
                        out.push_invalid_unicode(numbers);
                    }
                }
                return Ok(out);
            }
            out.push_invalid_unicode(&high_numbers);
        }

        match unit {
            0xD800..=0xDBFF => self.high = Some((unit, *numbers)),
            // Low surrogate without preceding high surrogate
            0xDC00..=0xDFFF => out.push_invalid_unicode(numbers),
            n => match char::from_u32(n as u32) {
                Some(c) => out.push_char(c),
                None => out.push_invalid_unicode(numbers),
            },
        }
        Ok(out)
    }

    /// Releases a held high surrogate when no low surrogate follows.
    pub(crate) fn flush(&mut self) -> Decoded {
        let mut out = Decoded::new();
        if let Some((_, numbers)) = self.high.take() {
            out.push_invalid_unicode(&numbers);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn decode(units: &[&str]) -> String {
        let mut decoder = Utf16Decoder::default();
        let mut buf = Vec::new();
        for unit in units {
            let numbers: [u8; UNICODE_LEN] = unit.as_bytes().try_into().unwrap();
            buf.extend_from_slice(decoder.push(&numbers).unwrap().as_bytes());
        }
        buf.extend_from_slice(decoder.flush().as_bytes());
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_utf16_decoder() {
        let test_cases: Vec<(Vec<&str>, &str)> = vec![
            (vec!["0041", "0042", "0043"], "ABC"),
            (vec!["00A9", "00ae"], "©®"),
            (vec!["4E2D", "6587"], "中文"),
            (vec!["007F"], "\u{7F}"),
            (vec!["0000"], "\u{0}"),
            // G-clef (musical symbol)
            (vec!["D834", "DD1E"], "𝄞"),
            (vec!["D83D", "DE00", "0021"], "😀!"),
            // unpaired surrogates are kept as written
            (vec!["DD1E"], "\\uDD1E"),
            (vec!["D834"], "\\uD834"),
            (vec!["D834", "0041"], "\\uD834A"),
            (vec!["D834", "D834", "DD1E"], "\\uD834𝄞"),
        ];
        for (units, expected) in test_cases {
            assert_eq!(decode(&units), expected, "{:?}", units);
        }
    }

    #[test]
    fn test_invalid_hex() {
        let mut decoder = Utf16Decoder::default();
        assert_eq!(decoder.push(b"GHIJ").err(), Some(Error::InvalidInput));
        assert_eq!(decoder.push(b"12 4").err(), Some(Error::InvalidInput));
    }

    #[test]
    fn test_escape_tables() {
        for c in [b'"', b'\\', b'b', b'f', b'n', b'r', b't'] {
            let byte = unescape_char(c).unwrap();
            assert_eq!(escape_char(byte), Some(c));
        }
        assert_eq!(unescape_char(b'/'), Some(b'/'));
        assert_eq!(escape_char(b'/'), None);
        assert_eq!(unescape_char(b'z'), None);
        assert_eq!(hex_digit(0x0A), b'a');
    }

    proptest! {
        #[test]
        fn proptest_utf16_decoder(text in any::<String>()) {
            let mut units = Vec::new();
            for unit in text.encode_utf16() {
                units.push(format!("{:04X}", unit));
            }
            let units: Vec<&str> = units.iter().map(|u| u.as_str()).collect();
            prop_assert_eq!(decode(&units), text);
        }
    }
}
