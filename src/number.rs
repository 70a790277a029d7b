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

use std::fmt::Display;
use std::fmt::Formatter;

use num_traits::NumCast;

use crate::constants::*;

/// Represents a number stored in a document.
///
/// Integers keep the signedness they were parsed or set with: non-negative
/// literals become `UInt64`, negative ones `Int64`. Literals with a fraction,
/// an exponent, or too many digits for 64 bits become `Float64`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer
    UInt64(u64),
    /// 64-bit floating-point
    Float64(f64),
}

impl Number {
    /// Returns the i64 representation of the number, if possible.
    ///
    /// This method returns None if the number cannot be represented as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int64(v) => Some(*v),
            Number::UInt64(v) => i64::try_from(*v).ok(),
            Number::Float64(_) => None,
        }
    }

    /// Returns the u64 representation of the number, if possible.
    ///
    /// This method returns None if the number cannot be represented as a u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Int64(v) => u64::try_from(*v).ok(),
            Number::UInt64(v) => Some(*v),
            Number::Float64(_) => None,
        }
    }

    /// Returns the f64 representation of the number.
    ///
    /// Large integers may lose precision.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int64(v) => *v as f64,
            Number::UInt64(v) => *v as f64,
            Number::Float64(v) => *v,
        }
    }

    /// Converts to any primitive number type. Out-of-range values yield
    /// `None`, floats are truncated toward zero.
    pub fn cast<T: NumCast>(&self) -> Option<T> {
        match self {
            Number::Int64(v) => T::from(*v),
            Number::UInt64(v) => T::from(*v),
            Number::Float64(v) => T::from(*v),
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float64(_))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int64(a), Number::Int64(b)) => a == b,
            (Number::UInt64(a), Number::UInt64(b)) => a == b,
            (Number::Int64(a), Number::UInt64(b)) | (Number::UInt64(b), Number::Int64(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Number::Int64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::UInt64(v) => {
                let mut buffer = itoa::Buffer::new();
                f.write_str(buffer.format(*v))
            }
            Number::Float64(v) => {
                let mut buffer = FloatBuffer::new();
                f.write_str(buffer.format(*v))
            }
        }
    }
}

/// Parses a complete number literal.
///
/// Accepts an optional `+` or `-` sign, digits with an optional fraction
/// (either side of the dot may be empty, not both) and an optional exponent.
/// With `allow_nan`, the tokens `NaN` and `Infinity` are accepted as well.
pub(crate) fn parse_number(literal: &[u8], allow_nan: bool) -> Option<Number> {
    let mut idx = 0;
    let mut negative = false;
    match literal.first() {
        Some(b'-') => {
            negative = true;
            idx += 1;
        }
        Some(b'+') => idx += 1,
        _ => {}
    }
    let body = &literal[idx..];

    if allow_nan {
        if body == TYPE_NAN.as_bytes() {
            return Some(Number::Float64(f64::NAN));
        }
        if body == TYPE_INFINITY.as_bytes() {
            let inf = if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            return Some(Number::Float64(inf));
        }
    }

    let mut mantissa = 0_u64;
    let mut overflow = false;
    let mut digits = 0;
    while let Some(c) = literal.get(idx).filter(|c| c.is_ascii_digit()) {
        let digit = (c - b'0') as u64;
        match mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
            Some(m) => mantissa = m,
            None => overflow = true,
        }
        digits += 1;
        idx += 1;
    }

    let mut is_float = false;
    if literal.get(idx) == Some(&b'.') {
        is_float = true;
        idx += 1;
        while literal.get(idx).is_some_and(|c| c.is_ascii_digit()) {
            digits += 1;
            idx += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(literal.get(idx), Some(b'e') | Some(b'E')) {
        is_float = true;
        idx += 1;
        if matches!(literal.get(idx), Some(b'+') | Some(b'-')) {
            idx += 1;
        }
        let start = idx;
        while literal.get(idx).is_some_and(|c| c.is_ascii_digit()) {
            idx += 1;
        }
        if idx == start {
            return None;
        }
    }
    if idx != literal.len() {
        return None;
    }

    if !is_float && !overflow {
        if !negative {
            return Some(Number::UInt64(mantissa));
        }
        if mantissa <= i64::MAX as u64 + 1 {
            return Some(Number::Int64((mantissa as i64).wrapping_neg()));
        }
    }

    // fast_float2 takes the sign itself but not a leading plus
    let text = if literal.first() == Some(&b'+') {
        &literal[1..]
    } else {
        literal
    };
    fast_float2::parse::<f64, _>(text).ok().map(Number::Float64)
}

const POSITIVE_BINARY_POWERS_OF_TEN: [f64; 9] =
    [1e1, 1e2, 1e4, 1e8, 1e16, 1e32, 1e64, 1e128, 1e256];
const NEGATIVE_BINARY_POWERS_OF_TEN: [f64; 9] =
    [1e-1, 1e-2, 1e-4, 1e-8, 1e-16, 1e-32, 1e-64, 1e-128, 1e-256];
const NEGATIVE_BINARY_POWERS_OF_TEN_PLUS_ONE: [f64; 9] =
    [1e0, 1e-1, 1e-3, 1e-7, 1e-15, 1e-31, 1e-63, 1e-127, 1e-255];

/// A non-negative finite float split into `integral.decimal e exponent`.
///
/// The value is first normalized into `[1e-5, 1e7)` (or `[1, 10)` when an
/// exponent is needed), then the fraction is rounded half-up to nine
/// significant decimal places and trailing zeros are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FloatParts {
    pub(crate) integral: u32,
    pub(crate) decimal: u32,
    pub(crate) decimal_places: u8,
    pub(crate) exponent: i16,
}

impl FloatParts {
    pub(crate) fn new(value: f64) -> FloatParts {
        let mut value = value;
        let mut exponent = normalize(&mut value);
        let mut max_decimal_part = FLOAT_MAX_DECIMAL_PART;
        let mut decimal_places = FLOAT_DECIMAL_PLACES;

        let mut integral = value as u32;
        // every integral digit costs one decimal place
        let mut tmp = integral;
        while tmp >= 10 {
            max_decimal_part /= 10;
            decimal_places -= 1;
            tmp /= 10;
        }

        let mut remainder = (value - integral as f64) * max_decimal_part as f64;
        let mut decimal = remainder as u32;
        remainder -= decimal as f64;

        // round half up
        decimal += (remainder * 2.0) as u32;
        if decimal >= max_decimal_part {
            decimal = 0;
            integral += 1;
            if exponent != 0 && integral >= 10 {
                exponent += 1;
                integral = 1;
            }
        }

        while decimal % 10 == 0 && decimal_places > 0 {
            decimal /= 10;
            decimal_places -= 1;
        }

        FloatParts {
            integral,
            decimal,
            decimal_places,
            exponent,
        }
    }
}

fn normalize(value: &mut f64) -> i16 {
    let mut powers_of_ten = 0_i16;

    if *value >= POSITIVE_EXPONENTIATION_THRESHOLD {
        for index in (0..POSITIVE_BINARY_POWERS_OF_TEN.len()).rev() {
            if *value >= POSITIVE_BINARY_POWERS_OF_TEN[index] {
                *value *= NEGATIVE_BINARY_POWERS_OF_TEN[index];
                powers_of_ten += 1 << index;
            }
        }
    }

    if *value > 0.0 && *value <= NEGATIVE_EXPONENTIATION_THRESHOLD {
        for index in (0..NEGATIVE_BINARY_POWERS_OF_TEN_PLUS_ONE.len()).rev() {
            if *value < NEGATIVE_BINARY_POWERS_OF_TEN_PLUS_ONE[index] {
                *value *= POSITIVE_BINARY_POWERS_OF_TEN[index];
                powers_of_ten -= 1 << index;
            }
        }
    }

    powers_of_ten
}

const FLOAT_BUFFER_LEN: usize = 32;

/// A stack buffer for the normalized float text, in the manner of
/// `itoa::Buffer` and `ryu::Buffer`.
pub(crate) struct FloatBuffer {
    bytes: [u8; FLOAT_BUFFER_LEN],
    len: usize,
}

impl FloatBuffer {
    pub(crate) fn new() -> FloatBuffer {
        FloatBuffer {
            bytes: [0; FLOAT_BUFFER_LEN],
            len: 0,
        }
    }

    /// Formats `value`. NaN and infinities are rendered as `NaN`,
    /// `Infinity` and `-Infinity`.
    pub(crate) fn format(&mut self, value: f64) -> &str {
        self.len = 0;
        if value.is_nan() {
            self.push_str(TYPE_NAN);
            return self.as_str();
        }
        let mut value = value;
        if value < 0.0 {
            self.push(b'-');
            value = -value;
        }
        if value.is_infinite() {
            self.push_str(TYPE_INFINITY);
            return self.as_str();
        }

        let parts = FloatParts::new(value);
        let mut int_buffer = itoa::Buffer::new();
        self.push_str(int_buffer.format(parts.integral));
        if parts.decimal_places > 0 {
            self.push(b'.');
            let mut digits = [b'0'; FLOAT_DECIMAL_PLACES as usize];
            let width = parts.decimal_places as usize;
            let mut decimal = parts.decimal;
            for digit in digits[..width].iter_mut().rev() {
                *digit = b'0' + (decimal % 10) as u8;
                decimal /= 10;
            }
            for digit in digits[..width].iter() {
                self.push(*digit);
            }
        }
        if parts.exponent != 0 {
            self.push(b'e');
            self.push_str(int_buffer.format(parts.exponent));
        }
        self.as_str()
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    fn push_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.push(byte);
        }
    }

    fn as_str(&self) -> &str {
        // only ASCII is ever pushed
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }
}
