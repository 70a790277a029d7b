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

// JSON text constants
pub(crate) const UNICODE_LEN: usize = 4;

// JSON text escape characters constants
pub(crate) const BS: u8 = b'\x5C'; // \\ Backslash
pub(crate) const QU: u8 = b'\x22'; // \" Double quotation mark
pub(crate) const SD: u8 = b'\x2F'; // \/ Slash or divide
pub(crate) const BB: u8 = b'\x08'; // \b Backspace
pub(crate) const FF: u8 = b'\x0C'; // \f Formfeed Page Break
pub(crate) const NN: u8 = b'\x0A'; // \n Newline
pub(crate) const RR: u8 = b'\x0D'; // \r Carriage Return
pub(crate) const TT: u8 = b'\x09'; // \t Horizontal Tab

/// Maximum array/object depth accepted by the parsers unless overridden.
pub const DEFAULT_NESTING_LIMIT: u8 = 10;

// A number literal (sign, digits, dot, exponent) must fit in this buffer,
// including one byte of headroom.
pub(crate) const NUMBER_BUFFER_LEN: usize = 64;

// Bytes of bookkeeping charged for every string record in the pool.
pub(crate) const STRING_HEADER_SIZE: usize = 4;

// Decimal digits emitted by the normalized float formatter.
pub(crate) const FLOAT_DECIMAL_PLACES: u8 = 9;
pub(crate) const FLOAT_MAX_DECIMAL_PART: u32 = 1_000_000_000;
pub(crate) const POSITIVE_EXPONENTIATION_THRESHOLD: f64 = 1e7;
pub(crate) const NEGATIVE_EXPONENTIATION_THRESHOLD: f64 = 1e-5;

pub(crate) const TYPE_NULL: &str = "null";
pub(crate) const TYPE_TRUE: &str = "true";
pub(crate) const TYPE_FALSE: &str = "false";
pub(crate) const TYPE_NAN: &str = "NaN";
pub(crate) const TYPE_INFINITY: &str = "Infinity";
