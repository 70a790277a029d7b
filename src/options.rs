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

use crate::constants::DEFAULT_NESTING_LIMIT;
use crate::filter::Filter;

/// Extensions to the JSON grammar accepted by the JSON parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonOptions {
    /// Whether `/* block */` and `// line` comments may appear wherever
    /// whitespace is allowed.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_comments: bool,

    /// Whether `'single quoted'` strings and keys are accepted.
    ///
    /// # Default
    ///
    /// `true`
    pub allow_single_quotes: bool,

    /// Whether object keys may be written without quotes, e.g. `{a:1}`.
    /// An unquoted key is made of letters, digits and `_+-.`.
    ///
    /// # Default
    ///
    /// `true`
    pub allow_unquoted_keys: bool,

    /// Whether an unquoted token that is neither a keyword nor a number is
    /// kept as a raw fragment instead of being rejected.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unquoted_values: bool,

    /// Whether `NaN`, `Infinity` and `-Infinity` are accepted as numbers.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_nan: bool,

    /// Whether `\uXXXX` escapes are decoded to UTF-8. When disabled they are
    /// stored as written.
    ///
    /// # Default
    ///
    /// `true`
    pub decode_unicode: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            allow_comments: false,
            allow_single_quotes: true,
            allow_unquoted_keys: true,
            allow_unquoted_values: false,
            allow_nan: false,
            decode_unicode: true,
        }
    }
}

impl JsonOptions {
    pub fn with_comments(mut self, allow: bool) -> Self {
        self.allow_comments = allow;
        self
    }

    pub fn with_single_quotes(mut self, allow: bool) -> Self {
        self.allow_single_quotes = allow;
        self
    }

    pub fn with_unquoted_keys(mut self, allow: bool) -> Self {
        self.allow_unquoted_keys = allow;
        self
    }

    pub fn with_unquoted_values(mut self, allow: bool) -> Self {
        self.allow_unquoted_values = allow;
        self
    }

    pub fn with_nan(mut self, allow: bool) -> Self {
        self.allow_nan = allow;
        self
    }

    pub fn with_decode_unicode(mut self, decode: bool) -> Self {
        self.decode_unicode = decode;
        self
    }
}

/// Options shared by the JSON and MessagePack parsers.
#[derive(Clone, Copy, Debug)]
pub struct DeserializeOptions<'f> {
    /// Maximum depth of nested arrays and objects.
    ///
    /// # Default
    ///
    /// `10`
    pub nesting_limit: u8,

    /// Selects which parts of the input are stored in the document.
    ///
    /// # Default
    ///
    /// Everything is stored.
    pub filter: Filter<'f>,

    /// Ignored by the MessagePack parser.
    pub json: JsonOptions,
}

impl Default for DeserializeOptions<'_> {
    fn default() -> Self {
        Self {
            nesting_limit: DEFAULT_NESTING_LIMIT,
            filter: Filter::allow_all(),
            json: JsonOptions::default(),
        }
    }
}

impl<'f> DeserializeOptions<'f> {
    pub fn with_nesting_limit(mut self, limit: u8) -> Self {
        self.nesting_limit = limit;
        self
    }

    pub fn with_filter(mut self, filter: Filter<'f>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_json(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }
}

/// How the JSON serializer renders floating point numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FloatFormat {
    /// At most nine decimal places. Exponent notation is used outside
    /// `[1e-5, 1e7)`. `3.14` is written `3.14`, `1e7` is written `1e7`.
    #[default]
    Normalized,
    /// The shortest text that reads back to the same `f64`.
    Shortest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Whether NaN and infinities are written as `NaN`, `Infinity` and
    /// `-Infinity`. When disabled they are written as `null`.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_nan: bool,

    /// # Default
    ///
    /// [`FloatFormat::Normalized`]
    pub float_format: FloatFormat,
}

impl SerializeOptions {
    pub fn with_nan(mut self, allow: bool) -> Self {
        self.allow_nan = allow;
        self
    }

    pub fn with_float_format(mut self, format: FloatFormat) -> Self {
        self.float_format = format;
        self
    }
}

/// Layout of the pretty JSON serializer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrettyOptions<'a> {
    /// Written once per nesting level at the start of every line.
    ///
    /// # Default
    ///
    /// Two spaces.
    pub indent: &'a str,

    pub serialize: SerializeOptions,
}

impl Default for PrettyOptions<'_> {
    fn default() -> Self {
        Self {
            indent: "  ",
            serialize: SerializeOptions::default(),
        }
    }
}

impl<'a> PrettyOptions<'a> {
    pub fn with_indent(mut self, indent: &'a str) -> Self {
        self.indent = indent;
        self
    }
}
