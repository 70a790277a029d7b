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

pub type Result<T> = std::result::Result<T, Error>;

/// The reasons a parse or a tree conversion can fail.
///
/// Parsers stop at the first error and return it unchanged. Whatever was
/// allocated before the failure stays in the document.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input ended before any token was found.
    EmptyInput,
    /// The input ended in the middle of a token or a container.
    IncompleteInput,
    /// The input contains a byte sequence that cannot be parsed.
    InvalidInput,
    /// The memory pool could not hold a slot or a string.
    NoMemory,
    /// Arrays and objects are nested deeper than the nesting limit.
    TooDeep,
    /// A value handed to the serde bridge has no document representation.
    Message(String),
}

impl Error {
    pub fn as_str(&self) -> &str {
        match self {
            Error::EmptyInput => "EmptyInput",
            Error::IncompleteInput => "IncompleteInput",
            Error::InvalidInput => "InvalidInput",
            Error::NoMemory => "NoMemory",
            Error::TooDeep => "TooDeep",
            Error::Message(msg) => msg.as_str(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for Error {}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
