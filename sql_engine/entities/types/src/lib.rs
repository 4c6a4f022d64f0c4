// Copyright 2020 - present Alex Dukhno
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

use query_ast::DataType;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Type class of a column, with the `CHAR` length cap erased.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SqlTypeFamily {
    Int,
    Char,
    Date,
}

impl Display for SqlTypeFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SqlTypeFamily::Int => write!(f, "int"),
            SqlTypeFamily::Char => write!(f, "char"),
            SqlTypeFamily::Date => write!(f, "date"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum SqlType {
    Int,
    Char { len: u32 },
    Date,
}

impl SqlType {
    pub fn char(len: u32) -> SqlType {
        SqlType::Char { len }
    }

    pub fn family(&self) -> SqlTypeFamily {
        match self {
            SqlType::Int => SqlTypeFamily::Int,
            SqlType::Char { .. } => SqlTypeFamily::Char,
            SqlType::Date => SqlTypeFamily::Date,
        }
    }

    pub fn chars_len(&self) -> Option<u32> {
        match self {
            SqlType::Char { len } => Some(*len),
            _ => None,
        }
    }

    /// Foreign-key compatibility: same type class and same presence of a
    /// length parameter. The length value and nullability are not compared.
    pub fn matches_as_reference(&self, other: &SqlType) -> bool {
        self.family() == other.family() && self.chars_len().is_some() == other.chars_len().is_some()
    }

    /// Ordered comparators are defined for `INT` and `DATE` only.
    pub fn supports_ordering(&self) -> bool {
        matches!(self.family(), SqlTypeFamily::Int | SqlTypeFamily::Date)
    }
}

impl From<DataType> for SqlType {
    fn from(data_type: DataType) -> SqlType {
        match data_type {
            DataType::Int => SqlType::Int,
            DataType::Char(len) => SqlType::char(len),
            DataType::Date => SqlType::Date,
        }
    }
}

impl Display for SqlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Int => write!(f, "int"),
            SqlType::Char { len } => write!(f, "char({})", len),
            SqlType::Date => write!(f, "date"),
        }
    }
}
