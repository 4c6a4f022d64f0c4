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

use chrono::NaiveDate;
use std::fmt::{self, Display, Formatter};
use types::SqlTypeFamily;

/// One value of a row, typed as INT / CHAR / DATE / NULL.
#[derive(Debug, PartialEq, Clone)]
pub enum Datum {
    Null,
    Int(i64),
    Str(String),
    Date(NaiveDate),
}

impl Datum {
    pub fn from_string<S: ToString>(value: S) -> Datum {
        Datum::Str(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn type_family(&self) -> Option<SqlTypeFamily> {
        match self {
            Datum::Null => None,
            Datum::Int(_) => Some(SqlTypeFamily::Int),
            Datum::Str(_) => Some(SqlTypeFamily::Char),
            Datum::Date(_) => Some(SqlTypeFamily::Date),
        }
    }
}

impl From<query_ast::Value> for Datum {
    fn from(value: query_ast::Value) -> Datum {
        match value {
            query_ast::Value::Int(value) => Datum::Int(value),
            query_ast::Value::String(value) => Datum::Str(value),
            query_ast::Value::Date(value) => Datum::Date(value),
            query_ast::Value::Null => Datum::Null,
        }
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Int(value) => write!(f, "{}", value),
            Datum::Str(value) => write!(f, "{}", value),
            // NaiveDate renders ISO `YYYY-MM-DD`
            Datum::Date(value) => write!(f, "{}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_upper_case() {
        assert_eq!(Datum::Null.to_string(), "NULL");
    }

    #[test]
    fn date_renders_iso() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();
        assert_eq!(Datum::Date(date).to_string(), "2021-03-07");
    }

    #[test]
    fn family_of_values() {
        assert_eq!(Datum::Int(1).type_family(), Some(SqlTypeFamily::Int));
        assert_eq!(Datum::from_string("abc").type_family(), Some(SqlTypeFamily::Char));
        assert_eq!(Datum::Null.type_family(), None);
    }
}
