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

use chrono::{Datelike, NaiveDate};
use data_scalar::Datum;
use serde_json::Value as JsonValue;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq)]
pub struct CodecError(String);

impl CodecError {
    fn new<M: ToString>(message: M) -> CodecError {
        CodecError(message.to_string())
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "malformed record encoding: {}", self.0)
    }
}

/// Stored representation of a row or of a primary-key byte string.
///
/// Rows and keys are JSON arrays of attribute encodings: integers as
/// integers, strings as strings, dates as `[year, month, day]`, NULL as
/// `null`. Equal logical keys therefore encode to byte-identical strings,
/// which is what makes the no-overwrite uniqueness check work.
#[derive(Debug, Clone, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Binary(Vec<u8>);

impl Binary {
    pub fn with_data(data: Vec<u8>) -> Binary {
        Binary(data)
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Lossy text view of the key, used when a key becomes part of a
    /// catalog bookkeeping key. Keys produced by this crate are valid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    pub fn pack(data: &[Datum]) -> Binary {
        let encoded = data.iter().map(encode_datum).collect::<Vec<JsonValue>>();
        Binary(serde_json::to_vec(&JsonValue::Array(encoded)).expect("attribute tuples always serialize"))
    }

    pub fn unpack(&self) -> Result<Vec<Datum>, CodecError> {
        let decoded: JsonValue = serde_json::from_slice(&self.0).map_err(CodecError::new)?;
        match decoded {
            JsonValue::Array(values) => values.iter().map(decode_datum).collect(),
            other => Err(CodecError::new(format!("expected a tuple, found {}", other))),
        }
    }

    /// Key for a row of a table with no declared primary key. Unique at
    /// insert time, but such rows are unidentifiable by content afterwards.
    pub fn random_key() -> Binary {
        let bytes: [u8; 16] = rand::random();
        let mut key = String::with_capacity(32);
        for byte in bytes.iter() {
            key.push_str(&format!("{:02x}", byte));
        }
        Binary(key.into_bytes())
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn encode_datum(datum: &Datum) -> JsonValue {
    match datum {
        Datum::Null => JsonValue::Null,
        Datum::Int(value) => JsonValue::from(*value),
        Datum::Str(value) => JsonValue::from(value.as_str()),
        Datum::Date(value) => JsonValue::from(vec![
            i64::from(value.year()),
            i64::from(value.month()),
            i64::from(value.day()),
        ]),
    }
}

fn decode_datum(value: &JsonValue) -> Result<Datum, CodecError> {
    match value {
        JsonValue::Null => Ok(Datum::Null),
        JsonValue::Number(number) => number
            .as_i64()
            .map(Datum::Int)
            .ok_or_else(|| CodecError::new(format!("{} is not a 64-bit integer", number))),
        JsonValue::String(string) => Ok(Datum::Str(string.clone())),
        JsonValue::Array(parts) => decode_date(parts),
        other => Err(CodecError::new(format!("unexpected attribute {}", other))),
    }
}

fn decode_date(parts: &[JsonValue]) -> Result<Datum, CodecError> {
    if parts.len() != 3 {
        return Err(CodecError::new("a date encodes as [year, month, day]"));
    }
    let mut fields = [0i64; 3];
    for (index, part) in parts.iter().enumerate() {
        fields[index] = part
            .as_i64()
            .ok_or_else(|| CodecError::new(format!("{} is not a date field", part)))?;
    }
    NaiveDate::from_ymd_opt(fields[0] as i32, fields[1] as u32, fields[2] as u32)
        .map(Datum::Date)
        .ok_or_else(|| CodecError::new(format!("[{}, {}, {}] is out of range", fields[0], fields[1], fields[2])))
}
