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

use serde::{Deserialize, Serialize};
use types::SqlType;

/// Schema invariants that a table must satisfy in isolation, before any
/// foreign key is resolved against the catalog.
#[derive(Debug, PartialEq)]
pub enum TableDefError {
    DuplicateColumn,
    DuplicatePrimaryKey,
    CharLength,
    UnknownColumn(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    name: String,
    sql_type: SqlType,
    nullable: bool,
}

impl ColumnDef {
    pub fn new<S: ToString>(name: S, sql_type: SqlType, nullable: bool) -> ColumnDef {
        ColumnDef {
            name: name.to_string(),
            sql_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// An ordered local to referenced column mapping; the referenced set must
/// cover the referenced table's entire primary key, which is checked at
/// CREATE TABLE time against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    columns: Vec<String>,
    ref_table: String,
    ref_columns: Vec<String>,
}

impl ForeignKey {
    pub fn new(columns: Vec<String>, ref_table: String, ref_columns: Vec<String>) -> ForeignKey {
        ForeignKey {
            columns,
            ref_table,
            ref_columns,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ref_table(&self) -> &str {
        &self.ref_table
    }

    pub fn ref_columns(&self) -> &[String] {
        &self.ref_columns
    }

    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.ref_columns.iter().map(String::as_str))
    }

    /// Local column mapped to the given referenced column, if any.
    pub fn local_column_for(&self, ref_column: &str) -> Option<&str> {
        self.column_pairs()
            .find(|(_local, referenced)| referenced.eq_ignore_ascii_case(ref_column))
            .map(|(local, _referenced)| local)
    }

    pub fn has_local_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl TableDef {
    /// Builds a table definition, enforcing the invariants that do not need
    /// the catalog: unique column names, a single primary-key clause with
    /// distinct members naming real columns, positive CHAR caps and foreign
    /// keys whose local columns are distinct and defined. Primary-key
    /// columns become non-nullable.
    pub fn new(
        name: String,
        mut columns: Vec<ColumnDef>,
        primary_keys: Vec<Vec<String>>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Result<TableDef, TableDefError> {
        for column in columns.iter() {
            if let Some(0) = column.sql_type().chars_len() {
                return Err(TableDefError::CharLength);
            }
        }

        for (index, column) in columns.iter().enumerate() {
            if columns[..index].iter().any(|other| other.has_name(column.name())) {
                return Err(TableDefError::DuplicateColumn);
            }
        }

        if primary_keys.len() > 1 {
            return Err(TableDefError::DuplicatePrimaryKey);
        }
        let primary_key = primary_keys.into_iter().next().unwrap_or_default();
        for (index, key_column) in primary_key.iter().enumerate() {
            if primary_key[..index].iter().any(|other| other.eq_ignore_ascii_case(key_column)) {
                return Err(TableDefError::DuplicatePrimaryKey);
            }
            if !columns.iter().any(|column| column.has_name(key_column)) {
                return Err(TableDefError::UnknownColumn(key_column.to_lowercase()));
            }
        }

        for foreign_key in foreign_keys.iter() {
            for (index, local) in foreign_key.columns().iter().enumerate() {
                if foreign_key.columns()[..index].iter().any(|other| other.eq_ignore_ascii_case(local)) {
                    return Err(TableDefError::DuplicateColumn);
                }
                if !columns.iter().any(|column| column.has_name(local)) {
                    return Err(TableDefError::UnknownColumn(local.to_lowercase()));
                }
            }
        }

        for column in columns.iter_mut() {
            if primary_key.iter().any(|key_column| column.has_name(key_column)) {
                column.nullable = false;
            }
        }

        Ok(TableDef {
            name,
            columns,
            primary_key,
            foreign_keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn find_column(&self, name: &str) -> Option<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_index, column)| column.has_name(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column(name).is_some()
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn is_primary_key_member(&self, name: &str) -> bool {
        self.primary_key.iter().any(|key_column| key_column.eq_ignore_ascii_case(name))
    }

    /// Primary-key columns in the order they appear in the column list,
    /// which is the canonical order of the key encoding.
    pub fn primary_key_columns(&self) -> Vec<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_index, column)| self.is_primary_key_member(column.name()))
            .collect()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn is_foreign_key_member(&self, name: &str) -> bool {
        self.foreign_keys.iter().any(|foreign_key| foreign_key.has_local_column(name))
    }
}
