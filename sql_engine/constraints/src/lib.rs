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

use data_scalar::Datum;
use definition::{ColumnDef, ForeignKey, TableDef};
use types::SqlType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    NullViolation,
    TypeMismatch,
}

/// Per-column value constraint: nullability plus type class. CHAR values
/// are not length-checked here; they are truncated by `coerce`.
pub struct TypeConstraint {
    sql_type: SqlType,
    nullable: bool,
}

impl From<&ColumnDef> for TypeConstraint {
    fn from(column: &ColumnDef) -> TypeConstraint {
        TypeConstraint {
            sql_type: column.sql_type(),
            nullable: column.nullable(),
        }
    }
}

impl TypeConstraint {
    pub fn validate(&self, value: &Datum) -> Result<(), ConstraintError> {
        match value.type_family() {
            None => {
                if self.nullable {
                    Ok(())
                } else {
                    Err(ConstraintError::NullViolation)
                }
            }
            Some(family) => {
                if family == self.sql_type.family() {
                    Ok(())
                } else {
                    Err(ConstraintError::TypeMismatch)
                }
            }
        }
    }

    /// Cuts CHAR values to the declared cap; everything else passes through.
    pub fn coerce(&self, value: Datum) -> Datum {
        match (&self.sql_type, value) {
            (SqlType::Char { len }, Datum::Str(value)) => {
                Datum::Str(value.chars().take(*len as usize).collect())
            }
            (_, value) => value,
        }
    }
}

/// How an insert tuple can fail to become a full row.
#[derive(Debug, PartialEq)]
pub enum RowError {
    ColumnCountMismatch,
    DuplicateColumn,
    UnknownColumn(String),
    NullViolation(String),
    TypeMismatch,
}

/// Builds the full row of an INSERT in the table's column order, putting
/// NULL in omitted columns, enforcing nullability and type class per
/// column and truncating CHAR values.
pub fn align_row(table: &TableDef, columns: Option<&[String]>, values: Vec<Datum>) -> Result<Vec<Datum>, RowError> {
    let column_names = match columns {
        Some(columns) => columns.to_vec(),
        None => table.columns().iter().map(|column| column.name().to_owned()).collect(),
    };

    if column_names.len() != values.len() {
        return Err(RowError::ColumnCountMismatch);
    }
    for (index, name) in column_names.iter().enumerate() {
        if column_names[..index].iter().any(|other| other.eq_ignore_ascii_case(name)) {
            return Err(RowError::DuplicateColumn);
        }
        if !table.has_column(name) {
            return Err(RowError::UnknownColumn(name.to_lowercase()));
        }
    }

    let mut row = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let value = column_names
            .iter()
            .position(|name| column.has_name(name))
            .map(|position| values[position].clone())
            .unwrap_or(Datum::Null);

        let constraint = TypeConstraint::from(column);
        match constraint.validate(&value) {
            Ok(()) => row.push(constraint.coerce(value)),
            Err(ConstraintError::NullViolation) => return Err(RowError::NullViolation(column.name().to_owned())),
            Err(ConstraintError::TypeMismatch) => return Err(RowError::TypeMismatch),
        }
    }
    Ok(row)
}

/// Attributes of the referenced primary key for one foreign key of a full
/// row, in the referenced table's column order. `None` when every
/// component is NULL, which waives the reference.
pub fn referenced_key(
    foreign_key: &ForeignKey,
    ref_table: &TableDef,
    table: &TableDef,
    row: &[Datum],
) -> Option<Vec<Datum>> {
    let mut key = vec![];
    for (_index, ref_column) in ref_table.primary_key_columns() {
        let local = foreign_key.local_column_for(ref_column.name())?;
        let (local_index, _local_column) = table.find_column(local)?;
        key.push(row[local_index].clone());
    }
    if key.iter().all(Datum::is_null) {
        None
    } else {
        Some(key)
    }
}
