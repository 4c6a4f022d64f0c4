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
use definition::TableDef;
use query_ast::{Ident, Operand, Operator, WhereExpr};
use std::cmp::Ordering;
use types::{SqlType, SqlTypeFamily};

/// Why an identifier failed to resolve against a view.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ResolutionError {
    TableNotSpecified,
    ColumnNotExist,
    AmbiguousReference,
}

/// Why a predicate failed validation.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum WhereError {
    TableNotSpecified,
    ColumnNotExist,
    AmbiguousReference,
    Incomparable,
}

impl From<ResolutionError> for WhereError {
    fn from(error: ResolutionError) -> WhereError {
        match error {
            ResolutionError::TableNotSpecified => WhereError::TableNotSpecified,
            ResolutionError::ColumnNotExist => WhereError::ColumnNotExist,
            ResolutionError::AmbiguousReference => WhereError::AmbiguousReference,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ViewEntry {
    alias: String,
    column: String,
    sql_type: SqlType,
}

impl ViewEntry {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }
}

/// The row shape a predicate is validated and evaluated over: one entry
/// per column of every table in scope, tagged with that table's alias.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct View {
    entries: Vec<ViewEntry>,
}

impl View {
    pub fn new() -> View {
        View::default()
    }

    pub fn extend_with_table(&mut self, alias: &str, table: &TableDef) {
        for column in table.columns() {
            self.entries.push(ViewEntry {
                alias: alias.to_owned(),
                column: column.name().to_owned(),
                sql_type: column.sql_type(),
            });
        }
    }

    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }

    /// Resolves an identifier: the alias must equal the entry's alias when
    /// given, the column name matches case-insensitively, and exactly one
    /// entry may match.
    pub fn find(&self, ident: &Ident) -> Result<&ViewEntry, ResolutionError> {
        let mut alias_seen = ident.table.is_none();
        let mut found: Option<&ViewEntry> = None;

        for entry in self.entries.iter() {
            if let Some(alias) = &ident.table {
                if &entry.alias != alias {
                    continue;
                }
                alias_seen = true;
            }
            if !entry.column.eq_ignore_ascii_case(&ident.column) {
                continue;
            }
            if found.is_some() {
                return Err(ResolutionError::AmbiguousReference);
            }
            found = Some(entry);
        }

        if !alias_seen {
            return Err(ResolutionError::TableNotSpecified);
        }
        found.ok_or(ResolutionError::ColumnNotExist)
    }
}

/// A row paired with per-column `(alias, column)` identifiers, the shape
/// predicates and projections are evaluated over.
#[derive(Debug, PartialEq, Clone)]
pub struct QualRecord {
    idents: Vec<Ident>,
    values: Vec<Datum>,
}

impl QualRecord {
    pub fn from_table_row(alias: &str, table: &TableDef, values: Vec<Datum>) -> QualRecord {
        QualRecord {
            idents: table
                .columns()
                .iter()
                .map(|column| Ident::qualified(alias, column.name()))
                .collect(),
            values,
        }
    }

    /// Concatenation of several records into the combined product row.
    pub fn union<'r, I: IntoIterator<Item = &'r QualRecord>>(parts: I) -> QualRecord {
        let mut idents = vec![];
        let mut values = vec![];
        for part in parts {
            idents.extend(part.idents.iter().cloned());
            values.extend(part.values.iter().cloned());
        }
        QualRecord { idents, values }
    }

    /// First column matching the identifier; validation has already ruled
    /// out ambiguity where it matters.
    pub fn find(&self, ident: &Ident) -> Option<&Datum> {
        self.idents
            .iter()
            .zip(self.values.iter())
            .find(|(record_ident, _value)| {
                let alias_matches = match (&ident.table, &record_ident.table) {
                    (Some(requested), Some(tagged)) => requested == tagged,
                    _ => true,
                };
                alias_matches && record_ident.column.eq_ignore_ascii_case(&ident.column)
            })
            .map(|(_record_ident, value)| value)
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Datum> {
        self.values
    }
}

/// Validates a predicate against a view: identifiers must resolve and both
/// sides of every comparison must share a type class, with ordered
/// comparators confined to INT and DATE.
pub struct TypeChecker<'v> {
    view: &'v View,
}

impl<'v> TypeChecker<'v> {
    pub fn new(view: &'v View) -> TypeChecker<'v> {
        TypeChecker { view }
    }

    pub fn validate(&self, predicate: &WhereExpr) -> Result<(), WhereError> {
        match predicate {
            WhereExpr::Nop => Ok(()),
            WhereExpr::And(children) | WhereExpr::Or(children) => {
                for child in children {
                    self.validate(child)?;
                }
                Ok(())
            }
            WhereExpr::Not(child) => self.validate(child),
            WhereExpr::IsNull(ident) => self.view.find(ident).map(|_entry| ()).map_err(WhereError::from),
            WhereExpr::Comparison { left, right, op } => {
                let left_family = self.operand_family(left)?;
                let right_family = self.operand_family(right)?;
                if left_family != right_family {
                    return Err(WhereError::Incomparable);
                }
                match op {
                    Operator::Eq | Operator::NotEq => Ok(()),
                    Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq => {
                        if matches!(left_family, SqlTypeFamily::Int | SqlTypeFamily::Date) {
                            Ok(())
                        } else {
                            Err(WhereError::Incomparable)
                        }
                    }
                }
            }
        }
    }

    fn operand_family(&self, operand: &Operand) -> Result<SqlTypeFamily, WhereError> {
        match operand {
            Operand::Literal(query_ast::Value::Int(_)) => Ok(SqlTypeFamily::Int),
            Operand::Literal(query_ast::Value::String(_)) => Ok(SqlTypeFamily::Char),
            Operand::Literal(query_ast::Value::Date(_)) => Ok(SqlTypeFamily::Date),
            // a NULL literal belongs to no type class
            Operand::Literal(query_ast::Value::Null) => Err(WhereError::Incomparable),
            Operand::Column(ident) => Ok(self.view.find(ident)?.sql_type().family()),
        }
    }
}

/// Evaluates a validated predicate over a qualified record. Three-valued
/// logic is collapsed to two values: a comparison with a NULL operand is
/// false and `IS NULL` is the only way to observe NULL.
pub fn evaluate(predicate: &WhereExpr, record: &QualRecord) -> bool {
    match predicate {
        WhereExpr::Nop => true,
        WhereExpr::And(children) => children.iter().all(|child| evaluate(child, record)),
        WhereExpr::Or(children) => children.iter().any(|child| evaluate(child, record)),
        WhereExpr::Not(child) => !evaluate(child, record),
        WhereExpr::IsNull(ident) => record.find(ident).map(Datum::is_null).unwrap_or(false),
        WhereExpr::Comparison { left, right, op } => {
            let left_value = operand_value(left, record);
            let right_value = operand_value(right, record);
            if left_value.is_null() || right_value.is_null() {
                return false;
            }
            match ordering(&left_value, &right_value) {
                None => false,
                Some(ordering) => match op {
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::LtEq => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::GtEq => ordering != Ordering::Less,
                    Operator::Eq => ordering == Ordering::Equal,
                    Operator::NotEq => ordering != Ordering::Equal,
                },
            }
        }
    }
}

fn operand_value(operand: &Operand, record: &QualRecord) -> Datum {
    match operand {
        Operand::Literal(value) => Datum::from(value.clone()),
        Operand::Column(ident) => record.find(ident).cloned().unwrap_or(Datum::Null),
    }
}

fn ordering(left: &Datum, right: &Datum) -> Option<Ordering> {
    match (left, right) {
        (Datum::Int(left), Datum::Int(right)) => Some(left.cmp(right)),
        (Datum::Str(left), Datum::Str(right)) => Some(left.cmp(right)),
        (Datum::Date(left), Datum::Date(right)) => Some(left.cmp(right)),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
