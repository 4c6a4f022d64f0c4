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
use std::fmt::{self, Display, Formatter};

const SHOW_TABLES_RULE: &str = "------------------------";
const EXPLAIN_RULE: &str = "-----------------------------------------------------------------";

/// Successful outcomes of commands, carrying whatever the session layer
/// needs to echo back to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryEvent {
    TableCreated(String),
    TableDropped(String),
    RecordInserted,
    RecordsDeleted(usize),
    TableNames(Vec<String>),
    TableDescribed(TableDescription),
    RecordsSelected(SelectedRecords),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_text: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub foreign_key: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectedRecords {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Datum>>,
}

impl Display for QueryEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryEvent::TableCreated(name) => write!(f, "'{}' table is created", name),
            QueryEvent::TableDropped(name) => write!(f, "'{}' table is dropped", name),
            QueryEvent::RecordInserted => write!(f, "1 row inserted"),
            QueryEvent::RecordsDeleted(count) => write!(f, "'{}' row(s) deleted", count),
            QueryEvent::TableNames(names) => {
                write!(f, "{}\n{}\n{}", SHOW_TABLES_RULE, names.join("\n"), SHOW_TABLES_RULE)
            }
            QueryEvent::TableDescribed(description) => write!(f, "{}", description),
            QueryEvent::RecordsSelected(records) => write!(f, "{}", records),
        }
    }
}

impl Display for TableDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", EXPLAIN_RULE)?;
        writeln!(f, "table_name [{}]", self.name)?;
        write!(f, "column_name\ttype\tnull\tkey")?;
        for column in self.columns.iter() {
            let mut key_roles = vec![];
            if column.primary_key {
                key_roles.push("PRI");
            }
            if column.foreign_key {
                key_roles.push("FOR");
            }
            write!(
                f,
                "\n{}\t{}\t{}\t{}",
                column.name,
                column.type_text,
                if column.nullable { "Y" } else { "N" },
                key_roles.join("/")
            )?;
        }
        write!(f, "\n{}", EXPLAIN_RULE)
    }
}

impl Display for SelectedRecords {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let body = self
            .rows
            .iter()
            .map(|row| row.iter().map(Datum::to_string).collect())
            .collect::<Vec<Vec<String>>>();

        let mut widths = self.headers.iter().map(String::len).collect::<Vec<usize>>();
        for row in body.iter() {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.len());
            }
        }

        let rule = format!(
            "+{}+",
            widths
                .iter()
                .map(|width| "-".repeat(width + 2))
                .collect::<Vec<String>>()
                .join("+")
        );

        writeln!(f, "{}", rule)?;
        writeln!(f, "{}", render_row(&self.headers, &widths))?;
        write!(f, "{}", rule)?;
        for row in body.iter() {
            write!(f, "\n{}", render_row(row, &widths))?;
        }
        write!(f, "\n{}", rule)
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let rendered = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!(" {:<pad$}", cell, pad = width + 1))
        .collect::<Vec<String>>()
        .join("|");
    format!("|{}|", rendered)
}

/// One structured diagnostic per failed command; the taxonomy is closed.
#[derive(Debug, PartialEq, Clone)]
pub struct QueryError {
    kind: QueryErrorKind,
}

#[derive(Debug, PartialEq, Clone)]
enum QueryErrorKind {
    SyntaxError,
    DuplicateColumnDef,
    DuplicatePrimaryKeyDef,
    CharLength,
    NonExistingColumnDef(String),
    TableExistence,
    ReferenceTableExistence,
    ReferenceColumnExistence,
    ReferenceType,
    ReferenceNonPrimaryKey,
    NoSuchTable,
    DropReferencedTable(String),
    InsertTypeMismatch,
    InsertColumnExistence(String),
    InsertColumnNonNullable(String),
    InsertDuplicatePrimaryKey,
    InsertReferentialIntegrity,
    DeleteReferentialIntegrityPassed(usize),
    SelectTableExistence(String),
    SelectColumnResolve(String),
    WhereIncomparable,
    WhereTableNotSpecified,
    WhereColumnNotExist,
    WhereAmbiguousReference,
}

impl QueryError {
    /// raised at the parser boundary only; the engine itself never emits it
    pub fn syntax_error() -> QueryError {
        QueryError {
            kind: QueryErrorKind::SyntaxError,
        }
    }

    pub fn duplicate_column_def() -> QueryError {
        QueryError {
            kind: QueryErrorKind::DuplicateColumnDef,
        }
    }

    pub fn duplicate_primary_key_def() -> QueryError {
        QueryError {
            kind: QueryErrorKind::DuplicatePrimaryKeyDef,
        }
    }

    pub fn char_length() -> QueryError {
        QueryError {
            kind: QueryErrorKind::CharLength,
        }
    }

    pub fn non_existing_column_def<S: ToString>(column_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::NonExistingColumnDef(column_name.to_string()),
        }
    }

    pub fn table_existence() -> QueryError {
        QueryError {
            kind: QueryErrorKind::TableExistence,
        }
    }

    pub fn reference_table_existence() -> QueryError {
        QueryError {
            kind: QueryErrorKind::ReferenceTableExistence,
        }
    }

    pub fn reference_column_existence() -> QueryError {
        QueryError {
            kind: QueryErrorKind::ReferenceColumnExistence,
        }
    }

    pub fn reference_type() -> QueryError {
        QueryError {
            kind: QueryErrorKind::ReferenceType,
        }
    }

    pub fn reference_non_primary_key() -> QueryError {
        QueryError {
            kind: QueryErrorKind::ReferenceNonPrimaryKey,
        }
    }

    pub fn no_such_table() -> QueryError {
        QueryError {
            kind: QueryErrorKind::NoSuchTable,
        }
    }

    pub fn drop_referenced_table<S: ToString>(table_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::DropReferencedTable(table_name.to_string()),
        }
    }

    pub fn insert_type_mismatch() -> QueryError {
        QueryError {
            kind: QueryErrorKind::InsertTypeMismatch,
        }
    }

    pub fn insert_column_existence<S: ToString>(column_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::InsertColumnExistence(column_name.to_string()),
        }
    }

    pub fn insert_column_non_nullable<S: ToString>(column_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::InsertColumnNonNullable(column_name.to_string()),
        }
    }

    pub fn insert_duplicate_primary_key() -> QueryError {
        QueryError {
            kind: QueryErrorKind::InsertDuplicatePrimaryKey,
        }
    }

    pub fn insert_referential_integrity() -> QueryError {
        QueryError {
            kind: QueryErrorKind::InsertReferentialIntegrity,
        }
    }

    /// carries the number of rows the predicate matched, not the number of
    /// rows that were blocked
    pub fn delete_referential_integrity_passed(count: usize) -> QueryError {
        QueryError {
            kind: QueryErrorKind::DeleteReferentialIntegrityPassed(count),
        }
    }

    pub fn select_table_existence<S: ToString>(table_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::SelectTableExistence(table_name.to_string()),
        }
    }

    pub fn select_column_resolve<S: ToString>(column_name: S) -> QueryError {
        QueryError {
            kind: QueryErrorKind::SelectColumnResolve(column_name.to_string()),
        }
    }

    pub fn where_incomparable() -> QueryError {
        QueryError {
            kind: QueryErrorKind::WhereIncomparable,
        }
    }

    pub fn where_table_not_specified() -> QueryError {
        QueryError {
            kind: QueryErrorKind::WhereTableNotSpecified,
        }
    }

    pub fn where_column_not_exist() -> QueryError {
        QueryError {
            kind: QueryErrorKind::WhereColumnNotExist,
        }
    }

    pub fn where_ambiguous_reference() -> QueryError {
        QueryError {
            kind: QueryErrorKind::WhereAmbiguousReference,
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            QueryErrorKind::SyntaxError => write!(f, "Syntax error"),
            QueryErrorKind::DuplicateColumnDef => {
                write!(f, "Create table has failed: column definition is duplicated")
            }
            QueryErrorKind::DuplicatePrimaryKeyDef => {
                write!(f, "Create table has failed: primary key definition is duplicated")
            }
            QueryErrorKind::CharLength => write!(f, "Char length should be over 0"),
            QueryErrorKind::NonExistingColumnDef(column_name) => write!(
                f,
                "Create table has failed: '{}' does not exist in column definition",
                column_name
            ),
            QueryErrorKind::TableExistence => {
                write!(f, "Create table has failed: table with the same name already exists")
            }
            QueryErrorKind::ReferenceTableExistence => {
                write!(f, "Create table has failed: foreign key references non existing table")
            }
            QueryErrorKind::ReferenceColumnExistence => {
                write!(f, "Create table has failed: foreign key references non existing column")
            }
            QueryErrorKind::ReferenceType => {
                write!(f, "Create table has failed: foreign key references wrong type")
            }
            QueryErrorKind::ReferenceNonPrimaryKey => write!(
                f,
                "Create table has failed: foreign key references non primary key column"
            ),
            QueryErrorKind::NoSuchTable => write!(f, "No such table"),
            QueryErrorKind::DropReferencedTable(table_name) => write!(
                f,
                "Drop table has failed: '{}' is referenced by other table",
                table_name
            ),
            QueryErrorKind::InsertTypeMismatch => write!(f, "Insertion has failed: Types are not matched"),
            QueryErrorKind::InsertColumnExistence(column_name) => {
                write!(f, "Insertion has failed: '{}' does not exist", column_name)
            }
            QueryErrorKind::InsertColumnNonNullable(column_name) => {
                write!(f, "Insertion has failed: '{}' is not nullable", column_name)
            }
            QueryErrorKind::InsertDuplicatePrimaryKey => {
                write!(f, "Insertion has failed: Primary key duplication")
            }
            QueryErrorKind::InsertReferentialIntegrity => {
                write!(f, "Insertion has failed: Referential integrity violation")
            }
            QueryErrorKind::DeleteReferentialIntegrityPassed(count) => {
                write!(f, "'{}' row(s) are not deleted due to referential integrity", count)
            }
            QueryErrorKind::SelectTableExistence(table_name) => {
                write!(f, "Selection has failed: '{}' does not exist", table_name)
            }
            QueryErrorKind::SelectColumnResolve(column_name) => {
                write!(f, "Selection has failed: fail to resolve '{}'", column_name)
            }
            QueryErrorKind::WhereIncomparable => {
                write!(f, "Where clause trying to compare incomparable values")
            }
            QueryErrorKind::WhereTableNotSpecified => {
                write!(f, "Where clause trying to reference tables which are not specified")
            }
            QueryErrorKind::WhereColumnNotExist => {
                write!(f, "Where clause trying to reference non existing column")
            }
            QueryErrorKind::WhereAmbiguousReference => {
                write!(f, "Where clause contains ambiguous reference")
            }
        }
    }
}
