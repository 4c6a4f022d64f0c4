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

/// Commands the engine consumes from the parser, one per parsed statement.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    CreateTable(CreateTableQuery),
    DropTable(String),
    Insert(InsertQuery),
    Delete(DeleteQuery),
    Select(SelectQuery),
    ShowTables,
    ExplainTable(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct CreateTableQuery {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    /// one entry per `PRIMARY KEY (...)` clause so a repeated clause is
    /// still visible to validation
    pub primary_keys: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub not_null: bool,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum DataType {
    Int,
    Char(u32),
    Date,
}

/// `FOREIGN KEY (columns) REFERENCES ref_table (ref_columns)` with the
/// local to referenced mapping kept positional
#[derive(Debug, PartialEq, Clone)]
pub struct ForeignKeyDef {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct InsertQuery {
    pub table_name: String,
    pub columns: Option<Vec<String>>,
    pub values: Vec<Value>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DeleteQuery {
    pub table_name: String,
    pub where_clause: Option<WhereExpr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SelectQuery {
    /// `None` means `SELECT *`; otherwise projected identifiers with their
    /// output names
    pub projection: Option<Vec<(Ident, String)>>,
    /// `(table name, alias)` pairs; the parser fills the alias with the
    /// table name when none was written
    pub tables: Vec<(String, String)>,
    pub where_clause: Option<WhereExpr>,
}

/// A possibly table-qualified column reference.
#[derive(Debug, PartialEq, Clone)]
pub struct Ident {
    pub table: Option<String>,
    pub column: String,
}

impl Ident {
    pub fn new<C: ToString>(column: C) -> Ident {
        Ident {
            table: None,
            column: column.to_string(),
        }
    }

    pub fn qualified<T: ToString, C: ToString>(table: T, column: C) -> Ident {
        Ident {
            table: Some(table.to_string()),
            column: column.to_string(),
        }
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.table {
            None => write!(f, "{}", self.column),
            Some(table) => write!(f, "{}.{}", table, self.column),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum WhereExpr {
    /// absent predicate; matches every record
    Nop,
    And(Vec<WhereExpr>),
    Or(Vec<WhereExpr>),
    Not(Box<WhereExpr>),
    IsNull(Ident),
    Comparison {
        left: Operand,
        right: Operand,
        op: Operator,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operand {
    Column(Ident),
    Literal(Value),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operator {
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Int(i64),
    String(String),
    Date(NaiveDate),
    /// appears in INSERT tuples only; predicates observe NULL through
    /// `IS NULL`
    Null,
}
