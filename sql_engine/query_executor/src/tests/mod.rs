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

use super::*;
use query_ast::{ColumnDef, DataType, ForeignKeyDef, Ident, Operand, Operator, Value};


#[rstest::fixture]
fn engine() -> QueryEngine {
    QueryEngine::new(Database::open(tempfile::tempdir().unwrap().into_path()).unwrap())
}

fn column(name: &str, data_type: DataType) -> ColumnDef {
    ColumnDef {
        name: name.to_owned(),
        data_type,
        not_null: false,
    }
}

fn create_table(table_name: &str, columns: Vec<ColumnDef>, primary_key: Vec<&str>) -> Command {
    let primary_keys = if primary_key.is_empty() {
        vec![]
    } else {
        vec![primary_key.into_iter().map(str::to_owned).collect()]
    };
    Command::CreateTable(CreateTableQuery {
        table_name: table_name.to_owned(),
        columns,
        primary_keys,
        foreign_keys: vec![],
    })
}

fn create_referencing_table(
    table_name: &str,
    columns: Vec<ColumnDef>,
    primary_key: Vec<&str>,
    foreign_keys: Vec<ForeignKeyDef>,
) -> Command {
    match create_table(table_name, columns, primary_key) {
        Command::CreateTable(mut query) => {
            query.foreign_keys = foreign_keys;
            Command::CreateTable(query)
        }
        _ => unreachable!(),
    }
}

fn foreign_key(columns: Vec<&str>, ref_table: &str, ref_columns: Vec<&str>) -> ForeignKeyDef {
    ForeignKeyDef {
        columns: columns.into_iter().map(str::to_owned).collect(),
        ref_table: ref_table.to_owned(),
        ref_columns: ref_columns.into_iter().map(str::to_owned).collect(),
    }
}

fn insert(table_name: &str, values: Vec<Value>) -> Command {
    Command::Insert(InsertQuery {
        table_name: table_name.to_owned(),
        columns: None,
        values,
    })
}

fn insert_into(table_name: &str, columns: Vec<&str>, values: Vec<Value>) -> Command {
    Command::Insert(InsertQuery {
        table_name: table_name.to_owned(),
        columns: Some(columns.into_iter().map(str::to_owned).collect()),
        values,
    })
}

fn delete(table_name: &str, where_clause: Option<WhereExpr>) -> Command {
    Command::Delete(DeleteQuery {
        table_name: table_name.to_owned(),
        where_clause,
    })
}

fn select_all(tables: Vec<&str>) -> Command {
    Command::Select(SelectQuery {
        projection: None,
        tables: tables.into_iter().map(|name| (name.to_owned(), name.to_owned())).collect(),
        where_clause: None,
    })
}

fn select(projection: Vec<(Ident, &str)>, tables: Vec<(&str, &str)>, where_clause: Option<WhereExpr>) -> Command {
    Command::Select(SelectQuery {
        projection: Some(
            projection
                .into_iter()
                .map(|(ident, output)| (ident, output.to_owned()))
                .collect(),
        ),
        tables: tables
            .into_iter()
            .map(|(name, alias)| (name.to_owned(), alias.to_owned()))
            .collect(),
        where_clause,
    })
}

fn int_equals(column_name: &str, value: i64) -> WhereExpr {
    WhereExpr::Comparison {
        left: Operand::Column(Ident::new(column_name)),
        right: Operand::Literal(Value::Int(value)),
        op: Operator::Eq,
    }
}

fn selected_rows(outcome: Result<QueryEvent, ExecutionError>) -> Vec<Vec<Datum>> {
    match outcome {
        Ok(QueryEvent::RecordsSelected(records)) => records.rows,
        other => panic!("expected selected records, got {:?}", other),
    }
}

/// a table `a (x int primary key)` with one referencing table
/// `b (y int, foreign key (y) references a (x))`
fn single_column_pair(engine: &QueryEngine) {
    engine
        .execute(create_table("a", vec![column("x", DataType::Int)], vec!["x"]))
        .unwrap();
    engine
        .execute(create_referencing_table(
            "b",
            vec![column("y", DataType::Int)],
            vec![],
            vec![foreign_key(vec!["y"], "a", vec!["x"])],
        ))
        .unwrap();
}
