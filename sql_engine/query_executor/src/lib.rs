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

use catalog::CatalogHandler;
use constraints::{align_row, referenced_key, RowError};
use data_binary::Binary;
use data_scalar::Datum;
use definition::{ColumnDef, ForeignKey, TableDef, TableDefError};
use itertools::Itertools;
use query_ast::{
    Command, CreateTableQuery, DeleteQuery, InsertQuery, SelectQuery, WhereExpr,
};
use query_processing::{evaluate, QualRecord, TypeChecker, View, WhereError};
use query_response::{
    ColumnDescription, QueryError, QueryEvent, SelectedRecords, TableDescription,
};
use std::fmt::{self, Display, Formatter};
use storage::{Database, StorageError};
use types::SqlType;

#[derive(Debug, PartialEq)]
pub enum ExecutionError {
    Query(QueryError),
    Storage(StorageError),
}

impl From<QueryError> for ExecutionError {
    fn from(error: QueryError) -> ExecutionError {
        ExecutionError::Query(error)
    }
}

impl From<StorageError> for ExecutionError {
    fn from(error: StorageError) -> ExecutionError {
        ExecutionError::Storage(error)
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::Query(error) => write!(f, "{}", error),
            ExecutionError::Storage(error) => write!(f, "{}", error),
        }
    }
}

/// Runs parsed commands against one database file. Commands execute one at
/// a time; validation and pre-checks happen before the first mutation so a
/// failed command leaves the stored state untouched.
pub struct QueryEngine {
    database: Database,
}

impl QueryEngine {
    pub fn new(database: Database) -> QueryEngine {
        QueryEngine { database }
    }

    pub fn execute(&self, command: Command) -> Result<QueryEvent, ExecutionError> {
        log::debug!("processing {:?}", command);
        match command {
            Command::CreateTable(query) => self.create_table(query),
            Command::DropTable(table_name) => self.drop_table(&table_name),
            Command::Insert(query) => self.insert(query),
            Command::Delete(query) => self.delete(query),
            Command::Select(query) => self.select(query),
            Command::ShowTables => self.show_tables(),
            Command::ExplainTable(table_name) => self.explain_table(&table_name),
        }
    }

    fn create_table(&self, query: CreateTableQuery) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;

        let columns = query
            .columns
            .into_iter()
            .map(|column| ColumnDef::new(column.name, SqlType::from(column.data_type), !column.not_null))
            .collect();
        let foreign_keys = query
            .foreign_keys
            .into_iter()
            .map(|foreign_key| {
                ForeignKey::new(foreign_key.columns, foreign_key.ref_table, foreign_key.ref_columns)
            })
            .collect();
        let table = TableDef::new(query.table_name, columns, query.primary_keys, foreign_keys)
            .map_err(|error| match error {
                TableDefError::DuplicateColumn => QueryError::duplicate_column_def(),
                TableDefError::DuplicatePrimaryKey => QueryError::duplicate_primary_key_def(),
                TableDefError::CharLength => QueryError::char_length(),
                TableDefError::UnknownColumn(column_name) => QueryError::non_existing_column_def(column_name),
            })?;

        for foreign_key in table.foreign_keys() {
            let ref_table = match catalog.table(foreign_key.ref_table())? {
                None => return Err(QueryError::reference_table_existence().into()),
                Some(ref_table) => ref_table,
            };
            for ref_column in foreign_key.ref_columns() {
                if !ref_table.has_column(ref_column) {
                    return Err(QueryError::reference_column_existence().into());
                }
            }
            for (local, referenced) in foreign_key.column_pairs() {
                let local_type = match table.find_column(local) {
                    None => return Err(QueryError::reference_column_existence().into()),
                    Some((_index, column)) => column.sql_type(),
                };
                let referenced_type = match ref_table.find_column(referenced) {
                    None => return Err(QueryError::reference_column_existence().into()),
                    Some((_index, column)) => column.sql_type(),
                };
                if !local_type.matches_as_reference(&referenced_type) {
                    return Err(QueryError::reference_type().into());
                }
            }
            if !covers_entire_primary_key(foreign_key, &ref_table) {
                return Err(QueryError::reference_non_primary_key().into());
            }
        }

        if !catalog.create_table(&table)? {
            return Err(QueryError::table_existence().into());
        }
        for foreign_key in table.foreign_keys() {
            catalog.add_table_refcnt(foreign_key.ref_table(), 1)?;
        }
        if table.primary_key().is_empty() {
            log::warn!(
                "table [{}] has no primary key; its rows get random keys and cannot be told apart by content",
                table.name()
            );
        }
        Ok(QueryEvent::TableCreated(table.name().to_owned()))
    }

    fn drop_table(&self, table_name: &str) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;
        let table = match catalog.table(table_name)? {
            None => return Err(QueryError::no_such_table().into()),
            Some(table) => table,
        };
        if catalog.table_refcnt(table_name)? != 0 {
            return Err(QueryError::drop_referenced_table(table.name()).into());
        }

        // rows of the dropped table stop referencing anything
        if !table.foreign_keys().is_empty() {
            for (_key, value) in self.database.user_table(table.name())?.cursor()? {
                let row = unpack_row(&value)?;
                self.release_row_references(&catalog, &table, &row)?;
            }
        }

        catalog.remove_table(table_name)?;
        for foreign_key in table.foreign_keys() {
            catalog.add_table_refcnt(foreign_key.ref_table(), -1)?;
        }
        self.database.drop_user_table(table.name())?;
        Ok(QueryEvent::TableDropped(table.name().to_owned()))
    }

    fn insert(&self, query: InsertQuery) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;
        let table = match catalog.table(&query.table_name)? {
            None => return Err(QueryError::no_such_table().into()),
            Some(table) => table,
        };

        let values = query.values.into_iter().map(Datum::from).collect();
        let row = align_row(&table, query.columns.as_deref(), values).map_err(|error| match error {
            RowError::ColumnCountMismatch | RowError::DuplicateColumn | RowError::TypeMismatch => {
                QueryError::insert_type_mismatch()
            }
            RowError::UnknownColumn(column_name) => QueryError::insert_column_existence(column_name),
            RowError::NullViolation(column_name) => QueryError::insert_column_non_nullable(column_name),
        })?;

        let mut satisfied_references = vec![];
        for foreign_key in table.foreign_keys() {
            let ref_table = self.referenced_table(&catalog, foreign_key)?;
            if let Some(key) = referenced_key(foreign_key, &ref_table, &table, &row) {
                let ref_key = Binary::pack(&key);
                if self.database.user_table(ref_table.name())?.lookup(&ref_key)?.is_none() {
                    return Err(QueryError::insert_referential_integrity().into());
                }
                satisfied_references.push((ref_table.name().to_owned(), ref_key));
            }
        }

        let key = primary_key_bytes(&table, &row);
        let inserted = self
            .database
            .user_table(table.name())?
            .insert_unique(&key, Binary::pack(&row))?;
        if !inserted {
            return Err(QueryError::insert_duplicate_primary_key().into());
        }
        for (ref_table_name, ref_key) in satisfied_references {
            catalog.add_row_refcnt(&ref_table_name, &ref_key, 1)?;
        }
        Ok(QueryEvent::RecordInserted)
    }

    fn delete(&self, query: DeleteQuery) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;
        let table = match catalog.table(&query.table_name)? {
            None => return Err(QueryError::no_such_table().into()),
            Some(table) => table,
        };

        let mut view = View::new();
        view.extend_with_table(&query.table_name, &table);
        let predicate = query.where_clause.unwrap_or(WhereExpr::Nop);
        TypeChecker::new(&view).validate(&predicate).map_err(where_error)?;

        let space = self.database.user_table(table.name())?;

        // first pass: count matches and check nothing still references them;
        // a single referenced row aborts the whole statement
        let mut matched = 0;
        let mut referenced = false;
        for (key, value) in space.cursor()? {
            let row = unpack_row(&value)?;
            let record = QualRecord::from_table_row(&query.table_name, &table, row);
            if !evaluate(&predicate, &record) {
                continue;
            }
            matched += 1;
            if catalog.row_refcnt(table.name(), &key)? > 0 {
                referenced = true;
            }
        }
        if referenced {
            return Err(QueryError::delete_referential_integrity_passed(matched).into());
        }

        // second pass: delete and release the references the rows held
        let mut deleted = 0;
        for (key, value) in space.cursor()? {
            let row = unpack_row(&value)?;
            let record = QualRecord::from_table_row(&query.table_name, &table, row.clone());
            if !evaluate(&predicate, &record) {
                continue;
            }
            space.remove(&key)?;
            self.release_row_references(&catalog, &table, &row)?;
            deleted += 1;
        }
        Ok(QueryEvent::RecordsDeleted(deleted))
    }

    fn select(&self, query: SelectQuery) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;

        let mut view = View::new();
        let mut tables = vec![];
        for (table_name, alias) in query.tables.iter() {
            let table = match catalog.table(table_name)? {
                None => return Err(QueryError::select_table_existence(table_name).into()),
                Some(table) => table,
            };
            view.extend_with_table(alias, &table);
            tables.push((table, alias.clone()));
        }

        let headers = match &query.projection {
            None => {
                // `SELECT *` needs every column name to be unique across
                // the whole product
                for (index, entry) in view.entries().iter().enumerate() {
                    if view.entries()[..index]
                        .iter()
                        .any(|other| other.column().eq_ignore_ascii_case(entry.column()))
                    {
                        return Err(QueryError::select_column_resolve(entry.column()).into());
                    }
                }
                view.entries().iter().map(|entry| entry.column().to_owned()).collect()
            }
            Some(projection) => {
                for (ident, _output) in projection.iter() {
                    if view.find(ident).is_err() {
                        return Err(QueryError::select_column_resolve(&ident.column).into());
                    }
                }
                for (index, (_ident, output)) in projection.iter().enumerate() {
                    if projection[..index]
                        .iter()
                        .any(|(_other, other_output)| other_output.eq_ignore_ascii_case(output))
                    {
                        return Err(QueryError::select_column_resolve(output).into());
                    }
                }
                projection.iter().map(|(_ident, output)| output.clone()).collect()
            }
        };

        let predicate = query.where_clause.unwrap_or(WhereExpr::Nop);
        TypeChecker::new(&view).validate(&predicate).map_err(where_error)?;

        let mut generators = vec![];
        for (table, alias) in tables.iter() {
            let mut records = vec![];
            for (_key, value) in self.database.user_table(table.name())?.cursor()? {
                records.push(QualRecord::from_table_row(alias, table, unpack_row(&value)?));
            }
            generators.push(records);
        }

        let mut rows = vec![];
        for parts in generators.iter().map(|records| records.iter()).multi_cartesian_product() {
            let combined = QualRecord::union(parts);
            if !evaluate(&predicate, &combined) {
                continue;
            }
            let row = match &query.projection {
                None => combined.into_values(),
                Some(projection) => projection
                    .iter()
                    .map(|(ident, _output)| combined.find(ident).cloned().unwrap_or(Datum::Null))
                    .collect(),
            };
            rows.push(row);
        }

        Ok(QueryEvent::RecordsSelected(SelectedRecords { headers, rows }))
    }

    fn show_tables(&self) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;
        Ok(QueryEvent::TableNames(catalog.table_names()?))
    }

    fn explain_table(&self, table_name: &str) -> Result<QueryEvent, ExecutionError> {
        let catalog = CatalogHandler::new(&self.database)?;
        let table = match catalog.table(table_name)? {
            None => return Err(QueryError::no_such_table().into()),
            Some(table) => table,
        };
        let columns = table
            .columns()
            .iter()
            .map(|column| ColumnDescription {
                name: column.name().to_owned(),
                type_text: column.sql_type().to_string(),
                nullable: column.nullable(),
                primary_key: table.is_primary_key_member(column.name()),
                foreign_key: table.is_foreign_key_member(column.name()),
            })
            .collect();
        Ok(QueryEvent::TableDescribed(TableDescription {
            name: table.name().to_owned(),
            columns,
        }))
    }

    fn referenced_table(&self, catalog: &CatalogHandler, foreign_key: &ForeignKey) -> Result<TableDef, ExecutionError> {
        // a stored foreign key always targets a stored table, DROP TABLE
        // refuses to break that
        catalog.table(foreign_key.ref_table())?.ok_or_else(|| {
            ExecutionError::Storage(StorageError::unrecoverable(format!(
                "table [{}] referenced by a stored foreign key is missing from the catalog",
                foreign_key.ref_table()
            )))
        })
    }

    fn release_row_references(
        &self,
        catalog: &CatalogHandler,
        table: &TableDef,
        row: &[Datum],
    ) -> Result<(), ExecutionError> {
        for foreign_key in table.foreign_keys() {
            let ref_table = self.referenced_table(catalog, foreign_key)?;
            if let Some(key) = referenced_key(foreign_key, &ref_table, table, row) {
                catalog.add_row_refcnt(ref_table.name(), &Binary::pack(&key), -1)?;
            }
        }
        Ok(())
    }
}

fn covers_entire_primary_key(foreign_key: &ForeignKey, ref_table: &TableDef) -> bool {
    let primary_key = ref_table.primary_key();
    !primary_key.is_empty()
        && primary_key.len() == foreign_key.ref_columns().len()
        && primary_key.iter().all(|key_column| {
            foreign_key
                .ref_columns()
                .iter()
                .any(|ref_column| ref_column.eq_ignore_ascii_case(key_column))
        })
}

fn primary_key_bytes(table: &TableDef, row: &[Datum]) -> Binary {
    if table.primary_key().is_empty() {
        Binary::random_key()
    } else {
        let key = table
            .primary_key_columns()
            .into_iter()
            .map(|(index, _column)| row[index].clone())
            .collect::<Vec<Datum>>();
        Binary::pack(&key)
    }
}

fn unpack_row(value: &Binary) -> Result<Vec<Datum>, ExecutionError> {
    value
        .unpack()
        .map_err(|error| ExecutionError::Storage(StorageError::unrecoverable(error.to_string())))
}

fn where_error(error: WhereError) -> ExecutionError {
    match error {
        WhereError::Incomparable => QueryError::where_incomparable().into(),
        WhereError::TableNotSpecified => QueryError::where_table_not_specified().into(),
        WhereError::ColumnNotExist => QueryError::where_column_not_exist().into(),
        WhereError::AmbiguousReference => QueryError::where_ambiguous_reference().into(),
    }
}

#[cfg(test)]
mod tests;
