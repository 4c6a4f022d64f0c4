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

use byteorder::{ByteOrder, LittleEndian};
use data_binary::Binary;
use definition::TableDef;
use storage::{Database, KeySpace, StorageError, StorageResult};

/// Catalog key families. The prefixes are disjoint so that scanning user
/// tables skips the bookkeeping entries.
const TABLE_DEF_PREFIX: &str = "ZZ_table_";
const TABLE_REFCNT_PREFIX: &str = "ZZ_refcnt_table_";
const ROW_REFCNT_PREFIX: &str = "ZZ_refcnt_record_";

/// Access to the schema catalog: table definitions plus the two refcount
/// families that foreign keys maintain. Table names are normalized to
/// lower case in every key; the stored definition keeps the user's casing.
pub struct CatalogHandler {
    catalog: KeySpace,
}

impl CatalogHandler {
    pub fn new(database: &Database) -> StorageResult<CatalogHandler> {
        Ok(CatalogHandler {
            catalog: database.catalog()?,
        })
    }

    pub fn table(&self, table_name: &str) -> StorageResult<Option<TableDef>> {
        match self.catalog.lookup(&table_def_key(table_name))? {
            None => Ok(None),
            Some(raw) => decode_table(&raw).map(Some),
        }
    }

    /// Persists the definition unless a table of that name is already
    /// stored. `false` signals the name collision.
    pub fn create_table(&self, table: &TableDef) -> StorageResult<bool> {
        let raw = bincode::serialize(table)
            .map_err(|error| StorageError::unrecoverable(format!("table definition does not serialize: {}", error)))?;
        self.catalog.insert_unique(&table_def_key(table.name()), Binary::with_data(raw))
    }

    pub fn remove_table(&self, table_name: &str) -> StorageResult<()> {
        self.catalog.remove(&table_def_key(table_name))?;
        self.catalog.remove(&table_refcnt_key(table_name))?;
        Ok(())
    }

    /// Names of the stored tables in key order, echoing the casing the
    /// tables were created with.
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        let mut names = vec![];
        for (_key, value) in self.catalog.cursor_over_prefix(TABLE_DEF_PREFIX)? {
            names.push(decode_table(&value)?.name().to_owned());
        }
        Ok(names)
    }

    /// Number of stored tables holding a foreign key to the given table.
    pub fn table_refcnt(&self, table_name: &str) -> StorageResult<i32> {
        self.read_refcnt(&table_refcnt_key(table_name))
    }

    pub fn add_table_refcnt(&self, table_name: &str, delta: i32) -> StorageResult<()> {
        let key = table_refcnt_key(table_name);
        let refcnt = self.read_refcnt(&key)? + delta;
        log::debug!("table refcnt of [{}] becomes {}", table_name, refcnt);
        self.write_refcnt(&key, refcnt)
    }

    /// Number of live rows referencing the row of `table_name` stored under
    /// the given primary-key bytes.
    pub fn row_refcnt(&self, table_name: &str, pkey: &Binary) -> StorageResult<i32> {
        self.read_refcnt(&row_refcnt_key(table_name, pkey))
    }

    pub fn add_row_refcnt(&self, table_name: &str, pkey: &Binary, delta: i32) -> StorageResult<()> {
        let key = row_refcnt_key(table_name, pkey);
        let refcnt = self.read_refcnt(&key)? + delta;
        log::debug!("row refcnt of [{}:{}] becomes {}", table_name, pkey.to_text(), refcnt);
        self.write_refcnt(&key, refcnt)
    }

    fn read_refcnt(&self, key: &Binary) -> StorageResult<i32> {
        match self.catalog.lookup(key)? {
            None => Ok(0),
            Some(raw) if raw.to_bytes().len() == 4 => Ok(LittleEndian::read_i32(raw.to_bytes())),
            Some(raw) => Err(StorageError::unrecoverable(format!(
                "refcount entry of {} bytes instead of 4",
                raw.to_bytes().len()
            ))),
        }
    }

    fn write_refcnt(&self, key: &Binary, refcnt: i32) -> StorageResult<()> {
        let mut raw = [0u8; 4];
        LittleEndian::write_i32(&mut raw, refcnt);
        self.catalog.insert(key, Binary::with_data(raw.to_vec()))
    }
}

fn table_def_key(table_name: &str) -> Binary {
    catalog_key(TABLE_DEF_PREFIX, &table_name.to_lowercase())
}

fn table_refcnt_key(table_name: &str) -> Binary {
    catalog_key(TABLE_REFCNT_PREFIX, &table_name.to_lowercase())
}

fn row_refcnt_key(table_name: &str, pkey: &Binary) -> Binary {
    let name = serde_json::to_string(&[table_name.to_lowercase(), pkey.to_text()])
        .expect("a pair of strings always serializes");
    catalog_key(ROW_REFCNT_PREFIX, &name)
}

fn catalog_key(prefix: &str, rest: &str) -> Binary {
    Binary::with_data(format!("{}{}", prefix, rest).into_bytes())
}

fn decode_table(raw: &Binary) -> StorageResult<TableDef> {
    bincode::deserialize(raw.to_bytes())
        .map_err(|error| StorageError::unrecoverable(format!("stored table definition is corrupt: {}", error)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use definition::ColumnDef;
    use types::SqlType;

    fn catalog() -> CatalogHandler {
        let database = Database::open(tempfile::tempdir().unwrap().into_path()).unwrap();
        CatalogHandler::new(&database).unwrap()
    }

    fn table(name: &str) -> TableDef {
        TableDef::new(
            name.to_owned(),
            vec![ColumnDef::new("x", SqlType::Int, true)],
            vec![vec!["x".to_owned()]],
            vec![],
        )
        .unwrap()
    }

    #[cfg(test)]
    mod definitions {
        use super::*;

        #[test]
        fn created_table_is_found_case_insensitively() {
            let catalog = catalog();

            assert_eq!(catalog.create_table(&table("Items")).unwrap(), true);

            assert_eq!(catalog.table("items").unwrap(), Some(table("Items")));
            assert_eq!(catalog.table("ITEMS").unwrap(), Some(table("Items")));
        }

        #[test]
        fn second_create_is_refused() {
            let catalog = catalog();

            assert_eq!(catalog.create_table(&table("a")).unwrap(), true);
            assert_eq!(catalog.create_table(&table("A")).unwrap(), false);
        }

        #[test]
        fn removed_table_is_gone() {
            let catalog = catalog();
            catalog.create_table(&table("a")).unwrap();

            catalog.remove_table("a").unwrap();

            assert_eq!(catalog.table("a").unwrap(), None);
        }

        #[test]
        fn names_preserve_stored_casing() {
            let catalog = catalog();
            catalog.create_table(&table("Orders")).unwrap();
            catalog.create_table(&table("clients")).unwrap();
            catalog.add_table_refcnt("Orders", 1).unwrap();

            assert_eq!(catalog.table_names().unwrap(), vec!["clients".to_owned(), "Orders".to_owned()]);
        }
    }

    #[cfg(test)]
    mod refcounts {
        use super::*;

        #[test]
        fn absent_table_refcnt_reads_as_zero() {
            assert_eq!(catalog().table_refcnt("a").unwrap(), 0);
        }

        #[test]
        fn table_refcnt_accumulates() {
            let catalog = catalog();

            catalog.add_table_refcnt("a", 1).unwrap();
            catalog.add_table_refcnt("A", 1).unwrap();
            catalog.add_table_refcnt("a", -1).unwrap();

            assert_eq!(catalog.table_refcnt("a").unwrap(), 1);
        }

        #[test]
        fn row_refcnt_is_keyed_by_table_and_key() {
            let catalog = catalog();
            let key = Binary::with_data(b"[1]".to_vec());
            let other = Binary::with_data(b"[2]".to_vec());

            catalog.add_row_refcnt("a", &key, 1).unwrap();

            assert_eq!(catalog.row_refcnt("a", &key).unwrap(), 1);
            assert_eq!(catalog.row_refcnt("a", &other).unwrap(), 0);
            assert_eq!(catalog.row_refcnt("b", &key).unwrap(), 0);
        }
    }
}
