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

use data_binary::Binary;
use sled::{Db as SledDb, Error as SledError, Tree as SledTree};
use std::fmt::{self, Debug, Display, Formatter};
use std::iter::FromIterator;
use std::path::Path;

pub type Key = Binary;
pub type Value = Binary;
pub type StorageResult<R> = Result<R, StorageError>;

/// Key space of the catalog entries, kept apart from every user table.
const DEFINITION_SCHEMA: &str = "DEFINITION_SCHEMA";
/// Prefix of the per-table key spaces so they never collide with the
/// catalog.
const USER_TABLE_PREFIX: &str = "ZZ_table_";

#[derive(Debug, PartialEq)]
pub enum StorageError {
    Unrecoverable(String),
    Io(String),
}

impl StorageError {
    pub fn unrecoverable<M: ToString>(message: M) -> StorageError {
        StorageError::Unrecoverable(message.to_string())
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unrecoverable(message) => write!(f, "unrecoverable storage failure: {}", message),
            StorageError::Io(message) => write!(f, "storage io failure: {}", message),
        }
    }
}

fn map_sled_error(error: SledError) -> StorageError {
    match error {
        SledError::CollectionNotFound(key_space) => StorageError::unrecoverable(format!(
            "key space [{}] can't be found",
            String::from_utf8_lossy(&key_space)
        )),
        SledError::Unsupported(operation) => {
            StorageError::unrecoverable(format!("unsupported operation [{}] was used on sled", operation))
        }
        SledError::Corruption { at, bt: _bt } => match at {
            Some(at) => StorageError::unrecoverable(format!("sled encountered corruption at {}", at)),
            None => StorageError::unrecoverable("sled encountered corruption".to_owned()),
        },
        SledError::ReportableBug(description) => {
            StorageError::unrecoverable(format!("sled encountered reportable BUG: {}", description))
        }
        SledError::Io(error) => StorageError::Io(error.to_string()),
    }
}

/// One database file: a sled container holding the catalog key space and
/// one key space per user table.
pub struct Database {
    sled_db: SledDb,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Database> {
        log::info!("initializing on-disk storage under [{:?}] folder", path.as_ref());
        let sled_db = sled::open(path).map_err(map_sled_error)?;
        if sled_db.was_recovered() {
            log::info!("on-disk storage recovered from a previous start");
        } else {
            log::info!("on-disk storage initialized anew");
        }
        Ok(Database { sled_db })
    }

    pub fn catalog(&self) -> StorageResult<KeySpace> {
        self.key_space(DEFINITION_SCHEMA.to_owned())
    }

    pub fn user_table(&self, table_name: &str) -> StorageResult<KeySpace> {
        self.key_space(format!("{}{}", USER_TABLE_PREFIX, table_name.to_lowercase()))
    }

    pub fn drop_user_table(&self, table_name: &str) -> StorageResult<()> {
        self.sled_db
            .drop_tree(format!("{}{}", USER_TABLE_PREFIX, table_name.to_lowercase()))
            .map(|_existed| ())
            .map_err(map_sled_error)
    }

    fn key_space(&self, name: String) -> StorageResult<KeySpace> {
        self.sled_db.open_tree(name).map(KeySpace::from).map_err(map_sled_error)
    }
}

/// An ordered key space; iteration follows the byte order of the keys.
pub struct KeySpace {
    sled_tree: SledTree,
}

impl From<SledTree> for KeySpace {
    fn from(sled_tree: SledTree) -> KeySpace {
        KeySpace { sled_tree }
    }
}

impl KeySpace {
    pub fn insert(&self, key: &Binary, value: Binary) -> StorageResult<()> {
        self.sled_tree
            .insert(key.as_ref(), value.to_bytes())
            .map(|_prev| ())
            .map_err(map_sled_error)
    }

    /// Writes only when the key is absent. `false` signals the key was
    /// already taken.
    pub fn insert_unique(&self, key: &Binary, value: Binary) -> StorageResult<bool> {
        self.sled_tree
            .compare_and_swap(key.as_ref(), None as Option<&[u8]>, Some(value.to_bytes()))
            .map(|outcome| outcome.is_ok())
            .map_err(map_sled_error)
    }

    pub fn lookup(&self, key: &Binary) -> StorageResult<Option<Binary>> {
        self.sled_tree
            .get(key.as_ref())
            .map(|value| value.map(|value| Binary::with_data(value.to_vec())))
            .map_err(map_sled_error)
    }

    pub fn remove(&self, key: &Binary) -> StorageResult<Option<Binary>> {
        self.sled_tree
            .remove(key.as_ref())
            .map(|value| value.map(|value| Binary::with_data(value.to_vec())))
            .map_err(map_sled_error)
    }

    pub fn cursor(&self) -> StorageResult<Cursor> {
        self.collect(self.sled_tree.iter())
    }

    pub fn cursor_over_prefix(&self, prefix: &str) -> StorageResult<Cursor> {
        self.collect(self.sled_tree.scan_prefix(prefix.as_bytes()))
    }

    fn collect(&self, iter: sled::Iter) -> StorageResult<Cursor> {
        let mut pairs = vec![];
        for row in iter {
            let (key, value) = row.map_err(map_sled_error)?;
            pairs.push((Binary::with_data(key.to_vec()), Binary::with_data(value.to_vec())));
        }
        Ok(pairs.into_iter().collect())
    }
}

pub struct Cursor {
    source: Box<dyn Iterator<Item = (Binary, Binary)>>,
}

impl Debug for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Data Cursor")
    }
}

impl FromIterator<(Binary, Binary)> for Cursor {
    fn from_iter<T: IntoIterator<Item = (Binary, Binary)>>(iter: T) -> Cursor {
        Cursor {
            source: Box::new(iter.into_iter().collect::<Vec<(Binary, Binary)>>().into_iter()),
        }
    }
}

impl Iterator for Cursor {
    type Item = (Binary, Binary);

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next()
    }
}
