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

//! Single-user relational engine over an embedded ordered key-value store.
//!
//! A session layer parses statements into [`query_ast::Command`] values and
//! hands them to [`SoleDb::execute`]; every outcome is either a
//! [`QueryEvent`] that renders the user-facing message via `Display` or a
//! typed diagnostic.

pub use query_ast::Command;
pub use query_executor::{ExecutionError, QueryEngine};
pub use query_response::{QueryError, QueryEvent};
pub use storage::{Database, StorageError};

use std::path::Path;

/// One open database file and the engine on top of it.
pub struct SoleDb {
    engine: QueryEngine,
}

impl SoleDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SoleDb, StorageError> {
        Ok(SoleDb {
            engine: QueryEngine::new(Database::open(path)?),
        })
    }

    pub fn execute(&self, command: Command) -> Result<QueryEvent, ExecutionError> {
        self.engine.execute(command)
    }
}
