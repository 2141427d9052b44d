//! Remote table storage.
//!
//! The backend speaks untyped JSON rows; [`Record`] ties each entity to its
//! table so rows are decoded into typed values at this boundary and nothing
//! partially typed reaches the store.

mod rest;

pub use rest::RestStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{CrmError, Result};
use crate::model::{App, Contact, Deal, Task};

/// The four remote tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Apps,
    Contacts,
    Deals,
    Tasks,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Apps, Table::Contacts, Table::Deals, Table::Tasks];

    /// Remote table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Apps => "apps",
            Table::Contacts => "contacts",
            Table::Deals => "deals",
            Table::Tasks => "tasks",
        }
    }

    /// Column the full listing is ordered by, newest first.
    pub fn order_column(&self) -> &'static str {
        match self {
            Table::Apps | Table::Contacts => "createdAt",
            Table::Deals => "closeDate",
            Table::Tasks => "dueDate",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Remote row storage.
///
/// Rows go in and out as JSON objects. Insert and update return the stored
/// row, which is authoritative over what was sent.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row of `table`, ordered by `column`.
    async fn select_ordered(&self, table: Table, column: &str, descending: bool) -> Result<Vec<Value>>;

    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    async fn update(&self, table: Table, id: &str, row: Value) -> Result<Value>;

    async fn delete(&self, table: Table, id: &str) -> Result<()>;
}

/// An entity stored in one remote table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const TABLE: Table;

    /// Human label used in messages.
    const ENTITY: &'static str;

    /// Prefix of generated mock ids.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
}

impl Record for App {
    const TABLE: Table = Table::Apps;
    const ENTITY: &'static str = "App";
    const ID_PREFIX: &'static str = "app";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Contact {
    const TABLE: Table = Table::Contacts;
    const ENTITY: &'static str = "Contact";
    const ID_PREFIX: &'static str = "contact";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Deal {
    const TABLE: Table = Table::Deals;
    const ENTITY: &'static str = "Deal";
    const ID_PREFIX: &'static str = "deal";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Task {
    const TABLE: Table = Table::Tasks;
    const ENTITY: &'static str = "Task";
    const ID_PREFIX: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Decode one row; failure names the table.
pub fn decode_row<T: DeserializeOwned>(table: Table, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| CrmError::decode(table.name(), e.to_string()))
}

/// Decode every row, failing on the first malformed one.
pub fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| decode_row(table, row)).collect()
}

/// Encode a value as a row body.
pub fn encode_row<T: Serialize>(table: Table, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| CrmError::decode(table.name(), e.to_string()))
}

/// Fetch and decode a whole table in its listing order.
pub async fn fetch_all<T: Record>(remote: &dyn RemoteStore) -> Result<Vec<T>> {
    let table = T::TABLE;
    let rows = remote.select_ordered(table, table.order_column(), true).await?;
    decode_rows(table, rows)
}
