/// Model Module
///
/// Active-record persistence.
///
/// A `Model<E>` holds one row's attributes for entity type `E`, a snapshot
/// of what was last loaded or written (`original`), and whether the row
/// exists in the database. `save` inserts or updates based on that flag and
/// only writes attributes that changed.
///
/// Instance state moves through three phases:
///
/// - transient (`exists == false`): built with `Entity::make` or `Model::new`
/// - persisted (`exists == true`): after a successful insert or when loaded
///   through a finder; updates keep it here and refresh `original`
/// - deleted (`exists == false` again): attributes are kept, and a later
///   `save` inserts a new row
///
/// No statement is wrapped in a transaction here. Use
/// `Connection::transaction` when several records must change together.
pub mod entity;
/// Default table names derived from entity type names.
///
/// `BlogPost` becomes `blog_posts`: an underscore goes before every
/// uppercase letter except the first, the result is lowercased, then
/// pluralized with a suffix heuristic. Irregular plurals are not handled
/// (`Person` gives `persons`, `Child` gives `childs`); entities with such
/// names should set `Entity::TABLE` explicitly.
pub mod naming;

pub use entity::Entity;

use crate::core::db::Connection;
use crate::core::{Result, Row, Value};
use crate::row;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Format of the timestamp columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn current_timestamp() -> Value {
    Value::Text(chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string())
}

/// One record of entity type `E`.
pub struct Model<E: Entity> {
    table: String,
    attributes: Row,
    original: Row,
    exists: bool,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Model<E> {
    /// Empty, unsaved instance.
    pub fn new() -> Self {
        Model {
            table: E::table_name(),
            attributes: Row::new(),
            original: Row::new(),
            exists: false,
            entity: PhantomData,
        }
    }

    pub(crate) fn from_persisted(row: Row) -> Self {
        Model {
            table: E::table_name(),
            original: row.clone(),
            attributes: row,
            exists: true,
            entity: PhantomData,
        }
    }

    /// Assigns every fillable key of `attributes`. Keys outside
    /// `E::FILLABLE` are dropped without error.
    pub fn fill(&mut self, attributes: Row) -> &mut Self {
        for (key, value) in attributes {
            if E::is_fillable(&key) {
                self.attributes.insert(key, value);
            }
        }
        self
    }

    /// Sets one attribute, bypassing the fillable list.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attribute value, or `default` when it is not set.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.attributes
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// True when the attribute is present and not `NULL`.
    pub fn has(&self, key: &str) -> bool {
        self.attributes.get(key).map_or(false, |v| !v.is_null())
    }

    pub fn attributes(&self) -> &Row {
        &self.attributes
    }

    /// Snapshot of the attributes as last loaded or persisted.
    pub fn original(&self) -> &Row {
        &self.original
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key_name(&self) -> &'static str {
        E::PRIMARY_KEY
    }

    pub fn key(&self) -> Option<&Value> {
        self.attributes.get(E::PRIMARY_KEY)
    }

    /// Non-key attributes that differ from, or are missing in, `original`.
    pub fn dirty(&self) -> Row {
        self.attributes
            .iter()
            .filter(|(key, _)| key.as_str() != E::PRIMARY_KEY)
            .filter(|(key, value)| self.original.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty().is_empty()
    }

    /// Attributes without the hidden ones.
    pub fn to_array(&self) -> Row {
        self.attributes
            .iter()
            .filter(|(key, _)| !E::HIDDEN.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_array())?)
    }

    /// Inserts the record if it does not exist yet, otherwise updates it.
    ///
    /// Returns `false` when an update matched no row.
    pub fn save(&mut self, db: &Connection) -> Result<bool> {
        if self.exists {
            self.perform_update(db)
        } else {
            self.perform_insert(db)
        }
    }

    fn perform_insert(&mut self, db: &Connection) -> Result<bool> {
        if E::TIMESTAMPS {
            let now = current_timestamp();
            self.set(E::CREATED_AT, now.clone());
            self.set(E::UPDATED_AT, now);
        }

        // An empty key is left to the database to generate.
        let mut payload = self.attributes.clone();
        let generate_key = payload.get(E::PRIMARY_KEY).map_or(true, Value::is_empty);
        if generate_key {
            payload.shift_remove(E::PRIMARY_KEY);
        }

        let id = db.insert(&self.table, &payload)?;

        if generate_key {
            self.set(E::PRIMARY_KEY, id);
        }
        self.original = self.attributes.clone();
        self.exists = true;

        debug!(table = %self.table, id, "record inserted");
        Ok(true)
    }

    fn perform_update(&mut self, db: &Connection) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(true);
        }

        if E::TIMESTAMPS {
            self.set(E::UPDATED_AT, current_timestamp());
        }

        let changes = self.dirty();
        let key = self.key().cloned().unwrap_or_default();
        let affected = db.update(&self.table, &changes, &row! { E::PRIMARY_KEY => key })?;

        self.original = self.attributes.clone();

        debug!(table = %self.table, affected, columns = changes.len(), "record updated");
        Ok(affected > 0)
    }

    /// Deletes the row. Returns `false` without touching the database when
    /// the record does not exist. Attributes are kept in memory.
    pub fn delete(&mut self, db: &Connection) -> Result<bool> {
        if !self.exists {
            return Ok(false);
        }

        let key = self.key().cloned().unwrap_or_default();
        let affected = db.delete(&self.table, &row! { E::PRIMARY_KEY => key })?;
        self.exists = false;

        debug!(table = %self.table, affected, "record deleted");
        Ok(affected > 0)
    }
}

impl<E: Entity> Default for Model<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Clone for Model<E> {
    fn clone(&self) -> Self {
        Model {
            table: self.table.clone(),
            attributes: self.attributes.clone(),
            original: self.original.clone(),
            exists: self.exists,
            entity: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Model<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("table", &self.table)
            .field("attributes", &self.attributes)
            .field("exists", &self.exists)
            .finish()
    }
}
