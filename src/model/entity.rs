/// Entity Module
///
/// The `Entity` trait: per-type table mapping and the finders built on it.
use super::naming::default_table_name;
use super::Model;
use crate::core::db::{Connection, Operator, QueryBuilder};
use crate::core::{Result, Row, RowkeepError, Value};
use tracing::debug;

/// Table mapping for a record type.
///
/// Implementors override the associated constants they need; everything
/// else has a working default. Finders take the [`Connection`] explicitly.
///
/// ```
/// use rowkeep::{row, Connection, ConnectionConfig, Entity};
///
/// struct Author;
///
/// impl Entity for Author {
///     const FILLABLE: &'static [&'static str] = &["name", "email"];
///     const HIDDEN: &'static [&'static str] = &["email"];
///     const TIMESTAMPS: bool = false;
/// }
///
/// let db = Connection::new(ConnectionConfig::in_memory());
/// db.execute_batch("CREATE TABLE authors (id INTEGER PRIMARY KEY, name TEXT, email TEXT)")?;
///
/// let ada = Author::create(&db, row! { "name" => "Ada", "email" => "ada@x.io" })?;
/// let found = Author::find_or_fail(&db, ada.key().cloned())?;
/// assert_eq!(found.to_array(), row! { "id" => 1, "name" => "Ada" });
/// # Ok::<(), rowkeep::RowkeepError>(())
/// ```
pub trait Entity: Sized + 'static {
    /// Explicit table name. When `None` the name is derived from the type
    /// name, e.g. `BlogPost` -> `blog_posts`.
    const TABLE: Option<&'static str> = None;
    const PRIMARY_KEY: &'static str = "id";
    /// Attributes writable through `fill`. Empty means every attribute.
    const FILLABLE: &'static [&'static str] = &[];
    /// Attributes left out of `to_array` and `to_json`.
    const HIDDEN: &'static [&'static str] = &[];
    const TIMESTAMPS: bool = true;
    const CREATED_AT: &'static str = "created_at";
    const UPDATED_AT: &'static str = "updated_at";

    fn table_name() -> String {
        match Self::TABLE {
            Some(table) => table.to_string(),
            None => default_table_name(std::any::type_name::<Self>()),
        }
    }

    fn is_fillable(key: &str) -> bool {
        Self::FILLABLE.is_empty() || Self::FILLABLE.contains(&key)
    }

    /// New unsaved instance with `attributes` filled in.
    fn make(attributes: Row) -> Model<Self> {
        let mut model = Model::new();
        model.fill(attributes);
        model
    }

    /// Rebuilds a persisted instance from a database row.
    fn from_row(row: Row) -> Model<Self> {
        Model::from_persisted(row)
    }

    /// Builder over this entity's table, selecting `*`.
    fn query(db: &Connection) -> QueryBuilder<'_> {
        db.table(Self::table_name())
    }

    fn find(db: &Connection, id: impl Into<Value>) -> Result<Option<Model<Self>>> {
        let row = Self::query(db)
            .and_where(Self::PRIMARY_KEY, Operator::Eq, id)
            .first()?;
        Ok(row.map(Self::from_row))
    }

    /// Like [`find`](Entity::find) but a missing row is `RowkeepError::NotFound`.
    fn find_or_fail(db: &Connection, id: impl Into<Value>) -> Result<Model<Self>> {
        let id = id.into();
        Self::find(db, id.clone())?.ok_or_else(|| {
            debug!(table = %Self::table_name(), id = %id, "record not found");
            RowkeepError::NotFound { id: id.to_string() }
        })
    }

    fn all(db: &Connection) -> Result<Vec<Model<Self>>> {
        let rows = Self::query(db).get()?;
        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Single-predicate lookup. Use [`query`](Entity::query) for anything
    /// compound.
    fn filter(
        db: &Connection,
        column: &str,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Result<Vec<Model<Self>>> {
        let rows = Self::query(db).and_where(column, operator, value).get()?;
        Ok(rows.into_iter().map(Self::from_row).collect())
    }

    /// Fills a new instance and inserts it immediately.
    fn create(db: &Connection, attributes: Row) -> Result<Model<Self>> {
        let mut model = Self::make(attributes);
        model.save(db)?;
        Ok(model)
    }
}
