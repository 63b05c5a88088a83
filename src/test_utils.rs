/// # Test Utilities Module
///
/// Shared fixtures for the in-crate tests:
/// - Isolated in-memory database fixtures with a blog schema
/// - Sample entity types covering the `Entity` configuration knobs
/// - Error assertion helpers
/// - Tracing setup that routes log output through the test harness
use crate::config::ConnectionConfig;
use crate::core::db::Connection;
use crate::core::Result;
use crate::model::Entity;
use crate::row;

/// Installs a tracing subscriber writing to the test output. Safe to call
/// from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Author: explicit table, fillable allow-list, hidden email.
pub struct Author;

impl Entity for Author {
    const TABLE: Option<&'static str> = Some("authors");
    const FILLABLE: &'static [&'static str] =
        &["name", "email", "bio", "avatar", "website", "twitter", "github"];
    const HIDDEN: &'static [&'static str] = &["email"];
}

/// Article: explicit table, everything in the blog schema is fillable.
pub struct Article;

impl Entity for Article {
    const TABLE: Option<&'static str> = Some("articles");
    const FILLABLE: &'static [&'static str] = &[
        "title",
        "slug",
        "content",
        "excerpt",
        "category_id",
        "author_id",
        "status",
        "published_at",
    ];
}

/// Category: table name derived from the type name (`categories`).
pub struct Category;

impl Entity for Category {
    const FILLABLE: &'static [&'static str] = &["name", "slug", "description"];
}

/// Tag: text primary key, no timestamp columns.
pub struct Tag;

impl Entity for Tag {
    const PRIMARY_KEY: &'static str = "slug";
    const TIMESTAMPS: bool = false;
}

/// Isolated database test fixture
pub struct DatabaseFixture {
    pub name: String,
    pub connection: Connection,
}

impl DatabaseFixture {
    /// Create a new empty in-memory database
    pub fn new(name: &str) -> Result<Self> {
        init_tracing();
        let connection =
            Connection::new(ConnectionConfig::in_memory().with_option("foreign_keys", "ON"));

        Ok(DatabaseFixture {
            name: name.to_string(),
            connection,
        })
    }

    /// Create fixture with the blog schema and sample rows
    pub fn with_sample_data(name: &str) -> Result<Self> {
        let fixture = Self::with_schema(name)?;
        fixture.populate_sample_data()?;
        Ok(fixture)
    }

    /// Create fixture with the blog schema and no rows
    pub fn with_schema(name: &str) -> Result<Self> {
        let fixture = Self::new(name)?;
        fixture.setup_standard_schema()?;
        Ok(fixture)
    }

    /// Set up standard test schema
    pub fn setup_standard_schema(&self) -> Result<()> {
        self.connection.execute_batch(
            "
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT,
                updated_at TEXT
            );

            CREATE TABLE authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT,
                updated_at TEXT
            );

            CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT,
                content TEXT,
                excerpt TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                author_id INTEGER REFERENCES authors (id) ON DELETE CASCADE,
                category_id INTEGER REFERENCES categories (id),
                published_at TEXT,
                created_at TEXT,
                updated_at TEXT
            );

            CREATE TABLE tags (
                slug TEXT PRIMARY KEY,
                label TEXT NOT NULL
            );
        ",
        )
    }

    /// Populate with realistic sample data
    pub fn populate_sample_data(&self) -> Result<()> {
        let db = &self.connection;

        for (name, slug) in [("Technology", "technology"), ("Travel", "travel")] {
            db.insert("categories", &row! { "name" => name, "slug" => slug })?;
        }

        for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
            db.insert("authors", &row! { "name" => name, "email" => email })?;
        }

        let articles = [
            ("Welcome to Rust", "published", 1, 1, "2024-01-01 09:00:00"),
            ("Borrowing in practice", "draft", 1, 1, "2024-01-02 09:00:00"),
            ("A week in Lisbon", "published", 2, 2, "2024-01-03 09:00:00"),
            ("Compilers for fun", "draft", 2, 1, "2024-01-04 09:00:00"),
        ];
        for (title, status, author_id, category_id, created_at) in articles {
            db.insert(
                "articles",
                &row! {
                    "title" => title,
                    "status" => status,
                    "author_id" => author_id,
                    "category_id" => category_id,
                    "created_at" => created_at,
                },
            )?;
        }

        Ok(())
    }
}

/// Error testing utilities
pub mod error_testing {
    /// Asserts that `result` failed with a message containing `fragment`.
    pub fn assert_error_contains<T, E>(
        result: &std::result::Result<T, E>,
        fragment: &str,
        context: &str,
    ) where
        T: std::fmt::Debug,
        E: std::fmt::Display,
    {
        match result {
            Ok(value) => panic!("Expected error but got Ok({:?}) in {}", value, context),
            Err(e) => {
                let message = e.to_string();
                assert!(
                    message.to_lowercase().contains(&fragment.to_lowercase()),
                    "Expected '{}' in error message '{}' context: {}",
                    fragment,
                    message,
                    context
                );
            }
        }
    }
}

#[macro_export]
macro_rules! assert_rowkeep_error {
    ($result:expr, $expected:ident, $context:expr) => {
        match $result {
            Err($crate::RowkeepError::$expected { .. }) => {}
            Ok(_) => panic!("Expected {} error but got Ok in {}", stringify!($expected), $context),
            Err(other) => panic!(
                "Expected {} but got {:?} in {}",
                stringify!($expected),
                other,
                $context
            ),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_fixture_creation() {
        let fixture = DatabaseFixture::new("test_create").unwrap();
        assert_eq!(fixture.name, "test_create");
        assert!(!fixture.connection.is_connected());
    }

    #[test]
    fn test_sample_data_fixture() {
        let fixture = DatabaseFixture::with_sample_data("test_sample").unwrap();

        let count = fixture
            .connection
            .fetch(
                "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                (),
            )
            .unwrap()
            .unwrap();
        assert_eq!(count["n"], crate::core::Value::Integer(4));

        let articles = fixture.connection.fetch_all("SELECT id FROM articles", ()).unwrap();
        assert_eq!(articles.len(), 4);
    }
}
