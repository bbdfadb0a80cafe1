//! Persistence of drinks in a single relational table.
//!
//! Every operation touches at most one row and runs outside of an explicit
//! transaction, except [`DrinkStore::reset`] which rebuilds the table.

use crate::config::DatabaseConfig;
use crate::models::{Drink, DrinkPatch, Ingredient, NewDrink, Recipe};
use log::{debug, info, warn};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS drinks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    recipe TEXT NOT NULL
)
"#;

/// Errors raised by the store, classified by what the caller can do about them
#[derive(Debug, Error)]
pub enum StoreError {
    /// A constraint such as the unique title was violated
    #[error("Constraint violated: {0}")]
    Conflict(String),
    /// The database could not be reached in time
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A stored recipe could not be decoded
    #[error("Stored recipe of drink {id} is invalid: {source}")]
    Corrupt {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode recipe: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Query failed: {0}")]
    Query(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = StoreError;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        let recipe = Recipe::from_json(&row.recipe).map_err(|source| StoreError::Corrupt {
            id: row.id,
            source,
        })?;
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe,
        })
    }
}

/// CRUD accessor for the `drinks` table
#[derive(Debug, Clone)]
pub struct DrinkStore {
    pool: SqlitePool,
}

impl DrinkStore {
    /// Opens a connection pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout());

        if config.url.contains(":memory:") {
            // closing the last connection would discard the database
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options.connect(&config.url).await?;
        debug!("Connected to database at {}", config.url);
        Ok(Self { pool })
    }

    /// Creates the table when it does not exist yet
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Drops every record and seeds the table with a single drink
    pub async fn reset(&self) -> Result<(), StoreError> {
        warn!("Resetting the drinks table, all records will be dropped");
        let seed = Recipe(vec![Ingredient {
            name: "water".to_string(),
            color: "blue".to_string(),
            parts: 1,
        }]);

        let mut tx = self.pool.begin().await?;
        sqlx::query("DROP TABLE IF EXISTS drinks")
            .execute(&mut *tx)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO drinks (title, recipe) VALUES (?, ?)")
            .bind("water")
            .bind(seed.to_json()?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Drinks table reset");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Drink::try_from)
            .collect()
    }

    pub async fn find(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Drink::try_from)
            .transpose()
    }

    pub async fn title_exists(&self, title: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drinks WHERE title = ?")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn insert(&self, drink: &NewDrink) -> Result<Drink, StoreError> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO drinks (title, recipe) VALUES (?, ?) RETURNING id")
                .bind(&drink.title)
                .bind(drink.recipe.to_json()?)
                .fetch_one(&self.pool)
                .await?;

        debug!("Inserted drink {} '{}'", id, drink.title);
        Ok(Drink {
            id,
            title: drink.title.clone(),
            recipe: drink.recipe.clone(),
        })
    }

    /// Applies the provided fields and returns the updated row, `None` if `id` does not exist
    pub async fn update(&self, id: i64, patch: &DrinkPatch) -> Result<Option<Drink>, StoreError> {
        if patch.title.is_none() && patch.recipe.is_none() {
            return self.find(id).await;
        }

        let recipe = patch.recipe.as_ref().map(Recipe::to_json).transpose()?;
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET title = COALESCE(?, title), recipe = COALESCE(?, recipe)
            WHERE id = ?
            RETURNING id, title, recipe
            "#,
        )
        .bind(patch.title.as_deref())
        .bind(recipe)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            debug!("Updated drink {}", id);
        }
        row.map(Drink::try_from).transpose()
    }

    /// Removes the row, returning whether it existed
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM drinks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Round trip to the database for readiness checks
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Waits for checked out connections and closes the pool, shared by every clone
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs a statement outside the typed operations, for arranging broken states in tests
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .expect("Failed to execute raw statement");
    }
}
