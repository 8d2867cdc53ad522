//! Key-value preferences in the `user_preferences` table.
//!
//! Values are stored as text. Structured values go through the JSON helpers,
//! which keep decoding failures separate from database failures.

use serde::{de::DeserializeOwned, Serialize};

use super::schema::Database;
use super::types::{DatabaseError, JsonPreference};

impl Database {
    /// Raw value stored under `key`, if any.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM user_preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Committed when this returns.
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(())
    }

    /// Decode the JSON value under `key`.
    pub async fn read_json_preference<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<JsonPreference<T>, DatabaseError> {
        let Some(raw) = self.get_preference(key).await? else {
            return Ok(JsonPreference::Absent);
        };

        Ok(match serde_json::from_str(&raw) {
            Ok(value) => JsonPreference::Value(value),
            Err(e) => {
                tracing::debug!(key, len = raw.len(), error = %e, "Stored preference does not decode");
                JsonPreference::Malformed(e)
            }
        })
    }

    /// Encode `value` as JSON and store it under `key`.
    pub async fn write_json_preference<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let encoded = serde_json::to_string(value).map_err(|source| DatabaseError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set_preference(key, &encoded).await
    }
}
