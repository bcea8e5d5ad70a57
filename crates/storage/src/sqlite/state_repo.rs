use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{StateRepository, StateSlot, StorageError};

use super::SqliteRepository;

#[async_trait]
impl StateRepository for SqliteRepository {
    async fn load(&self, slot: StateSlot) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM state_slots WHERE slot_key = ?1")
            .bind(slot.key())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(value))
    }

    async fn save(&self, slot: StateSlot, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO state_slots (slot_key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(slot_key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(slot.key())
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear(&self, slot: StateSlot) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM state_slots WHERE slot_key = ?1")
            .bind(slot.key())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
