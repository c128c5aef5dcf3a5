//! Key/value system settings.

use std::collections::BTreeMap;

use sqlx::SqlitePool;

use crate::validation::{
    require_text, ValidationError, MAX_CONFIG_KEY_LENGTH, MAX_LONG_TEXT_LENGTH,
};
use crate::Result;

/// Get all settings as a key/value map.
pub async fn get_all(pool: &SqlitePool) -> Result<BTreeMap<String, String>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT config_key, config_value
        FROM system_config
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}


/// Create or update every given setting in one transaction.
pub async fn upsert_many(pool: &SqlitePool, entries: &[(String, String)]) -> Result<()> {
    for (key, value) in entries {
        require_text("config key", key, MAX_CONFIG_KEY_LENGTH)?;
        let len = value.chars().count();
        if len > MAX_LONG_TEXT_LENGTH {
            return Err(ValidationError::TooLong {
                field: "config value".to_string(),
                max: MAX_LONG_TEXT_LENGTH,
                actual: len,
            }
            .into());
        }
    }

    let mut tx = pool.begin().await?;
    for (key, value) in entries {
        sqlx::query(
            r#"
            INSERT INTO system_config (config_key, config_value)
            VALUES (?, ?)
            ON CONFLICT(config_key) DO UPDATE SET
                config_value = excluded.config_value
            "#,
        )
        .bind(key.trim())
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}
