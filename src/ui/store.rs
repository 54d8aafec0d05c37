use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use crate::ui::handler::HandlerId;
use crate::ui::state::{ActionKind, ButtonPayload, ButtonState, UiError};

/// Durable row backing one database-mode button, keyed (custom_id, message_id).
#[derive(Clone, Debug)]
pub struct ButtonRecord {
    pub custom_id: String,
    pub button_type: String,
    pub handler_class: String,
    pub view_class: String,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ButtonRecord {
    pub fn from_state(
        custom_id: &str,
        handler: HandlerId,
        view_class: &str,
        state: &ButtonState,
        channel_id: u64,
        message_id: u64,
    ) -> Self {
        ButtonRecord {
            custom_id: custom_id.to_string(),
            button_type: state.payload.kind().as_wire().to_string(),
            handler_class: handler.wire_name().to_string(),
            view_class: view_class.to_string(),
            guild_id: state.guild_id,
            channel_id,
            message_id,
            user_id: state.owner_id,
            data: Value::Object(state.payload.to_field_map()).to_string(),
            created_at: Utc::now(),
            expires_at: state
                .expires_at
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            is_active: true,
        }
    }

    pub fn handler_id(&self) -> Result<HandlerId, UiError> {
        HandlerId::from_wire(&self.handler_class)
    }

    /// Rebuild the typed state this row was flattened from.
    pub fn to_state(&self) -> Result<ButtonState, UiError> {
        let kind = ActionKind::from_wire(&self.button_type).ok_or_else(|| {
            UiError::MalformedState(format!("stored row has unknown kind {}", self.button_type))
        })?;
        let fields: Value = serde_json::from_str(&self.data)
            .map_err(|e| UiError::MalformedState(format!("stored data column: {e}")))?;
        let fields = fields
            .as_object()
            .ok_or_else(|| UiError::MalformedState("stored data is not an object".to_string()))?;

        Ok(ButtonState {
            owner_id: self.user_id,
            payload: ButtonPayload::from_field_map(kind, fields)?,
            guild_id: self.guild_id,
            expires_at: self.expires_at.map(|t| t.timestamp()),
        })
    }
}

/// Durable side-table for database-mode buttons. The single source of truth
/// across restarts; the in-memory recovery table is only a cache of it.
#[derive(Clone)]
pub struct ButtonStore {
    pool: SqlitePool,
}

impl ButtonStore {
    pub fn new(pool: SqlitePool) -> Self {
        ButtonStore { pool }
    }

    pub async fn setup_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS persistent_buttons (
                custom_id TEXT NOT NULL,
                button_type TEXT NOT NULL,
                handler_class TEXT NOT NULL,
                view_class TEXT NOT NULL,
                guild_id INTEGER,
                channel_id INTEGER NOT NULL,
                message_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                data TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                expires_at TIMESTAMP,
                is_active INTEGER NOT NULL DEFAULT 1,
                UNIQUE (custom_id, message_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a record. Re-registering the same (custom_id, message_id) pair
    /// replaces payload, expiry and active flag rather than erroring.
    pub async fn store(&self, record: &ButtonRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO persistent_buttons
                (custom_id, button_type, handler_class, view_class, guild_id,
                 channel_id, message_id, user_id, data, created_at, expires_at, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (custom_id, message_id) DO UPDATE SET
                data = excluded.data,
                expires_at = excluded.expires_at,
                is_active = excluded.is_active
            "#,
        )
        .bind(&record.custom_id)
        .bind(&record.button_type)
        .bind(&record.handler_class)
        .bind(&record.view_class)
        .bind(record.guild_id.map(|id| id as i64))
        .bind(record.channel_id as i64)
        .bind(record.message_id as i64)
        .bind(record.user_id as i64)
        .bind(&record.data)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.is_active as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load one record, treating inactive or expired rows as not found.
    pub async fn load(
        &self,
        custom_id: &str,
        message_id: u64,
    ) -> Result<Option<ButtonRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT * FROM persistent_buttons
            WHERE custom_id = ? AND message_id = ? AND is_active = 1
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(custom_id)
        .bind(message_id as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| record_from_row(&r)))
    }

    /// Every active, unexpired record, ordered so recovery can group by
    /// message in a single pass.
    pub async fn load_all_active(&self) -> Result<Vec<ButtonRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM persistent_buttons
            WHERE is_active = 1 AND (expires_at IS NULL OR expires_at > ?)
            ORDER BY message_id, created_at
            "#,
        )
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Soft-delete every record for a message. Used when the owning message
    /// is gone or has lost its components.
    pub async fn deactivate_message(&self, message_id: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE persistent_buttons SET is_active = 0 WHERE message_id = ?")
            .bind(message_id as i64)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Hard-delete inactive and past-expiry rows. Runs on a periodic
    /// schedule, never in the activation path.
    pub async fn sweep_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM persistent_buttons
            WHERE is_active = 0 OR (expires_at IS NOT NULL AND expires_at <= ?)
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> ButtonRecord {
    ButtonRecord {
        custom_id: row.get("custom_id"),
        button_type: row.get("button_type"),
        handler_class: row.get("handler_class"),
        view_class: row.get("view_class"),
        guild_id: row.get::<Option<i64>, _>("guild_id").map(|id| id as u64),
        channel_id: row.get::<i64, _>("channel_id") as u64,
        message_id: row.get::<i64, _>("message_id") as u64,
        user_id: row.get::<i64, _>("user_id") as u64,
        data: row.get("data"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        is_active: row.get::<i64, _>("is_active") != 0,
    }
}
