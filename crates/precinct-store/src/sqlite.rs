use crate::connection::Database;
use crate::error::{StorageError, StorageResult};
use crate::store::SheetStore;
use precinct_core::{BatchId, ElectionConfig, ScannerSettings, SheetId, SheetPages};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

/// SQLite implementation of [`SheetStore`]
///
/// Sheets are written with `synchronous = FULL`, so a sheet the controller
/// has recorded is on disk before the controller moves on.
#[derive(Debug, Clone)]
pub struct SqliteSheetStore {
    db: Database,
}

impl SqliteSheetStore {
    /// Create a new SQLite sheet store
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Replace the stored election configuration.
    pub async fn set_election_config(&self, config: Option<&ElectionConfig>) -> StorageResult<()> {
        let json = config.map(serde_json::to_string).transpose()?;
        sqlx::query("UPDATE settings SET election_config = ? WHERE id = 1")
            .bind(json)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Replace the operator settings.
    pub async fn set_scanner_settings(&self, settings: ScannerSettings) -> StorageResult<()> {
        sqlx::query(
            r#"
            UPDATE settings
            SET is_shoeshine_mode_enabled = ?, is_double_feed_detection_disabled = ?
            WHERE id = 1
            "#,
        )
        .bind(settings.is_shoeshine_mode_enabled)
        .bind(settings.is_double_feed_detection_disabled)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Close the open batch.
    pub async fn end_batch(&self, batch_id: BatchId) -> StorageResult<()> {
        sqlx::query("UPDATE batches SET ended_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(batch_id.to_string())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn touch_sheet(&self, sql: &str, sheet_id: SheetId) -> StorageResult<()> {
        let result = sqlx::query(sql)
            .bind(sheet_id.to_string())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::sheet_not_found(sheet_id));
        }
        Ok(())
    }
}

async fn insert_sheet(
    conn: &mut SqliteConnection,
    sheet_id: SheetId,
    batch_id: BatchId,
    pages: &SheetPages,
) -> StorageResult<()> {
    let [front, back] = pages;
    let result = sqlx::query(
        r#"
        INSERT INTO sheets (
            id, batch_id, front_image, back_image,
            front_interpretation, back_interpretation
        )
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(sheet_id.to_string())
    .bind(batch_id.to_string())
    .bind(&front.image)
    .bind(&back.image)
    .bind(serde_json::to_string(&front.interpretation)?)
    .bind(serde_json::to_string(&back.interpretation)?)
    .execute(conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StorageError::Conflict(
            format!("sheet {sheet_id} already recorded"),
        )),
        Err(e) => Err(e.into()),
    }
}

impl SheetStore for SqliteSheetStore {
    async fn ongoing_batch_id(&self) -> StorageResult<BatchId> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM batches WHERE ended_at IS NULL AND deleted_at IS NULL LIMIT 1",
        )
        .fetch_optional(self.db.pool())
        .await?;

        if let Some(id) = existing {
            return id
                .parse()
                .map_err(|e: precinct_core::Error| StorageError::Configuration(e.to_string()));
        }

        let batch_id = BatchId::new();
        sqlx::query("INSERT INTO batches (id) VALUES (?)")
            .bind(batch_id.to_string())
            .execute(self.db.pool())
            .await?;
        debug!("Opened batch {}", batch_id);
        Ok(batch_id)
    }

    async fn add_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> StorageResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        insert_sheet(&mut conn, sheet_id, batch_id, pages).await?;
        debug!("Stored sheet {} in batch {}", sheet_id, batch_id);
        Ok(())
    }

    async fn record_rejected_sheet(
        &self,
        sheet_id: SheetId,
        batch_id: BatchId,
        pages: &SheetPages,
    ) -> StorageResult<()> {
        let mut tx = self.db.pool().begin().await?;
        insert_sheet(&mut tx, sheet_id, batch_id, pages).await?;
        sqlx::query("UPDATE sheets SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(sheet_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("Stored rejected sheet {} in batch {}", sheet_id, batch_id);
        Ok(())
    }

    async fn delete_sheet(&self, sheet_id: SheetId) -> StorageResult<()> {
        self.touch_sheet(
            "UPDATE sheets SET deleted_at = CURRENT_TIMESTAMP WHERE id = ?",
            sheet_id,
        )
        .await
    }

    async fn adjudicate_sheet(&self, sheet_id: SheetId) -> StorageResult<()> {
        self.touch_sheet(
            "UPDATE sheets SET adjudicated_at = CURRENT_TIMESTAMP WHERE id = ?",
            sheet_id,
        )
        .await
    }

    async fn ballots_counted(&self) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(sheets.id)
            FROM sheets INNER JOIN batches
              ON sheets.batch_id = batches.id
             AND sheets.deleted_at IS NULL
            WHERE batches.deleted_at IS NULL
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn election_config(&self) -> StorageResult<Option<ElectionConfig>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT election_config FROM settings WHERE id = 1")
                .fetch_one(self.db.pool())
                .await?;

        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    async fn scanner_settings(&self) -> StorageResult<ScannerSettings> {
        let row = sqlx::query(
            r#"
            SELECT is_shoeshine_mode_enabled, is_double_feed_detection_disabled
            FROM settings WHERE id = 1
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(ScannerSettings {
            is_shoeshine_mode_enabled: row.try_get("is_shoeshine_mode_enabled")?,
            is_double_feed_detection_disabled: row.try_get("is_double_feed_detection_disabled")?,
        })
    }
}
