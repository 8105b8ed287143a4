use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use snafu::{OptionExt, ResultExt};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Connection, FromRow, SqliteConnection, SqlitePool};

use super::error::{
    ConflictSnafu, CreateSqliteDirectorySnafu, InvariantViolationSnafu, NotFoundSnafu,
    SqliteConnectOptionsSnafu, SqliteConnectSnafu, SqliteMigrateSnafu, SqlitePragmaSnafu,
    SqliteQuerySnafu, SqliteRuntimeInitSnafu, SqliteThreadSpawnSnafu, StorageResult,
};
use super::ids::{MediaRefId, MessageId, SessionId};
use super::types::{
    DEFAULT_SESSION_TITLE, MediaRefRecord, MessagePatch, MessageRecord, MessageRole, NewMediaRef,
    NewMessage, NewSession, SessionPatch, SessionRecord,
};
use super::{MediaStore, MessageStore, SessionStore};

#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
    database_url: String,
}

impl SqliteStorage {
    pub async fn open(database_location: &str) -> StorageResult<Self> {
        ensure_database_directory(database_location)?;

        let database_url = normalize_database_url(database_location);
        let connect_options = SqliteConnectOptions::from_str(&database_url)
            .context(SqliteConnectOptionsSnafu {
                stage: "sqlite-open-parse-url",
                database_url: database_url.clone(),
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5_000));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .context(SqliteConnectSnafu {
                stage: "sqlite-open-connect",
                database_url: database_url.clone(),
            })?;

        // Explicit PRAGMA writes make bootstrap behavior deterministic for QA checks.
        let _: String = sqlx::query_scalar("PRAGMA journal_mode = WAL;")
            .fetch_one(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-journal-mode",
                pragma: "journal_mode",
            })?;
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-foreign-keys",
                pragma: "foreign_keys",
            })?;
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .context(SqlitePragmaSnafu {
                stage: "sqlite-open-pragma-busy-timeout",
                pragma: "busy_timeout",
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context(SqliteMigrateSnafu {
                stage: "sqlite-open-migrate",
            })?;

        Ok(Self { pool, database_url })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn run_db_call<T, F>(&self, stage: &'static str, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: Future<Output = StorageResult<T>> + Send + 'static,
    {
        // Store traits are sync, so each call executes on a dedicated worker thread
        // with its own current-thread runtime to avoid nested-runtime blocking panics.
        let worker = std::thread::Builder::new()
            .name(format!("sqlite-store-{stage}"))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context(SqliteRuntimeInitSnafu {
                        stage: "sqlite-store-runtime-build",
                    })?;
                runtime.block_on(op)
            })
            .context(SqliteThreadSpawnSnafu {
                stage: "sqlite-store-spawn-worker",
            })?;

        match worker.join() {
            Ok(result) => result,
            Err(_) => InvariantViolationSnafu {
                stage,
                details: "sqlite storage worker thread panicked".to_string(),
            }
            .fail(),
        }
    }
}

impl SessionStore for SqliteStorage {
    fn create_session(&self, input: NewSession) -> StorageResult<SessionRecord> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-create", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-create-connect").await?;

            // Empty titles collapse to the default so session lists never show blanks.
            let title = if input.title.trim().is_empty() {
                DEFAULT_SESSION_TITLE.to_string()
            } else {
                input.title
            };

            let session_id = SessionId::new_v7();
            let now = unix_timestamp_seconds();

            sqlx::query(
                "INSERT INTO sessions (id, title, created_at, updated_at, deleted_at) VALUES (?, ?, ?, ?, NULL)",
            )
            .bind(session_id.to_string())
            .bind(title.clone())
            .bind(now)
            .bind(now)
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-create-insert",
            })?;

            Ok(SessionRecord {
                id: session_id,
                title,
                created_at_unix_seconds: i64_to_u64(now, "session-create-created-at")?,
                updated_at_unix_seconds: i64_to_u64(now, "session-create-updated-at")?,
                deleted_at_unix_seconds: None,
            })
        })
    }

    fn list_sessions(&self, include_deleted: bool) -> StorageResult<Vec<SessionRecord>> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-list", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-list-connect").await?;
            let rows = if include_deleted {
                sqlx::query_as::<_, SessionRow>(
                    "SELECT id, title, created_at, updated_at, deleted_at FROM sessions ORDER BY updated_at DESC, id DESC",
                )
                .fetch_all(&mut connection)
                .await
            } else {
                sqlx::query_as::<_, SessionRow>(
                    "SELECT id, title, created_at, updated_at, deleted_at FROM sessions WHERE deleted_at IS NULL ORDER BY updated_at DESC, id DESC",
                )
                .fetch_all(&mut connection)
                .await
            }
            .context(SqliteQuerySnafu {
                stage: "session-list-query",
            })?;

            rows.into_iter().map(session_row_to_record).collect()
        })
    }

    fn get_session(&self, session_id: SessionId) -> StorageResult<Option<SessionRecord>> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-get", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-get-connect").await?;
            let row = sqlx::query_as::<_, SessionRow>(
                "SELECT id, title, created_at, updated_at, deleted_at FROM sessions WHERE id = ?",
            )
            .bind(session_id.to_string())
            .fetch_optional(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-get-query",
            })?;

            row.map(session_row_to_record).transpose()
        })
    }

    fn update_session(
        &self,
        session_id: SessionId,
        patch: SessionPatch,
    ) -> StorageResult<SessionRecord> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-update", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-update-connect").await?;
            let now = unix_timestamp_seconds();
            let update_result = sqlx::query(
                "UPDATE sessions SET title = COALESCE(?, title), updated_at = ? WHERE id = ?",
            )
            .bind(patch.title)
            .bind(now)
            .bind(session_id.to_string())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-update-apply",
            })?;

            if update_result.rows_affected() == 0 {
                return NotFoundSnafu {
                    stage: "session-update-missing",
                    entity: "session",
                    id: session_id.to_string(),
                }
                .fail();
            }

            let row = sqlx::query_as::<_, SessionRow>(
                "SELECT id, title, created_at, updated_at, deleted_at FROM sessions WHERE id = ?",
            )
            .bind(session_id.to_string())
            .fetch_optional(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-update-load",
            })?
            .context(NotFoundSnafu {
                stage: "session-update-load-missing",
                entity: "session",
                id: session_id.to_string(),
            })?;

            session_row_to_record(row)
        })
    }

    fn soft_delete_session(&self, session_id: SessionId) -> StorageResult<()> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-soft-delete", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-soft-delete-connect").await?;
            let now = unix_timestamp_seconds();
            let result = sqlx::query(
                "UPDATE sessions SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            )
            .bind(now)
            .bind(now)
            .bind(session_id.to_string())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-soft-delete-apply",
            })?;

            if result.rows_affected() == 0 {
                let exists = session_exists(&mut connection, session_id).await?;
                if !exists {
                    return NotFoundSnafu {
                        stage: "session-soft-delete-missing",
                        entity: "session",
                        id: session_id.to_string(),
                    }
                    .fail();
                }
            }

            Ok(())
        })
    }

    fn restore_session(&self, session_id: SessionId) -> StorageResult<()> {
        let database_url = self.database_url.clone();
        self.run_db_call("session-restore", async move {
            let mut connection =
                connect_store_connection(&database_url, "session-restore-connect").await?;
            let now = unix_timestamp_seconds();
            let result = sqlx::query(
                "UPDATE sessions SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL",
            )
            .bind(now)
            .bind(session_id.to_string())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "session-restore-apply",
            })?;

            if result.rows_affected() == 0 {
                let exists = session_exists(&mut connection, session_id).await?;
                if !exists {
                    return NotFoundSnafu {
                        stage: "session-restore-missing",
                        entity: "session",
                        id: session_id.to_string(),
                    }
                    .fail();
                }
            }

            Ok(())
        })
    }
}

impl MessageStore for SqliteStorage {
    fn append_message(
        &self,
        session_id: SessionId,
        input: NewMessage,
    ) -> StorageResult<MessageRecord> {
        let database_url = self.database_url.clone();
        self.run_db_call("message-append", async move {
            let mut connection =
                connect_store_connection(&database_url, "message-append-connect").await?;
            ensure_session_in_scope(&mut connection, session_id, "message-append-ensure-session")
                .await?;

            // Seq assignment and insert run in one transaction so concurrent appends
            // can never mint the same position.
            let mut tx = connection.begin().await.context(SqliteQuerySnafu {
                stage: "message-append-begin",
            })?;

            let next_seq = sqlx::query_scalar::<_, i64>(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE session_id = ?",
            )
            .bind(session_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-append-next-seq",
            })?;

            let now = unix_timestamp_seconds();
            let message_id = MessageId::new_v7();
            let role_text = role_to_sql(input.role);

            sqlx::query(
                "INSERT INTO messages (id, session_id, seq, role, content, created_at, updated_at, deleted_at) VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
            )
            .bind(message_id.to_string())
            .bind(session_id.to_string())
            .bind(next_seq)
            .bind(role_text)
            .bind(input.content.clone())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-append-insert",
            })?;

            sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(session_id.to_string())
                .execute(&mut *tx)
                .await
                .context(SqliteQuerySnafu {
                    stage: "message-append-touch-session",
                })?;

            tx.commit().await.context(SqliteQuerySnafu {
                stage: "message-append-commit",
            })?;

            Ok(MessageRecord {
                id: message_id,
                session_id,
                seq: i64_to_u64(next_seq, "message-append-seq")?,
                role: input.role,
                content: input.content,
                deleted_at_unix_seconds: None,
            })
        })
    }

    fn list_messages(&self, session_id: SessionId) -> StorageResult<Vec<MessageRecord>> {
        let database_url = self.database_url.clone();
        self.run_db_call("message-list", async move {
            let mut connection =
                connect_store_connection(&database_url, "message-list-connect").await?;
            ensure_session_in_scope(&mut connection, session_id, "message-list-ensure-session")
                .await?;
            let rows = sqlx::query_as::<_, MessageRow>(
                "SELECT id, session_id, seq, role, content, deleted_at FROM messages WHERE session_id = ? AND deleted_at IS NULL ORDER BY seq ASC, id ASC",
            )
            .bind(session_id.to_string())
            .fetch_all(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-list-query",
            })?;

            rows.into_iter().map(message_row_to_record).collect()
        })
    }

    fn get_message(
        &self,
        session_id: SessionId,
        message_id: MessageId,
    ) -> StorageResult<Option<MessageRecord>> {
        let database_url = self.database_url.clone();
        self.run_db_call("message-get", async move {
            let mut connection =
                connect_store_connection(&database_url, "message-get-connect").await?;
            let row = sqlx::query_as::<_, MessageRow>(
                "SELECT id, session_id, seq, role, content, deleted_at FROM messages WHERE session_id = ? AND id = ? AND deleted_at IS NULL",
            )
            .bind(session_id.to_string())
            .bind(message_id.to_string())
            .fetch_optional(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-get-query",
            })?;

            row.map(message_row_to_record).transpose()
        })
    }

    fn update_message(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        patch: MessagePatch,
    ) -> StorageResult<MessageRecord> {
        let database_url = self.database_url.clone();
        self.run_db_call("message-update", async move {
            let mut connection =
                connect_store_connection(&database_url, "message-update-connect").await?;
            let now = unix_timestamp_seconds();
            let update_result = sqlx::query(
                "UPDATE messages SET content = COALESCE(?, content), updated_at = ? WHERE session_id = ? AND id = ? AND deleted_at IS NULL",
            )
            .bind(patch.content)
            .bind(now)
            .bind(session_id.to_string())
            .bind(message_id.to_string())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-update-apply",
            })?;

            if update_result.rows_affected() == 0 {
                return NotFoundSnafu {
                    stage: "message-update-missing",
                    entity: "message",
                    id: message_id.to_string(),
                }
                .fail();
            }

            let row = sqlx::query_as::<_, MessageRow>(
                "SELECT id, session_id, seq, role, content, deleted_at FROM messages WHERE session_id = ? AND id = ? AND deleted_at IS NULL",
            )
            .bind(session_id.to_string())
            .bind(message_id.to_string())
            .fetch_optional(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "message-update-load",
            })?
            .context(NotFoundSnafu {
                stage: "message-update-load-missing",
                entity: "message",
                id: message_id.to_string(),
            })?;

            message_row_to_record(row)
        })
    }
}

impl MediaStore for SqliteStorage {
    fn attach_media(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        input: NewMediaRef,
    ) -> StorageResult<MediaRefRecord> {
        let database_url = self.database_url.clone();
        self.run_db_call("media-attach", async move {
            let mut connection =
                connect_store_connection(&database_url, "media-attach-connect").await?;
            ensure_message_in_session(
                &mut connection,
                session_id,
                message_id,
                "media-attach-ensure-message",
            )
            .await?;
            validate_media_uri(&input.uri, "media-attach-validate-uri")?;

            let media_ref_id = MediaRefId::new_v7();
            let now = unix_timestamp_seconds();
            let size_bytes = u64_to_i64(input.size_bytes, "media-attach-size-bytes")?;
            let duration_ms = input
                .duration_ms
                .map(|value| u64_to_i64(value, "media-attach-duration-ms"))
                .transpose()?;
            let width_px = input.width_px.map(i64::from);
            let height_px = input.height_px.map(i64::from);

            sqlx::query(
                "INSERT INTO media_refs (id, session_id, message_id, uri, mime_type, size_bytes, duration_ms, width_px, height_px, created_at, deleted_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)",
            )
            .bind(media_ref_id.to_string())
            .bind(session_id.to_string())
            .bind(message_id.to_string())
            .bind(input.uri.clone())
            .bind(input.mime_type.clone())
            .bind(size_bytes)
            .bind(duration_ms)
            .bind(width_px)
            .bind(height_px)
            .bind(now)
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "media-attach-insert",
            })?;

            Ok(MediaRefRecord {
                id: media_ref_id,
                session_id,
                message_id,
                uri: input.uri,
                mime_type: input.mime_type,
                size_bytes: input.size_bytes,
                duration_ms: input.duration_ms,
                width_px: input.width_px,
                height_px: input.height_px,
                deleted_at_unix_seconds: None,
            })
        })
    }

    fn list_media(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        include_deleted: bool,
    ) -> StorageResult<Vec<MediaRefRecord>> {
        let database_url = self.database_url.clone();
        self.run_db_call("media-list", async move {
            let mut connection =
                connect_store_connection(&database_url, "media-list-connect").await?;
            ensure_message_in_session(
                &mut connection,
                session_id,
                message_id,
                "media-list-ensure-message",
            )
            .await?;

            let rows = if include_deleted {
                sqlx::query_as::<_, MediaRefRow>(
                    "SELECT id, session_id, message_id, uri, mime_type, size_bytes, duration_ms, width_px, height_px, deleted_at FROM media_refs WHERE session_id = ? AND message_id = ? ORDER BY created_at ASC, id ASC",
                )
                .bind(session_id.to_string())
                .bind(message_id.to_string())
                .fetch_all(&mut connection)
                .await
            } else {
                sqlx::query_as::<_, MediaRefRow>(
                    "SELECT id, session_id, message_id, uri, mime_type, size_bytes, duration_ms, width_px, height_px, deleted_at FROM media_refs WHERE session_id = ? AND message_id = ? AND deleted_at IS NULL ORDER BY created_at ASC, id ASC",
                )
                .bind(session_id.to_string())
                .bind(message_id.to_string())
                .fetch_all(&mut connection)
                .await
            }
            .context(SqliteQuerySnafu {
                stage: "media-list-query",
            })?;

            rows.into_iter().map(media_ref_row_to_record).collect()
        })
    }

    fn soft_delete_media(
        &self,
        session_id: SessionId,
        message_id: MessageId,
        media_ref_id: MediaRefId,
    ) -> StorageResult<()> {
        let database_url = self.database_url.clone();
        self.run_db_call("media-soft-delete", async move {
            let mut connection =
                connect_store_connection(&database_url, "media-soft-delete-connect").await?;
            ensure_message_in_session(
                &mut connection,
                session_id,
                message_id,
                "media-soft-delete-ensure-message",
            )
            .await?;

            let now = unix_timestamp_seconds();
            let result = sqlx::query(
                "UPDATE media_refs SET deleted_at = ? WHERE session_id = ? AND message_id = ? AND id = ? AND deleted_at IS NULL",
            )
            .bind(now)
            .bind(session_id.to_string())
            .bind(message_id.to_string())
            .bind(media_ref_id.to_string())
            .execute(&mut connection)
            .await
            .context(SqliteQuerySnafu {
                stage: "media-soft-delete-apply",
            })?;

            if result.rows_affected() == 0 {
                let exists =
                    media_ref_exists_in_scope(&mut connection, session_id, message_id, media_ref_id)
                        .await?;
                if !exists {
                    return NotFoundSnafu {
                        stage: "media-soft-delete-missing",
                        entity: "media_ref",
                        id: media_ref_id.to_string(),
                    }
                    .fail();
                }
            }

            Ok(())
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    title: String,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: String,
    session_id: String,
    seq: i64,
    role: String,
    content: String,
    deleted_at: Option<i64>,
}

#[derive(Debug, FromRow)]
struct MediaRefRow {
    id: String,
    session_id: String,
    message_id: String,
    uri: String,
    mime_type: String,
    size_bytes: i64,
    duration_ms: Option<i64>,
    width_px: Option<i64>,
    height_px: Option<i64>,
    deleted_at: Option<i64>,
}

fn session_row_to_record(row: SessionRow) -> StorageResult<SessionRecord> {
    Ok(SessionRecord {
        id: SessionId::parse(&row.id)?,
        title: row.title,
        created_at_unix_seconds: i64_to_u64(row.created_at, "session-row-created-at")?,
        updated_at_unix_seconds: i64_to_u64(row.updated_at, "session-row-updated-at")?,
        deleted_at_unix_seconds: row
            .deleted_at
            .map(|value| i64_to_u64(value, "session-row-deleted-at"))
            .transpose()?,
    })
}

fn message_row_to_record(row: MessageRow) -> StorageResult<MessageRecord> {
    Ok(MessageRecord {
        id: MessageId::parse(&row.id)?,
        session_id: SessionId::parse(&row.session_id)?,
        seq: i64_to_u64(row.seq, "message-row-seq")?,
        role: role_from_sql(&row.role)?,
        content: row.content,
        deleted_at_unix_seconds: row
            .deleted_at
            .map(|value| i64_to_u64(value, "message-row-deleted-at"))
            .transpose()?,
    })
}

fn media_ref_row_to_record(row: MediaRefRow) -> StorageResult<MediaRefRecord> {
    Ok(MediaRefRecord {
        id: MediaRefId::parse(&row.id)?,
        session_id: SessionId::parse(&row.session_id)?,
        message_id: MessageId::parse(&row.message_id)?,
        uri: row.uri,
        mime_type: row.mime_type,
        size_bytes: i64_to_u64(row.size_bytes, "media-row-size-bytes")?,
        duration_ms: row
            .duration_ms
            .map(|value| i64_to_u64(value, "media-row-duration-ms"))
            .transpose()?,
        width_px: row
            .width_px
            .map(|value| i64_to_u32(value, "media-row-width-px"))
            .transpose()?,
        height_px: row
            .height_px
            .map(|value| i64_to_u32(value, "media-row-height-px"))
            .transpose()?,
        deleted_at_unix_seconds: row
            .deleted_at
            .map(|value| i64_to_u64(value, "media-row-deleted-at"))
            .transpose()?,
    })
}

async fn connect_store_connection(
    database_url: &str,
    stage: &'static str,
) -> StorageResult<SqliteConnection> {
    let mut connection =
        SqliteConnection::connect(database_url)
            .await
            .context(SqliteConnectSnafu {
                stage,
                database_url: database_url.to_string(),
            })?;

    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(&mut connection)
        .await
        .context(SqlitePragmaSnafu {
            stage: "sqlite-store-pragma-foreign-keys",
            pragma: "foreign_keys",
        })?;
    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&mut connection)
        .await
        .context(SqlitePragmaSnafu {
            stage: "sqlite-store-pragma-busy-timeout",
            pragma: "busy_timeout",
        })?;

    Ok(connection)
}

async fn session_exists(
    connection: &mut SqliteConnection,
    session_id: SessionId,
) -> StorageResult<bool> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT 1 FROM sessions WHERE id = ? LIMIT 1")
        .bind(session_id.to_string())
        .fetch_optional(&mut *connection)
        .await
        .context(SqliteQuerySnafu {
            stage: "session-exists-query",
        })?;

    Ok(existing.is_some())
}

async fn ensure_session_in_scope(
    connection: &mut SqliteConnection,
    session_id: SessionId,
    stage: &'static str,
) -> StorageResult<()> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM sessions WHERE id = ? AND deleted_at IS NULL LIMIT 1",
    )
    .bind(session_id.to_string())
    .fetch_optional(&mut *connection)
    .await
    .context(SqliteQuerySnafu { stage })?;

    if existing.is_none() {
        return NotFoundSnafu {
            stage,
            entity: "session",
            id: session_id.to_string(),
        }
        .fail();
    }

    Ok(())
}

async fn ensure_message_in_session(
    connection: &mut SqliteConnection,
    session_id: SessionId,
    message_id: MessageId,
    stage: &'static str,
) -> StorageResult<()> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM messages WHERE session_id = ? AND id = ? AND deleted_at IS NULL LIMIT 1",
    )
    .bind(session_id.to_string())
    .bind(message_id.to_string())
    .fetch_optional(&mut *connection)
    .await
    .context(SqliteQuerySnafu {
        stage: "message-exists-in-scope-query",
    })?;

    if existing.is_none() {
        return NotFoundSnafu {
            stage,
            entity: "message",
            id: message_id.to_string(),
        }
        .fail();
    }

    Ok(())
}

async fn media_ref_exists_in_scope(
    connection: &mut SqliteConnection,
    session_id: SessionId,
    message_id: MessageId,
    media_ref_id: MediaRefId,
) -> StorageResult<bool> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM media_refs WHERE session_id = ? AND message_id = ? AND id = ? LIMIT 1",
    )
    .bind(session_id.to_string())
    .bind(message_id.to_string())
    .bind(media_ref_id.to_string())
    .fetch_optional(&mut *connection)
    .await
    .context(SqliteQuerySnafu {
        stage: "media-ref-exists-in-scope-query",
    })?;

    Ok(existing.is_some())
}

fn role_to_sql(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn role_from_sql(raw: &str) -> StorageResult<MessageRole> {
    match raw {
        "system" => Ok(MessageRole::System),
        "user" => Ok(MessageRole::User),
        "assistant" => Ok(MessageRole::Assistant),
        _ => InvariantViolationSnafu {
            stage: "message-role-from-sql",
            details: format!("unknown message role '{raw}'"),
        }
        .fail(),
    }
}

fn unix_timestamp_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0_i64, |duration| duration.as_secs() as i64)
}

fn i64_to_u64(value: i64, stage: &'static str) -> StorageResult<u64> {
    value
        .try_into()
        .map_err(|_| super::error::StorageError::InvariantViolation {
            stage,
            details: format!("negative sqlite integer '{value}' cannot map to u64"),
        })
}

fn i64_to_u32(value: i64, stage: &'static str) -> StorageResult<u32> {
    value
        .try_into()
        .map_err(|_| super::error::StorageError::InvariantViolation {
            stage,
            details: format!("sqlite integer '{value}' cannot map to u32"),
        })
}

fn u64_to_i64(value: u64, stage: &'static str) -> StorageResult<i64> {
    value
        .try_into()
        .map_err(|_| super::error::StorageError::InvariantViolation {
            stage,
            details: format!("u64 '{value}' cannot map to sqlite i64"),
        })
}

fn validate_media_uri(uri: &str, stage: &'static str) -> StorageResult<()> {
    let uri_lower = uri.to_ascii_lowercase();
    let is_blob_like = uri_lower.starts_with("data:") || uri_lower.contains(";base64,");
    if is_blob_like {
        return ConflictSnafu {
            stage,
            entity: "media_ref",
            details: "blob payloads are not allowed; store URI/path references only".to_string(),
        }
        .fail();
    }

    Ok(())
}

fn ensure_database_directory(database_location: &str) -> StorageResult<()> {
    if database_location.starts_with("sqlite:") || database_location == ":memory:" {
        return Ok(());
    }

    let path = Path::new(database_location);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context(CreateSqliteDirectorySnafu {
            stage: "sqlite-open-create-directory",
            path: parent.display().to_string(),
        })?;
    }

    Ok(())
}

fn normalize_database_url(database_location: &str) -> String {
    if database_location.starts_with("sqlite:") {
        return database_location.to_string();
    }

    if database_location == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    format!("sqlite://{database_location}")
}
