use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::str::FromStr;

use snafu::{OptionExt, ResultExt, Snafu};

use montage_storage::{
    DEFAULT_SESSION_TITLE, MediaRefId, MediaStore, MessageId, MessagePatch, MessageRole,
    MessageStore, NewMediaRef, NewMessage, NewSession, SessionId, SessionPatch, SessionStore,
    SqliteStorage, StorageError,
};

#[derive(Debug, Clone)]
struct RunnerArgs {
    scenario: Scenario,
    db_path: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Scenario {
    IdRoundtrip,
    IdInvalid,
    SchemaInit,
    SessionCrud,
    MessageOrdering,
    CrossSessionGuard,
    MediaRefRoundtrip,
    MediaBlobGuard,
    All,
}

impl Scenario {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id_roundtrip" => Some(Self::IdRoundtrip),
            "id_invalid" => Some(Self::IdInvalid),
            "schema_init" => Some(Self::SchemaInit),
            "session_crud" => Some(Self::SessionCrud),
            "message_ordering" => Some(Self::MessageOrdering),
            "cross_session_guard" => Some(Self::CrossSessionGuard),
            "media_ref_roundtrip" => Some(Self::MediaRefRoundtrip),
            "media_blob_guard" => Some(Self::MediaBlobGuard),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::IdRoundtrip => "id_roundtrip",
            Self::IdInvalid => "id_invalid",
            Self::SchemaInit => "schema_init",
            Self::SessionCrud => "session_crud",
            Self::MessageOrdering => "message_ordering",
            Self::CrossSessionGuard => "cross_session_guard",
            Self::MediaRefRoundtrip => "media_ref_roundtrip",
            Self::MediaBlobGuard => "media_blob_guard",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Snafu)]
enum RunnerError {
    #[snafu(display("missing required --scenario argument"))]
    MissingScenario { stage: &'static str },
    #[snafu(display("missing value for argument '{arg}'"))]
    MissingArgumentValue {
        stage: &'static str,
        arg: &'static str,
    },
    #[snafu(display("unknown scenario '{raw}'"))]
    UnknownScenario { stage: &'static str, raw: String },
    #[snafu(display("unknown argument '{raw}'"))]
    UnknownArgument { stage: &'static str, raw: String },
    #[snafu(display("storage validation failed: {source}"))]
    StorageValidation {
        stage: &'static str,
        source: StorageError,
    },
    #[snafu(display("missing required --db argument for scenario '{scenario}'"))]
    MissingDbPath {
        stage: &'static str,
        scenario: &'static str,
    },
    #[snafu(display("sqlite query failed: {source}"))]
    SqliteQuery {
        stage: &'static str,
        source: sqlx::Error,
    },
    #[snafu(display("scenario '{scenario}' failed: {reason}"))]
    ScenarioFailed {
        stage: &'static str,
        scenario: &'static str,
        reason: String,
    },
    #[snafu(display("file operation failed at '{path}': {source}"))]
    FileIo {
        stage: &'static str,
        path: String,
        source: std::io::Error,
    },
}

type RunnerResult<T> = Result<T, RunnerError>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        println!("runner_ok=false");
        eprintln!("runner_error={error}");
        std::process::exit(1);
    }
}

async fn run() -> RunnerResult<()> {
    let args = parse_args(env::args().skip(1))?;
    println!("scenario={}", args.scenario.name());
    if let Some(db_path) = args.db_path.as_deref() {
        println!("db_path={db_path}");
    }

    match args.scenario {
        Scenario::IdRoundtrip => run_id_roundtrip(),
        Scenario::IdInvalid => run_id_invalid(),
        Scenario::SchemaInit => run_schema_init(require_db_path(&args, "schema_init")?).await,
        Scenario::SessionCrud => run_session_crud(require_db_path(&args, "session_crud")?).await,
        Scenario::MessageOrdering => {
            run_message_ordering(require_db_path(&args, "message_ordering")?).await
        }
        Scenario::CrossSessionGuard => {
            run_cross_session_guard(require_db_path(&args, "cross_session_guard")?).await
        }
        Scenario::MediaRefRoundtrip => {
            run_media_ref_roundtrip(require_db_path(&args, "media_ref_roundtrip")?).await
        }
        Scenario::MediaBlobGuard => {
            run_media_blob_guard(require_db_path(&args, "media_blob_guard")?).await
        }
        Scenario::All => run_all(args.db_path.as_deref()).await,
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> RunnerResult<RunnerArgs> {
    let mut scenario = None;
    let mut db_path = None;
    let mut pending = args.into_iter();

    // The parser is intentionally strict to keep scenario execution deterministic in CI.
    while let Some(argument) = pending.next() {
        match argument.as_str() {
            "--scenario" => {
                let value = pending.next().context(MissingArgumentValueSnafu {
                    stage: "parse-args-scenario-value",
                    arg: "--scenario",
                })?;

                let parsed = Scenario::parse(&value).context(UnknownScenarioSnafu {
                    stage: "parse-args-scenario",
                    raw: value,
                })?;
                scenario = Some(parsed);
            }
            "--db" => {
                let value = pending.next().context(MissingArgumentValueSnafu {
                    stage: "parse-args-db-value",
                    arg: "--db",
                })?;
                db_path = Some(value);
            }
            _ => {
                return UnknownArgumentSnafu {
                    stage: "parse-args",
                    raw: argument,
                }
                .fail();
            }
        }
    }

    Ok(RunnerArgs {
        scenario: scenario.context(MissingScenarioSnafu {
            stage: "parse-args-scenario-required",
        })?,
        db_path,
    })
}

fn run_id_roundtrip() -> RunnerResult<()> {
    assert_id_roundtrip("session_id", SessionId::new_v7())?;
    assert_id_roundtrip("message_id", MessageId::new_v7())?;
    assert_id_roundtrip("media_ref_id", MediaRefId::new_v7())?;
    println!("id_roundtrip=true");
    println!("runner_ok=true");
    Ok(())
}

fn run_id_invalid() -> RunnerResult<()> {
    let invalid_input = "not-a-valid-uuid";
    let invalid_id_error = invalid_input_is_rejected::<SessionId>(invalid_input)
        && invalid_input_is_rejected::<MessageId>(invalid_input)
        && invalid_input_is_rejected::<MediaRefId>(invalid_input);

    println!("invalid_id_error={invalid_id_error}");
    if !invalid_id_error {
        return ScenarioFailedSnafu {
            stage: "scenario-id-invalid",
            scenario: "id_invalid",
            reason: "at least one ID wrapper accepted malformed UUID input".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_all(db_path: Option<&str>) -> RunnerResult<()> {
    run_id_roundtrip()?;
    run_id_invalid()?;

    if let Some(path) = db_path {
        run_schema_init(path).await?;
        run_session_crud(path).await?;
        run_message_ordering(path).await?;
        run_cross_session_guard(path).await?;
        run_media_ref_roundtrip(path).await?;
        run_media_blob_guard(path).await?;
    }

    println!("all_passed=true");
    Ok(())
}

async fn run_schema_init(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-schema-init-open",
        })?;
    let pool = storage.pool();

    let discovered_tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('sessions', 'messages', 'media_refs')",
    )
    .fetch_all(pool)
    .await
    .context(SqliteQuerySnafu {
        stage: "scenario-schema-init-list-tables",
    })?;

    let required_tables = ["sessions", "messages", "media_refs"];
    let available_tables: HashSet<String> = discovered_tables.into_iter().collect();
    let schema_ok = required_tables
        .iter()
        .all(|table_name| available_tables.contains(*table_name));

    let journal_mode = sqlx::query_scalar::<_, String>("PRAGMA journal_mode;")
        .fetch_one(pool)
        .await
        .context(SqliteQuerySnafu {
            stage: "scenario-schema-init-journal-mode",
        })?
        .to_lowercase();
    let foreign_keys = sqlx::query_scalar::<_, i64>("PRAGMA foreign_keys;")
        .fetch_one(pool)
        .await
        .context(SqliteQuerySnafu {
            stage: "scenario-schema-init-foreign-keys",
        })?;

    println!("schema_tables_ok={schema_ok}");
    println!("journal_mode={journal_mode}");
    println!("foreign_keys={foreign_keys}");

    if !schema_ok || journal_mode != "wal" || foreign_keys != 1 {
        return ScenarioFailedSnafu {
            stage: "scenario-schema-init-verify",
            scenario: "schema_init",
            reason: "schema tables or connection pragmas did not match expectations".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_session_crud(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-open",
        })?;

    let created = storage
        .create_session(NewSession {
            title: "   ".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-create",
        })?;
    let default_title_applied = created.title == DEFAULT_SESSION_TITLE;

    let renamed = storage
        .update_session(
            created.id,
            SessionPatch {
                title: Some("Rough cut review".to_string()),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-rename",
        })?;

    let listed = storage
        .list_sessions(false)
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-list",
        })?;
    let visible_after_rename = listed.iter().any(|session| session.id == created.id);

    storage
        .soft_delete_session(created.id)
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-soft-delete",
        })?;
    let listed_after_delete = storage
        .list_sessions(false)
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-list-after-delete",
        })?;
    let hidden_after_delete = !listed_after_delete
        .iter()
        .any(|session| session.id == created.id);

    storage
        .restore_session(created.id)
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-restore",
        })?;
    let restored = storage
        .get_session(created.id)
        .context(StorageValidationSnafu {
            stage: "scenario-session-crud-get-restored",
        })?
        .is_some_and(|session| session.deleted_at_unix_seconds.is_none());

    println!("default_title_applied={default_title_applied}");
    println!("rename_applied={}", renamed.title == "Rough cut review");
    println!("visible_after_rename={visible_after_rename}");
    println!("hidden_after_delete={hidden_after_delete}");
    println!("restored={restored}");

    if !(default_title_applied
        && renamed.title == "Rough cut review"
        && visible_after_rename
        && hidden_after_delete
        && restored)
    {
        return ScenarioFailedSnafu {
            stage: "scenario-session-crud-verify",
            scenario: "session_crud",
            reason: "session lifecycle did not round-trip as expected".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_message_ordering(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-message-ordering-open",
        })?;

    let session = storage
        .create_session(NewSession {
            title: "Ordering".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-message-ordering-create-session",
        })?;

    let roles = [MessageRole::User, MessageRole::Assistant, MessageRole::User];
    let mut appended = Vec::new();
    for (index, role) in roles.into_iter().enumerate() {
        let record = storage
            .append_message(
                session.id,
                NewMessage {
                    role,
                    content: format!("turn-{index}"),
                },
            )
            .context(StorageValidationSnafu {
                stage: "scenario-message-ordering-append",
            })?;
        appended.push(record);
    }

    let seq_monotonic = appended
        .windows(2)
        .all(|pair| pair[1].seq == pair[0].seq + 1);

    let listed = storage
        .list_messages(session.id)
        .context(StorageValidationSnafu {
            stage: "scenario-message-ordering-list",
        })?;
    let listed_in_order = listed
        .iter()
        .map(|message| message.content.as_str())
        .eq(["turn-0", "turn-1", "turn-2"]);

    let edited = storage
        .update_message(
            session.id,
            appended[1].id,
            MessagePatch {
                content: Some("turn-1 (edited)".to_string()),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-message-ordering-update",
        })?;

    println!("seq_monotonic={seq_monotonic}");
    println!("listed_in_order={listed_in_order}");
    println!("edit_applied={}", edited.content == "turn-1 (edited)");
    println!("edit_kept_seq={}", edited.seq == appended[1].seq);

    if !(seq_monotonic && listed_in_order && edited.seq == appended[1].seq) {
        return ScenarioFailedSnafu {
            stage: "scenario-message-ordering-verify",
            scenario: "message_ordering",
            reason: "message seq assignment or ordering regressed".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_cross_session_guard(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-cross-session-open",
        })?;

    let session_a = storage
        .create_session(NewSession {
            title: "A".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-cross-session-create-a",
        })?;
    let session_b = storage
        .create_session(NewSession {
            title: "B".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-cross-session-create-b",
        })?;

    let message_a = storage
        .append_message(
            session_a.id,
            NewMessage {
                role: MessageRole::User,
                content: "belongs to A".to_string(),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-cross-session-append",
        })?;

    // A message id must not be addressable through a different session scope.
    let cross_get = storage
        .get_message(session_b.id, message_a.id)
        .context(StorageValidationSnafu {
            stage: "scenario-cross-session-get",
        })?;
    let cross_update = storage.update_message(
        session_b.id,
        message_a.id,
        MessagePatch {
            content: Some("hijacked".to_string()),
        },
    );

    let get_scoped = cross_get.is_none();
    let update_scoped = matches!(cross_update, Err(StorageError::NotFound { .. }));

    println!("get_scoped={get_scoped}");
    println!("update_scoped={update_scoped}");

    if !(get_scoped && update_scoped) {
        return ScenarioFailedSnafu {
            stage: "scenario-cross-session-verify",
            scenario: "cross_session_guard",
            reason: "message access leaked across session boundaries".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_media_ref_roundtrip(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-open",
        })?;

    let session = storage
        .create_session(NewSession {
            title: "Media".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-create-session",
        })?;
    let message = storage
        .append_message(
            session.id,
            NewMessage {
                role: MessageRole::User,
                content: "attached a clip".to_string(),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-append-message",
        })?;

    let attached = storage
        .attach_media(
            session.id,
            message.id,
            NewMediaRef {
                uri: "file:///library/intro.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                size_bytes: 4_194_304,
                duration_ms: Some(12_500),
                width_px: Some(1_920),
                height_px: Some(1_080),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-attach",
        })?;

    let listed = storage
        .list_media(session.id, message.id, false)
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-list",
        })?;
    let roundtrip_ok = listed.len() == 1 && listed[0] == attached;

    storage
        .soft_delete_media(session.id, message.id, attached.id)
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-soft-delete",
        })?;
    let visible_after_delete = storage
        .list_media(session.id, message.id, false)
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-list-after-delete",
        })?;
    let deleted_rows_visible = storage
        .list_media(session.id, message.id, true)
        .context(StorageValidationSnafu {
            stage: "scenario-media-roundtrip-list-deleted",
        })?;

    println!("roundtrip_ok={roundtrip_ok}");
    println!("hidden_after_delete={}", visible_after_delete.is_empty());
    println!("soft_deleted_retained={}", deleted_rows_visible.len() == 1);

    if !(roundtrip_ok && visible_after_delete.is_empty() && deleted_rows_visible.len() == 1) {
        return ScenarioFailedSnafu {
            stage: "scenario-media-roundtrip-verify",
            scenario: "media_ref_roundtrip",
            reason: "media ref lifecycle did not round-trip as expected".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

async fn run_media_blob_guard(db_path: &str) -> RunnerResult<()> {
    reset_sqlite_files(db_path)?;
    let storage = SqliteStorage::open(db_path)
        .await
        .context(StorageValidationSnafu {
            stage: "scenario-media-blob-open",
        })?;

    let session = storage
        .create_session(NewSession {
            title: "Blobs".to_string(),
        })
        .context(StorageValidationSnafu {
            stage: "scenario-media-blob-create-session",
        })?;
    let message = storage
        .append_message(
            session.id,
            NewMessage {
                role: MessageRole::User,
                content: "pasted an image".to_string(),
            },
        )
        .context(StorageValidationSnafu {
            stage: "scenario-media-blob-append-message",
        })?;

    let attach_result = storage.attach_media(
        session.id,
        message.id,
        NewMediaRef {
            uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 16,
            duration_ms: None,
            width_px: None,
            height_px: None,
        },
    );
    let blob_rejected = matches!(attach_result, Err(StorageError::Conflict { .. }));

    println!("blob_rejected={blob_rejected}");
    if !blob_rejected {
        return ScenarioFailedSnafu {
            stage: "scenario-media-blob-verify",
            scenario: "media_blob_guard",
            reason: "inline blob URI was accepted as a media reference".to_string(),
        }
        .fail();
    }

    println!("runner_ok=true");
    Ok(())
}

fn reset_sqlite_files(db_path: &str) -> RunnerResult<()> {
    for suffix in ["", "-wal", "-shm"] {
        let path_string = format!("{db_path}{suffix}");
        let path = Path::new(&path_string);
        if path.exists() {
            std::fs::remove_file(path).context(FileIoSnafu {
                stage: "reset-sqlite-files",
                path: path_string.clone(),
            })?;
        }
    }

    Ok(())
}

fn assert_id_roundtrip<T>(label: &'static str, id: T) -> RunnerResult<()>
where
    T: FromStr<Err = StorageError> + std::fmt::Display + PartialEq + Copy,
{
    let parsed = T::from_str(&id.to_string()).context(StorageValidationSnafu {
        stage: "assert-id-roundtrip-parse",
    })?;

    if parsed != id {
        return ScenarioFailedSnafu {
            stage: "assert-id-roundtrip-compare",
            scenario: "id_roundtrip",
            reason: format!("{label} did not round-trip through Display/FromStr"),
        }
        .fail();
    }

    Ok(())
}

fn invalid_input_is_rejected<T>(raw: &str) -> bool
where
    T: FromStr<Err = StorageError>,
{
    matches!(T::from_str(raw), Err(StorageError::InvalidId { .. }))
}

fn require_db_path<'a>(args: &'a RunnerArgs, scenario: &'static str) -> RunnerResult<&'a str> {
    args.db_path.as_deref().context(MissingDbPathSnafu {
        stage: "require-db-path",
        scenario,
    })
}
