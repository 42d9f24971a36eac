use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Both tables are clustered on their primary key (`WITHOUT ROWID`), which is
/// (partition key, clustering key). Rows for one partition are therefore
/// stored together and scanned in clustering order.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (conversation index and messages)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE IF NOT EXISTS user_conversations (
                user_id                 TEXT NOT NULL,
                last_activity           INTEGER NOT NULL,
                conversation_id         TEXT NOT NULL,
                participant_ids         TEXT,
                last_message_preview    TEXT,
                PRIMARY KEY (user_id, last_activity DESC)
            ) WITHOUT ROWID;

            CREATE TABLE IF NOT EXISTS messages_by_conversation (
                conversation_id     TEXT NOT NULL,
                message_timestamp   INTEGER NOT NULL,
                message_id          TEXT NOT NULL,
                sender_id           TEXT NOT NULL,
                message_text        TEXT NOT NULL,
                PRIMARY KEY (conversation_id, message_timestamp DESC)
            ) WITHOUT ROWID;

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
