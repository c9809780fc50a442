use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id                  TEXT PRIMARY KEY,
                email               TEXT NOT NULL UNIQUE,
                name                TEXT NOT NULL DEFAULT '',
                password_hash       TEXT NOT NULL,
                email_verified      INTEGER NOT NULL DEFAULT 0,
                verification_token  TEXT,
                created_at          TEXT NOT NULL,
                verified_at         TEXT
            );

            CREATE TABLE IF NOT EXISTS listings (
                id              TEXT PRIMARY KEY,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL DEFAULT '',
                price           REAL NOT NULL,
                category        TEXT NOT NULL,
                condition       TEXT NOT NULL,
                campus          TEXT NOT NULL,
                images          TEXT NOT NULL DEFAULT '[]',
                seller_name     TEXT NOT NULL DEFAULT '',
                seller_email    TEXT NOT NULL,
                status          TEXT NOT NULL,
                location        TEXT NOT NULL DEFAULT '',
                created_date    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id              TEXT PRIMARY KEY,
                listing_id      TEXT NOT NULL,
                sender_email    TEXT NOT NULL,
                sender_name     TEXT NOT NULL DEFAULT '',
                receiver_email  TEXT NOT NULL,
                content         TEXT NOT NULL,
                read            INTEGER NOT NULL DEFAULT 0,
                created_date    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                id              TEXT PRIMARY KEY,
                listing_id      TEXT NOT NULL,
                reporter_email  TEXT NOT NULL,
                reason          TEXT NOT NULL,
                created_date    TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_listings_seller_email ON listings(seller_email);
            CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);
            CREATE INDEX IF NOT EXISTS idx_messages_listing ON messages(listing_id);
            CREATE INDEX IF NOT EXISTS idx_messages_participants
                ON messages(sender_email, receiver_email);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
