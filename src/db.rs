use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_local_cache_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS flags (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS record_cache (
    day TEXT PRIMARY KEY,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    entries_json TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_record_cache_month ON record_cache(year, month);
"#,
    },
    Migration {
        version: 2,
        name: "reward_cache_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS reward_cache (
    id INTEGER PRIMARY KEY,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    image_url TEXT,
    json_url TEXT,
    sound_url TEXT,
    hidden INTEGER NOT NULL DEFAULT 0,
    hidden_read INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS equipped_reward (
    year INTEGER NOT NULL,
    month INTEGER NOT NULL,
    category TEXT NOT NULL,
    reward_id INTEGER NOT NULL,
    PRIMARY KEY (year, month, category)
);

CREATE TABLE IF NOT EXISTS reward_resource (
    url TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reward_cache_category ON reward_cache(category);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH.to_string())
}

#[cfg(test)]
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn get_flag(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM flags WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_flag(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO flags (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![key, value],
    )?;
    Ok(())
}

pub fn list_flags(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM flags ORDER BY key")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push((row.get(0)?, row.get(1)?));
    }
    Ok(result)
}

/// A cached day. `entries_json == None` is the no-spending marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCacheRow {
    pub day: String,
    pub entries_json: Option<String>,
}

pub struct UpsertRecord<'a> {
    pub day: &'a str,
    pub year: i32,
    pub month: u8,
    pub entries_json: Option<&'a str>,
}

pub fn upsert_record(conn: &Connection, args: &UpsertRecord<'_>) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO record_cache (day, year, month, entries_json, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(day) DO UPDATE SET
    entries_json = excluded.entries_json,
    updated_at = excluded.updated_at
"#,
        params![
            args.day,
            args.year,
            args.month,
            args.entries_json,
            now_utc_rfc3339()
        ],
    )?;
    Ok(())
}

pub fn get_record(conn: &Connection, day: &str) -> Result<Option<RecordCacheRow>> {
    conn.query_row(
        "SELECT day, entries_json FROM record_cache WHERE day = ?1",
        params![day],
        |row| {
            Ok(RecordCacheRow {
                day: row.get(0)?,
                entries_json: row.get(1)?,
            })
        },
    )
    .optional()
}

pub fn list_records_in_month(
    conn: &Connection,
    year: i32,
    month: u8,
) -> Result<Vec<RecordCacheRow>> {
    let mut stmt = conn.prepare(
        r#"
SELECT day, entries_json
FROM record_cache
WHERE year = ?1 AND month = ?2
ORDER BY day ASC
"#,
    )?;
    let mut rows = stmt.query(params![year, month])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(RecordCacheRow {
            day: row.get(0)?,
            entries_json: row.get(1)?,
        });
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardRow {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub image_url: Option<String>,
    pub json_url: Option<String>,
    pub sound_url: Option<String>,
    pub hidden: bool,
    pub hidden_read: bool,
}

const REWARD_COLUMNS: &str =
    "id, category, name, image_url, json_url, sound_url, hidden, hidden_read";

fn reward_row(row: &rusqlite::Row<'_>) -> Result<RewardRow> {
    Ok(RewardRow {
        id: row.get(0)?,
        category: row.get(1)?,
        name: row.get(2)?,
        image_url: row.get(3)?,
        json_url: row.get(4)?,
        sound_url: row.get(5)?,
        hidden: row.get(6)?,
        hidden_read: row.get(7)?,
    })
}

pub fn upsert_reward(conn: &Connection, row: &RewardRow) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO reward_cache (
    id, category, name, image_url, json_url, sound_url, hidden, hidden_read
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    category = excluded.category,
    name = excluded.name,
    image_url = excluded.image_url,
    json_url = excluded.json_url,
    sound_url = excluded.sound_url,
    hidden = excluded.hidden,
    hidden_read = excluded.hidden_read
"#,
        params![
            row.id,
            row.category,
            row.name,
            row.image_url,
            row.json_url,
            row.sound_url,
            row.hidden,
            row.hidden_read
        ],
    )?;
    Ok(())
}

pub fn get_reward(conn: &Connection, id: i64) -> Result<Option<RewardRow>> {
    conn.query_row(
        &format!("SELECT {REWARD_COLUMNS} FROM reward_cache WHERE id = ?1"),
        params![id],
        reward_row,
    )
    .optional()
}

pub fn list_rewards(conn: &Connection) -> Result<Vec<RewardRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REWARD_COLUMNS} FROM reward_cache ORDER BY category ASC, id ASC"
    ))?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(reward_row(row)?);
    }
    Ok(result)
}

pub fn replace_equipped(
    conn: &mut Connection,
    year: i32,
    month: u8,
    equipped: &[(String, i64)],
) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM equipped_reward WHERE year = ?1 AND month = ?2",
        params![year, month],
    )?;
    for (category, reward_id) in equipped {
        tx.execute(
            r#"
INSERT INTO equipped_reward (year, month, category, reward_id)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(year, month, category) DO UPDATE SET reward_id = excluded.reward_id
"#,
            params![year, month, category, reward_id],
        )?;
    }
    tx.commit()
}

/// Equipped rewards of a month joined with the reward cache; equipped ids
/// missing from the cache are skipped.
pub fn list_equipped(conn: &Connection, year: i32, month: u8) -> Result<Vec<RewardRow>> {
    let mut stmt = conn.prepare(
        r#"
SELECT r.id, r.category, r.name, r.image_url, r.json_url, r.sound_url, r.hidden, r.hidden_read
FROM equipped_reward e
JOIN reward_cache r ON r.id = e.reward_id
WHERE e.year = ?1 AND e.month = ?2
ORDER BY e.category ASC
"#,
    )?;
    let mut rows = stmt.query(params![year, month])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(reward_row(row)?);
    }
    Ok(result)
}

pub fn put_resource_entry(conn: &Connection, url: &str, file_name: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO reward_resource (url, file_name, stored_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(url) DO UPDATE SET
    file_name = excluded.file_name,
    stored_at = excluded.stored_at
"#,
        params![url, file_name, now_utc_rfc3339()],
    )?;
    Ok(())
}

pub fn get_resource_entry(conn: &Connection, url: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT file_name FROM reward_resource WHERE url = ?1",
        params![url],
        |row| row.get(0),
    )
    .optional()
}

#[cfg(test)]
mod tests;
