use super::{
    get_flag, get_meta, get_record, get_resource_entry, list_equipped, list_flags,
    list_records_in_month, list_rewards, open_connection, put_resource_entry, replace_equipped,
    set_flag, upsert_record, upsert_reward, RewardRow, UpsertRecord, CURRENT_SCHEMA_VERSION,
};
use rusqlite::params;
use uuid::Uuid;

fn unique_db_path() -> String {
    std::env::temp_dir()
        .join(format!("donmani-db-{}.sqlite", Uuid::now_v7()))
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let candidate = format!("{path}{suffix}");
        let _ = std::fs::remove_file(candidate);
    }
}

fn table_exists(conn: &rusqlite::Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
            params![table_name],
            |row| row.get(0),
        )
        .expect("table existence query should be readable");
    exists == 1
}

fn reward(id: i64, category: &str) -> RewardRow {
    RewardRow {
        id,
        category: category.to_string(),
        name: format!("reward-{id}"),
        image_url: Some(format!("https://cdn.example/{id}.png")),
        json_url: None,
        sound_url: None,
        hidden: false,
        hidden_read: false,
    }
}

#[test]
fn configures_connection_pragmas() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("journal_mode pragma should be readable");
    assert_eq!(journal_mode.to_uppercase(), "WAL");

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .expect("busy_timeout pragma should be readable");
    assert_eq!(busy_timeout, 5000);

    cleanup_db_files(&path);
}

#[test]
fn initializes_required_tables_and_schema_version() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    for table in [
        "schema_migrations",
        "meta",
        "flags",
        "record_cache",
        "reward_cache",
        "equipped_reward",
        "reward_resource",
    ] {
        assert!(table_exists(&conn, table), "missing table {table}");
    }

    let version = get_meta(&conn, "schema_version").expect("meta should be readable");
    assert_eq!(version, Some(CURRENT_SCHEMA_VERSION.to_string()));

    drop(conn);
    let reopened = open_connection(&path).expect("reopen should apply no new migrations");
    let applied: i64 = reopened
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
        .expect("migration count should be readable");
    assert_eq!(applied, CURRENT_SCHEMA_VERSION);

    cleanup_db_files(&path);
}

#[test]
fn flags_round_trip_and_overwrite() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    assert_eq!(get_flag(&conn, "streakSubmitCount").unwrap(), None);
    set_flag(&conn, "streakSubmitCount", "1").unwrap();
    set_flag(&conn, "streakSubmitCount", "2").unwrap();
    assert_eq!(
        get_flag(&conn, "streakSubmitCount").unwrap(),
        Some("2".to_string())
    );
    assert_eq!(list_flags(&conn).unwrap().len(), 1);

    cleanup_db_files(&path);
}

#[test]
fn record_rows_keep_empty_marker_and_month_scope() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    upsert_record(
        &conn,
        &UpsertRecord {
            day: "2025-05-02",
            year: 2025,
            month: 5,
            entries_json: None,
        },
    )
    .unwrap();
    upsert_record(
        &conn,
        &UpsertRecord {
            day: "2025-05-01",
            year: 2025,
            month: 5,
            entries_json: Some("{}"),
        },
    )
    .unwrap();
    upsert_record(
        &conn,
        &UpsertRecord {
            day: "2025-06-01",
            year: 2025,
            month: 6,
            entries_json: Some("{}"),
        },
    )
    .unwrap();

    let may = list_records_in_month(&conn, 2025, 5).unwrap();
    assert_eq!(may.len(), 2);
    assert_eq!(may[0].day, "2025-05-01");
    assert_eq!(get_record(&conn, "2025-05-02").unwrap().unwrap().entries_json, None);
    assert!(get_record(&conn, "2025-05-03").unwrap().is_none());

    cleanup_db_files(&path);
}

#[test]
fn equipped_rewards_replace_per_month_and_join_cache() {
    let path = unique_db_path();
    let mut conn = open_connection(&path).expect("connection should open");

    upsert_reward(&conn, &reward(1, "background")).unwrap();
    upsert_reward(&conn, &reward(24, "bottle")).unwrap();
    assert_eq!(list_rewards(&conn).unwrap().len(), 2);

    replace_equipped(
        &mut conn,
        2025,
        5,
        &[("background".to_string(), 1), ("bottle".to_string(), 24)],
    )
    .unwrap();
    replace_equipped(&mut conn, 2025, 5, &[("bottle".to_string(), 24)]).unwrap();
    replace_equipped(&mut conn, 2025, 6, &[("effect".to_string(), 99)]).unwrap();

    let may = list_equipped(&conn, 2025, 5).unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].id, 24);
    assert!(list_equipped(&conn, 2025, 6).unwrap().is_empty());

    cleanup_db_files(&path);
}

#[test]
fn resource_entries_map_urls_to_files() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    put_resource_entry(&conn, "https://cdn.example/a.png", "abc.png").unwrap();
    assert_eq!(
        get_resource_entry(&conn, "https://cdn.example/a.png").unwrap(),
        Some("abc.png".to_string())
    );
    assert_eq!(get_resource_entry(&conn, "https://cdn.example/b.png").unwrap(), None);

    cleanup_db_files(&path);
}
