use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use super::LocalStore;
use crate::db::{self, RecordCacheRow, UpsertRecord};
use crate::domain::day::Day;
use crate::domain::record::{Record, RecordEntries};

/// Local record cache keyed by day. Failures are logged and read as a miss.
#[derive(Clone)]
pub struct RecordStore {
    store: Arc<LocalStore>,
}

impl RecordStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, record: &Record) {
        let entries_json = match record.records.as_ref().map(serde_json::to_string).transpose() {
            Ok(value) => value,
            Err(err) => {
                warn!(day = %record.day, error = %err, "failed to encode record entries");
                return;
            }
        };
        let conn = self.store.conn();
        let result = db::upsert_record(
            &conn,
            &UpsertRecord {
                day: &record.day.yyyymmdd(),
                year: record.day.year,
                month: record.day.month,
                entries_json: entries_json.as_deref(),
            },
        );
        if let Err(err) = result {
            warn!(day = %record.day, error = %err, "failed to cache record");
        }
    }

    pub fn save_all(&self, records: &[Record]) {
        for record in records {
            self.save(record);
        }
    }

    pub fn load(&self, day: Day) -> Option<Record> {
        let conn = self.store.conn();
        match db::get_record(&conn, &day.yyyymmdd()) {
            Ok(row) => row.and_then(decode_row),
            Err(err) => {
                warn!(day = %day, error = %err, "failed to read cached record");
                None
            }
        }
    }

    /// Cached records of a month in day order, or `None` when nothing is
    /// cached for that month.
    pub fn load_month(&self, year: i32, month: u8) -> Option<Vec<Record>> {
        let conn = self.store.conn();
        let rows = match db::list_records_in_month(&conn, year, month) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(year, month, error = %err, "failed to read cached month");
                return None;
            }
        };
        let records: Vec<Record> = rows.into_iter().filter_map(decode_row).collect();
        if records.is_empty() {
            None
        } else {
            Some(records)
        }
    }
}

fn decode_row(row: RecordCacheRow) -> Option<Record> {
    let day = match Day::from_str(&row.day) {
        Ok(day) => day,
        Err(err) => {
            warn!(error = %err, "skipping cached record with bad day");
            return None;
        }
    };
    let records = match row.entries_json {
        None => None,
        Some(raw) => match serde_json::from_str::<RecordEntries>(&raw) {
            Ok(entries) => Some(entries),
            Err(err) => {
                warn!(day = %day, error = %err, "skipping undecodable cached record");
                return None;
            }
        },
    };
    Some(Record { day, records })
}

#[cfg(test)]
mod tests {
    use super::RecordStore;
    use crate::domain::day::Day;
    use crate::domain::record::{Record, RecordCategory, RecordContent, RecordContentType};
    use crate::store::test_support::TempStore;

    #[test]
    fn saves_and_loads_contents_and_empty_marker() {
        let temp = TempStore::new();
        let records = RecordStore::new(temp.store.clone());
        let day = Day::new(2025, 5, 10).unwrap();
        let written = Record::new(
            day,
            vec![RecordContent::new(
                RecordContentType::Bad,
                RecordCategory::Impulse,
                "late-night snack",
            )],
        );
        records.save(&written);
        records.save(&Record::empty(day.next()));

        assert_eq!(records.load(day), Some(written));
        assert!(records.load(day.next()).unwrap().is_empty_marker());
        assert_eq!(records.load(day.previous()), None);
    }

    #[test]
    fn month_load_is_none_when_nothing_cached() {
        let temp = TempStore::new();
        let records = RecordStore::new(temp.store.clone());
        assert_eq!(records.load_month(2025, 1), None);

        records.save_all(&[
            Record::empty(Day::new(2025, 1, 3).unwrap()),
            Record::empty(Day::new(2025, 1, 1).unwrap()),
        ]);
        let month = records.load_month(2025, 1).unwrap();
        assert_eq!(month.len(), 2);
        assert_eq!(month[0].day, Day::new(2025, 1, 1).unwrap());
    }

    #[test]
    fn resaving_a_day_overwrites_it() {
        let temp = TempStore::new();
        let records = RecordStore::new(temp.store.clone());
        let day = Day::new(2025, 2, 2).unwrap();
        records.save(&Record::empty(day));
        let good = Record::new(
            day,
            vec![RecordContent::new(
                RecordContentType::Good,
                RecordCategory::Saving,
                "",
            )],
        );
        records.save(&good);
        assert_eq!(records.load(day), Some(good));
    }
}
