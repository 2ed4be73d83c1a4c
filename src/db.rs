//! Calculation history stored in SQLite

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;

use crate::models::MixOutcome;

/// Number of entries the `history list` command shows by default
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// A saved calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    /// Unix time in milliseconds
    pub created_at_ms: i64,
    /// "STD" or "AI"
    pub mode: String,
    pub form_data: Value,
    pub outcome: MixOutcome,
}

impl std::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.outcome.proportions();
        write!(
            f,
            "#{:<4} {:<3} {:<4} W/B {:.3}  water {:.0}  cement {:.0}  sand {:.0}  stone {:.0}  ({})",
            self.id,
            self.mode,
            self.outcome.strength_grade(),
            self.outcome.wcr(),
            p.water,
            p.cement,
            p.sand,
            p.stone,
            self.created_at_ms
        )
    }
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS mix_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at_ms INTEGER NOT NULL,
            mode TEXT NOT NULL,
            form_data TEXT NOT NULL,
            outcome TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_mix_history_created ON mix_history(created_at_ms);
        "#,
    )?;
    Ok(())
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Save a calculation and return its id
pub fn insert_entry(conn: &Connection, form_data: &Value, outcome: &MixOutcome) -> Result<i64> {
    insert_entry_at(conn, now_ms(), form_data, outcome)
}

fn insert_entry_at(
    conn: &Connection,
    created_at_ms: i64,
    form_data: &Value,
    outcome: &MixOutcome,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO mix_history (created_at_ms, mode, form_data, outcome)
         VALUES (?1, ?2, ?3, ?4)",
        (
            created_at_ms,
            outcome.mode(),
            serde_json::to_string(form_data)?,
            serde_json::to_string(outcome)?,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

type RawEntry = (i64, i64, String, String, String);

fn raw_entry(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode((id, created_at_ms, mode, form_data, outcome): RawEntry) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id,
        created_at_ms,
        mode,
        form_data: serde_json::from_str(&form_data)
            .with_context(|| format!("Corrupt form data in history entry {}", id))?,
        outcome: serde_json::from_str(&outcome)
            .with_context(|| format!("Corrupt outcome in history entry {}", id))?,
    })
}

/// Most recent entries first
pub fn recent_entries(conn: &Connection, limit: usize) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, created_at_ms, mode, form_data, outcome
         FROM mix_history
         ORDER BY created_at_ms DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit as i64], raw_entry)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(decode(row?)?);
    }
    Ok(results)
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<HistoryEntry>> {
    let raw = conn
        .query_row(
            "SELECT id, created_at_ms, mode, form_data, outcome FROM mix_history WHERE id = ?1",
            [id],
            raw_entry,
        )
        .optional()?;
    raw.map(decode).transpose()
}

/// Delete one entry; returns whether it existed
pub fn delete_entry(conn: &Connection, id: i64) -> Result<bool> {
    let removed = conn.execute("DELETE FROM mix_history WHERE id = ?1", [id])?;
    Ok(removed > 0)
}

/// Delete every entry; returns how many were removed
pub fn clear_history(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM mix_history", [])?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{MixProportions, Recommendation};

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn recommendation(grade: &str) -> MixOutcome {
        MixOutcome::Recommended(Recommendation {
            proportions: MixProportions {
                water: 175.0,
                cement: 300.0,
                sand: 760.0,
                stone: 1080.0,
                ..Default::default()
            },
            wcr: 0.45,
            sand_ratio: 41.3,
            strength_grade: grade.to_string(),
            notes: String::new(),
            referenced_standards: vec!["JGJ 55-2011".into()],
        })
    }

    #[test]
    fn schema_init_is_idempotent() {
        let conn = memory_db();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn insert_and_read_back() {
        let conn = memory_db();
        let form = json!({"grade": "C30"});
        let outcome = recommendation("C30");
        let id = insert_entry(&conn, &form, &outcome).unwrap();

        let entry = get_entry(&conn, id).unwrap().unwrap();
        assert_eq!(entry.mode, "AI");
        assert_eq!(entry.form_data, form);
        assert_eq!(entry.outcome, outcome);
        assert!(get_entry(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn standard_results_survive_the_round_trip() {
        let conn = memory_db();
        let request = crate::models::MixDesignRequest {
            strength_grade: Some("C30".into()),
            slump: Some(70.0),
            aggregate_type: Some("卵石".into()),
            max_size: Some(31.5),
            cement_strength_28d: Some(45.0),
            ..Default::default()
        };
        let result = crate::calculator::design(&request).unwrap();
        let outcome = MixOutcome::Standard(result);
        let id = insert_entry(&conn, &serde_json::to_value(&request).unwrap(), &outcome).unwrap();

        let entry = get_entry(&conn, id).unwrap().unwrap();
        assert_eq!(entry.mode, "STD");
        assert_eq!(entry.outcome, outcome);
    }

    #[test]
    fn recent_entries_newest_first_and_limited() {
        let conn = memory_db();
        for (i, grade) in ["C20", "C25", "C30", "C35", "C40", "C45"].iter().enumerate() {
            insert_entry_at(&conn, 1_000 + i as i64, &json!({}), &recommendation(grade)).unwrap();
        }

        let recent = recent_entries(&conn, DEFAULT_HISTORY_LIMIT).unwrap();
        let grades: Vec<&str> = recent.iter().map(|e| e.outcome.strength_grade()).collect();
        assert_eq!(grades, vec!["C45", "C40", "C35", "C30", "C25"]);
    }

    #[test]
    fn delete_and_clear() {
        let conn = memory_db();
        let a = insert_entry(&conn, &json!({}), &recommendation("C30")).unwrap();
        insert_entry(&conn, &json!({}), &recommendation("C35")).unwrap();

        assert!(delete_entry(&conn, a).unwrap());
        assert!(!delete_entry(&conn, a).unwrap());
        assert_eq!(recent_entries(&conn, 10).unwrap().len(), 1);

        assert_eq!(clear_history(&conn).unwrap(), 1);
        assert!(recent_entries(&conn, 10).unwrap().is_empty());
    }
}
