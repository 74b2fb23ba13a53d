use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{milestones, pakts};
use crate::error::Result;
use crate::flows::{self, ImportOutcome};
use crate::models::{default_importance, Milestone, NewMilestone};

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    due_date: NaiveDate,
    #[serde(default)]
    importance: Option<i16>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    name: &'a str,
    due_date: NaiveDate,
    importance: i16,
    notes: &'a str,
    completed: bool,
    completed_at: Option<String>,
}

/// Parses `name,due_date,importance,notes` rows. Every row is validated first.
pub fn read_milestones<R: Read>(input: R) -> Result<Vec<NewMilestone>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut drafts = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let draft = NewMilestone {
            name: row.name,
            due_date: row.due_date,
            notes: row.notes.unwrap_or_default(),
            importance: row.importance.unwrap_or_else(default_importance),
            order_index: index as i32,
        };
        draft.validate()?;
        drafts.push(draft);
    }

    Ok(drafts)
}

pub fn write_milestones<W: Write>(output: W, rows: &[Milestone]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(output);
    for milestone in rows {
        writer.serialize(ExportRow {
            name: &milestone.name,
            due_date: milestone.due_date,
            importance: milestone.importance,
            notes: &milestone.notes,
            completed: milestone.completed,
            completed_at: milestone.completed_at.map(|ts| ts.to_rfc3339()),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads the whole file before writing, then appends every row in one transaction.
pub async fn import_milestones_csv(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    csv_path: &Path,
) -> Result<ImportOutcome> {
    let drafts = read_milestones(std::fs::File::open(csv_path)?)?;
    flows::import_milestones(pool, owner_id, pakt_id, &drafts).await
}

pub async fn export_milestones_csv(
    pool: &PgPool,
    owner_id: Uuid,
    pakt_id: Uuid,
    out: &Path,
) -> Result<usize> {
    let pakt = pakts::get(pool, owner_id, pakt_id).await?;
    let rows = milestones::list_for_pakt(pool, pakt.id).await?;
    write_milestones(std::fs::File::create(out)?, &rows)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaktError;
    use chrono::{TimeZone, Utc};

    #[test]
    fn reads_rows_with_optional_columns() {
        let input = "name,due_date,importance,notes\n\
                     Book physio,2026-02-01,4,bring referral\n\
                     Buy shoes,2026-02-10,,\n";
        let drafts = read_milestones(input.as_bytes()).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name, "Book physio");
        assert_eq!(drafts[0].importance, 4);
        assert_eq!(drafts[0].notes, "bring referral");
        assert_eq!(drafts[1].importance, 3);
        assert_eq!(drafts[1].notes, "");
        assert_eq!(drafts[1].order_index, 1);
    }

    #[test]
    fn rejects_importance_out_of_range() {
        let input = "name,due_date,importance,notes\nStretch,2026-02-01,9,\n";
        assert!(matches!(read_milestones(input.as_bytes()), Err(PaktError::Validation(_))));
    }

    #[test]
    fn rejects_malformed_dates() {
        let input = "name,due_date,importance,notes\nStretch,next week,3,\n";
        assert!(matches!(read_milestones(input.as_bytes()), Err(PaktError::Csv(_))));
    }

    #[test]
    fn writes_header_and_completion() {
        let done_at = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
        let rows = vec![Milestone {
            id: Uuid::new_v4(),
            pakt_id: Uuid::new_v4(),
            name: "Book physio".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            notes: "done early".to_string(),
            importance: 4,
            completed: true,
            completed_at: Some(done_at),
            order_index: 0,
        }];

        let mut buffer = Vec::new();
        write_milestones(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("name,due_date,importance,notes,completed,completed_at")
        );
        assert_eq!(
            lines.next(),
            Some("Book physio,2026-02-01,4,done early,true,2026-02-02T08:00:00+00:00")
        );
    }
}
