use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Amount, Donation, LeafPlacement};

/// Errors that can occur when reading or writing csv rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: invalid {field} timestamp '{value}'")]
    InvalidTimestamp {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: amount is not a finite number in range")]
    InvalidAmount { line: usize },

    #[error("failed to write placements: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush placements: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Debug, Deserialize)]
struct InputRow {
    id: String,
    username: String,
    #[serde(default)]
    message: String,
    amount: f64,
    created: String,
    updated: String,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    tint: String,
    brightness: f64,
}

/// Accepts RFC 3339 and the backend's `2024-12-01 10:00:00.123Z` form.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.fZ")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Read donations from a csv file, in file order
pub fn read_donations(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Donation, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let amount =
                Amount::try_from_float(row.amount).ok_or(CsvError::InvalidAmount { line })?;
            let timestamp = |field: &'static str, value: String| {
                parse_timestamp(&value).ok_or(CsvError::InvalidTimestamp { line, field, value })
            };
            Ok(Donation {
                created: timestamp("created", row.created)?,
                updated: timestamp("updated", row.updated)?,
                id: row.id,
                username: row.username,
                message: row.message,
                amount,
            })
        }))
}

/// Write placements in csv format (`id,x,y,tint,brightness`)
pub fn write_placements<'a, W: io::Write>(
    writer: W,
    placements: impl IntoIterator<Item = &'a LeafPlacement>,
) -> Result<(), CsvError> {
    let mut writer = csv::Writer::from_writer(writer);

    for placement in placements {
        writer.serialize(OutputRow {
            id: &placement.donation_id,
            x: (placement.x * 100.0).round() / 100.0,
            y: (placement.y * 100.0).round() / 100.0,
            tint: placement.tint.to_string(),
            brightness: placement.brightness,
        })?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tint;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "id,username,message,amount,created,updated\n";

    #[test]
    fn read_donation() {
        let file = write_csv(&format!(
            "{HEADER}abc123,Sapling,hello there,12.5,2024-12-01 10:00:00.123Z,2024-12-01T10:00:01Z\n"
        ));
        let results: Vec<_> = read_donations(file.path()).unwrap().collect();
        assert_eq!(results.len(), 1);

        let donation = results.into_iter().next().unwrap().unwrap();
        assert_eq!(donation.id, "abc123");
        assert_eq!(donation.username, "Sapling");
        assert_eq!(donation.message, "hello there");
        assert_eq!(donation.amount, Amount::from_float(12.5));
        assert_eq!(donation.created.to_rfc3339(), "2024-12-01T10:00:00.123+00:00");
        assert_eq!(donation.updated.to_rfc3339(), "2024-12-01T10:00:01+00:00");
    }

    #[test]
    fn read_keeps_file_order() {
        let file = write_csv(&format!(
            "{HEADER}b,B,,5,2024-12-02T00:00:00Z,2024-12-02T00:00:00Z\na,A,,5,2024-12-01T00:00:00Z,2024-12-01T00:00:00Z\n"
        ));
        let ids: Vec<_> = read_donations(file.path())
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn read_with_whitespace() {
        let file = write_csv(&format!("{HEADER}a, A , hi , 10.0 , 2024-12-01T00:00:00Z , 2024-12-01T00:00:00Z\n"));
        let results: Vec<_> = read_donations(file.path()).unwrap().collect();
        assert_eq!(results[0].as_ref().unwrap().username, "A");
    }

    #[test]
    fn read_returns_error_for_bad_timestamp() {
        let file = write_csv(&format!("{HEADER}a,A,,10,yesterday,2024-12-01T00:00:00Z\n"));
        let results: Vec<_> = read_donations(file.path()).unwrap().collect();
        let err = results[0].as_ref().unwrap_err();
        assert!(matches!(
            err,
            CsvError::InvalidTimestamp {
                line: 2,
                field: "created",
                ..
            }
        ));
    }

    #[test]
    fn read_returns_error_for_bad_amount() {
        let file = write_csv(&format!("{HEADER}a,A,,lots,2024-12-01T00:00:00Z,2024-12-01T00:00:00Z\n"));
        let results: Vec<_> = read_donations(file.path()).unwrap().collect();
        assert!(matches!(results[0], Err(CsvError::Parse { line: 2, .. })));
    }

    #[test]
    fn read_returns_error_for_out_of_range_amount() {
        let file = write_csv(&format!(
            "{HEADER}a,A,,-1e20,2024-12-01T00:00:00Z,2024-12-01T00:00:00Z\n\
             b,B,,1e20,2024-12-01T00:00:00Z,2024-12-01T00:00:00Z\n\
             c,C,,-3,2024-12-01T00:00:00Z,2024-12-01T00:00:00Z\n"
        ));
        let results: Vec<_> = read_donations(file.path()).unwrap().collect();
        assert!(matches!(results[0], Err(CsvError::InvalidAmount { line: 2 })));
        assert!(matches!(results[1], Err(CsvError::InvalidAmount { line: 3 })));
        assert_eq!(results[2].as_ref().unwrap().amount, Amount::units(-3));
    }

    #[test]
    fn read_missing_file_fails() {
        assert!(matches!(
            read_donations("/no/such/donations.csv"),
            Err(CsvError::Open { .. })
        ));
    }

    #[test]
    fn write_placements_as_rows() {
        let placements = vec![LeafPlacement {
            donation_id: "d0".to_string(),
            x: 6123.456,
            y: -2000.0,
            tint: Tint(0xFDD100),
            brightness: 1.5,
        }];
        let mut out = Vec::new();
        write_placements(&mut out, &placements).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,x,y,tint,brightness");
        assert_eq!(lines[1], "d0,6123.46,-2000.0,#FDD100,1.5");
    }
}
