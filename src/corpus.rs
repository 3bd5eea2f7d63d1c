//! Training-corpus persistence: flat CSV, one row per project, feature
//! columns in canonical order.

use std::path::Path;

use anyhow::Context;

use crate::models::ProjectRow;

pub fn write_corpus(path: &Path, rows: &[ProjectRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create corpus file {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_corpus(path: &Path) -> anyhow::Result<Vec<ProjectRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open corpus file {}", path.display()))?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<ProjectRow>() {
        rows.push(result.context("malformed corpus row")?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{build_corpus, CorpusConfig};
    use chrono::NaiveDate;

    #[test]
    fn corpus_round_trips_through_csv() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let rows = build_corpus(&CorpusConfig::new(8, 21, today)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.csv");
        write_corpus(&path, &rows).unwrap();

        let loaded = read_corpus(&path).unwrap();
        assert_eq!(loaded.len(), rows.len());
        for (written, read) in rows.iter().zip(loaded.iter()) {
            assert_eq!(written.project_id, read.project_id);
            assert_eq!(written.label, read.label);
            assert_eq!(written.start_date, read.start_date);
            assert!((written.budget_amount - read.budget_amount).abs() < 1e-6);
            assert!((written.cpi - read.cpi).abs() < 1e-9);
            assert!((written.people_active_7d - read.people_active_7d).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_corpus_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(read_corpus(&path).is_err());
    }
}
