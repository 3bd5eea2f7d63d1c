use std::fmt::Write;

use statrs::statistics::Statistics;

use crate::models::{ProjectRow, FEATURE_NAMES};
use crate::synth;

#[derive(Debug, Clone)]
pub struct FeatureSummary {
    pub name: &'static str,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

pub fn summarize_features(rows: &[ProjectRow]) -> Vec<FeatureSummary> {
    FEATURE_NAMES
        .iter()
        .map(|&name| {
            let column: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.features().value(name))
                .collect();
            if column.is_empty() {
                return FeatureSummary {
                    name,
                    mean: 0.0,
                    std_dev: 0.0,
                    min: 0.0,
                    max: 0.0,
                };
            }
            let std_dev = if column.len() > 1 {
                (&column).std_dev()
            } else {
                0.0
            };
            FeatureSummary {
                name,
                mean: (&column).mean(),
                std_dev,
                min: (&column).min(),
                max: (&column).max(),
            }
        })
        .collect()
}

pub fn build_report(rows: &[ProjectRow]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Overrun Corpus Summary");
    let _ = writeln!(output);

    if rows.is_empty() {
        let _ = writeln!(output, "The corpus is empty.");
        return output;
    }

    let (overruns, on_budget) = synth::label_split(rows);
    let overrun_share = overruns as f64 / rows.len() as f64 * 100.0;
    let _ = writeln!(output, "## Labels");
    let _ = writeln!(output);
    let _ = writeln!(output, "- Projects: {}", rows.len());
    let _ = writeln!(
        output,
        "- Overrun (1): {} ({:.1}%)",
        overruns, overrun_share
    );
    let _ = writeln!(
        output,
        "- On budget (0): {} ({:.1}%)",
        on_budget,
        100.0 - overrun_share
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Features");
    let _ = writeln!(output);
    for summary in summarize_features(rows) {
        let _ = writeln!(
            output,
            "- {}: mean {:.3}, std {:.3}, min {:.3}, max {:.3}",
            summary.name, summary.mean, summary.std_dev, summary.min, summary.max
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{build_corpus, CorpusConfig};
    use chrono::NaiveDate;

    fn sample_rows() -> Vec<ProjectRow> {
        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        build_corpus(&CorpusConfig::new(25, 5, today)).unwrap()
    }

    #[test]
    fn report_lists_labels_and_every_feature() {
        let rows = sample_rows();
        let report = build_report(&rows);

        assert!(report.contains("# Overrun Corpus Summary"));
        assert!(report.contains("- Projects: 25"));
        for name in FEATURE_NAMES {
            assert!(report.contains(&format!("- {name}:")), "missing {name}");
        }
    }

    #[test]
    fn empty_corpus_renders_a_stub() {
        let report = build_report(&[]);
        assert!(report.contains("The corpus is empty."));
    }

    #[test]
    fn summaries_bound_means_between_min_and_max() {
        let rows = sample_rows();
        for summary in summarize_features(&rows) {
            assert!(summary.min <= summary.mean + 1e-9, "{}", summary.name);
            assert!(summary.mean <= summary.max + 1e-9, "{}", summary.name);
            assert!(summary.std_dev >= 0.0);
        }
    }
}
