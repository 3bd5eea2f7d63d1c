//! Online scoring driver: applies a persisted standardizer + linear model
//! to feature vectors. The artifact is produced by an external training
//! pipeline; this side only has to read it and agree on feature order.

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FeatureVector, FEATURE_NAMES};

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Column order the model was fitted with; every name must be a known
    /// feature.
    pub feature_order: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model artifact {}", path.display()))?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).context("malformed model artifact")?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let width = self.feature_order.len();
        if width == 0 {
            bail!("model artifact declares no features");
        }
        if self.means.len() != width || self.stds.len() != width || self.coefficients.len() != width
        {
            bail!(
                "model artifact is inconsistent: {} features, {} means, {} stds, {} coefficients",
                width,
                self.means.len(),
                self.stds.len(),
                self.coefficients.len()
            );
        }
        for name in &self.feature_order {
            if !FEATURE_NAMES.contains(&name.as_str()) {
                bail!("model artifact names unknown feature `{name}`");
            }
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("decision threshold {} is outside [0, 1]", self.threshold);
        }
        Ok(())
    }

    /// Standardize, apply the linear model, squash to a probability.
    /// A zero-variance column contributes nothing, mirroring how the
    /// scaler treated it at fit time.
    pub fn score(&self, features: &FeatureVector) -> Prediction {
        let mut z = self.intercept;
        for (index, name) in self.feature_order.iter().enumerate() {
            let raw = features.value(name).unwrap_or(0.0);
            let std = self.stds[index];
            let scaled = if std > 0.0 {
                (raw - self.means[index]) / std
            } else {
                0.0
            };
            z += self.coefficients[index] * scaled;
        }
        let probability = 1.0 / (1.0 + (-z).exp());
        Prediction {
            probability,
            predicted_overrun: probability >= self.threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    pub probability: f64,
    pub predicted_overrun: bool,
}

#[derive(Debug, Serialize)]
pub struct ProjectFeatures {
    pub project_id: Uuid,
    pub project_name: String,
    pub project_code: String,
    pub budget_amount: f64,
    pub features: FeatureVector,
}

#[derive(Debug, Serialize)]
pub struct FeatureExport {
    pub generated_at: String,
    pub total_projects: usize,
    pub projects: Vec<ProjectFeatures>,
}

#[derive(Debug, Serialize)]
pub struct ScoredProject {
    pub project_id: Uuid,
    pub project_name: String,
    pub project_code: String,
    pub budget_amount: f64,
    pub predicted_overrun: bool,
    pub overrun_probability: f64,
    pub features: FeatureVector,
}

#[derive(Debug, Serialize)]
pub struct PredictionExport {
    pub generated_at: String,
    pub total_projects: usize,
    pub predictions: Vec<ScoredProject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_features(value: f64) -> FeatureVector {
        FeatureVector {
            cpi: value,
            spi: value,
            vac_pct: value,
            burn_rate_ratio: value,
            overdue_pct: value,
            blocker_density: value,
            progress_pct: value,
            days_elapsed_pct: value,
            scope_creep_proxy: value,
            finance_gaps: value,
            invoice_lag_days: value,
            timesheet_volatility: value,
            avg_team_rate: value,
            people_active_7d: value,
        }
    }

    fn cpi_only_artifact(coefficient: f64) -> ModelArtifact {
        ModelArtifact {
            feature_order: vec!["cpi".to_string()],
            means: vec![1.0],
            stds: vec![0.5],
            coefficients: vec![coefficient],
            intercept: 0.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn neutral_input_scores_one_half() {
        let artifact = cpi_only_artifact(-2.0);
        let prediction = artifact.score(&flat_features(1.0));
        assert!((prediction.probability - 0.5).abs() < 1e-12);
        assert!(prediction.predicted_overrun);
    }

    #[test]
    fn negative_cpi_coefficient_raises_risk_as_cpi_falls() {
        let artifact = cpi_only_artifact(-2.0);
        let healthy = artifact.score(&flat_features(1.4)).probability;
        let strained = artifact.score(&flat_features(0.6)).probability;
        assert!(strained > healthy);
        assert!(artifact.score(&flat_features(0.2)).predicted_overrun);
        assert!(!artifact.score(&flat_features(1.8)).predicted_overrun);
    }

    #[test]
    fn zero_variance_columns_contribute_nothing() {
        let mut artifact = cpi_only_artifact(5.0);
        artifact.stds = vec![0.0];
        let prediction = artifact.score(&flat_features(123.0));
        assert!((prediction.probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn validation_rejects_mismatched_widths() {
        let mut artifact = cpi_only_artifact(1.0);
        artifact.coefficients = vec![1.0, 2.0];
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn validation_rejects_unknown_features() {
        let mut artifact = cpi_only_artifact(1.0);
        artifact.feature_order = vec!["velocity".to_string()];
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn threshold_defaults_when_absent() {
        let raw = r#"{
            "feature_order": ["cpi", "spi"],
            "means": [1.0, 1.0],
            "stds": [0.5, 0.5],
            "coefficients": [-1.0, -1.0],
            "intercept": 0.1
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(raw).unwrap();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.threshold, 0.5);
    }
}
