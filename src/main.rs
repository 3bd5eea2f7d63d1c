use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod archetype;
mod corpus;
mod db;
mod features;
mod generate;
mod models;
mod report;
mod sampling;
mod score;
mod synth;

#[derive(Parser)]
#[command(name = "project-overrun-radar")]
#[command(about = "Budget-overrun training corpus and feature engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Insert synthetic demo projects into the live store
    SeedDemo {
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
    /// Synthesize a labeled training corpus
    Generate {
        #[arg(long)]
        projects: usize,
        #[arg(long)]
        seed: u64,
        #[arg(long, default_value = "synthetic_projects.csv")]
        out: PathBuf,
    },
    /// Summarize a generated corpus as markdown
    Summarize {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long, default_value = "corpus_summary.md")]
        out: PathBuf,
    },
    /// Derive noise-free feature vectors for open projects
    Features {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long, default_value = "project_features.json")]
        out: PathBuf,
    },
    /// Score open projects with a persisted model artifact
    Score {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long, default_value = "overrun_predictions.json")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::SeedDemo { seed } => {
            let pool = connect().await?;
            let today = Utc::now().date_naive();
            let inserted = db::seed_demo(&pool, seed, today).await?;
            println!("Seeded {inserted} demo projects.");
        }
        Commands::Generate {
            projects,
            seed,
            out,
        } => {
            let today = Utc::now().date_naive();
            let config = synth::CorpusConfig::new(projects, seed, today);
            let rows = synth::build_corpus(&config)?;
            corpus::write_corpus(&out, &rows)?;

            let (overruns, on_budget) = synth::label_split(&rows);
            let share = overruns as f64 / rows.len() as f64 * 100.0;
            println!("Generated {} projects into {}.", rows.len(), out.display());
            println!(
                "Label split: {overruns} overrun ({share:.1}%), {on_budget} on budget."
            );
        }
        Commands::Summarize { corpus, out } => {
            let rows = corpus::read_corpus(&corpus)?;
            let summary = report::build_report(&rows);
            std::fs::write(&out, summary)?;
            println!("Summary written to {}.", out.display());
        }
        Commands::Features { project, out } => {
            let pool = connect().await?;
            let scored = live_feature_rows(&pool, project).await?;
            if scored.is_empty() {
                println!("No open projects found.");
                return Ok(());
            }

            let export = score::FeatureExport {
                generated_at: Utc::now().to_rfc3339(),
                total_projects: scored.len(),
                projects: scored
                    .into_iter()
                    .map(|(record, vector)| score::ProjectFeatures {
                        project_id: record.id,
                        project_name: record.name,
                        project_code: record.code,
                        budget_amount: record.budget_amount,
                        features: vector,
                    })
                    .collect(),
            };
            std::fs::write(&out, serde_json::to_string_pretty(&export)?)?;
            println!(
                "Feature vectors for {} projects written to {}.",
                export.total_projects,
                out.display()
            );
        }
        Commands::Score {
            model,
            project,
            out,
        } => {
            let artifact = score::ModelArtifact::load(&model)?;
            let pool = connect().await?;
            let rows = live_feature_rows(&pool, project).await?;
            if rows.is_empty() {
                println!("No open projects found.");
                return Ok(());
            }

            let mut predictions = Vec::with_capacity(rows.len());
            for (record, vector) in rows {
                let prediction = artifact.score(&vector);
                predictions.push(score::ScoredProject {
                    project_id: record.id,
                    project_name: record.name,
                    project_code: record.code,
                    budget_amount: record.budget_amount,
                    predicted_overrun: prediction.predicted_overrun,
                    overrun_probability: prediction.probability,
                    features: vector,
                });
            }

            println!("Scored {} projects:", predictions.len());
            for scored in &predictions {
                let verdict = if scored.predicted_overrun {
                    "overrun risk"
                } else {
                    "on track"
                };
                println!(
                    "- {} ({}) p(overrun) {:.2} -> {}",
                    scored.project_name, scored.project_code, scored.overrun_probability, verdict
                );
            }

            let export = score::PredictionExport {
                generated_at: Utc::now().to_rfc3339(),
                total_projects: predictions.len(),
                predictions,
            };
            std::fs::write(&out, serde_json::to_string_pretty(&export)?)?;
            println!("Predictions written to {}.", out.display());
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set for commands that use the project store")?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

/// Online feature path: fetch each open project's record collections and
/// run the same derivation the corpus uses, without the training noise.
async fn live_feature_rows(
    pool: &PgPool,
    project: Option<Uuid>,
) -> anyhow::Result<Vec<(db::ProjectRecord, models::FeatureVector)>> {
    let today = Utc::now().date_naive();
    let projects = db::fetch_open_projects(pool, project).await?;

    let mut rows = Vec::with_capacity(projects.len());
    for record in projects {
        let records = db::fetch_records(pool, record.id).await?;
        // Open projects have no actual end yet; the planned end stands in.
        let ctx = models::ProjectContext::new(
            record.start_date,
            record.end_date,
            record.end_date,
            record.budget_amount,
            record.progress_pct,
            today,
        );
        let actual_cost = features::counted_actual_cost(&records);
        let vector = features::derive(&ctx, &records, actual_cost);
        rows.push((record, vector));
    }

    Ok(rows)
}
