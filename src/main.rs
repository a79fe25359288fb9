//! NeuroOpositor - command line
//!
//! Loads a course snapshot into an in-memory store, runs one engine
//! operation and prints the result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use neuroopositor::graph::{ClusterKind, CourseId, Dimensions, UserId};
use neuroopositor::paths::PathType;
use neuroopositor::store::{CourseSnapshot, InMemoryCourseStore};
use neuroopositor::{Config, CourseEngine, NeuroEngine};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "neuroopositor")]
#[command(about = "Topic graph layout and study path engine")]
struct Cli {
    /// Course snapshot (JSON with topics, connections and progress)
    #[arg(short, long, global = true, default_value = "course.json")]
    snapshot: PathBuf,

    /// YAML config file (defaults to neuroopositor.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute node positions with the force layout
    Layout {
        /// Layout space: 2 or 3
        #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=3))]
        dimensions: u8,
    },

    /// Group topics into clusters
    Clusters {
        /// block or connectivity
        #[arg(long, default_value = "connectivity")]
        by: ClusterKind,
    },

    /// Generate a study path for a user
    Path {
        #[arg(short, long)]
        user: UserId,

        /// optimal, reinforcement or exploration
        #[arg(short = 't', long = "type", default_value = "optimal")]
        path_type: PathType,
    },

    /// Rank recommended topics for a user
    Recommend {
        #[arg(short, long)]
        user: UserId,

        /// Number of topics (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Course progress totals for a user
    Summary {
        #[arg(short, long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (stderr, so stdout stays valid JSON)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,neuroopositor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_yaml_and_env(cli.config.as_deref())?;

    let snapshot = CourseSnapshot::from_json_file(&cli.snapshot)?;
    let course_id: CourseId = snapshot.course_id;
    tracing::info!(
        "Loaded course {} from {} ({} topics)",
        course_id,
        cli.snapshot.display(),
        snapshot.topics.len()
    );

    let store = Arc::new(InMemoryCourseStore::from_snapshot(snapshot).await);
    let engine = CourseEngine::new(store, config);

    match cli.command {
        Commands::Layout { dimensions } => {
            let dimensions = Dimensions::try_from(dimensions).map_err(anyhow::Error::msg)?;
            print_json(&engine.compute_layout(course_id, dimensions).await?)
        }
        Commands::Clusters { by } => print_json(&engine.detect_clusters(course_id, by).await?),
        Commands::Path { user, path_type } => {
            print_json(&engine.generate_path(user, course_id, path_type).await?)
        }
        Commands::Recommend { user, limit } => {
            print_json(&engine.recommend_topics(user, course_id, limit).await?)
        }
        Commands::Summary { user } => print_json(&engine.progress_summary(user, course_id).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}
