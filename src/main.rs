use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voteboard::{api, AppState};
use voteboard_core::models::{CreateFeatureInput, CreateProjectInput, FeatureStatus};
use voteboard_core::sync::GitHubIssueSource;
use voteboard_core::Database;

#[derive(Parser)]
#[command(name = "voteboard")]
#[command(about = "Feature-request voting platform with GitHub issue sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Voteboard server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Populate the database with sample projects and features
    Seed {
        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "voteboard=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, db_path }) => serve(port, db_path).await?,
        Some(Commands::Seed { db_path }) => {
            let db = open_db(db_path)?;
            seed(&db)?;
            println!("Seeded sample projects and features");
        }
        None => serve(3000, None).await?,
    }

    Ok(())
}

fn open_db(db_path: Option<PathBuf>) -> anyhow::Result<Database> {
    let db = match db_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = open_db(db_path)?;

    let admin_token = std::env::var("VOTEBOARD_ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("VOTEBOARD_ADMIN_TOKEN not set; admin endpoints are disabled");
    }

    let app = api::create_router(AppState {
        db,
        admin_token,
        issue_source: Arc::new(GitHubIssueSource::new()),
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Voteboard server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Sample data for local development. Votes go through the ledger so
/// counts and vote rows stay consistent.
fn seed(db: &Database) -> anyhow::Result<()> {
    let hosting = db.create_project(CreateProjectInput {
        name: "Minecraft Hosting Helper".into(),
        slug: "minecraft-hosting-helper".into(),
        description: Some("A tool to help manage Minecraft servers and hosting.".into()),
        is_active: true,
        github_owner: None,
        github_repo: None,
        github_token: None,
    })?;

    let samples = [
        (
            "Add automatic backup functionality",
            "Automatically backup worlds at regular intervals.",
            FeatureStatus::Accepted,
            15,
        ),
        (
            "Support for multiple server versions",
            "Allow users to switch between different Minecraft versions easily.",
            FeatureStatus::Planned,
            23,
        ),
        (
            "Plugin management interface",
            "A web interface to install, update, and configure plugins.",
            FeatureStatus::Submitted,
            8,
        ),
    ];

    for (title, description, status, votes) in samples {
        let feature = db.create_feature(
            hosting.id,
            CreateFeatureInput {
                title: title.into(),
                description: Some(description.into()),
                status: Some(status),
                ..Default::default()
            },
        )?;
        for i in 0..votes {
            db.add_vote(feature.id, &format!("seed-client-{i}"))?;
        }
    }

    Ok(())
}
