//! noteshare-setup: one-time database preparation.
//!
//! Verifies connectivity, applies the schema and search indexes, and can
//! seed a handful of sample notes into an empty database. The API server
//! never runs any of this itself.

use std::process::ExitCode;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use tracing::{error, info};

use noteshare_core::defaults::DATABASE_URL;
use noteshare_core::{BlobStore, NewNote, NoteFields, NoteRepository};
use noteshare_db::{Database, PoolConfig};

#[derive(Parser)]
#[command(name = "noteshare-setup")]
#[command(author, version, about = "Prepare the noteshare database")]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", default_value = DATABASE_URL)]
    database_url: String,

    /// Insert sample notes when the note table is empty
    #[arg(long)]
    seed: bool,
}

/// (title, subject, course number, description, uploader, file name)
const SAMPLE_NOTES: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "Linear Algebra Midterm Review",
        "Math",
        "MATH 221",
        "Eigenvalues, determinants and vector spaces",
        "Priya",
        "linear_algebra_review.pdf",
    ),
    (
        "Data Structures Cheat Sheet",
        "CS",
        "CS 225",
        "Trees, heaps, hash tables and graph traversal",
        "Marcus",
        "ds_cheatsheet.pdf",
    ),
    (
        "Organic Chemistry Lab Notes",
        "Chemistry",
        "CHEM 236",
        "Week 1-4 lab procedures",
        "Anonymous",
        "orgo_lab.docx",
    ),
];

/// Minimal valid PDF used as the payload for every sample note.
const SAMPLE_PAYLOAD: &[u8] = b"%PDF-1.4\n1 0 obj<<>>endobj\ntrailer<<>>\n%%EOF\n";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noteshare_setup=info,noteshare_db=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {
            info!(subsystem = "setup", "Database setup completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(subsystem = "setup", error = %format!("{:#}", e), "Database setup failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db = Database::connect(&cli.database_url, PoolConfig::default())
        .await
        .context("failed to connect to database")?;
    db.ping().await.context("database did not answer ping")?;
    info!(subsystem = "setup", "Successfully connected to database");

    db.migrate().await.context("failed to apply migrations")?;
    info!(subsystem = "setup", "Schema and indexes are up to date");

    if cli.seed {
        seed(&db).await?;
    }

    db.close().await;
    Ok(())
}

async fn seed(db: &Database) -> anyhow::Result<()> {
    if db.notes.count().await? > 0 {
        info!(
            subsystem = "setup",
            "Note table already contains data, skipping sample data"
        );
        return Ok(());
    }

    let now = Utc::now();
    for (i, (title, subject, number, description, uploader, file_name)) in
        SAMPLE_NOTES.iter().enumerate()
    {
        let file_id = db.blobs.put(SAMPLE_PAYLOAD, file_name).await?;
        let fields = NoteFields {
            title: Some(title.to_string()),
            subject: Some(subject.to_string()),
            course_number: Some(number.to_string()),
            description: Some(description.to_string()),
            uploaded_by: Some(uploader.to_string()),
            file_size: Some(format!("{} B", SAMPLE_PAYLOAD.len())),
        };
        let upload_date = now - Duration::days(i as i64);
        let note = NewNote::from_fields(fields, file_name.to_string(), file_id, upload_date);
        let id = db.notes.insert(note).await?;
        info!(subsystem = "setup", note_id = %id, title = %title, "Inserted sample note");
    }
    Ok(())
}
