//! Upload command handler.

use crate::context::AppContext;
use clap::Args;
use ragbot_knowledge::{ingest_files, DocumentProcessor, IngestOutcome};
use std::path::PathBuf;

/// Process and index files, or every supported file in a directory
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Files or directories to index
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl UploadCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!(paths = self.paths.len(), recursive = self.recursive, "Executing upload command");

        let outcome = upload_paths(ctx, &self.paths, self.recursive).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_outcome(&outcome);
        }

        Ok(())
    }
}

/// Expand directories into their supported files, then ingest everything.
pub(crate) async fn upload_paths(
    ctx: &AppContext,
    paths: &[PathBuf],
    recursive: bool,
) -> anyhow::Result<IngestOutcome> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(DocumentProcessor::discover(path, recursive)?);
        } else {
            files.push(path.clone());
        }
    }

    Ok(ingest_files(ctx.processor.clone(), &ctx.chatbot, files).await)
}

pub(crate) fn print_outcome(outcome: &IngestOutcome) {
    for (name, chunks) in &outcome.processed {
        println!("  ok     {} ({} chunks)", name, chunks);
    }
    for (name, error) in &outcome.failed {
        println!("  failed {}: {}", name, error);
    }
    println!(
        "Processed {} file(s), {} chunks indexed, {} failed",
        outcome.processed.len(),
        outcome.total_chunks(),
        outcome.failed.len()
    );
}
