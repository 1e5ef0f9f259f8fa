//! Search command handler.

use crate::commands::print_scored;
use crate::context::AppContext;
use clap::Args;
use ragbot_knowledge::rag::DEFAULT_RETRIEVAL_K;

/// Show the indexed chunks most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of chunks to return
    #[arg(short, long, default_value_t = DEFAULT_RETRIEVAL_K)]
    pub k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!(k = self.k, "Executing search command");

        if self.k == 0 {
            anyhow::bail!("k must be at least 1");
        }

        let results = ctx.chatbot.relevant_documents(&self.query, self.k).await?;

        if self.json {
            let output: Vec<_> = results
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "content": r.chunk.text,
                        "metadata": r.chunk.metadata,
                        "relevance_score": r.score,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_scored(&results);
        }

        Ok(())
    }
}
