//! Status command handler.

use crate::context::AppContext;
use clap::Args;

/// Show indexed document count, LLMs and chain state
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!("Executing status command");

        let documents = ctx.chatbot.store().collection_count().await?;
        let llms = ctx.llms.list_available_llms();
        let current = ctx.llms.manager_name().unwrap_or("<none>");
        let formats = ctx.processor.supported_extensions();
        let state = ctx.chatbot.state();

        if self.json {
            let output = serde_json::json!({
                "documents_indexed": documents,
                "available_llms": llms,
                "current_llm": ctx.llms.manager_name(),
                "supported_formats": formats,
                "chain_state": state.as_str(),
                "chunk_size": ctx.processor.chunk_size(),
                "chunk_overlap": ctx.processor.chunk_overlap(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Documents indexed: {}", documents);
            println!("Chain state: {}", state.as_str());
            println!("Current LLM: {}", current);
            println!("Available LLMs: {}", llms.join(", "));
            println!("Supported formats: {}", formats.join(", "));
            println!(
                "Chunking: {} chars, {} overlap",
                ctx.processor.chunk_size(),
                ctx.processor.chunk_overlap()
            );
        }

        Ok(())
    }
}
