//! Reset command handler.

use crate::context::AppContext;
use clap::Args;

/// Delete every indexed document
#[derive(Args, Debug)]
pub struct ResetCommand {
    /// Also empty the uploads directory
    #[arg(long)]
    pub uploads: bool,
}

impl ResetCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!("Executing reset command");

        ctx.chatbot.delete_documents().await?;

        if self.uploads && ctx.config.upload_dir.exists() {
            std::fs::remove_dir_all(&ctx.config.upload_dir)?;
            ctx.config.ensure_upload_dir()?;
        }

        println!("All documents deleted");
        Ok(())
    }
}
