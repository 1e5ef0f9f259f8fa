//! Serve command handler.

use crate::context::AppContext;
use clap::Args;
use std::sync::Arc;

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default: RAGBOT_BIND or 0.0.0.0:8000)
    #[arg(short, long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, ctx: AppContext) -> anyhow::Result<()> {
        let addr = self
            .bind
            .clone()
            .unwrap_or_else(|| ctx.config.bind_addr.clone());

        ctx.config.ensure_upload_dir()?;
        let state = Arc::new(ctx.into_server_state());

        ragbot_server::serve(state, &addr).await?;
        Ok(())
    }
}
