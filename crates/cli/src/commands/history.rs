//! History command handler.

use crate::context::AppContext;
use clap::Args;
use ragbot_knowledge::ChatMessage;

/// Show conversation history
#[derive(Args, Debug)]
pub struct HistoryCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        let history = ctx.chatbot.history().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&history)?);
        } else {
            print_history(&history);
        }

        Ok(())
    }
}

pub(crate) fn print_history(history: &[ChatMessage]) {
    if history.is_empty() {
        println!("No conversation history.");
        return;
    }

    for message in history {
        println!("{}: {}", message.role.label(), message.content);
    }
}
