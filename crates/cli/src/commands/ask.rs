//! Ask command handler.

use crate::commands::{print_fragment, print_sources};
use crate::context::AppContext;
use clap::Args;

/// Ask a single question against the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Print the whole answer at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        if self.json || self.no_stream {
            let response = ctx.chatbot.chat(&self.question).await;
            if self.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.answer);
                print_sources(&response.source_documents);
            }
            return Ok(());
        }

        let response = ask_streaming(ctx, &self.question).await;
        print_sources(&response.source_documents);
        Ok(())
    }
}

/// Stream a turn to stdout. An answer that was not streamed (a failed turn)
/// is printed whole.
pub(crate) async fn ask_streaming(
    ctx: &AppContext,
    question: &str,
) -> ragbot_knowledge::ChatResponse {
    let mut streamed = String::new();
    let response = ctx
        .chatbot
        .chat_stream(question, |fragment| {
            print_fragment(fragment);
            streamed.push_str(fragment);
        })
        .await;

    if streamed.trim() != response.answer {
        if !streamed.is_empty() {
            println!();
        }
        print!("{}", response.answer);
    }
    println!();

    response
}
