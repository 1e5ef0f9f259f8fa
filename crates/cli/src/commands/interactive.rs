//! Interactive terminal menu.

use crate::commands::ask::ask_streaming;
use crate::commands::history::print_history;
use crate::commands::print_scored;
use crate::commands::print_sources;
use crate::commands::upload::{print_outcome, upload_paths};
use crate::context::AppContext;
use clap::Args;
use ragbot_knowledge::rag::DEFAULT_RETRIEVAL_K;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::path::PathBuf;

type LineEditor = Editor<(), DefaultHistory>;

/// Interactive menu over upload, chat and search
#[derive(Args, Debug)]
pub struct InteractiveCommand {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Upload,
    Chat,
    Search,
    History,
    Clear,
    Status,
    Help,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 8] = [
        Self::Upload,
        Self::Chat,
        Self::Search,
        Self::History,
        Self::Clear,
        Self::Status,
        Self::Help,
        Self::Exit,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Chat => "chat",
            Self::Search => "search",
            Self::History => "history",
            Self::Clear => "clear",
            Self::Status => "status",
            Self::Help => "help",
            Self::Exit => "exit",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Upload => "Index a file or directory",
            Self::Chat => "Chat with your documents",
            Self::Search => "Search indexed chunks",
            Self::History => "Show conversation history",
            Self::Clear => "Clear conversation memory",
            Self::Status => "Show system status",
            Self::Help => "Show this menu",
            Self::Exit => "Quit",
        }
    }

    /// Accepts the command name or its 1-based menu number.
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim().to_lowercase();
        if let Ok(n) = input.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied();
        }
        match input.as_str() {
            "quit" | "q" => Some(Self::Exit),
            "?" => Some(Self::Help),
            other => Self::ALL.iter().copied().find(|a| a.name() == other),
        }
    }
}

fn print_menu() {
    println!();
    println!("Commands:");
    for (i, action) in MenuAction::ALL.iter().enumerate() {
        println!("  {}. {:<8} {}", i + 1, action.name(), action.description());
    }
    println!();
}

/// `Ok(None)` on Ctrl-C / Ctrl-D.
fn read_line(rl: &mut LineEditor, prompt: &str) -> anyhow::Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => {
            let line = line.trim().to_string();
            if !line.is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

impl InteractiveCommand {
    pub async fn execute(&self, ctx: &AppContext) -> anyhow::Result<()> {
        tracing::info!("Starting interactive session");

        let mut rl = LineEditor::new()?;

        println!("Ragbot - chat with your documents");
        print_menu();

        loop {
            let Some(input) = read_line(&mut rl, "ragbot> ")? else {
                break;
            };
            if input.is_empty() {
                continue;
            }

            let Some(action) = MenuAction::parse(&input) else {
                println!("Unknown command '{}'. Type 'help' for the menu.", input);
                continue;
            };

            if action == MenuAction::Exit {
                break;
            }

            if let Err(e) = self.dispatch(ctx, &mut rl, action).await {
                println!("Error: {}", e);
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn dispatch(
        &self,
        ctx: &AppContext,
        rl: &mut LineEditor,
        action: MenuAction,
    ) -> anyhow::Result<()> {
        match action {
            MenuAction::Upload => self.upload(ctx, rl).await,
            MenuAction::Chat => self.chat(ctx, rl).await,
            MenuAction::Search => self.search(ctx, rl).await,
            MenuAction::History => {
                print_history(&ctx.chatbot.history().await);
                Ok(())
            }
            MenuAction::Clear => {
                let answer = read_line(rl, "Clear conversation memory? [y/N] ")?;
                if answer.as_deref().is_some_and(is_yes) {
                    ctx.chatbot.clear_memory().await;
                    println!("Conversation memory cleared.");
                } else {
                    println!("Cancelled.");
                }
                Ok(())
            }
            MenuAction::Status => {
                super::StatusCommand { json: false }.execute(ctx).await
            }
            MenuAction::Help => {
                print_menu();
                Ok(())
            }
            MenuAction::Exit => Ok(()),
        }
    }

    async fn upload(&self, ctx: &AppContext, rl: &mut LineEditor) -> anyhow::Result<()> {
        let Some(path) = read_line(rl, "Path to file or directory: ")? else {
            return Ok(());
        };
        if path.is_empty() {
            return Ok(());
        }

        let path = PathBuf::from(path);
        let recursive = path.is_dir()
            && read_line(rl, "Include subdirectories? [y/N] ")?
                .as_deref()
                .is_some_and(is_yes);

        println!("Processing...");
        let outcome = upload_paths(ctx, &[path], recursive).await?;
        print_outcome(&outcome);
        Ok(())
    }

    async fn chat(&self, ctx: &AppContext, rl: &mut LineEditor) -> anyhow::Result<()> {
        println!("Chat mode. Type 'back' to return to the menu.");

        loop {
            let Some(question) = read_line(rl, "You: ")? else {
                break;
            };
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("back") {
                break;
            }

            print!("Assistant: ");
            let response = ask_streaming(ctx, &question).await;
            print_sources(&response.source_documents);
            println!();
        }

        Ok(())
    }

    async fn search(&self, ctx: &AppContext, rl: &mut LineEditor) -> anyhow::Result<()> {
        let Some(query) = read_line(rl, "Search query: ")? else {
            return Ok(());
        };
        if query.is_empty() {
            return Ok(());
        }

        let k = read_line(rl, &format!("Number of results [{}]: ", DEFAULT_RETRIEVAL_K))?
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|k| *k > 0)
            .unwrap_or(DEFAULT_RETRIEVAL_K);

        let results = ctx.chatbot.relevant_documents(&query, k).await?;
        print_scored(&results);
        Ok(())
    }
}
