//! Command handlers for the ragbot CLI.

pub mod ask;
pub mod history;
pub mod interactive;
pub mod reset;
pub mod search;
pub mod serve;
pub mod status;
pub mod upload;

pub use ask::AskCommand;
pub use history::HistoryCommand;
pub use interactive::InteractiveCommand;
pub use reset::ResetCommand;
pub use search::SearchCommand;
pub use serve::ServeCommand;
pub use status::StatusCommand;
pub use upload::UploadCommand;

use ragbot_knowledge::{Chunk, ScoredChunk};
use std::io::Write;

const PREVIEW_CHARS: usize = 200;

/// First `PREVIEW_CHARS` characters of `text`, with an ellipsis when cut.
pub(crate) fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub(crate) fn print_sources(sources: &[Chunk]) {
    if sources.is_empty() {
        return;
    }

    println!();
    println!("Sources:");
    for (i, chunk) in sources.iter().enumerate() {
        println!(
            "  {}. {} (chunk {})",
            i + 1,
            chunk.metadata.source,
            chunk.metadata.position
        );
    }
}

pub(crate) fn print_scored(results: &[ScoredChunk]) {
    if results.is_empty() {
        println!("No matching documents.");
        return;
    }

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} (chunk {}, score {:.3})",
            i + 1,
            result.chunk.metadata.source,
            result.chunk.metadata.position,
            result.score
        );
        println!("   {}", preview(&result.chunk.text).replace('\n', "\n   "));
        println!();
    }
}

/// Print a streamed fragment immediately.
pub(crate) fn print_fragment(fragment: &str) {
    print!("{}", fragment);
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "é".repeat(PREVIEW_CHARS + 5);
        let cut = preview(&text);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }
}
