//! Line framing for streamed HTTP bodies.
//!
//! Both NDJSON (Ollama) and server-sent events (OpenAI-compatible APIs) are
//! line oriented, but network chunks can end mid-line.

use futures::{Stream, StreamExt};
use ragbot_core::{AppError, AppResult};

/// Turn a byte stream into a stream of complete, non-empty lines.
pub(crate) fn line_stream<S, B, E>(bytes: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .map(Some)
        .chain(futures::stream::once(async { None }))
        .scan(Vec::<u8>::new(), |buffer, item| {
            let lines: Vec<AppResult<String>> = match item {
                Some(Ok(chunk)) => {
                    buffer.extend_from_slice(chunk.as_ref());
                    drain_complete_lines(buffer).into_iter().map(Ok).collect()
                }
                Some(Err(e)) => vec![Err(AppError::Llm(format!("Stream error: {}", e)))],
                // End of body: flush whatever is left without a trailing newline
                None => {
                    let rest = String::from_utf8_lossy(buffer).trim().to_string();
                    buffer.clear();
                    if rest.is_empty() {
                        Vec::new()
                    } else {
                        vec![Ok(rest)]
                    }
                }
            };
            futures::future::ready(Some(futures::stream::iter(lines)))
        })
        .flatten()
}

fn drain_complete_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line).trim().to_string();
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let chunks: Vec<Result<&'static [u8], String>> = vec![
            Ok(b"{\"a\":1}\n{\"b\"".as_slice()),
            Ok(b":2}\n\n".as_slice()),
            Ok(b"{\"c\":3}".as_slice()),
        ];

        let lines: Vec<String> = line_stream(futures::stream::iter(chunks))
            .map(|line| line.unwrap())
            .collect()
            .await;

        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]);
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced() {
        let chunks: Vec<Result<&'static [u8], String>> = vec![Err("connection reset".to_string())];
        let items: Vec<AppResult<String>> = line_stream(futures::stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
