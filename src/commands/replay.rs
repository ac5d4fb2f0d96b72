use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::events::source::{EventSender, EventSource};
use crate::tui::canvas::{self, ViewOptions};

const REPLAY_STEP_MS: u64 = 200;

/// Replay a captured event stream: one `code payload` pair per line, e.g.
///
/// ```text
/// 6 {"page":1,"type":0}
/// 2 {"page":1,"cell":0,"keyLen":16}
/// ```
///
/// Blank lines and `#` comments are skipped; anything else unparsable is
/// warned about and skipped, matching the tolerance of the live stream.
pub fn run(file: &Path, opts: ViewOptions) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("reading event stream {}", file.display()))?;
    let events = parse_stream(&text);

    let source = EventSource::new();
    spawn_producer(source.sender(), events);
    canvas::run(source, opts)
}

fn parse_stream(text: &str) -> Vec<(i32, String)> {
    let mut events = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((code, payload)) = line.split_once(char::is_whitespace) else {
            warn!(lineno = lineno + 1, line, "skipping line without payload");
            continue;
        };
        match code.parse::<i32>() {
            Ok(code) => events.push((code, payload.trim().to_string())),
            Err(_) => warn!(lineno = lineno + 1, code, "skipping line with bad event code"),
        }
    }
    events
}

fn spawn_producer(sender: EventSender, events: Vec<(i32, String)>) {
    thread::spawn(move || {
        for (code, payload) in events {
            sender.emit(code, payload);
            thread::sleep(Duration::from_millis(REPLAY_STEP_MS));
        }
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_payloads() {
        let events = parse_stream("6 {\"page\":1,\"type\":0}\n2 {\"page\":1,\"cell\":0,\"keyLen\":16}\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 6);
        assert_eq!(events[1].1, "{\"page\":1,\"cell\":0,\"keyLen\":16}");
    }

    #[test]
    fn skips_comments_blanks_and_garbage() {
        let events = parse_stream("# capture\n\nnot-a-code {}\n7 {\"page\":3}\n7\n");
        assert_eq!(events, vec![(7, "{\"page\":3}".to_string())]);
    }
}
