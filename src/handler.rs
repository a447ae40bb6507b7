//! Incoming message handling.
//!
//! [`Bot`] turns one incoming text into an ordered list of replies and sends
//! them one after another through a [`Messenger`]. It keeps no state between
//! messages; the only shared data is the read-only [`Table`].
//!
//! Routing:
//!
//! | Input | Replies |
//! |-------|---------|
//! | `/start`, `/start@botname`, `/start anything` | the welcome message |
//! | any other `/command` | none |
//! | `/` not followed by a name character, e.g. `/ foo` | searched as plain text |
//! | plain text | not-found message, or the matching rows in chunks |

use std::sync::Arc;

use crate::chunk::chunk_rows;
use crate::config::Config;
use crate::search::{search_table, SearchOutcome};
use crate::table::Table;
use crate::telegram::{Messenger, Update};

/// What an incoming text asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming<'a> {
    Start,
    /// A command the bot has no handler for.
    Command(&'a str),
    Query(&'a str),
}

/// Classify a message text as a command or a search query.
pub fn classify(text: &str) -> Incoming<'_> {
    // A command needs at least one name character right after the slash
    let Some(rest) = text
        .strip_prefix('/')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
    else {
        return Incoming::Query(text);
    };

    let word = rest.split_whitespace().next().unwrap_or("");
    let name = word.split('@').next().unwrap_or(word);

    match name {
        "start" => Incoming::Start,
        _ => Incoming::Command(name),
    }
}

pub struct Bot {
    table: Arc<Table>,
    welcome_message: String,
    max_chars: usize,
}

impl Bot {
    pub fn new(table: Arc<Table>, welcome_message: impl Into<String>, max_chars: usize) -> Self {
        Self {
            table,
            welcome_message: welcome_message.into(),
            max_chars,
        }
    }

    pub fn from_config(config: &Config, table: Arc<Table>) -> Self {
        Self::new(
            table,
            config.bot.welcome_message.clone(),
            config.chunking.max_chars,
        )
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The replies a message text produces, in send order.
    pub fn replies_for(&self, text: &str) -> Vec<String> {
        match classify(text) {
            Incoming::Start => vec![self.welcome_message.clone()],
            Incoming::Command(_) => Vec::new(),
            Incoming::Query(query) => self.search_replies(query),
        }
    }

    /// Search and chunk without command routing; used by `saoke search`.
    pub fn search_replies(&self, query: &str) -> Vec<String> {
        match search_table(&self.table, query) {
            SearchOutcome::NotFound(message) => vec![message],
            SearchOutcome::Matches(rows) => chunk_rows(&rows, self.max_chars)
                .into_iter()
                // The platform rejects empty messages
                .filter(|block| !block.trim().is_empty())
                .collect(),
        }
    }

    /// Handle one update, sending each reply in order.
    ///
    /// Returns the number of replies delivered. A failed send is logged and
    /// ends the sequence for this update; it is never retried.
    pub async fn handle_update(&self, update: &Update, messenger: &dyn Messenger) -> usize {
        let Some((chat_id, text)) = update.text_message() else {
            tracing::debug!(update_id = update.update_id, "ignoring update without text");
            return 0;
        };

        let replies = self.replies_for(text);
        tracing::info!(
            update_id = update.update_id,
            chat_id,
            query = text,
            replies = replies.len(),
            "handling message"
        );

        let mut sent = 0;
        for reply in &replies {
            if let Err(e) = messenger.send_message(chat_id, reply).await {
                tracing::warn!(
                    chat_id,
                    sent,
                    total = replies.len(),
                    "failed to send reply: {:#}",
                    e
                );
                break;
            }
            sent += 1;
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records sent messages; fails every send after `fail_after` successes.
    struct Recorder {
        sent: Mutex<Vec<(i64, String)>>,
        fail_after: Option<usize>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_after: None,
            }
        }

        fn texts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(_, t)| t.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Messenger for Recorder {
        async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
            let mut sent = self.sent.lock().unwrap();
            if let Some(limit) = self.fail_after {
                if sent.len() >= limit {
                    bail!("simulated send failure");
                }
            }
            sent.push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn bot(max_chars: usize) -> Bot {
        let table = Table::new(
            vec!["name".into(), "amount".into(), "note".into()],
            vec![
                vec!["A".into(), "1".into(), "foo".into()],
                vec!["B".into(), "2".into(), "bar".into()],
                vec!["C".into(), "3".into(), "Foobar".into()],
            ],
        );
        Bot::new(Arc::new(table), "welcome", max_chars)
    }

    fn update(chat_id: i64, text: Option<&str>) -> Update {
        let mut message = serde_json::json!({
            "message_id": 1,
            "chat": {"id": chat_id, "type": "private"}
        });
        if let Some(text) = text {
            message["text"] = serde_json::json!(text);
        }
        serde_json::from_value(serde_json::json!({"update_id": 1, "message": message})).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/start"), Incoming::Start);
        assert_eq!(classify("/start@saoke_bot"), Incoming::Start);
        assert_eq!(classify("/start hello"), Incoming::Start);
        assert_eq!(classify("/help"), Incoming::Command("help"));
        assert_eq!(classify("/"), Incoming::Query("/"));
        assert_eq!(classify("/ ung ho"), Incoming::Query("/ ung ho"));
        assert_eq!(classify("/_debug"), Incoming::Command("_debug"));
        assert_eq!(classify("start"), Incoming::Query("start"));
        assert_eq!(classify(" /start"), Incoming::Query(" /start"));
    }

    #[test]
    fn test_replies_for_query() {
        assert_eq!(
            bot(4000).replies_for("foo"),
            vec!["A | 1 | foo\n\nC | 3 | Foobar"]
        );
    }

    #[test]
    fn test_replies_chunked() {
        // each row is 11 or 14 chars + 2 separator
        assert_eq!(
            bot(20).replies_for("foo"),
            vec!["A | 1 | foo", "C | 3 | Foobar"]
        );
    }

    #[test]
    fn test_replies_not_found() {
        assert_eq!(bot(4000).replies_for("zzz"), vec!["Khong tim thay 'zzz'"]);
    }

    #[test]
    fn test_slash_without_command_name_is_searched() {
        assert_eq!(bot(4000).replies_for("/ foo"), vec!["Khong tim thay '/ foo'"]);
    }

    #[test]
    fn test_replies_commands() {
        assert_eq!(bot(4000).replies_for("/start"), vec!["welcome"]);
        assert!(bot(4000).replies_for("/stats").is_empty());
    }

    #[tokio::test]
    async fn test_handle_update_sends_in_order() {
        let recorder = Recorder::new();
        let sent = bot(20).handle_update(&update(7, Some("FOO")), &recorder).await;
        assert_eq!(sent, 2);
        let log = recorder.sent.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                (7, "A | 1 | foo".to_string()),
                (7, "C | 3 | Foobar".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_handle_update_without_text() {
        let recorder = Recorder::new();
        let sent = bot(4000).handle_update(&update(7, None), &recorder).await;
        assert_eq!(sent, 0);
        assert!(recorder.texts().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_stops_sequence() {
        let recorder = Recorder {
            sent: Mutex::new(Vec::new()),
            fail_after: Some(1),
        };
        let sent = bot(20).handle_update(&update(7, Some("foo")), &recorder).await;
        assert_eq!(sent, 1);
        assert_eq!(recorder.texts(), vec!["A | 1 | foo"]);
    }
}
