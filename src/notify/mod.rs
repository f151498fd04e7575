//! Best-effort player notifications through the chat bot.
//!
//! The engine posts intents with `try_send` and never waits on delivery;
//! a background worker performs the HTTP calls.

pub mod telegram;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::scoreboard::TOKENS_PER_WIN;
use crate::util::rate_limit::{create_limiter, Limiter, BOT_SEND_RATE_LIMIT};

pub use telegram::BotClient;

/// Pending notifications beyond this are dropped
const QUEUE_CAPACITY: usize = 256;

/// A message to deliver to one player's chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Victory {
        external_id: String,
        defeated_name: String,
    },
    Defeat {
        external_id: String,
        attacker_name: String,
    },
}

impl Notification {
    pub fn chat_id(&self) -> &str {
        match self {
            Notification::Victory { external_id, .. } => external_id,
            Notification::Defeat { external_id, .. } => external_id,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Notification::Victory { defeated_name, .. } => format!(
                "🎉 Victory! You defeated {}!\n🪙 +{} tokens earned",
                defeated_name, TOKENS_PER_WIN
            ),
            Notification::Defeat { attacker_name, .. } => format!(
                "💀 You were defeated by {}!\n🔄 Respawning in arena...",
                attacker_name
            ),
        }
    }
}

/// Cheap handle for queueing notifications
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    /// Create a handle plus the receiving end of its queue
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Spawn the delivery worker. Without a bot client intents are drained and dropped.
    pub fn spawn(client: Option<BotClient>) -> Self {
        let (notifier, rx) = Self::channel(QUEUE_CAPACITY);
        match &client {
            Some(_) => info!("Bot notifications enabled"),
            None => info!("No bot token configured, notifications disabled"),
        }
        tokio::spawn(run_worker(rx, client, create_limiter(BOT_SEND_RATE_LIMIT)));
        notifier
    }

    pub fn notify_victory(&self, external_id: &str, defeated_name: &str) {
        self.dispatch(Notification::Victory {
            external_id: external_id.to_string(),
            defeated_name: defeated_name.to_string(),
        });
    }

    pub fn notify_defeat(&self, external_id: &str, attacker_name: &str) {
        self.dispatch(Notification::Defeat {
            external_id: external_id.to_string(),
            attacker_name: attacker_name.to_string(),
        });
    }

    fn dispatch(&self, notification: Notification) {
        if notification.chat_id().is_empty() {
            return;
        }
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(chat_id = %n.chat_id(), "Notification queue full, dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                debug!(chat_id = %n.chat_id(), "Notification worker gone, dropping message");
            }
        }
    }
}

/// Deliver queued notifications until every handle is dropped
async fn run_worker(
    mut rx: mpsc::Receiver<Notification>,
    client: Option<BotClient>,
    limiter: Arc<Limiter>,
) {
    while let Some(notification) = rx.recv().await {
        let Some(client) = &client else {
            debug!(chat_id = %notification.chat_id(), "Dropping notification (bot disabled)");
            continue;
        };

        limiter.until_ready().await;
        if let Err(e) = client
            .send_message(notification.chat_id(), &notification.text())
            .await
        {
            warn!(chat_id = %notification.chat_id(), error = %e, "Failed to deliver notification");
        }
    }
    debug!("Notification worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts_name_the_other_player() {
        let victory = Notification::Victory {
            external_id: "1".into(),
            defeated_name: "Bob".into(),
        };
        assert!(victory.text().contains("You defeated Bob!"));
        assert!(victory.text().contains("+10 tokens"));

        let defeat = Notification::Defeat {
            external_id: "2".into(),
            attacker_name: "Ada".into(),
        };
        assert!(defeat.text().contains("defeated by Ada!"));
        assert_eq!(defeat.chat_id(), "2");
    }

    #[test]
    fn empty_identity_is_skipped() {
        let (notifier, mut rx) = Notifier::channel(4);
        notifier.notify_victory("", "Bob");
        notifier.notify_defeat("9", "Ada");
        assert_eq!(
            rx.try_recv().unwrap(),
            Notification::Defeat {
                external_id: "9".into(),
                attacker_name: "Ada".into()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn full_or_closed_queue_never_blocks() {
        let (notifier, rx) = Notifier::channel(1);
        notifier.notify_victory("1", "a");
        notifier.notify_victory("1", "b");
        drop(rx);
        notifier.notify_victory("1", "c");
    }

    #[tokio::test]
    async fn disabled_worker_drains_queue() {
        let notifier = Notifier::spawn(None);
        for i in 0..10 {
            notifier.notify_defeat(&i.to_string(), "x");
        }
        tokio::task::yield_now().await;
    }
}
