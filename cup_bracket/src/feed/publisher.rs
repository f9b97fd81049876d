//! Live feed fan-out and the state-change event channel.

use super::snapshot::{ScoreSnapshot, load_snapshot};
use crate::bracket::{MatchId, MatchStatus, TeamNumber};
use crate::db::{MatchRepository, TeamRepository};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Default per-subscriber queue depth
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 32;

/// Default depth of the state-change queue
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Subscriber ID type
pub type SubscriberId = u64;

/// Emitted after a mutation has been persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChangeNotification {
    /// All matches were discarded and regenerated
    BracketRebuilt { matches: usize },
    /// A score update was saved
    ResultRecorded { match_id: MatchId },
    /// Team metadata (e.g. its display name) changed
    TeamUpdated { team_number: TeamNumber },
}

/// Sending half of the state-change queue.
///
/// Notifying never blocks and never fails the caller: when the queue is full
/// or the publisher is gone the event is dropped and logged.
#[derive(Debug, Clone)]
pub struct FeedNotifier {
    sender: mpsc::Sender<StateChangeNotification>,
}

impl FeedNotifier {
    pub fn notify(&self, notification: StateChangeNotification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                log::warn!("Feed event queue full, dropping {:?}", n);
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                log::debug!("No feed publisher running, dropping {:?}", n);
            }
        }
    }
}

/// Create the state-change queue
pub fn notifier(capacity: usize) -> (FeedNotifier, mpsc::Receiver<StateChangeNotification>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (FeedNotifier { sender }, receiver)
}

/// A viewer's handle on the feed
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Arc<ScoreSnapshot>>,
}

/// The single shared "scores" broadcast group
pub struct LiveFeed {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<ScoreSnapshot>>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl LiveFeed {
    /// Create a feed whose subscribers each queue up to `buffer` snapshots
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Join the group. Nothing is delivered until the next publish.
    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.buffer);
        self.subscribers.lock().await.insert(id, sender);
        log::debug!("Feed subscriber {} joined", id);
        Subscription { id, receiver }
    }

    /// Leave the group
    pub async fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            log::debug!("Feed subscriber {} left", id);
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Deliver `snapshot` to every subscriber without waiting on any of them.
    ///
    /// Returns how many subscribers received it.
    pub async fn publish(&self, snapshot: ScoreSnapshot) -> usize {
        let snapshot = Arc::new(snapshot);
        let mut delivered = 0;

        self.subscribers
            .lock()
            .await
            .retain(|id, sender| match sender.try_send(Arc::clone(&snapshot)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Feed subscriber {} queue full, dropping snapshot", id);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Feed subscriber {} disconnected, removing", id);
                    false
                }
            });

        delivered
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

/// Run the publisher: on every state change, read the live matches and push them.
///
/// Events that queued up while a snapshot was being built are folded into the
/// next one, since each snapshot reflects the latest saved state anyway. The
/// task ends when every [`FeedNotifier`] is dropped.
pub fn spawn_publisher(
    feed: Arc<LiveFeed>,
    teams: Arc<dyn TeamRepository>,
    matches: Arc<dyn MatchRepository>,
    mut events: mpsc::Receiver<StateChangeNotification>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let mut folded = 0usize;
            while events.try_recv().is_ok() {
                folded += 1;
            }
            log::debug!("Publishing after {:?} (+{} folded)", event, folded);

            match load_snapshot(teams.as_ref(), matches.as_ref(), Some(MatchStatus::Live)).await {
                Ok(snapshot) => {
                    let delivered = feed.publish(snapshot).await;
                    log::debug!("Live snapshot delivered to {} subscribers", delivered);
                }
                Err(e) => {
                    log::error!("Failed to load live snapshot: {}", e);
                }
            }
        }
        log::info!("Feed publisher stopped");
    })
}
