//! Live feed: pushes the in-progress matches to every connected viewer.
//!
//! Mutations never talk to viewers directly. The tournament manager emits a
//! [`StateChangeNotification`] through a [`FeedNotifier`] after each save; the
//! task started by [`spawn_publisher`] reads the saved state and fans a
//! [`ScoreSnapshot`] out through the [`LiveFeed`]. Delivery is best-effort.

pub mod publisher;
pub mod snapshot;

pub use publisher::{
    DEFAULT_EVENT_BUFFER, DEFAULT_SUBSCRIBER_BUFFER, FeedNotifier, LiveFeed, StateChangeNotification,
    SubscriberId, Subscription, notifier, spawn_publisher,
};
pub use snapshot::{MatchSummary, ScoreSnapshot, TBD, load_snapshot};
