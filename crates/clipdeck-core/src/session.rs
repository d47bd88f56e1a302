//! Player Session - one loaded clip and its engine observers
//!
//! A session lives from the moment a clip is loaded until the next clip
//! replaces it or the view goes away. Closing it (or dropping it) releases
//! every observer it installed on the engine.

use crate::{engine::Subscription, ItemId, MediaItem, SessionId};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Live association between the engine and the state machine observers
#[derive(Debug)]
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Catalog entry being played
    item: MediaItem,
    /// Engine-side handle of the loaded item
    engine_item: ItemId,
    /// State machine generation owning this session's events
    generation: u64,
    /// Observer registrations
    subscription: Subscription,
    /// Load time
    started_at: DateTime<Utc>,
}

impl PlayerSession {
    pub fn new(
        item: MediaItem,
        engine_item: ItemId,
        generation: u64,
        subscription: Subscription,
    ) -> Self {
        Self {
            id: SessionId::new(),
            item,
            engine_item,
            generation,
            subscription,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn item(&self) -> &MediaItem {
        &self.item
    }

    pub fn engine_item(&self) -> ItemId {
        self.engine_item
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the observers are still installed
    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Release every observer installed for this session
    pub fn close(mut self) {
        self.subscription.cancel();
        debug!(
            session_id = %self.id,
            item = %self.item.title,
            lifetime_ms = (Utc::now() - self.started_at).num_milliseconds(),
            "Session closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalog, MediaEngine, SimulatedEngine};
    use std::sync::Arc;

    #[test]
    fn test_close_releases_observers() {
        let engine = Arc::new(SimulatedEngine::new());
        let item = Catalog::reference().items()[0].clone();
        let engine_item = engine.replace_current_item(&item.source_uri).unwrap();

        let mut subscription = Subscription::new(engine.clone());
        subscription.push(engine.observe_time_control(Box::new(|_| {})).unwrap());
        subscription.push(engine.observe_item_end(engine_item, Box::new(|| {})).unwrap());

        let session = PlayerSession::new(item.clone(), engine_item, 1, subscription);
        assert!(session.is_active());
        assert_eq!(session.item(), &item);
        assert_eq!(session.engine_item(), engine_item);
        assert_eq!(engine.observer_count(), 2);

        session.close();
        assert_eq!(engine.observer_count(), 0);
    }
}
