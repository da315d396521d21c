//! Typed publish/subscribe channels for game lifecycle events
//!
//! Delivery is synchronous: every handler subscribed to an event's channel
//! has run by the time `publish` returns. Handlers may publish further
//! events, subscribe, or drop subscriptions while a publish is in flight;
//! each publish works from a snapshot of the channel taken when it starts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Channel identifier, one per event variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameStart,
    GameOver,
    StartScreen,
    NextLevel,
    BricksCreated,
    BrickDestroyed,
    ScoreChanged,
    HighScoreChanged,
    LivesChanged,
}

/// Lifecycle and counter events published by [`super::GameState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    GameStart,
    GameOver,
    StartScreen,
    /// Level index after advancing
    NextLevel { level: u32 },
    /// A fresh brick grid was generated
    BricksCreated { total: u32 },
    BrickDestroyed { remaining: u32, total: u32 },
    ScoreChanged(u32),
    HighScoreChanged(u32),
    LivesChanged(u32),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::GameStart => EventKind::GameStart,
            GameEvent::GameOver => EventKind::GameOver,
            GameEvent::StartScreen => EventKind::StartScreen,
            GameEvent::NextLevel { .. } => EventKind::NextLevel,
            GameEvent::BricksCreated { .. } => EventKind::BricksCreated,
            GameEvent::BrickDestroyed { .. } => EventKind::BrickDestroyed,
            GameEvent::ScoreChanged(_) => EventKind::ScoreChanged,
            GameEvent::HighScoreChanged(_) => EventKind::HighScoreChanged,
            GameEvent::LivesChanged(_) => EventKind::LivesChanged,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&GameEvent)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: HashMap<EventKind, Vec<(u64, Handler)>>,
}

/// Shared handle to the subscription registry
///
/// Cloning is cheap and every clone talks to the same channels.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        let total: usize = registry.channels.values().map(Vec::len).sum();
        f.debug_struct("EventBus").field("subscribers", &total).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` on the channel for `kind`
    ///
    /// The handler stays registered until the returned token is dropped or revoked.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let handler: Handler = Rc::new(RefCell::new(handler));
        registry.channels.entry(kind).or_default().push((id, handler));

        Subscription {
            id,
            kind,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `event` to every handler on its channel, in subscription order
    pub fn publish(&self, event: GameEvent) {
        let snapshot: Vec<Handler> = {
            let registry = self.registry.borrow();
            match registry.channels.get(&event.kind()) {
                Some(handlers) => handlers.iter().map(|(_, h)| Rc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            match handler.try_borrow_mut() {
                Ok(mut f) => (&mut *f)(&event),
                Err(_) => log::warn!("skipping reentrant delivery of {:?}", event),
            }
        }
    }

    /// Number of live handlers on a channel
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .channels
            .get(&kind)
            .map_or(0, Vec::len)
    }

    fn unsubscribe(registry: &RefCell<Registry>, kind: EventKind, id: u64) {
        let removed = {
            let mut registry = registry.borrow_mut();
            registry.channels.get_mut(&kind).and_then(|handlers| {
                let index = handlers.iter().position(|(hid, _)| *hid == id)?;
                Some(handlers.remove(index))
            })
        };
        // The handler may own further subscriptions; release it outside the borrow.
        drop(removed);
    }
}

/// Scoped registration token
///
/// Dropping it removes the handler, so an entity that owns its subscriptions
/// can never be called back after it is gone.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Unsubscribe now (same as dropping)
    pub fn revoke(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            EventBus::unsubscribe(&registry, self.kind, self.id);
        }
    }
}
