//! Layout change notifications.

use std::fmt;

/// Something renderers or caches need to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutEvent {
    /// Marker set changed; the coordinate mapping is stale.
    ModulationMarkersChanged,
    /// Scroll position changed.
    ScrollChanged,
    /// Zoom level changed.
    ZoomChanged,
    /// A recompute produced new dimensions.
    LayoutConfigChanged,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&LayoutEvent)>;

/// Synchronous single-threaded event fan-out.
///
/// Listeners run in subscription order, on the caller's stack, before
/// `emit` returns.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&LayoutEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener.
    pub fn emit(&mut self, event: LayoutEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Drop all listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
