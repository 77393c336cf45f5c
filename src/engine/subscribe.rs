//! Observers of the periodic transport update.

use serde::Serialize;

use crate::engine::track::TrackView;

/// Payload pushed to subscribers on every tick while playing or recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportUpdate {
    pub current_time: f64,
    pub tracks: Vec<TrackView>,
    pub is_recording: bool,
    pub recording_elapsed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&TransportUpdate)>;

/// Every active subscriber receives every update, in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&TransportUpdate) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&mut self, update: &TransportUpdate) {
        for (_, callback) in self.entries.iter_mut() {
            callback(update);
        }
    }
}
