//! Per-vehicle event subscriptions.

use futures::Stream;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use super::TrackingEvent;

/// A live feed of one vehicle's [`TrackingEvent`]s.
///
/// Events arrive in the order the monitor produced them. A subscriber that
/// falls more than the buffer size behind loses the oldest events and gets
/// a single [`TrackingEvent::Gap`] in their place. Dropping the
/// subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    vehicle_id: usize,
    rx: broadcast::Receiver<TrackingEvent>,
}

impl Subscription {
    pub(crate) fn new(vehicle_id: usize, rx: broadcast::Receiver<TrackingEvent>) -> Self {
        Self { vehicle_id, rx }
    }

    pub fn vehicle_id(&self) -> usize {
        self.vehicle_id
    }

    /// Waits for the next event. Returns `None` once tracking for the
    /// vehicle has ended and every buffered event was delivered.
    pub async fn recv(&mut self) -> Option<TrackingEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(missed)) => Some(TrackingEvent::Gap { missed }),
            Err(RecvError::Closed) => None,
        }
    }

    /// Returns a buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<TrackingEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Lagged(missed)) => Some(TrackingEvent::Gap { missed }),
            Err(TryRecvError::Empty | TryRecvError::Closed) => None,
        }
    }

    /// Converts the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = TrackingEvent> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            let event = sub.recv().await?;
            Some((event, sub))
        })
    }
}
