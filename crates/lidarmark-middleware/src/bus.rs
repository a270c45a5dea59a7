//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Scan`] | Raw laser scans from the sensor stream |
//! | [`Topic::Odometry`] | Robot pose updates |
//! | [`Topic::Markers`] | Detected-landmark markers bound for visualisation |
//! | [`Topic::DecimatedScan`] | Downsampled scans produced by the decimator |

use lidarmark_types::{Event, LidarError};
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes of the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Scan,
    Odometry,
    Markers,
    DecimatedScan,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    scan: broadcast::Sender<Event>,
    odometry: broadcast::Sender<Event>,
    markers: broadcast::Sender<Event>,
    decimated_scan: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (scan, _) = broadcast::channel(capacity);
        let (odometry, _) = broadcast::channel(capacity);
        let (markers, _) = broadcast::channel(capacity);
        let (decimated_scan, _) = broadcast::channel(capacity);
        Self {
            scan,
            odometry,
            markers,
            decimated_scan,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event, or
    /// [`LidarError::Channel`] when nobody is listening on the topic.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, LidarError> {
        self.topic_sender(topic)
            .send(event)
            .map_err(|_| LidarError::Channel(format!("No subscribers for topic {topic:?}")))
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Scan => &self.scan,
            Topic::Odometry => &self.odometry,
            Topic::Markers => &self.markers,
            Topic::DecimatedScan => &self.decimated_scan,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take the next already-buffered event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidarmark_types::{EventPayload, OdometryData};

    fn make_event(source: &str) -> Event {
        Event::new(source, EventPayload::Odometry(OdometryData::default()))
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = EventBus::default();
        let result = bus.publish_to(Topic::Scan, make_event("test"));
        assert!(matches!(result, Err(LidarError::Channel(_))));
    }

    #[tokio::test]
    async fn topic_multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut subscriber1 = bus.subscribe_to(Topic::Odometry);
        let mut subscriber2 = bus.subscribe_to(Topic::Odometry);

        let event = make_event("ros2::odom");
        let delivered = bus.publish_to(Topic::Odometry, event.clone())?;
        assert_eq!(delivered, 2);

        assert_eq!(subscriber1.recv().await?.id, event.id);
        assert_eq!(subscriber2.recv().await?.id, event.id);
        Ok(())
    }

    /// A subscriber on `Markers` must not receive events published to `Scan`.
    #[tokio::test]
    async fn topic_subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut markers = bus.subscribe_to(Topic::Markers);
        let _scan_sub = bus.subscribe_to(Topic::Scan);

        bus.publish_to(Topic::Scan, make_event("ros2::scan"))?;

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), markers.recv()).await;
        assert!(result.is_err(), "Markers subscriber must not receive a Scan event");
        assert_eq!(markers.topic(), Topic::Markers);
        Ok(())
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn topic_channel_lag_on_slow_subscriber() {
        let bus = EventBus::new(16);
        let mut slow_sub = bus.subscribe_to(Topic::Scan);

        for _ in 0..1_000 {
            let _ = bus.publish_to(Topic::Scan, make_event("flood::scan"));
        }

        let result = slow_sub.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(Topic::Markers), 0);
        let rx = bus.subscribe_to(Topic::Markers);
        assert_eq!(bus.subscriber_count(Topic::Markers), 1);
        drop(rx);
        assert_eq!(bus.subscriber_count(Topic::Markers), 0);
    }

    #[test]
    fn try_recv_drains_buffered_events_then_reports_empty() {
        let bus = EventBus::default();
        let mut odom = bus.subscribe_to(Topic::Odometry);
        assert!(matches!(odom.try_recv(), Err(broadcast::error::TryRecvError::Empty)));

        bus.publish_to(Topic::Odometry, make_event("a")).unwrap();
        bus.publish_to(Topic::Odometry, make_event("b")).unwrap();

        assert_eq!(odom.try_recv().unwrap().source, "a");
        assert_eq!(odom.try_recv().unwrap().source, "b");
        assert!(matches!(odom.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }
}
