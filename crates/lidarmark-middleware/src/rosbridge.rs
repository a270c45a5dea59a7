//! WebSocket client for a rosbridge server.
//!
//! [`RosbridgeClient::run`] connects, sends the handshake (advertise the
//! output topics, subscribe to the input topics) and then shuttles traffic
//! until either side hangs up:
//!
//! ```text
//!  rosbridge ──/scan, /odom──▶ Ros2Adapter ──▶ EventBus (Scan, Odometry)
//!  rosbridge ◀──marker, scan── writer task ◀── EventBus (Markers, DecimatedScan)
//! ```
//!
//! Outbound frames go through an mpsc queue drained by a dedicated writer
//! task, so encoding never waits on the socket.

use std::sync::Arc;

use futures_util::{SinkExt, Stream, StreamExt};
use lidarmark_types::{EventPayload, LidarError};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, info, warn};

use crate::adapter::LandmarkAdapter;
use crate::bus::{EventBus, Topic, TopicReceiver};
use crate::ros2_adapter::Ros2Adapter;
use crate::ros_msgs::RosTopics;

/// Frames buffered between the bus side and the socket writer.
const OUTBOUND_CAPACITY: usize = 64;

pub struct RosbridgeClient {
    url: String,
    bus: Arc<EventBus>,
    topics: RosTopics,
}

impl RosbridgeClient {
    pub fn new(url: impl Into<String>, bus: Arc<EventBus>, topics: RosTopics) -> Self {
        Self {
            url: url.into(),
            bus,
            topics,
        }
    }

    /// Connect and run until the server closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`LidarError::Transport`] if the connection cannot be
    /// established or the socket fails mid-session.  Malformed inbound frames
    /// are logged and skipped.
    pub async fn run(self) -> Result<(), LidarError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| LidarError::Transport(format!("connect to {}: {e}", self.url)))?;
        info!(url = %self.url, "connected to rosbridge");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);

        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                ws_tx
                    .send(Message::Text(frame.into()))
                    .await
                    .map_err(|e| LidarError::Transport(format!("ws send: {e}")))?;
            }
            let _ = ws_tx.close().await;
            Ok::<(), LidarError>(())
        });

        // Subscribe before the handshake so nothing published in response to
        // the first inbound frames is missed.
        let mut markers = self.bus.subscribe_to(Topic::Markers);
        let mut decimated = self.bus.subscribe_to(Topic::DecimatedScan);

        let adapter = Ros2Adapter::new(Arc::clone(&self.bus), self.topics.clone(), out_tx.clone());
        for frame in adapter.handshake_frames() {
            out_tx
                .send(frame)
                .await
                .map_err(|_| LidarError::Transport("ws writer stopped".to_string()))?;
        }
        drop(out_tx);

        let outcome = self
            .pump(&adapter, &mut ws_rx, &mut markers, &mut decimated)
            .await;

        // Dropping the adapter closes the queue and lets the writer finish.
        drop(adapter);
        let written = match writer.await {
            Ok(result) => result,
            Err(e) => Err(LidarError::Transport(format!("ws writer task: {e}"))),
        };
        if let Err(e) = &written {
            error!(error = %e, "ws writer failed");
        } else {
            debug!("ws writer finished");
        }
        outcome.and(written)
    }

    async fn pump<S>(
        &self,
        adapter: &Ros2Adapter,
        ws_rx: &mut S,
        markers: &mut TopicReceiver,
        decimated: &mut TopicReceiver,
    ) -> Result<(), LidarError>
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        loop {
            tokio::select! {
                msg = ws_rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = adapter.handle_frame(text.as_str()) {
                            warn!(error = %e, "dropping inbound rosbridge frame");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(url = %self.url, "rosbridge closed the connection");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(LidarError::Transport(format!("ws receive: {e}")));
                    }
                    Some(Ok(_)) => {}
                },
                result = markers.recv() => match result {
                    Ok(event) => {
                        if let EventPayload::CylinderMarker(marker) = event.payload {
                            adapter.publish_marker(&marker).await?;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "marker forwarding lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                },
                result = decimated.recv() => match result {
                    Ok(event) => {
                        if let EventPayload::LaserScan(scan) = event.payload {
                            adapter.publish_scan(&scan).await?;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "decimated scan forwarding lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                },
            }
        }
    }
}
