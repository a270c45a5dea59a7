//! [`DecimatorNode`] – republishes every scan with only every n-th reading.
//!
//! Input on [`Topic::Scan`], output on [`Topic::DecimatedScan`].  The angular
//! step of the output is scaled so bearings stay correct; header, range limits
//! and timing fields are republished as received.  Scans arriving while
//! nobody listens on the output topic are skipped.

use std::sync::Arc;

use lidarmark_middleware::{EventBus, Topic, TopicReceiver};
use lidarmark_types::{Event, EventPayload, LaserScanData, LidarError};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::convert::{laser_scan_from, range_scan_from};

pub const DECIMATOR_SOURCE: &str = "lidarmark-runtime::decimator";

/// Keep every tenth reading unless configured otherwise.
pub const DEFAULT_DECIMATION_STEP: usize = 10;

pub struct DecimatorNode {
    bus: Arc<EventBus>,
    step: usize,
    scans: TopicReceiver,
}

impl DecimatorNode {
    pub fn new(bus: Arc<EventBus>, step: usize) -> Self {
        let scans = bus.subscribe_to(Topic::Scan);
        Self { bus, step, scans }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn decimate(&self, scan: &LaserScanData) -> LaserScanData {
        laser_scan_from(scan, &range_scan_from(scan).decimate(self.step))
    }

    pub async fn run(mut self) -> Result<(), LidarError> {
        loop {
            match self.scans.recv().await {
                Ok(event) => {
                    let EventPayload::LaserScan(scan) = event.payload else {
                        continue;
                    };
                    if self.bus.subscriber_count(Topic::DecimatedScan) == 0 {
                        debug!("no decimated-scan subscribers, skipping scan");
                        continue;
                    }
                    let reduced = self.decimate(&scan);
                    debug!(
                        readings_in = scan.ranges.len(),
                        readings_out = reduced.ranges.len(),
                        "scan decimated"
                    );
                    let _ = self.bus.publish_to(
                        Topic::DecimatedScan,
                        Event::new(DECIMATOR_SOURCE, EventPayload::LaserScan(reduced)),
                    );
                }
                Err(RecvError::Lagged(n)) => warn!(dropped = n, "decimator lagged"),
                Err(RecvError::Closed) => return Ok(()),
            }
        }
    }
}
