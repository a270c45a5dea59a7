//! Conversions between bus payloads and perception types.

use lidarmark_perception::RangeScan;
use lidarmark_types::LaserScanData;

pub fn range_scan_from(data: &LaserScanData) -> RangeScan {
    RangeScan::new(
        data.ranges.clone(),
        data.angle_min,
        data.angle_increment,
        data.range_max,
    )
}

/// Rebuild `source` around the readings of `scan`.
///
/// Geometry comes from `scan`; header, `angle_max`, `range_min` and the
/// timing fields are carried over from `source` unchanged.
pub fn laser_scan_from(source: &LaserScanData, scan: &RangeScan) -> LaserScanData {
    LaserScanData {
        header: source.header.clone(),
        angle_min: scan.angle_min(),
        angle_max: source.angle_max,
        angle_increment: scan.angle_increment(),
        time_increment: source.time_increment,
        scan_time: source.scan_time,
        range_min: source.range_min,
        range_max: scan.range_max(),
        ranges: scan.ranges().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lidarmark_types::{RosTime, ScanHeader};

    fn recorded() -> LaserScanData {
        LaserScanData {
            header: ScanHeader {
                frame_id: "base_scan".to_string(),
                stamp: RosTime { sec: 42, nanosec: 7 },
            },
            angle_min: -0.5,
            angle_max: 0.0,
            angle_increment: 0.25,
            time_increment: 0.001,
            scan_time: 0.2,
            range_min: 0.12,
            range_max: 8.0,
            ranges: vec![1.0, 2.0, 3.0],
        }
    }

    #[test]
    fn conversion_keeps_every_field() {
        let data = recorded();
        let scan = range_scan_from(&data);
        assert_eq!(scan.len(), 3);
        assert_eq!(laser_scan_from(&data, &scan), data);
    }

    #[test]
    fn decimated_readings_keep_message_metadata() {
        let data = recorded();
        let out = laser_scan_from(&data, &range_scan_from(&data).decimate(2));
        assert_eq!(out.ranges, vec![1.0, 3.0]);
        assert_eq!(out.angle_increment, 0.5);
        assert_eq!(out.header, data.header);
        assert_eq!(out.angle_max, data.angle_max);
        assert_eq!(out.range_min, 0.12);
        assert_eq!(out.scan_time, 0.2);
        assert_eq!(out.time_increment, 0.001);
    }
}
