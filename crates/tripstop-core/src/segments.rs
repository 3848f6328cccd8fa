//! Time-based route segmentation.
//!
//! Long trips are split into equal slices of driving time so that place
//! searches and stop recommendations are spread over the whole route instead
//! of clustering near the origin.

use serde::{Deserialize, Serialize};

/// Target length of one segment (35 min).
pub const DEFAULT_TARGET_SEGMENT_SECONDS: u64 = 2_100;

/// Routes longer than this (45 min) are searched segment by segment.
pub const LONG_ROUTE_THRESHOLD_SECONDS: u64 = 2_700;

/// A contiguous slice `[start, end)` of a route's total duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub index: usize,
    pub start_offset_seconds: u64,
    pub end_offset_seconds: u64,
    pub label: String,
}

impl RouteSegment {
    pub fn duration_seconds(&self) -> u64 {
        self.end_offset_seconds - self.start_offset_seconds
    }
}

/// Whether a route must be searched in segments. The threshold itself is
/// not long.
pub fn is_long_route(duration_seconds: u64) -> bool {
    duration_seconds > LONG_ROUTE_THRESHOLD_SECONDS
}

/// Split `duration_seconds` into `ceil(duration / target)` equal segments.
///
/// Boundaries are `i * duration / n` in integer arithmetic, so the segments
/// always partition `[0, duration_seconds]` exactly, even when the duration is
/// not divisible by the segment count. A zero duration yields a single empty
/// segment.
pub fn plan_segments(duration_seconds: u64, target_segment_seconds: u64) -> Vec<RouteSegment> {
    let target = target_segment_seconds.max(1);
    let count = duration_seconds.div_ceil(target).max(1);
    build_segments(duration_seconds, count)
}

/// Like [`plan_segments`], but never more than `max_segments` slices; past the
/// cap each slice simply gets longer.
pub fn plan_segments_capped(
    duration_seconds: u64,
    target_segment_seconds: u64,
    max_segments: usize,
) -> Vec<RouteSegment> {
    let max_segments = max_segments.max(1) as u64;
    let target = target_segment_seconds.max(1);
    let count = duration_seconds.div_ceil(target).clamp(1, max_segments);
    build_segments(duration_seconds, count)
}

fn build_segments(duration_seconds: u64, count: u64) -> Vec<RouteSegment> {
    (0..count)
        .map(|i| {
            let start = boundary(duration_seconds, count, i);
            let end = boundary(duration_seconds, count, i + 1);
            RouteSegment {
                index: i as usize,
                start_offset_seconds: start,
                end_offset_seconds: end,
                label: segment_label(start, end),
            }
        })
        .collect()
}

fn boundary(duration_seconds: u64, count: u64, i: u64) -> u64 {
    // u128 so huge durations cannot overflow the multiplication.
    ((duration_seconds as u128 * i as u128) / count as u128) as u64
}

/// `"30-60 min"` for `[1800, 3600)`.
pub fn segment_label(start_seconds: u64, end_seconds: u64) -> String {
    format!(
        "{}-{} min",
        whole_minutes(start_seconds),
        whole_minutes(end_seconds)
    )
}

fn whole_minutes(seconds: u64) -> u64 {
    (seconds as f64 / 60.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(duration: u64, segments: &[RouteSegment]) {
        assert!(!segments.is_empty());
        assert_eq!(segments[0].start_offset_seconds, 0);
        assert_eq!(segments.last().unwrap().end_offset_seconds, duration);
        for (i, pair) in segments.windows(2).enumerate() {
            assert_eq!(pair[0].end_offset_seconds, pair[1].start_offset_seconds);
            assert_eq!(pair[0].index, i);
            assert_eq!(pair[1].index, i + 1);
        }
        for segment in segments {
            assert!(segment.start_offset_seconds <= segment.end_offset_seconds);
        }
    }

    #[test]
    fn ninety_minute_route_splits_in_three() {
        let segments = plan_segments(5400, DEFAULT_TARGET_SEGMENT_SECONDS);
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.duration_seconds() == 1800));
        let labels: Vec<&str> = segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["0-30 min", "30-60 min", "60-90 min"]);
    }

    #[test]
    fn partition_holds_for_awkward_durations() {
        for duration in [1, 59, 2099, 2100, 2101, 4201, 5400, 14_138, 86_399, 1_000_003] {
            let segments = plan_segments(duration, DEFAULT_TARGET_SEGMENT_SECONDS);
            assert_eq!(
                segments.len() as u64,
                duration.div_ceil(DEFAULT_TARGET_SEGMENT_SECONDS)
            );
            assert_partition(duration, &segments);
        }
    }

    #[test]
    fn segments_are_balanced_not_tail_heavy() {
        // 2 x 2100 would leave a 1 s tail; equal split gives 1400/1401 instead.
        let segments = plan_segments(4201, DEFAULT_TARGET_SEGMENT_SECONDS);
        assert_eq!(segments.len(), 3);
        let min = segments.iter().map(RouteSegment::duration_seconds).min().unwrap();
        let max = segments.iter().map(RouteSegment::duration_seconds).max().unwrap();
        assert!(max - min <= 1);
    }

    #[test]
    fn zero_duration_yields_single_segment() {
        let segments = plan_segments(0, DEFAULT_TARGET_SEGMENT_SECONDS);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, "0-0 min");
    }

    #[test]
    fn cap_limits_segment_count_and_keeps_partition() {
        let segments = plan_segments_capped(36_000, DEFAULT_TARGET_SEGMENT_SECONDS, 8);
        assert_eq!(segments.len(), 8);
        assert_partition(36_000, &segments);
    }

    #[test]
    fn long_route_threshold_is_strict() {
        assert!(!is_long_route(2699));
        assert!(!is_long_route(2700));
        assert!(is_long_route(2701));
    }
}
