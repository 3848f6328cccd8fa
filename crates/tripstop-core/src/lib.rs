//! Route segmentation and stop curation for road trips.
//!
//! Everything in this crate is pure: provider clients live in `tripstop-google`
//! and request orchestration in `tripstop-server`.

pub mod curation;
pub mod error;
pub mod models;
pub mod segments;
pub mod time_format;

pub use curation::{
    build_prompt, combine_across_segments, parse_curation_response, reconcile_plan,
    RawRecommendation, RawStopsPlan, RawStopsSegment,
};
pub use error::{SegmentFailure, TripError, UpstreamError};
pub use models::{
    BoundingBox, Coordinate, Leg, Place, RecommendedPlace, Route, SearchParams,
    SegmentContext, Step, StopsPlan, StopsSegment, TravelMode, WaypointRoute,
};
pub use segments::{
    is_long_route, plan_segments, plan_segments_capped, segment_label, RouteSegment,
    DEFAULT_TARGET_SEGMENT_SECONDS, LONG_ROUTE_THRESHOLD_SECONDS,
};
pub use time_format::{
    convert_seconds_to_minutes, format_distance, format_duration, parse_duration_seconds,
    DurationValue,
};
