//! Along-route stop search and curation.
//!
//! Short trips get one search over the whole polyline. Long trips are split
//! into time segments searched one after another, and each segment's places
//! are curated separately before the plans are merged. Callers may also pin a
//! single segment themselves.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use tripstop_core::{
    build_prompt, combine_across_segments, is_long_route, parse_curation_response,
    plan_segments_capped, reconcile_plan, segment_label, Coordinate, Place, RouteSegment,
    SearchParams, SegmentContext, SegmentFailure, StopsPlan, TripError, UpstreamError,
    DEFAULT_TARGET_SEGMENT_SECONDS,
};
use tripstop_google::{GeminiClient, PlaceSearchResult, PlacesClient};

use crate::config::{Config, DEFAULT_MAX_SEGMENTS, DEFAULT_SEGMENT_DELAY};

/// Along-route place search.
pub trait PlaceSearch: Send + Sync {
    fn search(
        &self,
        params: &SearchParams,
    ) -> impl Future<Output = Result<PlaceSearchResult, TripError>> + Send;
}

/// Free-text generation used to rank candidate stops.
pub trait TextGeneration: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

impl PlaceSearch for PlacesClient {
    async fn search(&self, params: &SearchParams) -> Result<PlaceSearchResult, TripError> {
        PlacesClient::search(self, params).await
    }
}

impl TextGeneration for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        GeminiClient::generate(self, prompt).await
    }
}

#[derive(Debug, Clone)]
pub struct SegmentSettings {
    pub target_seconds: u64,
    pub max_segments: usize,
    /// Pause between consecutive segment searches.
    pub delay: Duration,
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            target_seconds: DEFAULT_TARGET_SEGMENT_SECONDS,
            max_segments: DEFAULT_MAX_SEGMENTS,
            delay: DEFAULT_SEGMENT_DELAY,
        }
    }
}

impl From<&Config> for SegmentSettings {
    fn from(config: &Config) -> Self {
        Self {
            target_seconds: config.segment_target_seconds,
            max_segments: config.max_segments,
            delay: config.segment_delay,
        }
    }
}

/// Caller-supplied segment bounds, in seconds from departure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
    pub start_time: u64,
    pub end_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_formatted: Option<String>,
}

/// Body of `POST /api/places/search`. Everything is optional at the wire
/// level so that missing fields surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopsRequest {
    #[serde(default)]
    pub text_query: String,
    #[serde(default)]
    pub encoded_polyline: String,
    pub max_result_count: Option<u32>,
    #[serde(default)]
    pub open_now: bool,
    pub included_type: Option<String>,
    pub origin: Option<Coordinate>,
    #[serde(alias = "durationSeconds")]
    pub route_duration_seconds: Option<u64>,
    pub segment: Option<usize>,
    pub segment_info: Option<SegmentInfo>,
}

/// Outcome of one segment of a segmented search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    #[serde(flatten)]
    pub segment: RouteSegment,
    pub total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<UpstreamError>,
    #[serde(skip)]
    pub places: Vec<Place>,
}

impl SegmentResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedSearch {
    pub places: Vec<Place>,
    pub segment_results: Vec<SegmentResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopsResponse {
    pub query: String,
    pub total_results: usize,
    pub origin: Coordinate,
    pub places: Vec<Place>,
    pub intelligent_stops: Option<StopsPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_info: Option<SegmentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_results: Option<Vec<SegmentResult>>,
}

/// Search `segments` one at a time, pausing `delay` between calls.
///
/// A failing segment is logged and contributes nothing. Only when every
/// segment fails is the search itself an error.
pub async fn execute_segmented_search<S: PlaceSearch>(
    search: &S,
    base: &SearchParams,
    segments: &[RouteSegment],
    route_duration_seconds: u64,
    delay: Duration,
) -> Result<SegmentedSearch, TripError> {
    let mut places = Vec::new();
    let mut segment_results = Vec::with_capacity(segments.len());
    let mut failures = Vec::new();

    for (position, segment) in segments.iter().enumerate() {
        let params = base
            .clone()
            .with_segment(SegmentContext::new(segment, route_duration_seconds));

        match search.search(&params).await {
            Ok(result) => {
                tracing::debug!(
                    "Segment {} ({}) returned {} places",
                    segment.index,
                    segment.label,
                    result.places.len()
                );
                places.extend(result.places.iter().cloned());
                segment_results.push(SegmentResult {
                    segment: segment.clone(),
                    total_results: result.places.len(),
                    error: None,
                    places: result.places,
                });
            }
            Err(err) => {
                let error = err.into_upstream();
                tracing::warn!(
                    "Segment {} ({}) search failed: {}",
                    segment.index,
                    segment.label,
                    error
                );
                failures.push(SegmentFailure {
                    segment_index: segment.index,
                    label: segment.label.clone(),
                    error: error.clone(),
                });
                segment_results.push(SegmentResult {
                    segment: segment.clone(),
                    total_results: 0,
                    error: Some(error),
                    places: Vec::new(),
                });
            }
        }

        if position + 1 < segments.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    if !segments.is_empty() && failures.len() == segments.len() {
        return Err(TripError::AggregateUpstream(failures));
    }

    Ok(SegmentedSearch {
        places,
        segment_results,
    })
}

/// Ask the model for a stops plan over `places`.
///
/// Failures are soft and yield `None`; the place search result stands on its
/// own.
pub async fn curate<G: TextGeneration>(
    generator: Option<&G>,
    places: &[Place],
    origin: &Coordinate,
    query: &str,
) -> Option<StopsPlan> {
    let generator = generator?;
    if places.is_empty() {
        tracing::debug!("No places to curate for \"{}\"", query);
        return None;
    }

    let prompt = build_prompt(places, origin, query);
    let text = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("Curation request failed: {}", err);
            return None;
        }
    };

    let Some(raw) = parse_curation_response(&text) else {
        tracing::warn!("Curation response had no usable stops plan");
        return None;
    };
    let plan = reconcile_plan(raw, places);
    tracing::info!(
        "Curated {} stops in {} segments",
        plan.recommendation_count(),
        plan.segments.len()
    );
    Some(plan)
}

/// Place search plus curation for one request.
pub struct StopPlanner<S, G> {
    search: S,
    generator: Option<G>,
    settings: SegmentSettings,
}

impl<S: PlaceSearch, G: TextGeneration> StopPlanner<S, G> {
    pub fn new(search: S, generator: Option<G>, settings: SegmentSettings) -> Self {
        Self {
            search,
            generator,
            settings,
        }
    }

    pub fn curation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn plan_and_curate_stops(
        &self,
        request: StopsRequest,
    ) -> Result<StopsResponse, TripError> {
        let (base, origin) = validate(&request)?;
        let route_duration = request.route_duration_seconds.unwrap_or(0);

        if let (Some(index), Some(info)) = (request.segment, request.segment_info.clone()) {
            return self.pinned_segment(&request, base, origin, index, info, route_duration).await;
        }

        if is_long_route(route_duration) {
            return self.segmented(&request, &base, origin, route_duration).await;
        }

        tracing::info!("Single-shot search for \"{}\"", base.text_query);
        let result = self.search.search(&base).await?;
        let intelligent_stops =
            curate(self.generator.as_ref(), &result.places, &origin, &base.text_query).await;

        Ok(StopsResponse {
            query: request.text_query.clone(),
            total_results: result.total_results,
            origin,
            places: result.places,
            intelligent_stops,
            segment: None,
            segment_info: None,
            segment_results: None,
        })
    }

    async fn pinned_segment(
        &self,
        request: &StopsRequest,
        base: SearchParams,
        origin: Coordinate,
        index: usize,
        info: SegmentInfo,
        route_duration: u64,
    ) -> Result<StopsResponse, TripError> {
        if info.end_time < info.start_time {
            return Err(TripError::validation("segmentInfo.endTime precedes startTime"));
        }
        if route_duration > 0 && info.end_time > route_duration {
            return Err(TripError::validation(
                "segmentInfo.endTime exceeds routeDurationSeconds",
            ));
        }
        let label = info
            .start_time_formatted
            .clone()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| segment_label(info.start_time, info.end_time));

        tracing::info!("Pinned segment {} ({}) search for \"{}\"", index, label, base.text_query);
        let params = base.with_segment(SegmentContext {
            index,
            label,
            start_offset_seconds: info.start_time,
            end_offset_seconds: info.end_time,
            route_duration_seconds: route_duration,
        });
        let result = self.search.search(&params).await?;
        let intelligent_stops =
            curate(self.generator.as_ref(), &result.places, &origin, &params.text_query).await;

        Ok(StopsResponse {
            query: request.text_query.clone(),
            total_results: result.total_results,
            origin,
            places: result.places,
            intelligent_stops,
            segment: Some(index),
            segment_info: Some(info),
            segment_results: None,
        })
    }

    async fn segmented(
        &self,
        request: &StopsRequest,
        base: &SearchParams,
        origin: Coordinate,
        route_duration: u64,
    ) -> Result<StopsResponse, TripError> {
        let segments = plan_segments_capped(
            route_duration,
            self.settings.target_seconds,
            self.settings.max_segments,
        );
        tracing::info!(
            "Segmented search for \"{}\": {} segments over {}s",
            base.text_query,
            segments.len(),
            route_duration
        );

        let outcome = execute_segmented_search(
            &self.search,
            base,
            &segments,
            route_duration,
            self.settings.delay,
        )
        .await?;

        let intelligent_stops = if self.curation_enabled() {
            let curations = outcome
                .segment_results
                .iter()
                .filter(|result| result.succeeded())
                .map(|result| async move {
                    let plan = curate(
                        self.generator.as_ref(),
                        &result.places,
                        &origin,
                        &base.text_query,
                    )
                    .await;
                    (result.segment.clone(), plan)
                });
            Some(combine_across_segments(join_all(curations).await)).filter(|plan| !plan.is_empty())
        } else {
            None
        };

        Ok(StopsResponse {
            query: request.text_query.clone(),
            total_results: outcome.places.len(),
            origin,
            places: outcome.places,
            intelligent_stops,
            segment: None,
            segment_info: None,
            segment_results: Some(outcome.segment_results),
        })
    }
}

/// Check the request before any upstream call and build the base search.
fn validate(request: &StopsRequest) -> Result<(SearchParams, Coordinate), TripError> {
    if request.text_query.trim().is_empty() || request.encoded_polyline.trim().is_empty() {
        return Err(TripError::validation(
            "textQuery and encodedPolyline are required",
        ));
    }
    let origin = request.origin.ok_or_else(|| {
        TripError::validation("origin coordinates (latitude and longitude) are required")
    })?;

    let mut params = SearchParams::new(request.text_query.trim(), request.encoded_polyline.trim())
        .with_origin(origin);
    if let Some(max) = request.max_result_count {
        params.max_result_count = max;
    }
    params.open_now = request.open_now;
    params.included_type = request.included_type.clone();
    params.validate()?;
    Ok((params, origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::time::Instant;
    use tripstop_core::plan_segments;

    fn place(name: &str) -> Place {
        Place {
            id: format!("id-{name}"),
            name: name.to_string(),
            address: format!("{name} address"),
            location: Some(Coordinate::new(1.0, 2.0)),
            primary_type: "gas_station".to_string(),
            rating: Some(4.2),
            user_rating_count: 40,
            is_open: true,
            price_level: None,
            detour_seconds: Some(300.0),
            detour_minutes: Some(5.0),
            detour_meters: Some(1500),
            detour_distance: Some("1.5 km".to_string()),
            directions_uri: None,
            segment_index: None,
        }
    }

    /// Answers every search with one place per call, failing the segment
    /// indexes listed in `failing`.
    #[derive(Default)]
    struct StubSearch {
        failing: HashSet<usize>,
        calls: Mutex<Vec<(SearchParams, Instant)>>,
    }

    impl StubSearch {
        fn failing(indexes: &[usize]) -> Self {
            Self {
                failing: indexes.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(SearchParams, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PlaceSearch for StubSearch {
        async fn search(&self, params: &SearchParams) -> Result<PlaceSearchResult, TripError> {
            self.calls.lock().unwrap().push((params.clone(), Instant::now()));
            let segment_index = params.segment.as_ref().map(|segment| segment.index);
            if let Some(index) = segment_index {
                if self.failing.contains(&index) {
                    return Err(UpstreamError::new(500, format!("segment {index} down")).into());
                }
            }
            let mut found = place(&format!("Stop {}", segment_index.unwrap_or(99)));
            found.segment_index = segment_index;
            Ok(PlaceSearchResult {
                places: vec![found],
                total_results: 1,
            })
        }
    }

    /// Recommends the first candidate named in the prompt, or fails.
    struct StubGenerator {
        reply: Result<String, UpstreamError>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn replying(reply: Result<String, UpstreamError>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Picks whichever stub place appears in the prompt.
        fn echoing() -> Self {
            Self::replying(Ok(String::new()))
        }
    }

    impl TextGeneration for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = self.reply.clone()?;
            if !reply.is_empty() {
                return Ok(reply);
            }
            let name = (0..10)
                .chain([99])
                .map(|index| format!("Stop {index}"))
                .find(|name| prompt.contains(&format!("\"{name}\"")))
                .unwrap_or_default();
            Ok(json!({
                "stopsPlan": [{
                    "segment": "0-45 min",
                    "recommendedPlaces": [{
                        "name": name,
                        "address": format!("{name} address"),
                        "reasoning": "closest open stop"
                    }]
                }]
            })
            .to_string())
        }
    }

    fn request(duration: Option<u64>) -> StopsRequest {
        StopsRequest {
            text_query: "gas station".to_string(),
            encoded_polyline: "_p~iF~ps|U".to_string(),
            origin: Some(Coordinate::new(40.0, -75.0)),
            route_duration_seconds: duration,
            ..StopsRequest::default()
        }
    }

    fn planner(
        search: StubSearch,
        generator: Option<StubGenerator>,
    ) -> StopPlanner<StubSearch, StubGenerator> {
        StopPlanner::new(search, generator, SegmentSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn segmented_search_is_sequential_with_delay_between_calls() {
        let search = StubSearch::default();
        let segments = plan_segments(5400, 2100);
        let base = SearchParams::new("gas", "abc").with_origin(Coordinate::new(40.0, -75.0));
        let started = Instant::now();

        let outcome = execute_segmented_search(&search, &base, &segments, 5400, Duration::from_millis(500))
            .await
            .unwrap();

        assert_eq!(outcome.places.len(), 3);
        let calls = search.calls();
        assert_eq!(calls.len(), 3);
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(500));
        }
        // No pause after the final segment.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed < Duration::from_millis(1500));

        let labels: Vec<_> = calls
            .iter()
            .map(|(params, _)| params.segment.as_ref().unwrap().label.clone())
            .collect();
        assert_eq!(labels, ["0-30 min", "30-60 min", "60-90 min"]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_segment_is_skipped() {
        let search = StubSearch::failing(&[1]);
        let segments = plan_segments(5400, 2100);
        let base = SearchParams::new("gas", "abc");

        let outcome = execute_segmented_search(&search, &base, &segments, 5400, Duration::from_millis(500))
            .await
            .unwrap();

        let indexes: Vec<_> = outcome.places.iter().map(|place| place.segment_index).collect();
        assert_eq!(indexes, [Some(0), Some(2)]);
        assert!(outcome.segment_results[0].succeeded());
        assert_eq!(outcome.segment_results[1].error.as_ref().unwrap().status, 500);
        assert!(outcome.segment_results[2].succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn all_segments_failing_is_aggregate_error() {
        let search = StubSearch::failing(&[0, 1, 2]);
        let segments = plan_segments(5400, 2100);
        let base = SearchParams::new("gas", "abc");

        let err = execute_segmented_search(&search, &base, &segments, 5400, Duration::ZERO)
            .await
            .unwrap_err();

        match err {
            TripError::AggregateUpstream(failures) => {
                assert_eq!(failures.len(), 3);
                assert_eq!(failures[2].label, "60-90 min");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn curation_is_skipped_without_generator() {
        let plan = curate::<StubGenerator>(None, &[place("Stop 0")], &Coordinate::new(0.0, 0.0), "gas").await;
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn curation_failures_are_soft() {
        let places = [place("Stop 0")];
        let origin = Coordinate::new(0.0, 0.0);

        let failing = StubGenerator::replying(Err(UpstreamError::new(503, "overloaded")));
        assert!(curate(Some(&failing), &places, &origin, "gas").await.is_none());

        let prose = StubGenerator::replying(Ok("Sorry, I cannot help with that.".to_string()));
        assert!(curate(Some(&prose), &places, &origin, "gas").await.is_none());
    }

    #[tokio::test]
    async fn curation_copies_canonical_fields() {
        let generator = StubGenerator::echoing();
        let places = [place("Stop 0")];

        let plan = curate(Some(&generator), &places, &Coordinate::new(40.0, -75.0), "gas")
            .await
            .unwrap();

        let recommended = &plan.segments[0].recommended_places[0];
        assert_eq!(recommended.location, Some(Coordinate::new(1.0, 2.0)));
        assert_eq!(recommended.id, "id-Stop 0");
        assert_eq!(recommended.reasoning, "closest open stop");
        assert!(generator.prompts.lock().unwrap()[0].contains("Origin: 40, -75"));
    }

    #[tokio::test]
    async fn missing_origin_fails_before_any_search() {
        let planner = planner(StubSearch::default(), None);
        let mut request = request(None);
        request.origin = None;

        let err = planner.plan_and_curate_stops(request).await.unwrap_err();

        assert!(matches!(err, TripError::Validation(_)));
        assert!(planner.search.calls().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_origin_is_rejected() {
        let planner = planner(StubSearch::default(), None);
        let mut request = request(None);
        request.origin = Some(Coordinate::new(120.0, 0.0));

        let err = planner.plan_and_curate_stops(request).await.unwrap_err();

        assert!(matches!(err, TripError::Validation(_)));
        assert!(planner.search.calls().is_empty());
    }

    #[tokio::test]
    async fn short_route_uses_single_search() {
        let planner = planner(StubSearch::default(), Some(StubGenerator::echoing()));

        let response = planner.plan_and_curate_stops(request(Some(2700))).await.unwrap();

        let calls = planner.search.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.segment.is_none());
        assert_eq!(response.total_results, 1);
        assert!(response.places[0].segment_index.is_none());
        assert!(response.segment_results.is_none());
        let stops = response.intelligent_stops.unwrap();
        assert_eq!(stops.segments[0].recommended_places[0].name, "Stop 99");
    }

    #[tokio::test(start_paused = true)]
    async fn long_route_curates_each_segment() {
        let planner = planner(StubSearch::failing(&[1]), Some(StubGenerator::echoing()));

        let response = planner.plan_and_curate_stops(request(Some(5400))).await.unwrap();

        assert_eq!(planner.search.calls().len(), 3);
        assert_eq!(response.total_results, 2);
        let segment_results = response.segment_results.as_ref().unwrap();
        assert_eq!(segment_results.len(), 3);

        let stops = response.intelligent_stops.unwrap();
        let labels: Vec<_> = stops.segments.iter().map(|segment| segment.label.as_str()).collect();
        assert_eq!(labels, ["0-30 min (0-45 min)", "60-90 min (0-45 min)"]);
        assert_eq!(stops.segments[1].recommended_places[0].segment_index, Some(2));
        assert_eq!(stops.segments[1].recommended_places[0].name, "Stop 2");
    }

    #[tokio::test]
    async fn pinned_segment_is_echoed() {
        let planner = planner(StubSearch::default(), None);
        let mut request = request(Some(14_138));
        request.segment = Some(2);
        request.segment_info = Some(SegmentInfo {
            start_time: 3600,
            end_time: 5400,
            start_time_formatted: Some("1h".to_string()),
        });

        let response = planner.plan_and_curate_stops(request).await.unwrap();

        let calls = planner.search.calls();
        assert_eq!(calls.len(), 1);
        let segment = calls[0].0.segment.as_ref().unwrap();
        assert_eq!(segment.index, 2);
        assert_eq!(segment.label, "1h");
        assert_eq!(segment.route_duration_seconds, 14_138);
        assert_eq!(response.segment, Some(2));
        assert_eq!(response.segment_info.unwrap().start_time, 3600);
        assert!(response.intelligent_stops.is_none());
    }

    #[tokio::test]
    async fn pinned_segment_past_route_end_is_rejected() {
        let planner = planner(StubSearch::default(), None);
        let mut request = request(Some(5400));
        request.segment = Some(0);
        request.segment_info = Some(SegmentInfo {
            start_time: u64::MAX - 10,
            end_time: u64::MAX - 5,
            start_time_formatted: None,
        });

        let err = planner.plan_and_curate_stops(request).await.unwrap_err();

        assert!(matches!(err, TripError::Validation(_)));
        assert!(planner.search.calls().is_empty());
    }

    #[tokio::test]
    async fn pinned_segment_with_huge_offsets_and_unknown_duration() {
        let planner = planner(StubSearch::default(), None);
        let mut request = request(None);
        request.segment = Some(0);
        request.segment_info = Some(SegmentInfo {
            start_time: u64::MAX - 10,
            end_time: u64::MAX - 5,
            start_time_formatted: None,
        });

        let response = planner.plan_and_curate_stops(request).await.unwrap();

        assert_eq!(response.segment, Some(0));
        let calls = planner.search.calls();
        let progress = calls[0].0.segment.as_ref().unwrap().progress();
        assert!((0.0..=1.0).contains(&progress));
    }

    /// Rejects the middle segment with a non-upstream error.
    struct RejectingSearch;

    impl PlaceSearch for RejectingSearch {
        async fn search(&self, params: &SearchParams) -> Result<PlaceSearchResult, TripError> {
            match params.segment.as_ref().map(|segment| segment.index) {
                Some(1) => Err(TripError::validation("segment bias out of range")),
                index => Ok(PlaceSearchResult {
                    places: vec![place(&format!("Stop {}", index.unwrap_or(99)))],
                    total_results: 1,
                }),
            }
        }
    }

    #[tokio::test]
    async fn non_upstream_segment_error_is_recorded_and_skipped() {
        let segments = plan_segments(5400, 2100);
        let base = SearchParams::new("gas", "abc");

        let outcome = execute_segmented_search(&RejectingSearch, &base, &segments, 5400, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(outcome.places.len(), 2);
        let error = outcome.segment_results[1].error.as_ref().unwrap();
        assert_eq!(error.status, 400);
        assert!(error.body.contains("segment bias out of range"));
    }

    #[test]
    fn response_serializes_null_stops() {
        let response = StopsResponse {
            query: "gas".to_string(),
            total_results: 0,
            origin: Coordinate::new(1.0, 2.0),
            places: Vec::new(),
            intelligent_stops: None,
            segment: None,
            segment_info: None,
            segment_results: None,
        };
        let body = serde_json::to_value(&response).unwrap();
        assert!(body["intelligentStops"].is_null());
        assert_eq!(body["totalResults"], 0);
        assert!(body.get("segmentResults").is_none());
    }
}
