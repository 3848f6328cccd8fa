//! Stop curation: prompt construction, parsing of the model's JSON answer and
//! reconciliation of its recommendations against the places we actually found.
//!
//! The model is asked for JSON but is free to wrap it in prose or code fences,
//! to quote numbers, or to invent places. Nothing it returns is trusted beyond
//! the name/address pair used to look up the canonical [`Place`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{Coordinate, Place, RecommendedPlace, StopsPlan, StopsSegment};
use crate::segments::RouteSegment;
use crate::time_format::round_one_decimal;

const RANKING_INSTRUCTIONS: &str = r#"You help drivers choose where to stop along a road trip.

You receive the trip origin and a list of candidate places found along the route. Each candidate has a name, address, rating, userRatingCount, isOpen, priceLevel, detourMinutes (extra driving time), detourMeters (extra distance), directionsUri and location.

Build a stops plan:
1. Split the trip into segments of 30-45 minutes of driving time and recommend 1-2 places per segment. Spread the recommendations over the whole trip instead of clustering them near the origin.
2. Rank candidates by, in order:
   a. open now
   b. smallest detour time, then distance
   c. higher rating
   d. more user ratings
   e. lower price level, when known
3. Copy "name" and "address" exactly as given; they are used to match your answer to the candidate list. Never invent places.

Answer with JSON only, in exactly this shape:

{
  "stopsPlan": [
    {
      "segment": "0-45 min",
      "recommendedPlaces": [
        {
          "name": "...",
          "address": "...",
          "rating": 4.2,
          "userRatingCount": 150,
          "detourTimeMinutes": 6.5,
          "detourDistanceKm": 2.3,
          "directionsUri": "...",
          "reasoning": "Shortest detour among open stations with a solid rating."
        }
      ]
    }
  ]
}"#;

/// Build the ranking prompt for `places` found while searching for `query`.
pub fn build_prompt(places: &[Place], origin: &Coordinate, query: &str) -> String {
    let candidates = serde_json::to_string_pretty(places).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{RANKING_INSTRUCTIONS}\n\nSearch: {query}\nOrigin: {}, {}\nCandidates ({} total):\n{candidates}",
        origin.latitude,
        origin.longitude,
        places.len(),
    )
}

/// The model's plan before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawStopsPlan {
    #[serde(rename = "stopsPlan", alias = "segments")]
    pub stops_plan: Option<Vec<RawStopsSegment>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawStopsSegment {
    #[serde(default, alias = "label")]
    pub segment: Option<String>,
    #[serde(default, rename = "recommendedPlaces")]
    pub recommended_places: Vec<RawRecommendation>,
}

/// One recommendation exactly as the model phrased it. Detour fields accept
/// numbers or numeric strings ("6.5", "2.3 km"). Ratings the model echoes back
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecommendation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub detour_time_minutes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub detour_distance_km: Option<f64>,
    #[serde(default)]
    pub directions_uri: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_number))
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

/// Parse the numeric prefix of `"2.3 km"`.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Extract the first JSON object shaped like a stops plan from free text.
///
/// Returns `None` when the text holds no `{...}` object, when no object
/// parses, or when the parsed object has no `stopsPlan` array.
pub fn parse_curation_response(text: &str) -> Option<RawStopsPlan> {
    for (start, _) in text.match_indices('{') {
        let mut stream =
            serde_json::Deserializer::from_str(&text[start..]).into_iter::<RawStopsPlan>();
        match stream.next() {
            Some(Ok(plan)) if plan.stops_plan.is_some() => return Some(plan),
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                tracing::trace!("no stops plan at offset {}: {}", start, err);
                continue;
            }
            None => break,
        }
    }
    tracing::debug!("curation response contained no stops plan JSON");
    None
}

/// Reconcile the model's plan with the canonical places.
///
/// Each recommendation is matched on exact `(name, address)`. Identity,
/// location, type, open status, price and ratings always come from the matched
/// place. Directions and detour values fall back to it when the model left
/// them out. Recommendations without a match are dropped, and so
/// are segments left with no recommendations.
pub fn reconcile_plan(raw: RawStopsPlan, places: &[Place]) -> StopsPlan {
    let mut segments = Vec::new();
    for raw_segment in raw.stops_plan.unwrap_or_default() {
        let recommended_places: Vec<RecommendedPlace> = raw_segment
            .recommended_places
            .into_iter()
            .filter_map(|recommendation| reconcile_one(recommendation, places))
            .collect();
        if recommended_places.is_empty() {
            continue;
        }
        segments.push(StopsSegment {
            label: raw_segment.segment.unwrap_or_default().trim().to_string(),
            recommended_places,
        });
    }
    StopsPlan { segments }
}

fn reconcile_one(recommendation: RawRecommendation, places: &[Place]) -> Option<RecommendedPlace> {
    let name = recommendation.name.as_deref()?;
    let address = recommendation.address.as_deref()?;
    let Some(place) = places
        .iter()
        .find(|place| place.name == name && place.address == address)
    else {
        tracing::debug!("dropping recommendation with no matching place: {} ({})", name, address);
        return None;
    };

    let detour_km = recommendation
        .detour_distance_km
        .or_else(|| place.detour_meters.map(|m| round_one_decimal(m as f64 / 1000.0)));

    Some(RecommendedPlace {
        id: place.id.clone(),
        name: place.name.clone(),
        address: place.address.clone(),
        location: place.location,
        primary_type: place.primary_type.clone(),
        rating: place.rating,
        user_rating_count: place.user_rating_count,
        is_open: place.is_open,
        price_level: place.price_level,
        detour_minutes: recommendation.detour_time_minutes.or(place.detour_minutes),
        detour_km,
        directions_uri: recommendation
            .directions_uri
            .filter(|uri| !uri.trim().is_empty())
            .or_else(|| place.directions_uri.clone()),
        segment_index: place.segment_index,
        reasoning: recommendation.reasoning.unwrap_or_default(),
    })
}

/// Merge per-segment plans into one, in segment order.
///
/// Entry labels are prefixed with the originating segment's time range and
/// every recommendation is tagged with that segment's index. Segments whose
/// curation produced nothing contribute nothing.
pub fn combine_across_segments<I>(per_segment: I) -> StopsPlan
where
    I: IntoIterator<Item = (RouteSegment, Option<StopsPlan>)>,
{
    let mut ordered: Vec<(RouteSegment, Option<StopsPlan>)> = per_segment.into_iter().collect();
    ordered.sort_by_key(|(segment, _)| segment.index);

    let mut segments = Vec::new();
    for (segment, plan) in ordered {
        let Some(plan) = plan else {
            continue;
        };
        for entry in plan.segments {
            let label = if entry.label.is_empty() {
                segment.label.clone()
            } else {
                format!("{} ({})", segment.label, entry.label)
            };
            let recommended_places = entry
                .recommended_places
                .into_iter()
                .map(|mut place| {
                    place.segment_index = Some(segment.index);
                    place
                })
                .collect();
            segments.push(StopsSegment {
                label,
                recommended_places,
            });
        }
    }
    StopsPlan { segments }
}
