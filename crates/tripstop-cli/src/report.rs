//! Plain-text rendering of server responses.

use std::fmt::Write;
use tripstop_core::{Place, Route, StopsPlan, WaypointRoute};

use crate::client::StopsSummary;

pub fn route_summary(route: &Route) -> String {
    let mut out = format!(
        "Route ({}): {} in {}\n  from {}\n  to   {}\n",
        route.mode,
        route.distance,
        route.duration,
        route.origin_coord.to_pair_string(),
        route.destination_coord.to_pair_string(),
    );
    for (index, step) in route.steps.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {} ({}, {})",
            index + 1,
            step.instruction,
            step.distance,
            step.duration
        );
    }
    out
}

pub fn waypoint_summary(route: &WaypointRoute) -> String {
    let mut out = format!(
        "Route ({}): {} in {} over {} legs\n",
        route.mode,
        route.distance,
        route.duration,
        route.legs.len()
    );
    for (index, leg) in route.legs.iter().enumerate() {
        let _ = writeln!(
            out,
            "  Leg {}: {} -> {} ({}, {})",
            index + 1,
            leg.start.to_pair_string(),
            leg.end.to_pair_string(),
            leg.distance,
            leg.duration
        );
    }
    out
}

fn place_line(place: &Place) -> String {
    let rating = place
        .rating
        .map(|rating| format!("{:.1}★ ({})", rating, place.user_rating_count))
        .unwrap_or_else(|| "unrated".to_string());
    let detour = place
        .detour_minutes
        .map(|minutes| format!("+{} min", minutes))
        .unwrap_or_else(|| "detour unknown".to_string());
    let open = if place.is_open { "open" } else { "closed" };
    format!("{} - {} [{}, {}, {}]", place.name, place.address, rating, detour, open)
}

fn plan_lines(plan: &StopsPlan, out: &mut String) {
    for segment in &plan.segments {
        let _ = writeln!(out, "  {}", segment.label);
        for stop in &segment.recommended_places {
            let detour = stop
                .detour_minutes
                .map(|minutes| format!(", +{} min", minutes))
                .unwrap_or_default();
            let _ = writeln!(out, "    * {}{}: {}", stop.name, detour, stop.reasoning);
        }
    }
}

/// Curated stops first when present, otherwise the top `limit` places.
pub fn stops_summary(summary: &StopsSummary, limit: usize) -> String {
    let mut out = format!(
        "\"{}\": {} places found along the route\n",
        summary.query, summary.total_results
    );
    match &summary.intelligent_stops {
        Some(plan) if !plan.is_empty() => {
            out.push_str("Recommended stops:\n");
            plan_lines(plan, &mut out);
        }
        _ => {
            for place in summary.places.iter().take(limit) {
                let _ = writeln!(out, "  - {}", place_line(place));
            }
            if summary.places.len() > limit {
                let _ = writeln!(out, "  ... and {} more", summary.places.len() - limit);
            }
        }
    }
    out
}
