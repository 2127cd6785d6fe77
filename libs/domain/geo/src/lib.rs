// [libs/domain/geo/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GEODESIC SPATIAL ENGINE (V1.0)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: DISTANCIA GEODÉSICA, EMPAREJAMIENTO RADIAL Y
 *                   AGRUPAMIENTO DE CUADRÍCULA DETERMINISTA
 *
 * Un único primitivo espacial (haversine) cubre tanto el
 * emparejamiento de pacientes por radio como las ventanas de
 * "cercanía" del lazo de verificación, por decisión de diseño
 * registrada en SPEC_FULL.md §9.
 * =================================================================
 */

use pulsegrid_domain_models::prelude::{GeoCluster, GeoEvent};
use std::collections::HashMap;
use uuid::Uuid;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two WGS84 points, in meters.
pub fn geodesic_distance_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let sin_half_phi = (delta_phi / 2.0).sin();
    let sin_half_lambda = (delta_lambda / 2.0).sin();

    let haversine = sin_half_phi * sin_half_phi
        + phi1.cos() * phi2.cos() * sin_half_lambda * sin_half_lambda;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_METERS * central_angle
}

pub fn within_radius_m(a: (f64, f64), b: (f64, f64), radius_m: f64) -> bool {
    geodesic_distance_m(a, b) <= radius_m
}

/// `HOSPITAL_ORIGIN_RADIUS` per SPEC_FULL.md §3/§4.7 — used both to set
/// `origin_facility_id` at SOS creation and to find an auto-resolution
/// candidate facility.
pub const HOSPITAL_ORIGIN_RADIUS_M: f64 = 500.0;

/// 0.03 degrees ≈ 3.3 km at the reference latitude; kept for documentation
/// purposes even though the implementation uses `geodesic_distance_m`
/// uniformly for the verification loop's "related SOS" window.
pub const RELATED_SOS_BOUNDING_DEGREES: f64 = 0.03;
pub const RELATED_SOS_RADIUS_M: f64 = 3_300.0;
pub const CORROBORATION_RADIUS_M: f64 = 3_000.0;

/// Grid-bucket clustering: maps `(lat, lon)` to cell `(floor(lat/p), floor(lon/p))`.
pub fn grid_cell(lat: f64, lon: f64, precision_deg: f64) -> (i64, i64) {
    (
        (lat / precision_deg).floor() as i64,
        (lon / precision_deg).floor() as i64,
    )
}

pub const DEFAULT_CLUSTER_PRECISION_DEG: f64 = 0.01;
const CLUSTER_EVENT_ID_CAP: usize = 50;

/// Deterministic grid clustering of geo events, sorted by member count desc.
pub fn cluster_geo_events(events: &[GeoEvent], precision_deg: f64) -> Vec<GeoCluster> {
    let mut buckets: HashMap<(i64, i64), Vec<&GeoEvent>> = HashMap::new();
    for event in events {
        let cell = grid_cell(event.latitude, event.longitude, precision_deg);
        buckets.entry(cell).or_default().push(event);
    }

    let mut clusters: Vec<GeoCluster> = buckets
        .into_values()
        .map(|members| build_cluster(&members))
        .collect();

    clusters.sort_by(|a, b| b.count.cmp(&a.count));
    clusters
}

fn build_cluster(members: &[&GeoEvent]) -> GeoCluster {
    let count = members.len();
    let centroid_lat = members.iter().map(|e| e.latitude).sum::<f64>() / count as f64;
    let centroid_lon = members.iter().map(|e| e.longitude).sum::<f64>() / count as f64;
    let max_severity = members.iter().map(|e| e.severity).max().unwrap_or(0);
    let avg_severity = members.iter().map(|e| e.severity as f64).sum::<f64>() / count as f64;

    let event_ids: Vec<Uuid> = members.iter().take(CLUSTER_EVENT_ID_CAP).map(|e| e.id).collect();

    let mut layers: Vec<_> = members.iter().map(|e| e.layer).collect();
    layers.dedup_by_key(|l| *l as u8);

    let min_lat = members.iter().map(|e| e.latitude).fold(f64::INFINITY, f64::min);
    let max_lat = members.iter().map(|e| e.latitude).fold(f64::NEG_INFINITY, f64::max);
    let min_lon = members.iter().map(|e| e.longitude).fold(f64::INFINITY, f64::min);
    let max_lon = members.iter().map(|e| e.longitude).fold(f64::NEG_INFINITY, f64::max);

    GeoCluster {
        centroid_lat,
        centroid_lon,
        count,
        max_severity,
        avg_severity,
        event_ids,
        layers,
        bounding_box: (min_lat, min_lon, max_lat, max_lon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_points_is_zero() {
        assert_eq!(geodesic_distance_m((31.5, 34.4), (31.5, 34.4)), 0.0);
    }

    #[test]
    fn roughly_one_degree_latitude_is_about_111km() {
        let d = geodesic_distance_m((31.0, 34.4), (32.0, 34.4));
        assert!((d - 111_195.0).abs() < 2_000.0, "unexpected distance: {d}");
    }

    #[test]
    fn five_hundred_meters_is_inclusive_boundary() {
        // A point exactly at the origin radius must count as "at facility".
        let a = (31.5, 34.4);
        let b = (31.5 + HOSPITAL_ORIGIN_RADIUS_M / 111_195.0, 34.4);
        let d = geodesic_distance_m(a, b);
        assert!(within_radius_m(a, b, d.ceil()));
    }

    #[test]
    fn grid_cell_buckets_nearby_points_together() {
        let a = grid_cell(31.501, 34.401, 0.01);
        let b = grid_cell(31.502, 34.402, 0.01);
        assert_eq!(a, b);
    }
}
