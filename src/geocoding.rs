//! # Spot Geocoding
//!
//! Authored and AI-generated tours describe spots by address; this module
//! resolves them to coordinates through a [`Geocoder`] before the route and
//! proximity pipeline can use them.
//!
//! Failures are never fatal: a spot that cannot be geocoded (primary address
//! and fallback query both failing) is logged and skipped, and the tour
//! continues with the spots that resolved.

use log::{debug, warn};

use crate::location::BoxFuture;
use crate::{sort_spots, GpsPoint, TourSpot, DEFAULT_REACH_RADIUS_M};

/// Resolves a free-form address or search query to a coordinate.
///
/// `Ok(None)` means the provider answered but found nothing; `Err` is a
/// provider failure. Both lead to the fallback query, then to skipping.
pub trait Geocoder: Send + Sync {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, crate::Result<Option<GpsPoint>>>;
}

/// A spot as authored or generated, before geocoding.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpotDraft {
    pub title: String,
    pub description: String,
    pub position_order: u32,
    pub full_address: String,
    pub search_query: String,
    /// Already-known coordinates, if the author supplied them.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reach_radius_m: Option<f64>,
}

impl SpotDraft {
    fn known_coordinates(&self) -> Option<GpsPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                let point = GpsPoint::new(lat, lng);
                point.is_valid().then_some(point)
            }
            _ => None,
        }
    }
}

/// Geocode with a fallback query: try `address` first, then `search_query`
/// when it differs. Provider failures are logged at warn and treated as "not
/// found".
pub async fn geocode_with_fallback(
    geocoder: &dyn Geocoder,
    address: &str,
    search_query: Option<&str>,
) -> Option<GpsPoint> {
    if !address.is_empty() {
        match geocoder.geocode(address).await {
            Ok(Some(point)) => return Some(point),
            Ok(None) => {}
            Err(e) => warn!("[geocoding] failed for \"{address}\": {e}"),
        }
    }

    match search_query {
        Some(query) if !query.is_empty() && query != address => {
            match geocoder.geocode(query).await {
                Ok(Some(point)) => Some(point),
                Ok(None) => None,
                Err(e) => {
                    warn!("[geocoding] failed for fallback \"{query}\": {e}");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Resolve a batch of drafts into usable tour spots.
///
/// Drafts with valid coordinates pass through untouched; the rest are
/// geocoded sequentially (providers rate-limit) and unresolvable drafts are
/// skipped. The result is sorted by `position_order`.
pub async fn resolve_spots(geocoder: &dyn Geocoder, drafts: &[SpotDraft]) -> Vec<TourSpot> {
    let mut spots = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let coordinates = match draft.known_coordinates() {
            Some(point) => {
                debug!(
                    "[geocoding] spot {} already has coordinates ({}, {})",
                    draft.position_order, point.latitude, point.longitude
                );
                point
            }
            None => {
                match geocode_with_fallback(
                    geocoder,
                    &draft.full_address,
                    Some(draft.search_query.as_str()),
                )
                .await
                {
                    Some(point) => point,
                    None => {
                        warn!(
                            "[geocoding] skipping spot {} \"{}\": no coordinates",
                            draft.position_order, draft.title
                        );
                        continue;
                    }
                }
            }
        };

        spots.push(TourSpot {
            title: draft.title.clone(),
            description: draft.description.clone(),
            position_order: draft.position_order,
            coordinates,
            reach_radius_m: draft.reach_radius_m.unwrap_or(DEFAULT_REACH_RADIUS_M),
        });
    }

    sort_spots(&mut spots);
    spots
}

// ============================================================================
// Tests
// ============================================================================
