//! # Route Builder
//!
//! Turns an ordered spot list into a displayable [`Route`]: a walking route
//! from a directions provider when one is configured, or straight line
//! segments through the spots when it is not, when there are too few spots
//! for the provider, or when the provider fails.
//!
//! This is a best-effort visual aid, not a correctness-critical system:
//! every provider failure degrades to the straight-line path and is logged,
//! never surfaced.

use std::sync::Arc;

use log::{debug, warn};

use crate::location::BoxFuture;
use crate::route_cache::RouteCache;
use crate::{GpsPoint, Result, Route, RouteStyle, TourSpot};

/// Provider-imposed cap on intermediate waypoints per directions request.
pub const MAX_VIA_WAYPOINTS: usize = 23;

/// A walking-directions provider.
///
/// Implementations return the route's coordinate sequence from `origin` to
/// `destination` passing through `via` in order.
pub trait DirectionsProvider: Send + Sync {
    fn walking_route<'a>(
        &'a self,
        origin: GpsPoint,
        destination: GpsPoint,
        via: &'a [GpsPoint],
    ) -> BoxFuture<'a, Result<Vec<GpsPoint>>>;
}

/// Builds and memoizes routes for spot sets.
pub struct RouteBuilder {
    provider: Option<Arc<dyn DirectionsProvider>>,
    cache: RouteCache,
    style: RouteStyle,
}

impl RouteBuilder {
    /// Builder with no directions provider: every route is the straight-line
    /// path.
    pub fn new() -> Self {
        Self {
            provider: None,
            cache: RouteCache::default(),
            style: RouteStyle::default(),
        }
    }

    pub fn with_provider(provider: Arc<dyn DirectionsProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::new()
        }
    }

    pub fn style(mut self, style: RouteStyle) -> Self {
        self.style = style;
        self
    }

    pub fn cache(mut self, cache: RouteCache) -> Self {
        self.cache = cache;
        self
    }

    /// Build the route for an ordered spot list, or return the cached one.
    ///
    /// Fewer than 2 spots means there is nothing to draw (`None`). Identical
    /// spot sets never re-issue provider calls while the cache entry is
    /// fresh.
    ///
    /// Only the first [`MAX_VIA_WAYPOINTS`] intermediate spots shape the
    /// provider route; any excess is dropped from route shaping (though such
    /// spots are still rendered as markers and detected for proximity).
    pub async fn build_route(&mut self, spots: &[TourSpot]) -> Option<Route> {
        if spots.len() < 2 {
            return None;
        }

        let waypoints: Vec<GpsPoint> = spots.iter().map(|s| s.coordinates).collect();
        let key = RouteCache::key_for(&waypoints);

        if let Some(route) = self.cache.get(&key) {
            debug!("[RouteBuilder] cache hit for {} waypoints", waypoints.len());
            return Some(route);
        }

        let points = match &self.provider {
            Some(provider) => self
                .fetch_directions(provider.as_ref(), &waypoints)
                .await
                .unwrap_or_else(|| waypoints.clone()),
            None => waypoints.clone(),
        };

        let route = Route::with_style(points, &self.style);
        self.cache.insert(key, route.clone());
        Some(route)
    }

    /// Drop any cached route for this spot set, forcing a rebuild.
    pub fn invalidate(&mut self, spots: &[TourSpot]) {
        let waypoints: Vec<GpsPoint> = spots.iter().map(|s| s.coordinates).collect();
        self.cache.invalidate(&RouteCache::key_for(&waypoints));
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    async fn fetch_directions(
        &self,
        provider: &dyn DirectionsProvider,
        waypoints: &[GpsPoint],
    ) -> Option<Vec<GpsPoint>> {
        let origin = waypoints[0];
        let destination = waypoints[waypoints.len() - 1];

        let via = &waypoints[1..waypoints.len() - 1];
        if via.len() > MAX_VIA_WAYPOINTS {
            warn!(
                "[RouteBuilder] {} intermediate waypoints exceed the provider cap; \
                 only the first {} shape the route",
                via.len(),
                MAX_VIA_WAYPOINTS
            );
        }
        let via = &via[..via.len().min(MAX_VIA_WAYPOINTS)];

        match provider.walking_route(origin, destination, via).await {
            Ok(points) if points.len() >= 2 => Some(points),
            Ok(points) => {
                warn!(
                    "[RouteBuilder] provider returned {} points; using straight-line fallback",
                    points.len()
                );
                None
            }
            Err(e) => {
                warn!("[RouteBuilder] directions failed ({e}); using straight-line fallback");
                None
            }
        }
    }
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
