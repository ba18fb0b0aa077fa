//! # Directions Client
//!
//! HTTP client for a Google-style walking-directions endpoint. The response's
//! overview polyline is decoded into the route's coordinate sequence.
//!
//! No retries: a single failure makes the route builder fall back to the
//! straight-line path immediately (fail-open). Rate limiting and quota are the
//! embedding app's concern.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, TourSimError};
use crate::location::BoxFuture;
use crate::polyline_codec::decode_polyline;
use crate::route_builder::DirectionsProvider;
use crate::GpsPoint;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire format of the directions endpoint (the fields this crate reads).
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    overview_polyline: ApiPolyline,
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

/// Walking-directions client.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tour_sim::{DirectionsClient, RouteBuilder};
///
/// let client = DirectionsClient::new("api-key").unwrap();
/// let builder = RouteBuilder::with_provider(Arc::new(client));
/// ```
#[derive(Debug)]
pub struct DirectionsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DirectionsClient {
    /// Create a client for the default endpoint.
    ///
    /// An empty API key is a configuration error: without one the endpoint
    /// rejects every request, so the caller should build without a provider
    /// instead.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (proxies, test servers).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(TourSimError::Config {
                message: "directions API key is not set".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TourSimError::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }

    async fn fetch(
        &self,
        origin: GpsPoint,
        destination: GpsPoint,
        via: &[GpsPoint],
    ) -> Result<Vec<GpsPoint>> {
        let mut params = vec![
            ("origin".to_string(), format_coordinate(&origin)),
            ("destination".to_string(), format_coordinate(&destination)),
            ("mode".to_string(), "walking".to_string()),
            ("key".to_string(), self.api_key.clone()),
        ];
        if !via.is_empty() {
            params.push(("waypoints".to_string(), join_waypoints(via)));
        }

        debug!(
            "[DirectionsClient] requesting walking route with {} via waypoints",
            via.len()
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| TourSimError::Directions {
                message: format!("request error: {e}"),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TourSimError::Directions {
                message: format!("HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let body: DirectionsResponse =
            response.json().await.map_err(|e| TourSimError::Directions {
                message: format!("parse error: {e}"),
                status_code: None,
            })?;

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| TourSimError::Directions {
                message: format!("no routes in response (status {})", body.status),
                status_code: None,
            })?;

        decode_polyline(&route.overview_polyline.points)
    }
}

impl DirectionsProvider for DirectionsClient {
    fn walking_route<'a>(
        &'a self,
        origin: GpsPoint,
        destination: GpsPoint,
        via: &'a [GpsPoint],
    ) -> BoxFuture<'a, Result<Vec<GpsPoint>>> {
        Box::pin(self.fetch(origin, destination, via))
    }
}

/// `lat,lng` with full float precision, the endpoint's coordinate syntax.
fn format_coordinate(point: &GpsPoint) -> String {
    format!("{},{}", point.latitude, point.longitude)
}

/// `|`-joined coordinate list for the `waypoints` parameter.
fn join_waypoints(points: &[GpsPoint]) -> String {
    points
        .iter()
        .map(format_coordinate)
        .collect::<Vec<_>>()
        .join("|")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_is_config_error() {
        let err = DirectionsClient::new("").unwrap_err();
        assert!(matches!(err, TourSimError::Config { .. }));
    }

    #[test]
    fn test_format_coordinate() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(format_coordinate(&p), "51.5074,-0.1278");
    }

    #[test]
    fn test_join_waypoints() {
        let points = vec![GpsPoint::new(1.0, 2.0), GpsPoint::new(3.5, -4.25)];
        assert_eq!(join_waypoints(&points), "1,2|3.5,-4.25");
    }

    #[test]
    fn test_response_parsing_and_decode() {
        let json = r#"{
            "routes": [
                { "legs": [], "overview_polyline": { "points": "_p~iF~ps|U_ulLnnqC" } }
            ],
            "status": "OK"
        }"#;

        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.status, "OK");
        assert_eq!(body.routes.len(), 1);

        let points = decode_polyline(&body.routes[0].overview_polyline.points).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].latitude - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_routes_parse() {
        let json = r#"{ "routes": [], "status": "ZERO_RESULTS" }"#;
        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert!(body.routes.is_empty());
        assert_eq!(body.status, "ZERO_RESULTS");
    }
}
