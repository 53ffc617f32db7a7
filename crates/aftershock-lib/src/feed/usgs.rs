//! USGS FDSN event service client

use super::{sort_by_magnitude, EarthquakeFeed, FeedError, FeedQuery};
use crate::models::EarthquakeEvent;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Public USGS event query endpoint
pub const DEFAULT_USGS_URL: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Maximum number of events requested per query
pub const DEFAULT_MAX_RESULTS: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    properties: Properties,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
    updated: Option<i64>,
    url: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

/// Client for the USGS GeoJSON event feed
pub struct UsgsFeed {
    client: Client,
    endpoint: Url,
    max_results: u32,
}

impl UsgsFeed {
    pub fn new(endpoint: &str, max_results: u32) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let endpoint = Url::parse(endpoint)?;

        Ok(Self {
            client,
            endpoint,
            max_results,
        })
    }

    fn query_url(&self, query: FeedQuery, now: DateTime<Utc>) -> Url {
        let start = now - ChronoDuration::days(i64::from(query.days));

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "geojson")
            .append_pair("starttime", &start.format("%Y-%m-%dT%H:%M:%S").to_string())
            .append_pair("minmagnitude", &query.min_magnitude.to_string())
            .append_pair("orderby", "time")
            .append_pair("limit", &self.max_results.to_string());
        url
    }
}

#[async_trait]
impl EarthquakeFeed for UsgsFeed {
    async fn recent(&self, query: FeedQuery) -> Result<Vec<EarthquakeEvent>, FeedError> {
        let url = self.query_url(query, Utc::now());
        info!(
            days = query.days,
            min_magnitude = query.min_magnitude,
            "Fetching earthquakes from USGS"
        );

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let collection: FeatureCollection = serde_json::from_str(&body)?;
        let mut events = parse_features(collection);
        sort_by_magnitude(&mut events);

        debug!(count = events.len(), "Fetched earthquakes");
        Ok(events)
    }
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

fn parse_features(collection: FeatureCollection) -> Vec<EarthquakeEvent> {
    collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let coords = &feature.geometry.coordinates;
            if coords.len() < 2 {
                warn!(id = %feature.id, "Skipping event without coordinates");
                return None;
            }

            let props = feature.properties;
            Some(EarthquakeEvent {
                magnitude: props.mag,
                latitude: coords[1],
                longitude: coords[0],
                depth: coords.get(2).copied().unwrap_or(0.0),
                time: format_millis(props.time),
                place: props.place.unwrap_or_default(),
                updated: format_millis(props.updated),
                url: props.url.unwrap_or_default(),
                detail_url: props.detail.unwrap_or_default(),
                id: feature.id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    const GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "us7000abcd",
                "properties": {
                    "mag": 4.6, "place": "10 km N of Town", "time": 1700000000000,
                    "updated": 1700000500000, "url": "https://example.org/us7000abcd",
                    "detail": "https://example.org/us7000abcd.geojson"
                },
                "geometry": {"type": "Point", "coordinates": [142.1, 38.3, 24.5]}
            },
            {
                "type": "Feature",
                "id": "us7000big",
                "properties": {
                    "mag": 6.8, "place": "Offshore", "time": 1700001000000,
                    "updated": 1700001500000, "url": "u", "detail": "d"
                },
                "geometry": {"type": "Point", "coordinates": [-72.0, -33.0, 30.0]}
            },
            {
                "type": "Feature",
                "id": "nomag",
                "properties": {"mag": null, "place": null, "time": null, "updated": null,
                               "url": null, "detail": null},
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 1.0]}
            },
            {
                "type": "Feature",
                "id": "broken",
                "properties": {"mag": 5.0},
                "geometry": {"type": "Point", "coordinates": []}
            }
        ]
    }"#;

    #[test]
    fn test_query_url_parameters() {
        let feed = UsgsFeed::new(DEFAULT_USGS_URL, 50).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let url = feed.query_url(FeedQuery { days: 7, min_magnitude: 4.5 }, now);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("format".into(), "geojson".into())));
        assert!(pairs.contains(&("starttime".into(), "2024-03-03T12:00:00".into())));
        assert!(pairs.contains(&("minmagnitude".into(), "4.5".into())));
        assert!(pairs.contains(&("orderby".into(), "time".into())));
        assert!(pairs.contains(&("limit".into(), "50".into())));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(matches!(
            UsgsFeed::new("not a url", 10),
            Err(FeedError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_recent_parses_and_sorts_events() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/fdsnws/event/1/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "geojson".into()),
                Matcher::UrlEncoded("minmagnitude".into(), "4.5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(GEOJSON)
            .create_async()
            .await;

        let feed = UsgsFeed::new(&format!("{}/fdsnws/event/1/query", server.url()), 100).unwrap();
        let events = feed
            .recent(FeedQuery { days: 3, min_magnitude: 4.5 })
            .await
            .unwrap();

        mock.assert_async().await;
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["us7000big", "us7000abcd", "nomag"]);

        let event = &events[1];
        assert_eq!(event.latitude, 38.3);
        assert_eq!(event.longitude, 142.1);
        assert_eq!(event.depth, 24.5);
        assert_eq!(event.place, "10 km N of Town");
        assert_eq!(event.time, "2023-11-14T22:13:20+00:00");
        assert_eq!(event.detail_url, "https://example.org/us7000abcd.geojson");

        assert_eq!(events[2].magnitude, None);
        assert_eq!(events[2].time, "");
    }

    #[tokio::test]
    async fn test_error_status_surfaces() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let feed = UsgsFeed::new(&format!("{}/query", server.url()), 100).unwrap();
        let err = feed.recent(FeedQuery::default()).await.unwrap_err();

        match err {
            FeedError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let feed = UsgsFeed::new(&format!("{}/query", server.url()), 100).unwrap();
        let err = feed.recent(FeedQuery::default()).await.unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }
}
