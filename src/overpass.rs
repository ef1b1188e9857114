//! Query construction and the Overpass API client.

use tracing::debug;

use crate::net::http::{ApiError, HttpClient};
use crate::types::overpass::{OverpassElement, OverpassResponse};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// OSM amenity value marking a cemetery.
pub const CEMETERY_AMENITY: &str = "grave_yard";
/// OSM amenity value marking an individual grave.
pub const GRAVE_AMENITY: &str = "grave";

/// Client for the Overpass interpreter, generic over the HTTP transport so
/// tests can swap in a mock.
#[derive(Clone)]
pub struct OverpassApi<C> {
    http: C,
    url: String,
}

impl<C: HttpClient> OverpassApi<C> {
    pub fn new(http: C) -> Self {
        Self {
            http,
            url: DEFAULT_OVERPASS_URL.to_string(),
        }
    }

    /// Point the client at a non-default interpreter.
    pub fn with_url(http: C, url: String) -> Self {
        Self { http, url }
    }

    /// Fetch every cemetery feature in the named area, plus the skeleton
    /// members needed to resolve ways and relations.
    pub async fn fetch_cemeteries_in_area(
        &self,
        area_name: &str,
    ) -> Result<Vec<OverpassElement>, ApiError> {
        let query = cemeteries_query(area_name);
        debug!(area = area_name, "querying overpass");
        let body = self.http.post_form(&self.url, &[("data", &query)]).await?;
        let response: OverpassResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::Parse(e.to_string()))?;
        debug!(
            area = area_name,
            elements = response.elements.len(),
            "overpass response parsed"
        );
        Ok(response.elements)
    }
}

// The area name is spliced into the QL verbatim; quotes or brackets in it
// will break the query. Scoping by bounding box instead of by name would
// avoid interpolating user text.
fn cemeteries_query(area_name: &str) -> String {
    format!(
        r#"[out:json];
area[name="{area_name}"]->.searchArea;
(
  node["amenity"="{CEMETERY_AMENITY}"](area.searchArea);
  way["amenity"="{CEMETERY_AMENITY}"](area.searchArea);
  relation["amenity"="{CEMETERY_AMENITY}"](area.searchArea);
);
out body;
>;
out skel qt;
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::http::tests::MockHttpClient;

    #[test]
    fn test_query_scopes_by_area_and_amenity() {
        let query = cemeteries_query("London");
        assert!(query.starts_with("[out:json];"));
        assert!(query.contains(r#"area[name="London"]->.searchArea;"#));
        assert!(query.contains(r#"node["amenity"="grave_yard"](area.searchArea);"#));
        assert!(query.contains(r#"way["amenity"="grave_yard"](area.searchArea);"#));
        assert!(query.contains(r#"relation["amenity"="grave_yard"](area.searchArea);"#));
        assert!(query.contains("out skel qt;"));
    }

    #[tokio::test]
    async fn test_fetch_parses_elements() {
        let mock = MockHttpClient::with_json(
            r#"{"elements":[
                {"type":"way","id":1,"tags":{"amenity":"grave_yard","name":"Abney Park"}},
                {"type":"node","id":2,"tags":{"amenity":"grave_yard"}}
            ]}"#,
        );
        let api = OverpassApi::new(mock.clone());

        let elements = api.fetch_cemeteries_in_area("London").await.unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name(), Some("Abney Park"));
        assert_eq!(elements[1].name(), None);

        let sent = mock.sent_queries();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains(r#"area[name="London"]"#));
    }

    #[tokio::test]
    async fn test_fetch_treats_missing_elements_as_empty() {
        let mock = MockHttpClient::with_json(r#"{"version":0.6}"#);
        let api = OverpassApi::new(mock);
        let elements = api.fetch_cemeteries_in_area("Atlantis").await.unwrap();
        assert!(elements.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_surfaces_status_code() {
        let mock = MockHttpClient::with_response(Err(ApiError::Status(504)));
        let api = OverpassApi::new(mock);
        let err = api.fetch_cemeteries_in_area("London").await.unwrap_err();
        assert!(err.to_string().contains("504"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_body() {
        let mock = MockHttpClient::with_json("<html>rate limited</html>");
        let api = OverpassApi::new(mock);
        let err = api.fetch_cemeteries_in_area("London").await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
