//! Client for the registry web API.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap};
use reqwest::Response;
use tracing::{debug, instrument};
use url::Url;

use crate::config::RegistryClientConfig;
use crate::error::{parse_error_response, RegistryClientError};
use crate::types::{LoginRequest, LoginResponse, RawPackage};

const PACKAGES_RESOURCE: &str = "packages";
const LOGIN_RESOURCE: &str = "login";
const LOGO_RESOURCE: &str = "logo";

/// A client for the registry web API.
///
/// Handles:
/// - HTTP client configuration with timeouts
/// - Bearer token authentication per request
/// - Mapping of error responses into [RegistryClientError]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: Url,
    config: RegistryClientConfig,
}

impl Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("api_url", &self.config.api_url)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Create a new registry client from configuration.
    pub fn new(config: RegistryClientConfig) -> Result<Self, RegistryClientError> {
        let base_url = base_url(&config.api_url)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the configured API URL.
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Fetch the full list of packages visible to the (optional) token holder.
    #[instrument(skip_all)]
    pub async fn packages(
        &self,
        token: Option<&str>,
    ) -> Result<Vec<RawPackage>, RegistryClientError> {
        let response = self.get(PACKAGES_RESOURCE, token).await?;
        let packages = response
            .json::<Vec<RawPackage>>()
            .await
            .map_err(RegistryClientError::InvalidResponsePayload)?;

        debug!(n_packages = packages.len(), "received package list");
        Ok(packages)
    }

    /// Exchange credentials for a session token.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, RegistryClientError> {
        let url = self.endpoint(LOGIN_RESOURCE)?;
        let response = self
            .client
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(RegistryClientError::Request)?;
        let response = check_status(response).await?;

        response
            .json::<LoginResponse>()
            .await
            .map_err(RegistryClientError::InvalidResponsePayload)
    }

    /// Fetch the URL of the registry logo.
    ///
    /// The registry may answer with plain text or with a JSON string.
    #[instrument(skip_all)]
    pub async fn logo(&self, token: Option<&str>) -> Result<String, RegistryClientError> {
        let response = self.get(LOGO_RESOURCE, token).await?;
        let body = response
            .text()
            .await
            .map_err(RegistryClientError::InvalidResponsePayload)?;

        let logo_url = serde_json::from_str::<String>(&body).unwrap_or(body);
        Ok(logo_url.trim().to_string())
    }

    async fn get(
        &self,
        resource: &str,
        token: Option<&str>,
    ) -> Result<Response, RegistryClientError> {
        let url = self.endpoint(resource)?;
        debug!(%url, has_token = token.is_some(), "sending GET request");

        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(RegistryClientError::Request)?;
        check_status(response).await
    }

    fn endpoint(&self, resource: &str) -> Result<Url, RegistryClientError> {
        self.base_url
            .join(resource)
            .map_err(|source| RegistryClientError::InvalidUrl {
                url: format!("{}{resource}", self.base_url),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Parse the API url, ensuring a trailing slash so that resources are
/// joined below it rather than replacing its last segment.
fn base_url(api_url: &str) -> Result<Url, RegistryClientError> {
    let normalized = format!("{}/", api_url.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|source| RegistryClientError::InvalidUrl {
        url: api_url.to_string(),
        source,
    })
}

async fn check_status(response: Response) -> Result<Response, RegistryClientError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(parse_error_response(response).await)
}

/// Build HTTP client with default headers and timeouts.
fn build_http_client(config: &RegistryClientConfig) -> Result<reqwest::Client, RegistryClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| RegistryClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| RegistryClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        api_url = %config.api_url,
        extra_headers = config.extra_headers.len(),
        "building registry HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| RegistryClientError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    const API_PATH: &str = "/-/verdaccio";

    fn client_config(server: &MockServer) -> RegistryClientConfig {
        RegistryClientConfig {
            api_url: server.url(API_PATH),
            ..Default::default()
        }
    }

    #[test]
    fn base_url_appends_trailing_slash() {
        let url = base_url("http://localhost:4873/-/verdaccio").unwrap();
        assert_eq!(
            url.join("packages").unwrap().as_str(),
            "http://localhost:4873/-/verdaccio/packages"
        );

        let url = base_url("http://localhost:4873/-/verdaccio/").unwrap();
        assert_eq!(
            url.join("packages").unwrap().as_str(),
            "http://localhost:4873/-/verdaccio/packages"
        );
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = RegistryClientConfig {
            api_url: "not a url".to_string(),
            ..Default::default()
        };
        let result = RegistryClient::new(config);
        assert!(
            matches!(result, Err(RegistryClientError::InvalidUrl { .. })),
            "expected InvalidUrl, found: {result:?}"
        );
    }

    #[tokio::test]
    async fn packages_are_fetched_in_server_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{API_PATH}/packages"));
                then.status(200).json_body(json!([
                    { "name": "react", "version": "18.0.0", "keywords": ["ui"] },
                    { "name": "redux", "version": "4.0.0", "keywords": ["state"] },
                ]));
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let packages = client.packages(None).await.unwrap();
        let names = packages
            .iter()
            .map(|p| p.name.as_deref().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["react", "redux"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("{API_PATH}/packages"))
                    .header("authorization", "Bearer my-token");
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let packages = client.packages(Some("my-token")).await.unwrap();
        assert!(packages.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn extra_headers_set_on_all_requests() {
        let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();
        extra_headers.insert("registry-test".to_string(), "test-value".to_string());
        extra_headers.insert("registry-test2".to_string(), "test-value2".to_string());

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.header("registry-test", "test-value")
                    .header("registry-test2", "test-value2");
                then.status(200).json_body(json!([]));
            })
            .await;

        let config = RegistryClientConfig {
            extra_headers,
            ..client_config(&server)
        };

        let client = RegistryClient::new(config).unwrap();
        let _ = client.packages(None).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.header("user-agent", expected_agent);
                then.status(200).json_body(json!([]));
            })
            .await;

        let config = RegistryClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server)
        };

        let client = RegistryClient::new(config).unwrap();
        let _ = client.packages(None).await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_returns_username_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("{API_PATH}/login"))
                    .json_body(json!({ "username": "alice", "password": "secret" }));
                then.status(200)
                    .json_body(json!({ "username": "alice", "token": "abc.def.ghi" }));
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let response = client.login("alice", "secret").await.unwrap();
        assert_eq!(response, LoginResponse {
            username: "alice".to_string(),
            token: "abc.def.ghi".to_string(),
        });
        mock.assert_async().await;
    }

    // region: Error response handling
    //
    // The registry answers failed requests with a json body of the form
    // `{ "error": <String> }`. Bodies in any other shape are dropped
    // and only the status is kept.

    #[tokio::test]
    async fn login_error_detail_is_parsed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path(format!("{API_PATH}/login"));
                then.status(401)
                    .json_body(json!({ "error": "bad username/password, access denied" }));
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let err = client.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.detail(), "bad username/password, access denied");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_error_body_is_dropped() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{API_PATH}/packages"));
                then.status(500)
                    .header("content-type", "text/html")
                    .body("<html>Internal Server Error</html>");
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let err = client.packages(None).await.unwrap_err();
        assert!(
            matches!(err, RegistryClientError::ErrorResponse { detail: None, .. }),
            "expected ErrorResponse without detail, found: {err:?}"
        );
        assert_eq!(err.to_string(), "500 Internal Server Error");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_package_list_is_invalid_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{API_PATH}/packages"));
                then.status(200).json_body(json!({ "not": "a list" }));
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        let err = client.packages(None).await.unwrap_err();
        assert!(
            matches!(err, RegistryClientError::InvalidResponsePayload(_)),
            "expected InvalidResponsePayload, found: {err:?}"
        );
        mock.assert_async().await;
    }

    // endregion

    #[tokio::test]
    async fn logo_accepts_text_and_json_string() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{API_PATH}/logo"));
                then.status(200).body("\"http://localhost:4873/-/static/logo.png\"");
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        assert_eq!(
            client.logo(None).await.unwrap(),
            "http://localhost:4873/-/static/logo.png"
        );
        mock.assert_async().await;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("{API_PATH}/logo"));
                then.status(200).body("http://localhost:4873/-/static/logo.png\n");
            })
            .await;

        let client = RegistryClient::new(client_config(&server)).unwrap();
        assert_eq!(
            client.logo(None).await.unwrap(),
            "http://localhost:4873/-/static/logo.png"
        );
    }
}
