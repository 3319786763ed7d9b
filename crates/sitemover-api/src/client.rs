// Async HTTP client for the cloud inventory REST API.
//
// Auth: `Authorization: Bearer <token>` header
// Bodies: snake_case JSON, errors as `{error_code, error_message}`

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the inventory service.
///
/// Every method issues exactly one HTTP request; retry decisions belong to
/// the caller.
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl InventoryClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a bearer token and transport config.
    ///
    /// Injects `Authorization` as a default header on every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    pub(crate) async fn put_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: "token rejected by the inventory service".into(),
            };
        }

        error_from_body(status.as_u16(), resp.text().await)
    }
}

/// A body that cannot be read is a transport failure, retried like any other.
fn error_from_body(status: u16, body: Result<String, reqwest::Error>) -> Error {
    match body {
        Ok(raw) => classify_error_body(status, raw),
        Err(e) => Error::Transport(e),
    }
}

/// Map a non-success body to an [`Error`].
///
/// Any error message mentioning "duplicate" becomes [`Error::DuplicateName`],
/// whatever the status code.
fn classify_error_body(status: u16, raw: String) -> Error {
    match serde_json::from_str::<ErrorResponse>(&raw) {
        Ok(ErrorResponse {
            error_code,
            error_message,
        }) if error_code.is_some() || error_message.is_some() => {
            let message = error_message.unwrap_or_else(|| format!("HTTP {status}"));
            if message.to_ascii_lowercase().contains("duplicate") {
                Error::DuplicateName { message }
            } else {
                Error::Api {
                    status,
                    message,
                    code: error_code,
                    structured: true,
                }
            }
        }
        _ => Error::Api {
            status,
            message: if raw.is_empty() {
                format!("HTTP {status}")
            } else {
                raw
            },
            code: None,
            structured: false,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_is_case_insensitive() {
        let err = classify_error_body(
            400,
            r#"{"error_code":"INVALID_ARGUMENT","error_message":"Name is DUPLICATE"}"#.into(),
        );
        assert!(err.is_duplicate_name());
    }

    #[test]
    fn structured_business_error_keeps_code() {
        let err = classify_error_body(
            400,
            r#"{"error_code":"INVALID_PARENT","error_message":"parent not found"}"#.into(),
        );
        assert!(matches!(
            &err,
            Error::Api { code: Some(code), structured: true, .. } if code == "INVALID_PARENT"
        ));
        assert!(!err.is_transient());
    }

    #[test]
    fn html_error_page_is_unstructured() {
        let err = classify_error_body(404, "<html>not found</html>".into());
        assert!(err.is_transient());
        assert!(matches!(err, Error::Api { structured: false, .. }));
    }

    #[test]
    fn unreadable_error_body_is_transport() {
        let read_err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let err = error_from_body(502, Err(read_err));
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = InventoryClient::normalize_base_url("https://api.example.com/xapi").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/xapi/");
    }
}
