//! HTTP client for an external person lookup web service.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AccountError, Result};
use crate::person::{PersonLookup, PersonRecord};

/// Person as returned by the lookup service.
#[derive(Debug, Deserialize)]
struct LookupPerson {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    numeric_id: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl LookupPerson {
    fn into_record(self) -> Result<PersonRecord> {
        let mut person = PersonRecord::new(
            self.username.map(|u| u.to_lowercase()),
            self.numeric_id,
        )?;
        if let Some(first) = self.first_name {
            person = person.with_first_name(first);
        }
        if let Some(last) = self.last_name {
            person = person.with_last_name(last);
        }
        Ok(person)
    }
}

/// Looks people up with `GET {base_url}/people?username=..` or `?numeric_id=..`.
/// A 404 means the person is unknown.
pub struct HttpPersonLookup {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPersonLookup {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    async fn query(&self, field: &str, value: &str) -> Result<Option<PersonRecord>> {
        let url = format!("{}/people", self.base_url);
        debug!(url = %url, field, "querying person lookup service");

        let mut req = self.http.get(&url).query(&[(field, value)]);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AccountError::remote(
                status.as_u16(),
                format!("person lookup failed: {body}"),
            ));
        }

        let person = resp
            .json::<LookupPerson>()
            .await
            .map_err(|e| AccountError::Serialization(format!("person lookup parse failed: {e}")))?;
        person.into_record().map(Some)
    }
}

#[async_trait]
impl PersonLookup for HttpPersonLookup {
    async fn find_by_username(&self, username: &str) -> Result<Option<PersonRecord>> {
        self.query("username", username).await
    }

    async fn find_by_numeric_id(&self, numeric_id: &str) -> Result<Option<PersonRecord>> {
        self.query("numeric_id", numeric_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn find_by_username_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .and(query_param("username", "jdoe"))
            .and(bearer_token("lookup-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "JDoe",
                "numeric_id": "12345678",
                "first_name": "John",
                "last_name": "Doe"
            })))
            .mount(&server)
            .await;

        let lookup = HttpPersonLookup::new(&server.uri(), Some("lookup-token"));
        let person = lookup.find_by_username("jdoe").await.unwrap().unwrap();
        assert_eq!(person.username(), Some("jdoe"));
        assert_eq!(person.numeric_id(), Some("12345678"));
        assert_eq!(person.first_name(), Some("John"));
    }

    #[tokio::test]
    async fn find_by_numeric_id_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .and(query_param("numeric_id", "99999999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let lookup = HttpPersonLookup::new(&server.uri(), None);
        assert!(lookup.find_by_numeric_id("99999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let lookup = HttpPersonLookup::new(&format!("{}/", server.uri()), None);
        let err = lookup.find_by_username("jdoe").await.unwrap_err();
        assert!(matches!(err, AccountError::Remote { status: 500, .. }));
    }

    #[tokio::test]
    async fn response_without_identifiers_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "first_name": "Nobody"
            })))
            .mount(&server)
            .await;

        let lookup = HttpPersonLookup::new(&server.uri(), None);
        let err = lookup.find_by_username("jdoe").await.unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }
}
