use async_trait::async_trait;
use reqwest::{header, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::cache::RemoteSource;
use crate::config::ApiConfig;
use crate::error::TransportError;

use super::api_types::{into_countries, ApiCountry, COUNTRY_FIELDS};
use super::types::Country;

type TransportResult<T> = std::result::Result<T, TransportError>;

/// REST Countries API client
#[derive(Clone)]
pub struct RestCountriesClient {
  http: reqwest::Client,
  base_url: Url,
}

impl RestCountriesClient {
  pub fn new(config: &ApiConfig) -> TransportResult<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
    if base_url.cannot_be_a_base() {
      return Err(TransportError::InvalidUrl(config.base_url.clone()));
    }

    let mut headers = header::HeaderMap::new();
    headers.insert(
      header::ACCEPT,
      header::HeaderValue::from_static("application/json"),
    );

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .default_headers(headers)
      .build()
      .map_err(classify)?;

    Ok(Self { http, base_url })
  }

  /// Build `{base}/{segments...}`, percent-encoding each segment.
  fn endpoint(&self, segments: &[&str]) -> TransportResult<Url> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_countries(&self, url: Url) -> TransportResult<Vec<Country>> {
    debug!(%url, "GET");
    let response = self.http.get(url).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
      return Err(TransportError::RequestFailed {
        status: status.as_u16(),
      });
    }

    let body = response.bytes().await.map_err(classify)?;
    decode(&body)
  }
}

#[async_trait]
impl RemoteSource<Country> for RestCountriesClient {
  async fn fetch(&self) -> TransportResult<Vec<Country>> {
    let mut url = self.endpoint(&["all"])?;
    url.query_pairs_mut().append_pair("fields", COUNTRY_FIELDS);
    self.get_countries(url).await
  }

  async fn search_by_name(&self, query: &str) -> TransportResult<Vec<Country>> {
    let url = self.endpoint(&["name", query])?;
    match self.get_countries(url).await {
      // The API answers 404 when no country matches
      Err(TransportError::RequestFailed { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
        Ok(Vec::new())
      }
      other => other,
    }
  }
}

fn decode(body: &[u8]) -> TransportResult<Vec<Country>> {
  let items: Vec<ApiCountry> =
    serde_json::from_slice(body).map_err(|e| TransportError::Decoding(e.to_string()))?;
  Ok(into_countries(items))
}

/// Classify a reqwest error into the transport error taxonomy.
fn classify(err: reqwest::Error) -> TransportError {
  if err.is_timeout() {
    TransportError::Timeout
  } else if err.is_connect() {
    TransportError::NoConnection
  } else if err.is_decode() {
    TransportError::Decoding(err.to_string())
  } else if err.is_builder() {
    TransportError::InvalidUrl(err.to_string())
  } else if let Some(status) = err.status() {
    TransportError::RequestFailed {
      status: status.as_u16(),
    }
  } else if err.is_body() || err.is_request() {
    TransportError::InvalidResponse
  } else {
    TransportError::Unknown(err.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base_url: &str) -> RestCountriesClient {
    RestCountriesClient::new(&ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    })
    .unwrap()
  }

  #[test]
  fn test_rejects_invalid_base_url() {
    let result = RestCountriesClient::new(&ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 5,
    });
    assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
  }

  #[test]
  fn test_endpoint_joins_segments() {
    let c = client("https://restcountries.com/v3.1");
    let url = c.endpoint(&["all"]).unwrap();
    assert_eq!(url.as_str(), "https://restcountries.com/v3.1/all");

    // Trailing slash on the base does not double up
    let c = client("https://restcountries.com/v3.1/");
    let url = c.endpoint(&["name", "united states"]).unwrap();
    assert_eq!(
      url.as_str(),
      "https://restcountries.com/v3.1/name/united%20states"
    );
  }

  #[test]
  fn test_query_segments_are_encoded() {
    let c = client("https://restcountries.com/v3.1");
    let url = c.endpoint(&["name", "a/b?c"]).unwrap();
    assert_eq!(url.path(), "/v3.1/name/a%2Fb%3Fc");
    assert_eq!(url.query(), None);
  }

  #[test]
  fn test_decode_valid_body() {
    let body = br#"[{ "name": { "common": "Egypt", "official": "Arab Republic of Egypt" },
      "capital": ["Cairo"], "population": 102334403, "region": "Africa" }]"#;
    let countries = decode(body).unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].capital.as_deref(), Some("Cairo"));
  }

  #[test]
  fn test_decode_error_body() {
    let body = br#"{ "status": 404, "message": "Not Found" }"#;
    assert!(matches!(decode(body), Err(TransportError::Decoding(_))));
  }

  #[tokio::test]
  async fn test_unreachable_host_is_transport_error() {
    // Port 9 on localhost is discard; nothing should be listening
    let c = client("http://127.0.0.1:9");
    let err = c.fetch().await.unwrap_err();
    assert!(matches!(
      err,
      TransportError::NoConnection | TransportError::Timeout | TransportError::InvalidResponse
    ));
  }
}
