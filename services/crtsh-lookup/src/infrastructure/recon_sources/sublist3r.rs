// Sublist3r検索APIソース

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{info, instrument, warn};

use super::{build_client, decode_error, network_error, parse_url, SourceError, SubdomainSource};
use crate::domain::DomainSuffix;
use crate::infrastructure::SourceConfig;

/// Sublist3rのレスポンス（名前のJSON配列、結果なしは`null`）を読み取る
pub fn names_from_sublist3r(body: &[u8]) -> Result<Vec<String>, SourceError> {
    let names: Option<Vec<String>> = serde_json::from_slice(body).map_err(decode_error)?;
    Ok(names.unwrap_or_default())
}

/// Sublist3rクライアント
#[derive(Debug, Clone)]
pub struct Sublist3rSource {
    client: Client,
    api_url: Url,
}

impl Sublist3rSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            api_url: parse_url(&config.sublist3r_api_url)?,
        })
    }

    fn search_url(&self, domain: &DomainSuffix) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut().append_pair("domain", domain.as_str());
        url
    }
}

#[async_trait]
impl SubdomainSource for Sublist3rSource {
    fn name(&self) -> &'static str {
        "sublist3r"
    }

    /// ステータスは検査せず、ボディが名前の配列として読めるかで成否を判断する
    #[instrument(skip(self), fields(domain = %domain))]
    async fn enumerate(&self, domain: &DomainSuffix) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(self.search_url(domain))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Sublist3rがエラーステータスを返却");
        }

        let body = response.bytes().await.map_err(network_error)?;
        let names = names_from_sublist3r(&body)?;

        info!(name_count = names.len(), "Sublist3r検索完了");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::recon_sources::tests::serve_sequence;
    use std::time::Duration;

    fn config_for(base: &str) -> SourceConfig {
        SourceConfig {
            sublist3r_api_url: format!("{}/search.php", base),
            request_timeout: Duration::from_secs(5),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_names_from_array() {
        let names =
            names_from_sublist3r(br#"["www.test.org", "api.test.org", "dev.api.test.org"]"#)
                .unwrap();

        assert_eq!(names, vec!["www.test.org", "api.test.org", "dev.api.test.org"]);
    }

    #[test]
    fn test_names_from_null_or_empty() {
        assert!(names_from_sublist3r(b"null").unwrap().is_empty());
        assert!(names_from_sublist3r(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_names_rejects_non_array() {
        assert!(matches!(
            names_from_sublist3r(br#"{"error": "rate limited"}"#),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_search_url_encodes_domain() {
        let source = Sublist3rSource::new(&SourceConfig::default()).unwrap();

        let url = source.search_url(&DomainSuffix::parse("test.org&x=1").unwrap());

        assert_eq!(
            url.as_str(),
            "https://api.sublist3r.com/search.php?domain=test.org%26x%3D1"
        );
    }

    #[tokio::test]
    async fn test_enumerate_queries_domain() {
        let (base, server) = serve_sequence(vec![(
            "200 OK",
            r#"["www.test.org","mail.test.org"]"#.to_string(),
        )])
        .await;
        let source = Sublist3rSource::new(&config_for(&base)).unwrap();

        let names = source
            .enumerate(&DomainSuffix::parse("test.org").unwrap())
            .await
            .unwrap();

        assert_eq!(names, vec!["www.test.org", "mail.test.org"]);

        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line(),
            "GET /search.php?domain=test.org HTTP/1.1"
        );
    }

    /// エラーステータスでもボディが配列なら結果として扱う
    #[tokio::test]
    async fn test_enumerate_ignores_status_when_body_is_array() {
        let (base, _server) =
            serve_sequence(vec![("500 Internal Server Error", "[]".to_string())]).await;
        let source = Sublist3rSource::new(&config_for(&base)).unwrap();

        let names = source
            .enumerate(&DomainSuffix::parse("test.org").unwrap())
            .await
            .unwrap();

        assert!(names.is_empty());
    }
}
