// AlienVault OTX パッシブDNSソース

use std::net::IpAddr;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::{build_client, decode_error, network_error, parse_url, SourceError, SubdomainSource};
use crate::domain::DomainSuffix;
use crate::infrastructure::SourceConfig;

/// passive_dns APIのレスポンス（使用するフィールドのみ）
#[derive(Debug, Deserialize)]
struct PassiveDnsResponse {
    #[serde(default)]
    passive_dns: Option<Vec<PassiveDnsRecord>>,
}

#[derive(Debug, Deserialize)]
struct PassiveDnsRecord {
    #[serde(default)]
    hostname: String,
}

/// passive_dnsレスポンスからホスト名を取り出す
///
/// IPアドレスそのものが記録されたレコード（IPv4/IPv6）と空のホスト名は除外する。
///
/// # 例
/// ```
/// use crtsh_lookup::infrastructure::recon_sources::hostnames_from_passive_dns;
///
/// let body = br#"{"passive_dns": [{"hostname": "www.test.org"}, {"hostname": "192.0.2.1"}]}"#;
/// assert_eq!(hostnames_from_passive_dns(body).unwrap(), vec!["www.test.org"]);
/// ```
pub fn hostnames_from_passive_dns(body: &[u8]) -> Result<Vec<String>, SourceError> {
    let response: PassiveDnsResponse = serde_json::from_slice(body).map_err(decode_error)?;

    Ok(response
        .passive_dns
        .unwrap_or_default()
        .into_iter()
        .map(|record| record.hostname)
        .filter(|host| !host.is_empty() && host.parse::<IpAddr>().is_err())
        .collect())
}

/// AlienVault OTXクライアント
#[derive(Debug, Clone)]
pub struct AlienVaultSource {
    client: Client,
    api_url: Url,
}

impl AlienVaultSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            api_url: parse_url(&config.alienvault_api_url)?,
        })
    }

    /// `{api_url}/{domain}/passive_dns`（ドメインはパスセグメントとしてエスケープ）
    fn passive_dns_url(&self, domain: &DomainSuffix) -> Result<Url, SourceError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend([domain.as_str(), "passive_dns"]);
        Ok(url)
    }
}

#[async_trait]
impl SubdomainSource for AlienVaultSource {
    fn name(&self) -> &'static str {
        "alienvault"
    }

    #[instrument(skip(self), fields(domain = %domain))]
    async fn enumerate(&self, domain: &DomainSuffix) -> Result<Vec<String>, SourceError> {
        let url = self.passive_dns_url(domain)?;

        let response = self.client.get(url).send().await.map_err(network_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(status = %status, "AlienVaultがエラーステータスを返却");
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(network_error)?;
        let hostnames = hostnames_from_passive_dns(&body)?;

        info!(hostname_count = hostnames.len(), "AlienVault検索完了");
        Ok(hostnames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::recon_sources::tests::serve_sequence;
    use std::time::Duration;

    const PASSIVE_DNS_PAYLOAD: &str = r#"{
        "passive_dns": [
            {"address": "192.0.2.10", "hostname": "www.test.org", "record_type": "A"},
            {"address": "192.0.2.11", "hostname": "192.0.2.11", "record_type": "A"},
            {"address": "2001:db8::1", "hostname": "2001:db8::1", "record_type": "AAAA"},
            {"address": "192.0.2.12", "hostname": "mail.test.org", "record_type": "A"},
            {"address": "192.0.2.10", "hostname": "www.test.org", "record_type": "A"}
        ],
        "count": 5
    }"#;

    fn config_for(base: &str) -> SourceConfig {
        SourceConfig {
            alienvault_api_url: format!("{}/api/v1/indicators/domain", base),
            request_timeout: Duration::from_secs(5),
            ..SourceConfig::default()
        }
    }

    #[test]
    fn test_hostnames_drop_ip_addresses() {
        let hostnames = hostnames_from_passive_dns(PASSIVE_DNS_PAYLOAD.as_bytes()).unwrap();

        assert_eq!(hostnames, vec!["www.test.org", "mail.test.org", "www.test.org"]);
    }

    #[test]
    fn test_hostnames_empty_or_null_records() {
        assert!(hostnames_from_passive_dns(br#"{"passive_dns": []}"#).unwrap().is_empty());
        assert!(hostnames_from_passive_dns(br#"{"passive_dns": null}"#).unwrap().is_empty());
        assert!(hostnames_from_passive_dns(br#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_hostnames_invalid_payload() {
        assert!(matches!(
            hostnames_from_passive_dns(b"<html>"),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_passive_dns_url_escapes_domain() {
        let source = AlienVaultSource::new(&SourceConfig::default()).unwrap();
        let domain = DomainSuffix::parse("test.org/../x").unwrap();

        let url = source.passive_dns_url(&domain).unwrap();
        let segments: Vec<&str> = url.path_segments().unwrap().collect();

        assert_eq!(url.host_str(), Some("otx.alienvault.com"));
        assert_eq!(segments.len(), 6);
        assert!(segments[4].starts_with("test.org%2F"));
        assert_eq!(segments[5], "passive_dns");
    }

    #[tokio::test]
    async fn test_enumerate_requests_passive_dns() {
        let (base, server) =
            serve_sequence(vec![("200 OK", PASSIVE_DNS_PAYLOAD.to_string())]).await;
        let source = AlienVaultSource::new(&config_for(&base)).unwrap();

        let hostnames = source
            .enumerate(&DomainSuffix::parse("test.org").unwrap())
            .await
            .unwrap();

        assert_eq!(hostnames, vec!["www.test.org", "mail.test.org", "www.test.org"]);

        let requests = server.await.unwrap();
        assert_eq!(
            requests[0].request_line(),
            "GET /api/v1/indicators/domain/test.org/passive_dns HTTP/1.1"
        );
    }

    /// 200以外のステータスはエラー
    #[tokio::test]
    async fn test_enumerate_rejects_non_200_status() {
        let (base, _server) = serve_sequence(vec![(
            "404 Not Found",
            r#"{"detail": "endpoint not found"}"#.to_string(),
        )])
        .await;
        let source = AlienVaultSource::new(&config_for(&base)).unwrap();

        let result = source
            .enumerate(&DomainSuffix::parse("test.org").unwrap())
            .await;

        assert_eq!(result.unwrap_err(), SourceError::Status(404));
    }
}
