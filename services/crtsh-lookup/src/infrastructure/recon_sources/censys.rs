// Censys証明書検索ソース
//
// 証明書の`parsed.names`とSANのDNS名を、検索結果の全ページにわたって取得する。

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    build_client, decode_error, network_error, parse_url, ApiKeyStore, SourceError,
    SubdomainSource,
};
use crate::domain::DomainSuffix;
use crate::infrastructure::SourceConfig;

/// SANのDNS名フィールド
const SAN_DNS_NAMES_FIELD: &str = "parsed.extensions.subject_alt_name.dns_names";

/// 証明書の名前フィールド
const PARSED_NAMES_FIELD: &str = "parsed.names";

/// Censys API認証情報
///
/// SSMパラメータには`{"id": "...", "secret": "..."}`の形式で格納する。
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CensysCredentials {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub secret: String,
}

impl fmt::Debug for CensysCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CensysCredentials")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl CensysCredentials {
    /// パラメータ値をパースし、idとsecretが揃っていることを確認する
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let credentials: Self = serde_json::from_str(raw)
            .map_err(|e| SourceError::ApiKey(format!("APIキーの形式が不正: {}", e)))?;

        if credentials.id.is_empty() || credentials.secret.is_empty() {
            return Err(SourceError::ApiKey("No API key provided".to_string()));
        }

        Ok(credentials)
    }
}

/// 検索リクエスト
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    page: u32,
    fields: [&'static str; 2],
    flatten: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    metadata: SearchMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct SearchMetadata {
    #[serde(default)]
    pages: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "parsed.extensions.subject_alt_name.dns_names", default)]
    san_dns_names: Vec<String>,
    #[serde(rename = "parsed.names", default)]
    parsed_names: Vec<String>,
}

/// 検索結果1ページ分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// 各証明書のSAN DNS名、続けてparsed.names（証明書の返却順）
    pub names: Vec<String>,
    /// 総ページ数
    pub pages: u32,
}

impl SearchPage {
    /// flatten指定の検索レスポンスを読み取る
    pub fn parse(body: &[u8]) -> Result<Self, SourceError> {
        let response: SearchResponse = serde_json::from_slice(body).map_err(decode_error)?;

        let names = response
            .results
            .into_iter()
            .flat_map(|result| result.san_dns_names.into_iter().chain(result.parsed_names))
            .collect();

        Ok(Self {
            names,
            pages: response.metadata.pages,
        })
    }
}

/// Censysクライアント
pub struct CensysSource<K: ApiKeyStore> {
    client: Client,
    search_url: Url,
    key_store: K,
}

impl<K: ApiKeyStore> CensysSource<K> {
    pub fn new(config: &SourceConfig, key_store: K) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(config.request_timeout)?,
            search_url: parse_url(&config.censys_api_url)?,
            key_store,
        })
    }

    async fn search_page(
        &self,
        credentials: &CensysCredentials,
        domain: &DomainSuffix,
        page: u32,
    ) -> Result<SearchPage, SourceError> {
        let request = SearchRequest {
            query: domain.as_str(),
            page,
            fields: [PARSED_NAMES_FIELD, SAN_DNS_NAMES_FIELD],
            flatten: true,
        };

        debug!(page, "Censys検索ページを要求");

        let response = self
            .client
            .post(self.search_url.clone())
            .basic_auth(&credentials.id, Some(&credentials.secret))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, page, "Censysがエラーステータスを返却");
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(network_error)?;
        SearchPage::parse(&body)
    }
}

#[async_trait]
impl<K: ApiKeyStore> SubdomainSource for CensysSource<K> {
    fn name(&self) -> &'static str {
        "censys"
    }

    /// # 処理フロー
    /// 1. APIキーを取得して検証（呼び出しごと）
    /// 2. 1ページ目から順に検索し、各ページの名前を追加
    /// 3. 現在ページが総ページ数に達したら終了
    #[instrument(skip(self), fields(domain = %domain))]
    async fn enumerate(&self, domain: &DomainSuffix) -> Result<Vec<String>, SourceError> {
        let raw_key = self.key_store.fetch_api_key().await?;
        let credentials = CensysCredentials::parse(&raw_key).map_err(|e| {
            error!(error = %e, "Censys APIキーが不正");
            e
        })?;

        let mut names = Vec::new();
        let mut page = 1;
        loop {
            let result = self.search_page(&credentials, domain, page).await?;
            names.extend(result.names);

            if page >= result.pages {
                break;
            }
            page += 1;
        }

        info!(name_count = names.len(), pages = page, "Censys検索完了");
        Ok(names)
    }
}
