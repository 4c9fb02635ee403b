// 外部サブドメイン列挙ソース
//
// crt.sh以外の公開サービスからサブドメイン候補を取得するクライアント群
// - AlienVaultSource: OTXのパッシブDNS（IPアドレスのホスト名は除外）
// - Sublist3rSource: 名前のJSON配列を返す検索API
// - CensysSource: SSMのAPIキーで認証し、証明書検索をページ送りで取得

mod alienvault;
mod api_key_store;
mod censys;
mod sublist3r;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::error;

use crate::domain::DomainSuffix;

pub use alienvault::{hostnames_from_passive_dns, AlienVaultSource};
pub use api_key_store::{ApiKeyStore, SsmApiKeyStore};
pub use censys::{CensysCredentials, CensysSource, SearchPage};
pub use sublist3r::{names_from_sublist3r, Sublist3rSource};

/// 外部ソースのエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// HTTPクライアントの構築に失敗
    #[error("HTTPクライアント構築エラー: {0}")]
    ClientBuild(String),

    /// APIのURLが不正
    #[error("不正なURL: {0}")]
    InvalidUrl(String),

    /// ネットワークエラー（接続失敗、タイムアウト等）
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 成功以外のHTTPステータス
    #[error("Invalid status code: {0}")]
    Status(u16),

    /// レスポンスのデシリアライズに失敗
    #[error("デシリアライズエラー: {0}")]
    Decode(String),

    /// APIキーの取得・検証に失敗
    #[error("APIキーエラー: {0}")]
    ApiKey(String),
}

/// サブドメイン候補を列挙する外部ソース
#[async_trait]
pub trait SubdomainSource: Send + Sync {
    /// ログに出すソース名
    fn name(&self) -> &'static str;

    /// 指定ドメインのサブドメイン候補を取得
    ///
    /// # 戻り値
    /// * ソースの返却順の名前一覧（重複除去はしない）
    async fn enumerate(&self, domain: &DomainSuffix) -> Result<Vec<String>, SourceError>;
}

/// 再試行なし・タイムアウト付きのHTTPクライアントを構築
fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| SourceError::ClientBuild(e.to_string()))
}

fn parse_url(raw: &str) -> Result<Url, SourceError> {
    Url::parse(raw).map_err(|e| SourceError::InvalidUrl(format!("{}: {}", raw, e)))
}

fn network_error(e: reqwest::Error) -> SourceError {
    error!(error = %e, timeout = e.is_timeout(), "外部APIリクエスト失敗");
    SourceError::Network(e.to_string())
}

fn decode_error(e: serde_json::Error) -> SourceError {
    error!(error = %e, "外部APIレスポンスのデシリアライズに失敗");
    SourceError::Decode(e.to_string())
}
