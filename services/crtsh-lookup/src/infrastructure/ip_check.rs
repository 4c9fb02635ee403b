// IPチェッククライアント
//
// Lambda実行環境のグローバルIPを外部のエコーサービスから取得する。
// 取得結果は検索結果に影響しないが、通信自体が失敗した場合は呼び出し全体を失敗させる。
// エコーサービスがエラーステータスを返しても、応答が得られた時点でチェックは完了とみなす。

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use super::LookupConfig;

/// IPチェックのエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IpCheckError {
    /// HTTPクライアントの構築に失敗
    #[error("HTTPクライアント構築エラー: {0}")]
    ClientBuild(String),

    /// ネットワークエラー（接続失敗、タイムアウト、ボディ読み取り失敗等）
    #[error("ネットワークエラー: {0}")]
    Network(String),
}

/// 自身のグローバルIPを取得するトレイト
///
/// 実際のHTTPクライアントとテスト用スタブを差し替えるための境界。
#[async_trait]
pub trait SelfIpFetcher: Send + Sync {
    /// 自身のグローバルIPを取得
    ///
    /// # 戻り値
    /// * `Ok` - エコーサービスが返したボディ（前後の空白除去済み）。
    ///   HTTPステータスが成功以外でも応答を受信できれば`Ok`
    /// * `Err` - 接続失敗、タイムアウト、ボディの読み取り失敗
    async fn fetch_self_ip(&self) -> Result<String, IpCheckError>;
}

/// reqwestによるIPチェック実装
///
/// 再試行は行わない（1回の呼び出しにつき1リクエスト）。
#[derive(Debug, Clone)]
pub struct HttpSelfIpFetcher {
    client: Client,
    url: String,
}

impl HttpSelfIpFetcher {
    /// 設定からクライアントを作成
    ///
    /// `ip_check_timeout`をリクエスト全体のタイムアウトとして使用する。
    pub fn new(config: &LookupConfig) -> Result<Self, IpCheckError> {
        let client = Client::builder()
            .timeout(config.ip_check_timeout)
            .connect_timeout(config.ip_check_timeout)
            .build()
            .map_err(|e| IpCheckError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            url: config.ip_check_url.clone(),
        })
    }
}

#[async_trait]
impl SelfIpFetcher for HttpSelfIpFetcher {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_self_ip(&self) -> Result<String, IpCheckError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            error!(error = %e, timeout = e.is_timeout(), "IPチェックリクエスト失敗");
            IpCheckError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "IPチェックがエラーステータスを返却（処理は継続）");
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "IPチェックレスポンスの読み取り失敗");
            IpCheckError::Network(e.to_string())
        })?;

        let ip = body.trim().to_string();
        debug!(ip = %ip, "IPチェック完了");

        Ok(ip)
    }
}
