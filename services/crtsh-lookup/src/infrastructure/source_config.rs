// 外部ソース検索Lambda設定
//
// AlienVault OTX / Sublist3r / Censys のエンドポイントと、
// CensysのAPIキーを格納したSSMパラメータ名を環境変数から読み込む。

use std::time::Duration;

use tracing::info;

use super::config::{read_parsed, read_string};
use super::ConfigError;

// ===========================================
// デフォルト値定義
// ===========================================

/// AlienVault OTXのドメイン指標API（この後ろに`/{domain}/passive_dns`が続く）
pub const DEFAULT_ALIENVAULT_API_URL: &str = "https://otx.alienvault.com/api/v1/indicators/domain";

/// Sublist3r検索API
pub const DEFAULT_SUBLIST3R_API_URL: &str = "https://api.sublist3r.com/search.php";

/// Censys証明書検索API
pub const DEFAULT_CENSYS_API_URL: &str = "https://www.censys.io/api/v1/search/certificates";

/// 外部APIのリクエストタイムアウト（秒）
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;

// ===========================================
// 環境変数名定義
// ===========================================

pub const ENV_ALIENVAULT_API_URL: &str = "ALIENVAULT_API_URL";
pub const ENV_SUBLIST3R_API_URL: &str = "SUBLIST3R_API_URL";
pub const ENV_CENSYS_API_URL: &str = "CENSYS_API_URL";
pub const ENV_API_KEY_PATH: &str = "API_KEY_PATH";
pub const ENV_SOURCE_TIMEOUT_SECS: &str = "SOURCE_TIMEOUT_SECS";

/// 外部ソース検索Lambdaの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub alienvault_api_url: String,
    pub sublist3r_api_url: String,
    pub censys_api_url: String,
    /// Censys APIキー（`{"id": .., "secret": ..}`）を格納したSSMパラメータ名
    pub api_key_path: Option<String>,
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            alienvault_api_url: DEFAULT_ALIENVAULT_API_URL.to_string(),
            sublist3r_api_url: DEFAULT_SUBLIST3R_API_URL.to_string(),
            censys_api_url: DEFAULT_CENSYS_API_URL.to_string(),
            api_key_path: None,
            request_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
        }
    }
}

impl SourceConfig {
    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - ALIENVAULT_API_URL / SUBLIST3R_API_URL / CENSYS_API_URL: 各APIのURL
    /// - API_KEY_PATH: Censys APIキーのSSMパラメータ名（Censys Lambdaのみ必須）
    /// - SOURCE_TIMEOUT_SECS: リクエストタイムアウト秒（デフォルト: 30）
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            alienvault_api_url: read_string(ENV_ALIENVAULT_API_URL)
                .unwrap_or(defaults.alienvault_api_url),
            sublist3r_api_url: read_string(ENV_SUBLIST3R_API_URL)
                .unwrap_or(defaults.sublist3r_api_url),
            censys_api_url: read_string(ENV_CENSYS_API_URL).unwrap_or(defaults.censys_api_url),
            api_key_path: read_string(ENV_API_KEY_PATH),
            request_timeout: read_parsed(ENV_SOURCE_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        };

        info!(
            alienvault_api_url = %config.alienvault_api_url,
            sublist3r_api_url = %config.sublist3r_api_url,
            censys_api_url = %config.censys_api_url,
            api_key_path = ?config.api_key_path,
            request_timeout_secs = config.request_timeout.as_secs(),
            "外部ソース設定を読み込みました"
        );

        Ok(config)
    }

    /// CensysのAPIキーパラメータ名を取得（未設定はエラー）
    pub fn require_api_key_path(&self) -> Result<&str, ConfigError> {
        self.api_key_path
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(ENV_API_KEY_PATH.to_string()))
    }
}
