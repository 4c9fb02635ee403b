// サブドメイン検索Lambda設定
//
// 上流のcrt.shデータベースとIPチェックエンドポイントへの接続設定を
// 環境変数から読み込む。未設定の項目は公開されている既定値を使用する。

use std::time::Duration;

use thiserror::Error;
use tracing::info;

// ===========================================
// デフォルト値定義
// ===========================================

/// crt.shデータベースホスト
pub const DEFAULT_DB_HOST: &str = "crt.sh";

/// crt.shデータベースポート
pub const DEFAULT_DB_PORT: u16 = 5432;

/// crt.shデータベース名
pub const DEFAULT_DB_NAME: &str = "certwatch";

/// crt.sh読み取り専用ゲストユーザー
pub const DEFAULT_DB_USER: &str = "guest";

/// 自身のグローバルIPを返すエンドポイント
pub const DEFAULT_IP_CHECK_URL: &str = "http://checkip.amazonaws.com/";

/// IPチェックのリクエストタイムアウト（秒）
pub const DEFAULT_IP_CHECK_TIMEOUT_SECS: u64 = 10;

/// データベース接続タイムアウト（秒）
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;

/// データベースクエリタイムアウト（秒）
pub const DEFAULT_DB_QUERY_TIMEOUT_SECS: u64 = 60;

// ===========================================
// 環境変数名定義
// ===========================================

pub const ENV_DB_HOST: &str = "CRTSH_DB_HOST";
pub const ENV_DB_PORT: &str = "CRTSH_DB_PORT";
pub const ENV_DB_NAME: &str = "CRTSH_DB_NAME";
pub const ENV_DB_USER: &str = "CRTSH_DB_USER";
pub const ENV_IP_CHECK_URL: &str = "IP_CHECK_URL";
pub const ENV_IP_CHECK_TIMEOUT_SECS: &str = "IP_CHECK_TIMEOUT_SECS";
pub const ENV_DB_CONNECT_TIMEOUT_SECS: &str = "CRTSH_DB_CONNECT_TIMEOUT_SECS";
pub const ENV_DB_QUERY_TIMEOUT_SECS: &str = "CRTSH_DB_QUERY_TIMEOUT_SECS";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 環境変数の値がパースできない
    #[error("環境変数の値が不正です: {name}={value}")]
    InvalidValue {
        /// 環境変数名
        name: String,
        /// 設定されていた値
        value: String,
    },

    /// 必須の環境変数が未設定
    #[error("環境変数が設定されていません: {0}")]
    Missing(String),
}

/// サブドメイン検索Lambdaの設定
///
/// # フィールド
/// - `db_host` / `db_port` / `db_name` / `db_user`: 上流データベースの接続先
/// - `ip_check_url`: 起動時に自身のIPを確認するエンドポイント
/// - 各種タイムアウト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub ip_check_url: String,
    pub ip_check_timeout: Duration,
    pub db_connect_timeout: Duration,
    pub db_query_timeout: Duration,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: DEFAULT_DB_PORT,
            db_name: DEFAULT_DB_NAME.to_string(),
            db_user: DEFAULT_DB_USER.to_string(),
            ip_check_url: DEFAULT_IP_CHECK_URL.to_string(),
            ip_check_timeout: Duration::from_secs(DEFAULT_IP_CHECK_TIMEOUT_SECS),
            db_connect_timeout: Duration::from_secs(DEFAULT_DB_CONNECT_TIMEOUT_SECS),
            db_query_timeout: Duration::from_secs(DEFAULT_DB_QUERY_TIMEOUT_SECS),
        }
    }
}

impl LookupConfig {
    /// 環境変数から設定を読み込み
    ///
    /// 未設定または空文字の環境変数はデフォルト値を使用する。
    /// 数値項目がパースできない場合はエラーを返す（コールドスタートを失敗させる）。
    ///
    /// # 環境変数
    /// - CRTSH_DB_HOST: データベースホスト（デフォルト: crt.sh）
    /// - CRTSH_DB_PORT: データベースポート（デフォルト: 5432）
    /// - CRTSH_DB_NAME: データベース名（デフォルト: certwatch）
    /// - CRTSH_DB_USER: データベースユーザー（デフォルト: guest）
    /// - IP_CHECK_URL: IPチェックURL（デフォルト: http://checkip.amazonaws.com/）
    /// - IP_CHECK_TIMEOUT_SECS: IPチェックタイムアウト秒（デフォルト: 10）
    /// - CRTSH_DB_CONNECT_TIMEOUT_SECS: 接続タイムアウト秒（デフォルト: 10）
    /// - CRTSH_DB_QUERY_TIMEOUT_SECS: クエリタイムアウト秒（デフォルト: 60）
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            db_host: read_string(ENV_DB_HOST).unwrap_or(defaults.db_host),
            db_port: read_parsed(ENV_DB_PORT)?.unwrap_or(defaults.db_port),
            db_name: read_string(ENV_DB_NAME).unwrap_or(defaults.db_name),
            db_user: read_string(ENV_DB_USER).unwrap_or(defaults.db_user),
            ip_check_url: read_string(ENV_IP_CHECK_URL).unwrap_or(defaults.ip_check_url),
            ip_check_timeout: read_parsed(ENV_IP_CHECK_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ip_check_timeout),
            db_connect_timeout: read_parsed(ENV_DB_CONNECT_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.db_connect_timeout),
            db_query_timeout: read_parsed(ENV_DB_QUERY_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.db_query_timeout),
        };

        info!(
            db_host = %config.db_host,
            db_port = config.db_port,
            db_name = %config.db_name,
            db_user = %config.db_user,
            ip_check_url = %config.ip_check_url,
            ip_check_timeout_secs = config.ip_check_timeout.as_secs(),
            db_connect_timeout_secs = config.db_connect_timeout.as_secs(),
            db_query_timeout_secs = config.db_query_timeout.as_secs(),
            "サブドメイン検索設定を読み込み"
        );

        Ok(config)
    }
}

/// 文字列環境変数を読み込む（空文字はNone扱い）
pub(super) fn read_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 数値環境変数を読み込む
pub(super) fn read_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match read_string(name) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
    }
}
