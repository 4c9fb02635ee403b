// 証明書名リポジトリ
//
// crt.shが公開しているcertwatchデータベース（PostgreSQL）に読み取り専用で接続し、
// 指定ドメインのサブドメインとして証明書に現れたDNS名を取得する。
// 接続は1回の検索ごとに確立し、検索終了時に必ず解放する。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, instrument, warn};

use super::LookupConfig;
use crate::domain::DomainSuffix;

/// サブドメイン検索クエリ
///
/// `reverse(lower(NAME_VALUE))`に対する前方一致は上流のインデックスで処理されるため、
/// パターンは反転済みの値（`DomainSuffix::reversed_like_pattern`）を渡す。
pub const SUBDOMAIN_QUERY: &str = "SELECT DISTINCT ci.NAME_VALUE \
     FROM certificate_identity ci \
     WHERE ci.NAME_TYPE = 'dNSName' \
     AND reverse(lower(ci.NAME_VALUE)) LIKE $1";

/// セッションを読み取り専用にする（自動コミットはtokio-postgresの既定動作）
const READ_ONLY_SESSION: &str = "SET SESSION CHARACTERISTICS AS TRANSACTION READ ONLY";

/// 接続時に名乗るアプリケーション名
const APPLICATION_NAME: &str = "crtsh-lookup";

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// 接続エラー
    #[error("データベース接続エラー: {0}")]
    Connect(String),

    /// 接続タイムアウト
    #[error("データベース接続タイムアウト: {0:?}")]
    ConnectTimeout(Duration),

    /// クエリエラー
    #[error("クエリエラー: {0}")]
    Query(String),

    /// クエリタイムアウト
    #[error("クエリタイムアウト: {0:?}")]
    QueryTimeout(Duration),
}

/// 証明書に現れたDNS名を検索するトレイト
#[async_trait]
pub trait CertificateNameRepository: Send + Sync {
    /// 指定ドメインのサブドメインを検索
    ///
    /// # 戻り値
    /// * 重複を除いたDNS名（上流の返却順）
    async fn find_subdomains(&self, domain: &DomainSuffix) -> Result<Vec<String>, RepositoryError>;
}

/// crt.sh certwatchデータベース実装
#[derive(Debug, Clone)]
pub struct CrtShRepository {
    pg_config: tokio_postgres::Config,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl CrtShRepository {
    /// 設定からリポジトリを作成（この時点では接続しない）
    pub fn new(config: &LookupConfig) -> Self {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.db_host)
            .port(config.db_port)
            .dbname(&config.db_name)
            .user(&config.db_user)
            .application_name(APPLICATION_NAME)
            .connect_timeout(config.db_connect_timeout);

        Self {
            pg_config,
            connect_timeout: config.db_connect_timeout,
            query_timeout: config.db_query_timeout,
        }
    }

    /// PostgreSQL接続設定を取得
    #[cfg(test)]
    pub(crate) fn pg_config(&self) -> &tokio_postgres::Config {
        &self.pg_config
    }

    /// 接続を確立してセッションを返す
    async fn open(&self) -> Result<CrtShSession, RepositoryError> {
        let (client, connection) =
            tokio::time::timeout(self.connect_timeout, self.pg_config.connect(NoTls))
                .await
                .map_err(|_| {
                    error!(timeout = ?self.connect_timeout, "crt.sh接続タイムアウト");
                    RepositoryError::ConnectTimeout(self.connect_timeout)
                })?
                .map_err(|e| {
                    error!(error = %e, "crt.sh接続失敗");
                    RepositoryError::Connect(e.to_string())
                })?;

        // 接続オブジェクトはソケットI/Oを駆動するため別タスクで実行する
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "crt.sh接続が異常終了");
            }
        });

        debug!("crt.sh接続を確立");

        Ok(CrtShSession {
            client: Some(client),
            driver,
        })
    }
}

#[async_trait]
impl CertificateNameRepository for CrtShRepository {
    #[instrument(skip(self), fields(domain = %domain))]
    async fn find_subdomains(&self, domain: &DomainSuffix) -> Result<Vec<String>, RepositoryError> {
        let session = self.open().await?;

        let result = session.query_names(domain, self.query_timeout).await;

        // 成功・失敗にかかわらず接続を閉じる
        session.close().await;

        let names = result?;
        info!(subdomain_count = names.len(), "crt.sh検索完了");

        Ok(names)
    }
}

/// 1回の検索に使う接続
///
/// `close`を呼ばずにドロップされた場合（呼び出し元のキャンセル等）も、
/// 接続駆動タスクを中断してソケットを解放する。
struct CrtShSession {
    client: Option<Client>,
    driver: JoinHandle<()>,
}

impl CrtShSession {
    /// 読み取り専用セッションでサブドメイン検索クエリを実行
    async fn query_names(
        &self,
        domain: &DomainSuffix,
        query_timeout: Duration,
    ) -> Result<Vec<String>, RepositoryError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| RepositoryError::Query("接続は既に閉じられています".to_string()))?;

        let pattern = domain.reversed_like_pattern();
        debug!(pattern = %pattern, "サブドメイン検索クエリを実行");

        let query = async {
            client.batch_execute(READ_ONLY_SESSION).await?;
            client.query(SUBDOMAIN_QUERY, &[&pattern]).await
        };

        let rows = tokio::time::timeout(query_timeout, query)
            .await
            .map_err(|_| {
                error!(timeout = ?query_timeout, "crt.shクエリタイムアウト");
                RepositoryError::QueryTimeout(query_timeout)
            })?
            .map_err(|e| {
                error!(error = %e, "crt.shクエリ失敗");
                RepositoryError::Query(e.to_string())
            })?;

        rows.iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                error!(error = %e, "NAME_VALUE列の読み取り失敗");
                RepositoryError::Query(e.to_string())
            })
    }

    /// クライアントを破棄して接続の終了を待つ
    async fn close(mut self) {
        // クライアントを破棄するとTerminateメッセージが送られ、駆動タスクが終了する
        drop(self.client.take());

        if tokio::time::timeout(Duration::from_secs(1), &mut self.driver)
            .await
            .is_err()
        {
            warn!("crt.sh接続の終了待ちがタイムアウト");
        }

        debug!("crt.sh接続を解放");
    }
}

impl Drop for CrtShSession {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
