// 外部ソース検索ハンドラー
//
// `{"domain": ..}`イベントを受け取り、外部ソースのサブドメイン候補を
// `{"subdomains": [..]}`として返す。

use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{SourceRequest, SourceResponse};
use crate::infrastructure::recon_sources::{SourceError, SubdomainSource};

/// 外部ソース検索のエラー
///
/// いずれもLambda呼び出しエラーとして呼び出し元に返す。
#[derive(Debug, Error)]
pub enum SourceHandlerError {
    /// domainが無い、または空白のみ
    #[error("No domain in event payload")]
    MissingDomain,

    /// 外部ソースの呼び出し失敗
    #[error("{source_name}の検索に失敗: {error}")]
    Source {
        source_name: &'static str,
        #[source]
        error: SourceError,
    },
}

/// 外部ソース検索ハンドラー
pub struct SourceLookupHandler<S: SubdomainSource> {
    source: S,
}

impl<S: SubdomainSource> SourceLookupHandler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// イベントを処理して検索結果を返す
    ///
    /// # 処理フロー
    /// 1. `domain`の検証（欠落・空白のみはエラー）
    /// 2. 外部ソースに問い合わせ（再試行なし）
    /// 3. ソースの返却順のまま`subdomains`に格納
    pub async fn handle(
        &self,
        request: &SourceRequest,
    ) -> Result<SourceResponse, SourceHandlerError> {
        let Some(domain) = request.domain() else {
            warn!(source = self.source.name(), "domainがありません");
            return Err(SourceHandlerError::MissingDomain);
        };

        info!(source = self.source.name(), domain = %domain, "外部ソース検索開始");

        let subdomains = self.source.enumerate(&domain).await.map_err(|e| {
            error!(source = self.source.name(), error = %e, "外部ソース検索に失敗");
            SourceHandlerError::Source {
                source_name: self.source.name(),
                error: e,
            }
        })?;

        info!(
            source = self.source.name(),
            subdomain_count = subdomains.len(),
            "外部ソース検索完了"
        );

        Ok(SourceResponse { subdomains })
    }
}
