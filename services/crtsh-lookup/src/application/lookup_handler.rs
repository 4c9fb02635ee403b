// サブドメイン検索ハンドラー
//
// 1回のLambda呼び出しを処理する:
// IPチェック → domainパラメータ検証 → crt.sh検索 → レスポンス構築

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{LookupRequest, LookupResponse, SubdomainsBody};
use crate::infrastructure::{
    CertificateNameRepository, IpCheckError, RepositoryError, SelfIpFetcher,
};

/// 呼び出しを失敗させるエラー
///
/// ここに含まれないエラー（domain欠落、上流データベース障害）は
/// 構造化されたエラーレスポンスとして返却する。
#[derive(Debug, Error)]
pub enum LookupHandlerError {
    /// IPチェック失敗
    #[error("IPチェックに失敗: {0}")]
    IpCheck(#[from] IpCheckError),

    /// レスポンスのシリアライズ失敗
    #[error("レスポンスのシリアライズに失敗: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// サブドメイン検索ハンドラー
///
/// 外部依存（IPチェック、証明書名リポジトリ）はトレイト経由で注入する。
pub struct SubdomainLookupHandler<F, R>
where
    F: SelfIpFetcher,
    R: CertificateNameRepository,
{
    ip_fetcher: F,
    repository: R,
}

impl<F, R> SubdomainLookupHandler<F, R>
where
    F: SelfIpFetcher,
    R: CertificateNameRepository,
{
    /// 新しいハンドラーを作成
    pub fn new(ip_fetcher: F, repository: R) -> Self {
        Self {
            ip_fetcher,
            repository,
        }
    }

    /// リクエストを処理してレスポンスを生成
    ///
    /// # 処理フロー
    /// 1. IPチェック（ネットワーク障害時は呼び出しを失敗させる。
    ///    エラーステータスは警告ログのみで継続）
    /// 2. `queryStringParameters`と`domain`の検証（欠落・空白のみなら400）
    /// 3. 証明書名リポジトリで後方一致検索（接続・クエリ失敗やタイムアウトは502）
    /// 4. クエリパラメータをそのままエコーし、検索結果を上流の返却順で返す
    ///
    /// # 戻り値
    /// * `Ok(200)` - 検索成功
    /// * `Ok(400)` - domainパラメータが無い、または空
    /// * `Ok(502)` - crt.shへの接続・クエリに失敗
    /// * `Err` - IPチェック失敗（呼び出し自体を失敗させる）
    pub async fn handle(
        &self,
        request: &LookupRequest,
    ) -> Result<LookupResponse, LookupHandlerError> {
        // IPチェックの失敗は呼び出し全体のエラーとして伝播する
        let ip = self.ip_fetcher.fetch_self_ip().await.map_err(|e| {
            error!(error = %e, "IPチェック失敗のため処理を中断");
            e
        })?;
        debug!(self_ip = %ip, "IPチェック完了");

        let (Some(parameters), Some(domain)) = (request.query_parameters(), request.domain())
        else {
            warn!(
                has_parameters = request.query_parameters().is_some(),
                "domainパラメータがありません"
            );
            return Ok(LookupResponse::missing_domain()?);
        };

        info!(domain = %domain, "サブドメイン検索開始");

        let subdomains = match self.repository.find_subdomains(&domain).await {
            Ok(subdomains) => subdomains,
            Err(e) => {
                log_repository_error(&e);
                return Ok(LookupResponse::upstream_failure()?);
            }
        };

        info!(
            domain = %domain,
            subdomain_count = subdomains.len(),
            "サブドメイン検索完了"
        );

        Ok(LookupResponse::ok(&SubdomainsBody {
            domain: parameters.clone(),
            subdomains,
        })?)
    }
}

fn log_repository_error(e: &RepositoryError) {
    match e {
        RepositoryError::ConnectTimeout(_) | RepositoryError::QueryTimeout(_) => {
            error!(error = %e, timeout = true, "crt.sh検索がタイムアウト");
        }
        RepositoryError::Connect(_) | RepositoryError::Query(_) => {
            error!(error = %e, timeout = false, "crt.sh検索に失敗");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueryParameters, MISSING_DOMAIN_MESSAGE, UPSTREAM_FAILURE_MESSAGE};
    use crate::infrastructure::certificate_repository::tests::InMemoryCertificateNameRepository;
    use crate::domain::DomainSuffix;
    use crate::infrastructure::HttpSelfIpFetcher;
    use crate::infrastructure::ip_check::tests::{config_for, serve_once, StubSelfIpFetcher};
    use crate::infrastructure::logging::init_test_logging;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    /// 登録順のまま名前を返すリポジトリ
    struct FixedNames(Vec<&'static str>);

    #[async_trait]
    impl CertificateNameRepository for FixedNames {
        async fn find_subdomains(
            &self,
            _domain: &DomainSuffix,
        ) -> Result<Vec<String>, RepositoryError> {
            Ok(self.0.iter().map(|n| n.to_string()).collect())
        }
    }

    fn handler_with(
        names: &[&str],
    ) -> SubdomainLookupHandler<StubSelfIpFetcher, InMemoryCertificateNameRepository> {
        SubdomainLookupHandler::new(
            StubSelfIpFetcher::succeeding("203.0.113.7"),
            InMemoryCertificateNameRepository::with_names(names),
        )
    }

    fn body_of(response: &LookupResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    // ===========================================
    // 正常系
    // ===========================================

    #[tokio::test]
    async fn test_handle_returns_subdomains() {
        init_test_logging();
        let handler = handler_with(&["a.test.org", "b.test.org"]);

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(
            body_of(&response),
            json!({
                "domain": {"domain": "test.org"},
                "subdomains": ["a.test.org", "b.test.org"]
            })
        );
    }

    /// domain以外のパラメータも含めてそのままエコーする
    #[tokio::test]
    async fn test_handle_echoes_all_parameters() {
        init_test_logging();
        let handler = handler_with(&["www.example.com"]);

        let mut params = QueryParameters::new();
        params.insert("domain".to_string(), "Example.COM".into());
        params.insert("format".to_string(), "json".into());
        params.insert("empty".to_string(), "".into());

        let response = handler
            .handle(&LookupRequest::new(params.clone()))
            .await
            .unwrap();

        let body = response.subdomains_body().unwrap();
        assert_eq!(body.domain, params);
        assert_eq!(body.subdomains, vec!["www.example.com"]);
    }

    /// 大文字小文字を区別せず、ドメイン自身や類似ドメインは含まない
    #[tokio::test]
    async fn test_handle_applies_suffix_rule() {
        init_test_logging();
        let handler = handler_with(&[
            "example.com",
            "WWW.example.com",
            "notexample.com",
            "a.b.example.com",
        ]);

        let response = handler
            .handle(&LookupRequest::for_domain("Example.COM"))
            .await
            .unwrap();

        assert_eq!(
            response.subdomains_body().unwrap().subdomains,
            vec!["WWW.example.com", "a.b.example.com"]
        );
    }

    /// リポジトリの返却順をソートせずそのまま返す
    #[tokio::test]
    async fn test_handle_passes_repository_order_through() {
        init_test_logging();
        let handler = SubdomainLookupHandler::new(
            StubSelfIpFetcher::succeeding("203.0.113.7"),
            FixedNames(vec!["z.test.org", "a.test.org", "m.test.org"]),
        );

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(
            response.subdomains_body().unwrap().subdomains,
            vec!["z.test.org", "a.test.org", "m.test.org"]
        );
    }

    /// エコーするパラメータは入力のキー順を保つ
    #[tokio::test]
    async fn test_handle_echoes_parameters_in_input_order() {
        init_test_logging();
        let handler = handler_with(&["a.test.org"]);
        let request: LookupRequest = serde_json::from_str(
            r#"{"queryStringParameters": {"zeta": "1", "domain": "test.org", "alpha": "2"}}"#,
        )
        .unwrap();

        let response = handler.handle(&request).await.unwrap();

        assert!(response.body.starts_with(
            r#"{"domain":{"zeta":"1","domain":"test.org","alpha":"2"},"subdomains":"#
        ));
    }

    #[tokio::test]
    async fn test_handle_no_matches_returns_empty_list() {
        init_test_logging();
        let handler = handler_with(&["www.other.net"]);

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(body_of(&response)["subdomains"], json!([]));
    }

    // ===========================================
    // domainパラメータ欠落
    // ===========================================

    #[tokio::test]
    async fn test_handle_missing_query_parameters() {
        init_test_logging();
        let handler = handler_with(&["a.test.org"]);

        let response = handler.handle(&LookupRequest::default()).await.unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(body_of(&response), json!({"error": "Requires domain parameter."}));
        assert_eq!(handler.repository.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_missing_domain_key() {
        init_test_logging();
        let handler = handler_with(&["a.test.org"]);

        let mut params = QueryParameters::new();
        params.insert("q".to_string(), "test.org".into());

        let response = handler.handle(&LookupRequest::new(params)).await.unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(response.error_body().unwrap().error, MISSING_DOMAIN_MESSAGE);
        assert_eq!(handler.repository.call_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_empty_domain_value() {
        init_test_logging();
        let handler = handler_with(&["a.test.org"]);

        let response = handler
            .handle(&LookupRequest::for_domain("   "))
            .await
            .unwrap();

        assert_eq!(response.status_code, 400);
        assert_eq!(handler.repository.call_count(), 0);
    }

    /// domain欠落時もIPチェックは1回実行される
    #[tokio::test]
    async fn test_handle_checks_ip_before_validation() {
        init_test_logging();
        let handler = handler_with(&[]);

        handler.handle(&LookupRequest::default()).await.unwrap();

        assert_eq!(handler.ip_fetcher.call_count(), 1);
    }

    // ===========================================
    // 外部依存の障害
    // ===========================================

    /// IPチェック失敗は呼び出し自体のエラーになり、検索は行わない
    #[tokio::test]
    async fn test_handle_ip_check_failure_is_fatal() {
        init_test_logging();
        let handler = SubdomainLookupHandler::new(
            StubSelfIpFetcher::failing(IpCheckError::Network("operation timed out".to_string())),
            InMemoryCertificateNameRepository::with_names(&["a.test.org"]),
        );

        let result = handler.handle(&LookupRequest::for_domain("test.org")).await;

        assert!(matches!(
            result,
            Err(LookupHandlerError::IpCheck(IpCheckError::Network(_)))
        ));
        assert_eq!(handler.ip_fetcher.call_count(), 1);
        assert_eq!(handler.repository.call_count(), 0);
    }

    /// domain欠落より先にIPチェック失敗が優先される
    #[tokio::test]
    async fn test_handle_ip_check_failure_precedes_validation() {
        init_test_logging();
        let handler = SubdomainLookupHandler::new(
            StubSelfIpFetcher::failing(IpCheckError::Network("connection reset".to_string())),
            InMemoryCertificateNameRepository::default(),
        );

        let result = handler.handle(&LookupRequest::default()).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_repository_failure_returns_502() {
        init_test_logging();
        let handler = SubdomainLookupHandler::new(
            StubSelfIpFetcher::succeeding("203.0.113.7"),
            InMemoryCertificateNameRepository::failing(RepositoryError::Connect(
                "connection refused".to_string(),
            )),
        );

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 502);
        assert_eq!(response.error_body().unwrap().error, UPSTREAM_FAILURE_MESSAGE);
        assert_eq!(handler.repository.call_count(), 1);
    }

    #[tokio::test]
    async fn test_handle_query_timeout_returns_502() {
        init_test_logging();
        let handler = SubdomainLookupHandler::new(
            StubSelfIpFetcher::succeeding("203.0.113.7"),
            InMemoryCertificateNameRepository::failing(RepositoryError::QueryTimeout(
                Duration::from_secs(60),
            )),
        );

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 502);
    }

    /// IPエコーサービスがエラーステータスを返しても検索は行う
    #[tokio::test]
    async fn test_handle_continues_when_ip_check_returns_error_status() {
        init_test_logging();
        let url = serve_once("503 Service Unavailable", "").await;
        let fetcher =
            HttpSelfIpFetcher::new(&config_for(url, Duration::from_secs(5))).unwrap();
        let handler = SubdomainLookupHandler::new(
            fetcher,
            InMemoryCertificateNameRepository::with_names(&["a.test.org"]),
        );

        let response = handler
            .handle(&LookupRequest::for_domain("test.org"))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.subdomains_body().unwrap().subdomains,
            vec!["a.test.org"]
        );
        assert_eq!(handler.repository.call_count(), 1);
    }

    /// 検索には空白除去後のドメインが渡される
    #[tokio::test]
    async fn test_handle_passes_trimmed_domain_to_repository() {
        init_test_logging();
        let handler = handler_with(&[]);

        handler
            .handle(&LookupRequest::for_domain(" test.org "))
            .await
            .unwrap();

        assert_eq!(handler.repository.queried_domains(), vec!["test.org"]);
    }
}
