/// サブドメイン検索Lambdaエントリポイント
///
/// API Gatewayプロキシ統合のイベントを受け取り、
/// crt.shから取得したサブドメイン一覧をJSONで返却する。
///
/// # 環境変数
/// - CRTSH_DB_HOST / CRTSH_DB_PORT / CRTSH_DB_NAME / CRTSH_DB_USER: 上流データベース
/// - IP_CHECK_URL: IPチェックURL
/// - IP_CHECK_TIMEOUT_SECS / CRTSH_DB_CONNECT_TIMEOUT_SECS / CRTSH_DB_QUERY_TIMEOUT_SECS: タイムアウト
/// - RUST_LOG: ログレベル（デフォルト: info）
use crtsh_lookup::application::SubdomainLookupHandler;
use crtsh_lookup::domain::{LookupRequest, LookupResponse};
use crtsh_lookup::infrastructure::{
    init_logging, CertificateNameRepository, CrtShRepository, HttpSelfIpFetcher, LookupConfig,
    SelfIpFetcher,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定とHTTPクライアントはコールドスタート時に1回だけ構築する
    let config = LookupConfig::from_env().map_err(|e| {
        error!(error = %e, "設定読み込み失敗");
        Error::from(e.to_string())
    })?;

    let ip_fetcher = HttpSelfIpFetcher::new(&config).map_err(|e| {
        error!(error = %e, "IPチェッククライアント初期化失敗");
        Error::from(e.to_string())
    })?;

    // データベース接続は呼び出しごとに確立する
    let repository = CrtShRepository::new(&config);

    let lookup_handler = SubdomainLookupHandler::new(ip_fetcher, repository);
    let shared = &lookup_handler;

    info!("サブドメイン検索Lambda関数を初期化");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<LookupRequest>| async move {
        handler(shared, event).await
    }))
    .await
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. リクエストIDをスパンに付与
/// 2. SubdomainLookupHandlerで処理
/// 3. IPチェック失敗時はエラーを返し、呼び出しを失敗させる
async fn handler<F, R>(
    lookup_handler: &SubdomainLookupHandler<F, R>,
    event: LambdaEvent<LookupRequest>,
) -> Result<LookupResponse, Error>
where
    F: SelfIpFetcher,
    R: CertificateNameRepository,
{
    let span = tracing::info_span!("lookup", request_id = %event.context.request_id);

    async move {
        let response = lookup_handler.handle(&event.payload).await.map_err(|e| {
            error!(error = %e, "サブドメイン検索呼び出しが失敗");
            Error::from(e)
        })?;

        info!(status_code = response.status_code, "レスポンス送信");
        Ok(response)
    }
    .instrument(span)
    .await
}
