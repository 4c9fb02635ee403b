/// AlienVault OTX サブドメイン検索Lambdaエントリポイント
///
/// `{"domain": ..}`を受け取り、OTXのパッシブDNSレコードからホスト名を返却する。
///
/// # 環境変数
/// - ALIENVAULT_API_URL: OTXドメイン指標API（デフォルト: https://otx.alienvault.com/api/v1/indicators/domain）
/// - SOURCE_TIMEOUT_SECS: リクエストタイムアウト秒（デフォルト: 30）
/// - RUST_LOG: ログレベル（デフォルト: info）
use crtsh_lookup::application::SourceLookupHandler;
use crtsh_lookup::domain::{SourceRequest, SourceResponse};
use crtsh_lookup::infrastructure::recon_sources::AlienVaultSource;
use crtsh_lookup::infrastructure::{init_logging, SourceConfig, SubdomainSource};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = SourceConfig::from_env().map_err(|e| {
        error!(error = %e, "設定読み込み失敗");
        Error::from(e.to_string())
    })?;

    let source = AlienVaultSource::new(&config).map_err(|e| {
        error!(error = %e, "AlienVaultクライアント初期化失敗");
        Error::from(e.to_string())
    })?;

    let source_handler = SourceLookupHandler::new(source);
    let shared = &source_handler;

    info!("AlienVault検索Lambda関数を初期化");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<SourceRequest>| async move {
        handler(shared, event).await
    }))
    .await
}

/// Lambda関数のメインハンドラー
async fn handler<S: SubdomainSource>(
    source_handler: &SourceLookupHandler<S>,
    event: LambdaEvent<SourceRequest>,
) -> Result<SourceResponse, Error> {
    let span = tracing::info_span!("alienvault", request_id = %event.context.request_id);

    async move {
        source_handler.handle(&event.payload).await.map_err(|e| {
            error!(error = %e, "AlienVault検索呼び出しが失敗");
            Error::from(e)
        })
    }
    .instrument(span)
    .await
}
