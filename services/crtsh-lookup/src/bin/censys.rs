/// Censys サブドメイン検索Lambdaエントリポイント
///
/// `{"domain": ..}`を受け取り、Censys証明書検索の全ページから名前を集めて返却する。
/// APIキーは呼び出しごとにSSM Parameter Storeから取得する。
///
/// # 環境変数
/// - API_KEY_PATH: APIキー（`{"id": .., "secret": ..}`）のSSMパラメータ名（必須）
/// - CENSYS_API_URL: Censys証明書検索API（デフォルト: https://www.censys.io/api/v1/search/certificates）
/// - SOURCE_TIMEOUT_SECS: リクエストタイムアウト秒（デフォルト: 30）
/// - RUST_LOG: ログレベル（デフォルト: info）
use crtsh_lookup::application::SourceLookupHandler;
use crtsh_lookup::domain::{SourceRequest, SourceResponse};
use crtsh_lookup::infrastructure::recon_sources::{CensysSource, SsmApiKeyStore};
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

    let api_key_path = config.require_api_key_path().map_err(|e| {
        error!(error = %e, "設定読み込み失敗");
        Error::from(e.to_string())
    })?;
    let key_store = SsmApiKeyStore::from_config(api_key_path).await;

    let source = CensysSource::new(&config, key_store).map_err(|e| {
        error!(error = %e, "Censysクライアント初期化失敗");
        Error::from(e.to_string())
    })?;

    let source_handler = SourceLookupHandler::new(source);
    let shared = &source_handler;

    info!("Censys検索Lambda関数を初期化");

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
    let span = tracing::info_span!("censys", request_id = %event.context.request_id);

    async move {
        source_handler.handle(&event.payload).await.map_err(|e| {
            error!(error = %e, "Censys検索呼び出しが失敗");
            Error::from(e)
        })
    }
    .instrument(span)
    .await
}
