/// Sublist3r サブドメイン検索Lambdaエントリポイント
///
/// `{"domain": ..}`を受け取り、Sublist3r検索APIが返す名前を返却する。
///
/// # 環境変数
/// - SUBLIST3R_API_URL: Sublist3r検索API（デフォルト: https://api.sublist3r.com/search.php）
/// - SOURCE_TIMEOUT_SECS: リクエストタイムアウト秒（デフォルト: 30）
/// - RUST_LOG: ログレベル（デフォルト: info）
use crtsh_lookup::application::SourceLookupHandler;
use crtsh_lookup::domain::{SourceRequest, SourceResponse};
use crtsh_lookup::infrastructure::recon_sources::Sublist3rSource;
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

    let source = Sublist3rSource::new(&config).map_err(|e| {
        error!(error = %e, "Sublist3rクライアント初期化失敗");
        Error::from(e.to_string())
    })?;

    let source_handler = SourceLookupHandler::new(source);
    let shared = &source_handler;

    info!("Sublist3r検索Lambda関数を初期化");

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
    let span = tracing::info_span!("sublist3r", request_id = %event.context.request_id);

    async move {
        source_handler.handle(&event.payload).await.map_err(|e| {
            error!(error = %e, "Sublist3r検索呼び出しが失敗");
            Error::from(e)
        })
    }
    .instrument(span)
    .await
}
