// APIキー取得
//
// 外部APIの認証情報をSSM Parameter Storeから取得する。

use async_trait::async_trait;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::Client as SsmClient;
use tracing::{debug, error, instrument};

use super::SourceError;

/// APIキー取得トレイト（テスト用の抽象化）
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// 格納されているAPIキー文字列を取得
    async fn fetch_api_key(&self) -> Result<String, SourceError>;
}

/// SSM Parameter Store実装
///
/// 呼び出しごとにパラメータを読み直すため、キーのローテーションは再デプロイなしで反映される。
#[derive(Debug, Clone)]
pub struct SsmApiKeyStore {
    client: SsmClient,
    parameter_name: String,
}

impl SsmApiKeyStore {
    pub fn new(client: SsmClient, parameter_name: impl Into<String>) -> Self {
        Self {
            client,
            parameter_name: parameter_name.into(),
        }
    }

    /// AWS設定からデフォルトのクライアントを作成
    pub async fn from_config(parameter_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(SsmClient::new(&config), parameter_name)
    }
}

#[async_trait]
impl ApiKeyStore for SsmApiKeyStore {
    #[instrument(skip(self), fields(parameter_name = %self.parameter_name))]
    async fn fetch_api_key(&self) -> Result<String, SourceError> {
        let output = self
            .client
            .get_parameter()
            .name(&self.parameter_name)
            .with_decryption(false)
            .send()
            .await
            .map_err(|e| {
                error!(error = %DisplayErrorContext(&e), "SSMパラメータの取得に失敗");
                SourceError::ApiKey(DisplayErrorContext(&e).to_string())
            })?;

        let value = output
            .parameter()
            .and_then(|parameter| parameter.value())
            .ok_or_else(|| SourceError::ApiKey("SSMパラメータに値がありません".to_string()))?;

        debug!("APIキーを取得");
        Ok(value.to_string())
    }
}
