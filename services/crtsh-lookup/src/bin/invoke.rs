/// サブドメイン検索Lambda呼び出しCLI
///
/// デプロイ済みのサブドメイン検索Lambda関数を同期呼び出しし、
/// 結果のサブドメインを1行ずつ標準出力に表示する。
///
/// # ローカル実行
/// ```bash
/// cargo run --bin invoke -- example.com
///
/// # リージョン・関数名を指定
/// cargo run --bin invoke -- example.com --region ap-northeast-1 --function-name CrtShFunction
/// ```
use std::process::ExitCode;

use aws_sdk_lambda::config::Region;
use aws_sdk_lambda::primitives::Blob;
use clap::Parser;
use crtsh_lookup::domain::{LookupRequest, LookupResponse};
use crtsh_lookup::infrastructure::init_cli_logging;
use serde::Deserialize;
use tracing::{debug, error};

/// デフォルトの呼び出し先関数名
const DEFAULT_FUNCTION_NAME: &str = "CrtShFunction";

/// サブドメインが無い場合の表示
const NO_SUBDOMAINS_MESSAGE: &str = "There were no subdomains";

/// コマンドライン引数
#[derive(Parser, Debug)]
#[command(name = "invoke")]
#[command(about = "サブドメイン検索Lambdaを呼び出して結果を表示")]
struct CliArgs {
    /// 検索対象ドメイン
    domain: String,

    /// AWSリージョン（省略時はAWS設定のデフォルト）
    #[arg(long, short = 'r')]
    region: Option<String>,

    /// 呼び出すLambda関数名
    #[arg(long, short = 'f', default_value = DEFAULT_FUNCTION_NAME)]
    function_name: String,
}

/// Lambdaランタイムが返す関数エラー
#[derive(Debug, Deserialize)]
struct FunctionError {
    #[serde(rename = "errorMessage")]
    error_message: String,
    #[serde(rename = "errorType", default)]
    error_type: Option<String>,
}

/// 呼び出し結果の解釈
#[derive(Debug, PartialEq, Eq)]
enum InvokeOutcome {
    /// 検索成功
    Subdomains(Vec<String>),
    /// 関数エラーまたはエラーレスポンス
    Failed(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_cli_logging();

    let args = CliArgs::parse();

    let payload = match serde_json::to_vec(&LookupRequest::for_domain(&args.domain)) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "リクエストのシリアライズに失敗");
            return ExitCode::FAILURE;
        }
    };

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = args.region.clone() {
        loader = loader.region(Region::new(region));
    }
    let aws_config = loader.load().await;
    let client = aws_sdk_lambda::Client::new(&aws_config);

    debug!(function_name = %args.function_name, domain = %args.domain, "Lambda関数を呼び出し");

    let output = match client
        .invoke()
        .function_name(&args.function_name)
        .payload(Blob::new(payload))
        .send()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, function_name = %args.function_name, "Lambda関数の呼び出しに失敗");
            return ExitCode::FAILURE;
        }
    };

    let payload = output.payload().map(|p| p.as_ref()).unwrap_or_default();

    match interpret(output.function_error(), payload) {
        Ok(InvokeOutcome::Subdomains(subdomains)) => {
            for line in render(&subdomains) {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Ok(InvokeOutcome::Failed(message)) => {
            println!("{}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Lambdaレスポンスのパースに失敗");
            ExitCode::FAILURE
        }
    }
}

/// 呼び出し結果のペイロードを解釈する
///
/// - 関数エラー: `errorMessage`を返す
/// - 非2xxレスポンス: ボディの`error`を返す
/// - 2xxレスポンス: ボディの`subdomains`を返す
fn interpret(
    function_error: Option<&str>,
    payload: &[u8],
) -> Result<InvokeOutcome, serde_json::Error> {
    if let Some(kind) = function_error {
        let function_error: FunctionError = serde_json::from_slice(payload)?;
        debug!(
            function_error = %kind,
            error_type = ?function_error.error_type,
            "Lambda関数がエラーを返却"
        );
        return Ok(InvokeOutcome::Failed(function_error.error_message));
    }

    let response: LookupResponse = serde_json::from_slice(payload)?;
    if !response.is_success() {
        return Ok(InvokeOutcome::Failed(response.error_body()?.error));
    }

    Ok(InvokeOutcome::Subdomains(response.subdomains_body()?.subdomains))
}

/// 表示行を生成する
fn render(subdomains: &[String]) -> Vec<String> {
    if subdomains.is_empty() {
        return vec![NO_SUBDOMAINS_MESSAGE.to_string()];
    }
    subdomains.to_vec()
}
