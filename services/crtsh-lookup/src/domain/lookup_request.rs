// サブドメイン検索リクエスト
//
// API Gatewayプロキシ統合から渡されるイベントのうち、
// クエリ文字列パラメータのみを扱う。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DomainSuffix;

/// 検索対象ドメインを指定するクエリパラメータ名
pub const DOMAIN_PARAMETER: &str = "domain";

/// クエリ文字列パラメータ
///
/// レスポンスの`domain`フィールドにそのままエコーされる。
/// serde_jsonの`preserve_order`により、キーは受信した順序を保つ。
pub type QueryParameters = serde_json::Map<String, Value>;

/// Lambdaイベント
///
/// `queryStringParameters`以外のフィールド（headers, requestContext等）は無視する。
/// API Gatewayはパラメータが無い場合に`null`を送るため、`None`として扱う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// クエリ文字列パラメータ
    #[serde(
        rename = "queryStringParameters",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub query_string_parameters: Option<QueryParameters>,
}

impl LookupRequest {
    /// クエリパラメータを指定してリクエストを作成
    pub fn new(query_string_parameters: QueryParameters) -> Self {
        Self {
            query_string_parameters: Some(query_string_parameters),
        }
    }

    /// `domain`パラメータのみを持つリクエストを作成
    pub fn for_domain(domain: impl Into<String>) -> Self {
        let mut parameters = QueryParameters::new();
        parameters.insert(DOMAIN_PARAMETER.to_string(), Value::String(domain.into()));
        Self::new(parameters)
    }

    /// クエリパラメータを取得
    pub fn query_parameters(&self) -> Option<&QueryParameters> {
        self.query_string_parameters.as_ref()
    }

    /// `domain`パラメータを検索対象ドメインとして取得
    ///
    /// パラメータが存在しない、文字列でない、または空白のみの場合は`None`。
    pub fn domain(&self) -> Option<DomainSuffix> {
        self.query_string_parameters
            .as_ref()?
            .get(DOMAIN_PARAMETER)
            .and_then(Value::as_str)
            .and_then(DomainSuffix::parse)
    }
}
