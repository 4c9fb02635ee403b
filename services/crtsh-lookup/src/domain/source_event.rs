// 外部ソース検索イベント
//
// 外部のサブドメイン列挙サービス（AlienVault OTX, Sublist3r, Censys）を
// 呼び出すLambdaの入出力。オーケストレーターから直接呼び出されるため、
// API Gatewayプロキシ形式ではなく素のJSONを受け渡す。

use serde::{Deserialize, Serialize};

use super::DomainSuffix;

/// 外部ソース検索Lambdaの入力
///
/// ```json
/// {"domain": "example.com"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl SourceRequest {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
        }
    }

    /// 検索対象ドメインを取得（欠落・空白のみは`None`）
    pub fn domain(&self) -> Option<DomainSuffix> {
        self.domain.as_deref().and_then(DomainSuffix::parse)
    }
}

/// 外部ソース検索Lambdaの出力
///
/// 名前はソースの返却順のまま格納する（重複除去・後方一致フィルタはしない）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResponse {
    pub subdomains: Vec<String>,
}
