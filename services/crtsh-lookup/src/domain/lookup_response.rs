// サブドメイン検索レスポンス
//
// API Gatewayプロキシ統合の出力形式（statusCode, headers, body）と、
// bodyに格納するJSONドキュメントを定義する。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::QueryParameters;

/// domainパラメータ欠落時のエラーメッセージ
pub const MISSING_DOMAIN_MESSAGE: &str = "Requires domain parameter.";

/// 上流データベース障害時のエラーメッセージ
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Certificate database query failed.";

/// 成功レスポンスのボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainsBody {
    /// 入力クエリパラメータのエコー
    pub domain: QueryParameters,
    /// 検索結果（上流の返却順）
    pub subdomains: Vec<String>,
}

/// エラーレスポンスのボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Lambdaレスポンス（API Gatewayプロキシ統合形式）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    /// HTTPステータスコード
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// レスポンスヘッダー
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON文字列化したボディ
    pub body: String,
}

impl LookupResponse {
    /// 200 OK（サブドメイン一覧）
    pub fn ok(body: &SubdomainsBody) -> Result<Self, serde_json::Error> {
        Self::json(200, body)
    }

    /// 400 Bad Request（domainパラメータ欠落）
    pub fn missing_domain() -> Result<Self, serde_json::Error> {
        Self::error(400, MISSING_DOMAIN_MESSAGE)
    }

    /// 502 Bad Gateway（上流データベース障害）
    pub fn upstream_failure() -> Result<Self, serde_json::Error> {
        Self::error(502, UPSTREAM_FAILURE_MESSAGE)
    }

    fn error(status_code: u16, message: &str) -> Result<Self, serde_json::Error> {
        Self::json(
            status_code,
            &ErrorBody {
                error: message.to_string(),
            },
        )
    }

    fn json<T: Serialize>(status_code: u16, body: &T) -> Result<Self, serde_json::Error> {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(Self {
            status_code,
            headers,
            body: serde_json::to_string(body)?,
        })
    }

    /// 成功ステータスかどうか
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// ボディを成功レスポンスとしてパース
    pub fn subdomains_body(&self) -> Result<SubdomainsBody, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// ボディをエラーレスポンスとしてパース
    pub fn error_body(&self) -> Result<ErrorBody, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
