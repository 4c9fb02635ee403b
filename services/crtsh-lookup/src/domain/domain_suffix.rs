// ドメインサフィックス
//
// 検索対象ドメインから、certificate_identityテーブルに対する
// 後方一致パターンを構築するドメイン層コンポーネント。

/// LIKEパターンのエスケープ文字（PostgreSQLのデフォルト）
const LIKE_ESCAPE: char = '\\';

/// 検索対象ドメイン
///
/// `domain`パラメータの値を正規化して保持する。
/// 候補名が「`.` + ドメイン」で終わる場合のみ一致とみなす（大文字小文字は区別しない）。
///
/// # 例
/// ```
/// use crtsh_lookup::domain::DomainSuffix;
///
/// let suffix = DomainSuffix::parse("Example.COM").unwrap();
/// assert!(suffix.matches("WWW.example.com"));
/// assert!(!suffix.matches("example.com"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSuffix {
    /// 前後の空白を除去した入力値
    original: String,
    /// 小文字化した値
    normalized: String,
}

impl DomainSuffix {
    /// 入力文字列からDomainSuffixを作成
    ///
    /// 前後の空白を除去した結果が空の場合は`None`を返す。
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(Self {
            original: trimmed.to_string(),
            normalized: trimmed.to_lowercase(),
        })
    }

    /// 空白除去後の入力値を取得
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// 小文字化した値を取得
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// `reverse(lower(NAME_VALUE)) LIKE $1` に渡す反転済みパターンを構築
    ///
    /// `%.{domain}` を小文字化して反転したものと等価。
    /// 反転後にエスケープを行うため、ドメイン中の`%`や`_`は
    /// ワイルドカードではなくリテラルとして扱われる。
    ///
    /// # 例
    /// `example.com` → `moc.elpmaxe.%`
    pub fn reversed_like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.normalized.len() + 4);

        for c in self.normalized.chars().rev() {
            if matches!(c, '%' | '_' | LIKE_ESCAPE) {
                pattern.push(LIKE_ESCAPE);
            }
            pattern.push(c);
        }

        pattern.push_str(".%");
        pattern
    }

    /// 名前がこのドメインのサブドメインかどうかを判定
    ///
    /// SQL述語と同じ意味: `lower(name)` が `"." + lower(domain)` で終わる。
    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase()
            .strip_suffix(self.normalized.as_str())
            .is_some_and(|head| head.ends_with('.'))
    }
}

impl std::fmt::Display for DomainSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}
