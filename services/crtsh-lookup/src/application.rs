// アプリケーション層モジュール
pub mod lookup_handler;
pub mod source_handler;

// 再エクスポート
pub use lookup_handler::{LookupHandlerError, SubdomainLookupHandler};
pub use source_handler::{SourceHandlerError, SourceLookupHandler};
