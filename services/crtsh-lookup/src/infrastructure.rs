// Infrastructure layer modules
pub mod certificate_repository;
pub mod config;
pub mod ip_check;
pub mod logging;
pub mod recon_sources;
pub mod source_config;

// Re-exports
pub use certificate_repository::{CertificateNameRepository, CrtShRepository, RepositoryError};
pub use config::{ConfigError, LookupConfig};
pub use ip_check::{HttpSelfIpFetcher, IpCheckError, SelfIpFetcher};
pub use logging::{init_cli_logging, init_logging};
pub use recon_sources::{SourceError, SubdomainSource};
pub use source_config::SourceConfig;
