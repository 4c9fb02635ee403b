// Domain layer modules
pub mod domain_suffix;
pub mod lookup_request;
pub mod lookup_response;
pub mod source_event;

// Re-exports
pub use domain_suffix::DomainSuffix;
pub use lookup_request::{LookupRequest, QueryParameters, DOMAIN_PARAMETER};
pub use lookup_response::{
    ErrorBody, LookupResponse, SubdomainsBody, MISSING_DOMAIN_MESSAGE, UPSTREAM_FAILURE_MESSAGE,
};
pub use source_event::{SourceRequest, SourceResponse};
