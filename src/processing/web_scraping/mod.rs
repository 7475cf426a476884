pub mod auth;
pub mod detail_extractor;
pub mod http_client;
pub mod lister;
pub mod portal;
pub mod status_mapper;

pub use auth::BrowserAuthenticator;
pub use detail_extractor::HttpDetailFetcher;
pub use lister::HttpDocumentLister;
pub use status_mapper::PortalStatusMapper;
