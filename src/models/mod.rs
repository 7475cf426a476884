pub mod document;
pub mod session;

pub use document::{
    DocumentLink, DocumentOverrides, DocumentStatus, DocumentType, GridColumn, GridRow,
    ListingPage, ListingResult, NormalizedDocument, RawDocument, Subcategory, PORTAL_NAME,
};
pub use session::{DateFormat, Session};
