//! Domain types for the preorder ledger.

mod catalog;
mod isbn;
mod status;

pub use catalog::CatalogProduct;
pub use isbn::{Isbn, IsbnError};
pub use status::TitleStatus;
