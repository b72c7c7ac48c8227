//! Bookmarks Module
//!
//! CRUD over the single `bookmarks` table: title, url, optional description and a
//! rating between 0 and 5.
//!
//! # Layout
//!
//! - `store`: one SQL statement per operation, no business rules
//! - `validation`: checks request bodies before anything touches the store
//! - `sanitize`: filters markup out of text fields on the way out
//! - `handler` / `routes`: the HTTP surface
//!
//! # Usage
//!
//! ```rust,ignore
//! use bookmarks_api::bookmarks;
//!
//! let app = Router::new()
//!     .nest("/api/bookmarks", bookmarks::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;
pub mod sanitize;
pub mod store;
pub mod validation;

pub use routes::routes;
pub use sanitize::sanitize_for_output;
pub use store::BookmarkStore;
pub use validation::{validate_create, validate_update};
