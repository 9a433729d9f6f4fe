//! Runtime query surface for generated documentation sites
//!
//! Ties the sharded symbol search and the navigation tree together behind
//! [`SearchSession`], configured from a `docnav.toml` in the site root.
//!
//! # Usage
//!
//! ```ignore
//! use docnav_session::SearchSession;
//! use std::path::Path;
//!
//! let mut session = SearchSession::open_dir(Path::new("docs/html"))?;
//! if let Some(results) = session.set_query("bkpsram") {
//!     let hit = results.hits[0].clone();
//!     session.select_hit(&hit);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod session;

pub use config::{DocNavConfig, CONFIG_FILE_NAME};
pub use session::{ResultChange, ResultObserver, SearchSession};
