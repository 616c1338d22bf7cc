//! callfreq core library: method call frequency reports, the derived catalog
//! and series views, and the interactive view state that ties them together.

mod cache;
mod catalog;
mod config;
mod error;
mod ingest;
mod render;
mod report;
mod schema;
mod series;
mod view;

#[cfg(test)]
mod testutil;

pub use cache::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use ingest::*;
pub use render::*;
pub use report::*;
pub use schema::*;
pub use series::*;
pub use view::*;
