//! Forest storage
//!
//! The store layer owns node data and tree shape. Everything above it
//! (mutation services, retrieval) goes through [`TreeStore`].

mod error;
mod tree_store;

pub use error::StoreError;
pub use tree_store::{NeighborInfo, TreeStore};
