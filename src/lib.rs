//! Program admission rankings: catalog loading, rank derivation, ranking
//! queries and personal lists.

pub mod catalog;
pub mod error;
pub mod export;
pub mod lists;
pub mod loader;
pub mod models;
pub mod query;
pub mod ranker;
pub mod storage;
pub mod text;

#[cfg(test)]
pub mod test_support;
