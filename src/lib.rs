//! Read, check, store and search Doxygen search-index fragments.

pub mod api;
pub mod config;
pub mod db;
pub mod index;
pub mod mcp;
pub mod models;
pub mod pages;
