pub mod cache;
pub mod error;
pub mod filter;
pub mod index;
pub mod package;
pub mod session;
pub mod text;
