pub mod assemble;
pub mod config;
pub mod domain;
pub mod dst;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod output;
pub mod store;
pub mod sunspot;
