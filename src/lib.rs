pub mod compat;
pub mod config;
pub mod edit;
pub mod error;
pub mod handle;
pub mod parse;
pub mod repair;
pub mod upstream;
pub mod validate;
pub mod wasm;
