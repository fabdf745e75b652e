pub mod attribution;
pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod profile;
pub mod request;
pub mod resize;
pub mod runner;
pub mod scanner;
pub mod validate;
pub mod wikitext;

#[cfg(test)]
mod testing;
