pub mod config;
pub mod loader;
pub mod meta;
pub mod query;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testing;
