pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod static_assets;

#[cfg(test)]
pub mod test_support;
