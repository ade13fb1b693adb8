pub mod handlers;
pub mod middleware;
pub mod server;
pub mod server_config;
