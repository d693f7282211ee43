pub mod auth;
pub mod capture;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod settings;
pub mod store;
