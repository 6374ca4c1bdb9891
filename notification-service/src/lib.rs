pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
