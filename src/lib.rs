pub mod assistant;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod filters;
pub mod helpers;
mod migrations;
pub mod navigation;
pub mod render;
pub mod services;
pub mod session;
pub mod state;
pub mod types;
