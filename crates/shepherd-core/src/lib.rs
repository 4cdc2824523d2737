//! Core library for the shepherd church dashboard.
//!
//! Holds everything that does not touch the terminal: durable session
//! storage and its synchronizer, the API client, data models, list view
//! helpers, forms, routes and configuration.

pub mod api;
pub mod attachment;
pub mod auth;
pub mod config;
pub mod forms;
pub mod listing;
pub mod models;
pub mod routes;
pub mod storage;
pub mod utils;
