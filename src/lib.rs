//! Contentdeck - a localized, region-aware content publishing backend
//!
//! This library provides the core functionality for the Contentdeck system.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
