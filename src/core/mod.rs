//! Core authentication, configuration and persistence

pub mod auth;
pub mod config;
pub mod db;
