//! Aftershock forecasting HTTP service

pub mod api;
pub mod config;
