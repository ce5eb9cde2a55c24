//! HTTP request handlers for the gateway API

pub mod dispatch;
pub mod operations;
