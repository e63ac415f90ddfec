pub mod auth;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod models;
pub mod pagination;
pub mod session;
pub mod validation;

pub use error::{ApiError, ApiResult};
