//! HTTP REST API interfaces
//!
//! - `common`: response envelope, error mapping, validated JSON
//! - `middleware`: bearer token authentication
//! - `modules`: handlers grouped by resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use common::{ApiError, ApiResponse};
pub use router::{create_api_router, ApiDoc, ApiState};
