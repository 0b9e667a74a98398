//! Backend gateway
//!
//! Thin request layer for the portal backend. One job: attach the bearer
//! token uniformly and map transport/HTTP failures into a small error
//! taxonomy so the rest of the crate never inspects status codes.

mod client;
mod error;

pub use client::{GatewayClient, LoginResponse, RegisterRequest};
pub use error::GatewayError;
