//! HTTP adapter - axum routers, handlers, and DTOs.
//!
//! One submodule per API area, each with its own state, DTOs, and error
//! mapping. Caller identity arrives from the upstream auth collaborator as
//! `X-User-Id` / `X-User-Role` headers; token verification is not this
//! service's job.

pub mod cart;
pub mod checkout;
mod error;
mod identity;
pub mod orders;

pub use error::ErrorResponse;
pub use identity::Caller;
