//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain records ([`crate::domain::Poll`], [`crate::domain::WaitListRequest`],
//! [`crate::domain::Occupancy`]) serialize as-is; only request bodies, query
//! parameters and composite responses get their own types here.

pub mod common_dto;
pub mod poll_dto;
pub mod request_dto;

pub use common_dto::*;
pub use poll_dto::*;
pub use request_dto::*;
