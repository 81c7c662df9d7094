//! # shiftboard
//!
//! Shift request reconciliation and administration (client end; talks to the shift service)
//!
//! Employees tell the service which days they can work. This crate pulls
//! those [requests](data::AvailabilityRequest) and the administrator's
//! [confirmed shifts](data::ConfirmedShift) for a month, merges them into a
//! [grid](recon::Grid), and drives the confirm, edit and delete flows
//! through [`ops::Board`].

#![deny(
    clippy::undocumented_unsafe_blocks,
    clippy::missing_safety_doc,
    reason = "multi-person projects should document dangers"
)]
#![warn(missing_docs)]
#![cfg_attr(
    not(any(test, debug_assertions)),
    deny(
        clippy::missing_panics_doc,
        clippy::panic,
        clippy::unimplemented,
        clippy::unwrap_used,
        reason = "prefer errors over panicking"
    )
)]
#![cfg_attr(
    not(any(test, debug_assertions)),
    forbid(clippy::todo, reason = "production code should not use `todo`")
)]

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod ops;
pub mod recon;
pub mod submit;
