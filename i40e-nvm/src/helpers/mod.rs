// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional helpers to integrate a tool built on this crate with the Rust
//! ecosystem.
//!
//! For now, this is an implementation of [`Log`](log::Log) writing to
//! stderr (feature `logger`).

pub mod logger;
