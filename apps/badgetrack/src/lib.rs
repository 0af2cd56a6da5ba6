//! # Badgetrack Application
//!
//! The HTTP API, CLI and configuration layers on top of `badgetrack-core`.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/badgetrack (THE BINARY)       │
//! │                                               │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────┐   │
//! │  │  CLI    │   │ HTTP API │   │  Config   │   │
//! │  │ (clap)  │   │  (axum)  │   │  (toml)   │   │
//! │  └────┬────┘   └────┬─────┘   └─────┬─────┘   │
//! │       └─────────────┼───────────────┘         │
//! │                     ▼                         │
//! │            ┌─────────────────┐                │
//! │            │ badgetrack-core │                │
//! │            │   (THE LOGIC)   │                │
//! │            └─────────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod config;
