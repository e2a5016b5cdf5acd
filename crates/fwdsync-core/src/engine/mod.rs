//! Core sync engine
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ DomainSource │─── raw hostnames ───┐
//! └──────────────┘                     │
//!                                      ▼
//!                              ┌──────────────┐
//!                              │  normalize   │
//!                              └──────────────┘
//!                                      │ candidate keys
//!                                      ▼
//!                              ┌──────────────┐
//!                              │ Synchronizer │
//!                              └──────────────┘
//!                                      │
//!                  ┌───────────────────┴───────────────────┐
//!                  ▼                                       ▼
//!          ┌───────────────┐                       ┌───────────────┐
//!          │  list_names   │                       │ add_forward_  │
//!          │  (snapshot)   │                       │ entry (diff)  │
//!          └───────────────┘                       └───────────────┘
//! ```
//!
//! [`SyncJob`] wires the pieces together for one run; [`Synchronizer`] can be
//! used on its own when the candidate set comes from somewhere else.

pub mod job;
pub mod synchronizer;

pub use job::{RunSummary, SyncJob};
pub use synchronizer::{FailedEntry, SyncReport, Synchronizer};
