//! Core traits for fwdsync
//!
//! This module defines the abstract interfaces of the external collaborators.
//!
//! - [`DomainSource`]: Retrieve the published domain list
//! - [`RouterDnsStore`]: Open sessions against the router's static DNS table
//! - [`DnsSession`]: Read and extend the table within one session

pub mod domain_source;
pub mod dns_store;

pub use domain_source::{DomainSource, StaticDomainSource};
pub use dns_store::{DnsSession, ForwardEntry, RouterDnsStore};
