// # RouterOS DNS Store
//
// This crate provides the RouterOS API implementation of `RouterDnsStore`.
//
// ## Implementation Status
//
// - ✅ API framing (variable-length words, sentences, !re/!done/!trap/!fatal/!empty)
// - ✅ Plaintext login (RouterOS 6.43+)
// - ✅ Static forward entry listing and creation
// - ✅ Plain TCP (8728), verified TLS and weak-compat TLS (8729)
// - ❌ NO legacy challenge login (MD5)
// - ❌ NO retry logic (single attempt, the next run picks up what is missing)
// - ❌ NO deletes or updates
//
// ## Security
//
// - The password NEVER appears in logs or `Debug` output
// - `TransportSecurity::WeakCompat` negotiates anonymous DH at OpenSSL security
//   level 0 and verifies neither certificate nor host name. It exists only for
//   routers whose API-SSL service has no certificate; a warning is logged for
//   every session opened this way.
//
// ## API Reference
//
// - https://help.mikrotik.com/docs/spaces/ROS/pages/47579160/API

pub mod codec;
pub mod connection;
pub mod store;
pub mod transport;

pub use connection::{ApiConnection, CommandOutput};
pub use store::{RouterOsSession, RouterOsStore};
pub use transport::{BoxedTransport, Transport};
