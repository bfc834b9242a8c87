//! In-process fake push gateway and feedback service for `apns-client`'s
//! integration tests.
//!
//! Not published: this crate exists purely so the end-to-end scenarios in
//! spec §8 (S1-S6) can be driven against a cooperating peer over a real TLS
//! socket on `localhost`, without reaching out to Apple's actual endpoints.
//! [`TestCertificates`] mints a throwaway CA plus a server and client leaf;
//! [`FakePushServer`] and [`FakeFeedbackServer`] speak just enough of the
//! wire protocol for a test to script the peer's side of a scenario.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod certs;
mod feedback;
mod push;

pub use certs::TestCertificates;
pub use feedback::FakeFeedbackServer;
pub use push::{FakePushConnection, FakePushServer};
