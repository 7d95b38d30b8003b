//! Top-level facade crate for the Aperture flow control SDK.
//!
//! Re-exports the core contracts and the client library so users can depend on a single crate.

pub mod core {
    pub use aperture_core::*;
}

pub mod client {
    pub use aperture_client::*;
}
