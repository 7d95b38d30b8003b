//! Aperture flow control client library.
//!
//! This crate wires the decision channel, telemetry binder, and flow lifecycle
//! into a client that applications call around every protected feature:
//! `begin_flow` asks the agent for a decision, the returned flow tells whether
//! to proceed, and `end` reports the outcome on the flow's span.
//!
//! When the agent cannot be reached the flow fails open: it is accepted and
//! the transport error is returned next to it for logging only.

pub mod client;
pub mod config;
pub mod flow;
pub mod obs;
pub mod rpc;
pub mod telemetry;

pub use client::{ApertureClient, Client};
pub use config::{ClientSettings, Options};
pub use flow::{ApertureFlow, Flow};
pub use rpc::{FlowControlService, GrpcFlowControl};
pub use telemetry::Telemetry;

pub use aperture_core::{ApertureError, Code, Result};
