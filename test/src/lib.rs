//! Shared test helpers for the vigil cluster core: recording peer
//! listeners, static zone/endpoint fixtures, scripted compiler doubles and
//! runtime builders.

pub mod helpers;

pub use helpers::compiler::{MockCompiler, MockItems};
pub use helpers::engine::MockCheckEngine;
pub use helpers::listener::{MockListener, RelayedMessage};
pub use helpers::runtime::{local_origin_from, test_runtime, test_runtime_at};
pub use helpers::zones::{AccessPolicy, StaticEndpoint, StaticZone};
