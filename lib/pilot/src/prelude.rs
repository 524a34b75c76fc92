//! Prelude module for convenient imports.
//!
//! ```ignore
//! use pilot::prelude::*;
//! ```

pub use pilot_core::prelude::*;

pub use crate::{
    BlockingHyperClient, BlockingPilot, ClientConfig, Deferred, DeferredPilot, DiagnosticSink,
    HyperClient, Pilot, TracingSink,
};
pub use serde::{Deserialize, Serialize};
