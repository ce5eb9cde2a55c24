//! Shared data models for the gateway

mod envelope;
mod operation;
mod returned;

pub use envelope::*;
pub use operation::*;
pub use returned::*;
