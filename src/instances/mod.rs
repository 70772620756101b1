//! Registry of known webhook senders

pub mod registry;

pub use registry::{Instance, InstanceRegistry};
