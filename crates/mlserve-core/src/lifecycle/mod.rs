//! Model lifecycle: train, retrain, predict, describe and delete.
//!
//! The only component that writes to both the registry and the artifact
//! store. Transports call into it and never touch storage directly.

pub mod error;
mod locks;
mod manager;

pub use error::{ErrorKind, LifecycleError, LifecycleResult, Operation};
pub use manager::{ModelLifecycleManager, TrainOutcome, TrainRequest};
