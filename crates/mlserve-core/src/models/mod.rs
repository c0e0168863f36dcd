//! Domain models shared by the registry, the lifecycle manager and the
//! transports.

pub mod proto_convert;
pub mod record;

pub use record::{ModelRecord, ModelSummary};
