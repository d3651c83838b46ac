//! Data files for pulsenet: wiring and run configuration in RON, TOML, or
//! JSON, plus subscriber setup for the `tracing` events the other crates emit.

pub mod loader;
pub mod logging;
pub mod schema;

pub use loader::{DataLoadError, load_config, load_network, load_simulation};
pub use schema::{NodeData, NodeKindData, SimConfig, WiringFile};
