//! Domain building blocks shared by every storyloom crate.
//!
//! Holds the scenario model, the prompt compiler, the moderation gate, the
//! artifact types and naming rules, the error taxonomy, and the Story Store
//! contracts. Nothing in here performs network or model I/O.

pub mod artifact;
pub mod error;
pub mod hashing;
pub mod moderation;
pub mod naming;
pub mod prompt;
pub mod scenario;
pub mod store;
pub mod types;
