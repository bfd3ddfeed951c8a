pub mod bundle;
pub mod config;
pub mod connector;
pub mod emitter;
pub mod error;
pub mod events;
pub mod kernel;

pub use bundle::{BundleAssembler, EvidenceBundle, RiskTier};
pub use emitter::{BundleEmitter, Emission, Sink};
pub use error::{ConnectorError, Result};
pub use events::{ArtifactMetadata, ChangeEvent, DiffResult, DiffType, EventType};
