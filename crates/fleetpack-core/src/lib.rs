//! Fleetpack Core - Configuration model and resolution for blue/green fleets
//!
//! This crate provides the foundational types used throughout Fleetpack:
//! - `Pack`: The package definition on disk (Pack.yaml, values, environments)
//! - `Values`: Untyped configuration documents with deep merge support
//! - `ChartValues`: The typed declared configuration
//! - `Resolver`: Layered defaulting and validation into `ResolvedApp` records
//! - `NameGenerator` / `ColorRouter`: Naming, labels and traffic color
//! - `RenderError`: The render error taxonomy

pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod naming;
pub mod pack;
pub mod resolve;
pub mod suggestions;
pub mod values;

pub use color::{Color, ColorRouter, SelectorFragment};
pub use config::{
    AccessControlSpec, AppSettings, AppSpec, ChartValues, EnvironmentOverlay, GlobalConfig,
    IngressSpec,
};
pub use context::{PackInfo, ReleaseInfo, RenderContext};
pub use error::{CoreError, RenderError, RenderErrorKind};
pub use naming::NameGenerator;
pub use pack::{EngineConfig, LoadedPack, Pack, PackMetadata};
pub use resolve::{
    Layer, PullPolicy, Resolution, ResolvedApp, ResolvedGlobal, Resolver, ServiceType,
};
pub use values::{Values, parse_set_values};
