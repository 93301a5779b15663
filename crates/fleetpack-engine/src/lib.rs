//! Fleetpack Engine - manifest synthesis for blue/green microservice sets
//!
//! This crate turns resolved configuration into typed Kubernetes objects:
//! - One Deployment per application, labelled with its variant color
//! - Services whose selectors route to the active color
//! - Autoscalers, a single Ingress and an access-control set
//! - Cross-entry checks (references, duplicates, name collisions)
//! - Multi-error collection for validate-only runs

pub mod access;
pub mod aggregate;
pub mod autoscaler;
pub mod engine;
pub mod error;
pub mod ingress;
pub mod manifest;
pub mod meta;
pub mod service;
pub mod workload;

#[cfg(test)]
mod testing;

pub use engine::{Engine, EngineBuilder, RenderResultWithReport};
pub use error::{EngineError, RenderReport, Result};
pub use manifest::{Manifest, ManifestSet, Resource};
