#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`SbomGeneratorError`)
//! - [`config`]: Generator configuration (`SbomGeneratorConfig`, builder)
//! - [`types`]: Domain types (`PackageKey`, `PackageRecord`, `RequirementRef`, `Origin`, `ResolveMode`, `RootProject`)
//! - [`source`]: Metadata sources (`MetadataSource` trait, `IntrospectionReader`, `FreezeReader`, `ManifestReader`)
//! - [`catalog`]: First-wins catalog merge
//! - [`resolver`]: Direct / transitive dependency resolution
//! - [`sbom`]: CycloneDX 1.5 document assembly (`SbomAssembler`, `Clock`, `IdGenerator`)
//! - [`generator`]: Main orchestrator (`SbomGenerator`, `SbomGeneratorBuilder`)
//!
//! # Architecture
//!
//! ```text
//! site-packages --> IntrospectionReader --+
//! pip freeze -----> FreezeReader ---------+--> merge --> Catalog --> resolve --> DependencyMap
//! pyproject.toml -> ManifestReader -------+                 |                         |
//!                                                           +------> SbomAssembler <--+
//!                                                                          |
//!                                                                    SbomDocument
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod resolver;
pub mod sbom;
pub mod source;
pub mod types;

// --- Public API Re-exports ---

// Generator (main orchestrator)
pub use generator::{GenerationReport, SbomGenerator, SbomGeneratorBuilder};

// Configuration
pub use config::{SbomGeneratorConfig, SbomGeneratorConfigBuilder};

// Error
pub use error::SbomGeneratorError;

// Types
pub use types::{
    Catalog, DependencyMap, Origin, PackageKey, PackageRecord, PartialCatalog, RequirementRef,
    ResolveMode, RootProject, normalize,
};

// Sources
pub use source::{
    FreezeReader, IntrospectionReader, ManifestReader, MetadataSource, discover_site_packages,
    parse_freeze_output, parse_requirement,
};

// Catalog & resolution
pub use catalog::merge;
pub use resolver::resolve;

// SBOM document
pub use sbom::{
    Clock, FixedClock, FixedIdGenerator, IdGenerator, SbomAssembler, SbomDocument, SystemClock,
    UuidV4Generator,
};
