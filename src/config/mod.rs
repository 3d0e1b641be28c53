// src/config/mod.rs

//! Descriptor configuration for procvisor.
//!
//! Responsibilities:
//! - Define the TOML-backed raw data model (`model.rs`).
//! - Load a descriptor file from disk (`loader.rs`).
//! - Turn raw descriptors into typed [`ProcessDescriptor`]s (`validate.rs`).
//!
//! [`ProcessDescriptor`]: crate::descriptor::ProcessDescriptor

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{RawOtherOptions, RawProcessDescriptor, RawProcessFile, RawSubCommand};
pub use validate::validate_file;
