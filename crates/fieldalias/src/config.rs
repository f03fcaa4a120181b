// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry configuration.
//!
//! - **Static**: compile-time constants shared by the builder and registry.
//! - **Per instance**: [`RegistryConfig`], passed to
//!   [`TypeRegistry::with_config`](crate::TypeRegistry::with_config).
//!
//! ```
//! use fieldalias::{RegistryConfig, TypeRegistry};
//!
//! let registry = TypeRegistry::with_config(
//!     RegistryConfig::default()
//!         .initial_capacity(256)
//!         .verify_layouts(true),
//! );
//! assert!(registry.is_empty());
//! ```

/// Descriptor slots reserved up front by a new registry.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 64;

/// Name of the synthetic entry of arrays, slices and pointers.
pub const ELEMENT_FIELD_NAME: &str = "elem";

/// Tunables for one [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Descriptor slots reserved at construction.
    pub initial_capacity: usize,
    /// Reject shapes whose fields do not fit inside their parent.
    pub verify_layouts: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_REGISTRY_CAPACITY,
            verify_layouts: true,
        }
    }
}

impl RegistryConfig {
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    #[must_use]
    pub fn verify_layouts(mut self, enabled: bool) -> Self {
        self.verify_layouts = enabled;
        self
    }
}
