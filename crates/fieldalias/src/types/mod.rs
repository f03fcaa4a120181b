// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type system for field projection.
//!
//! Provides `TypeDescriptor` for field layout metadata, `TypeRegistry` for
//! caching descriptors for the life of the process, and the builder that
//! turns a type's `Shape` into a descriptor.

mod builder;
pub mod descriptor;
pub mod registry;

pub use descriptor::{FieldDescriptor, Kind, TypeDescriptor};
pub use registry::{RegistryStats, TypeRegistry};
