// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fieldalias - zero-allocation field projection
//!
//! Views individual fields of a type-erased aggregate as type-erased values
//! of their own, without copying or boxing them.
//!
//! Binding APIs that take "any value" arguments (`&[&dyn Any]`, variadic
//! parameter lists of a database driver, ...) force each field of each row to
//! be erased separately. In a loop over many rows that is one allocation per
//! field per row. Here the row is erased once, and each field is *projected*:
//! the result is an [`Erased`] whose data pointer points into the row.
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldalias::{Erased, Reflect, Result};
//!
//! #[derive(Reflect)]
//! struct Row {
//!     id: i64,
//!     name: String,
//! }
//!
//! fn main() -> Result<()> {
//!     let rows = vec![
//!         Row { id: 1, name: "ada".into() },
//!         Row { id: 2, name: "grace".into() },
//!     ];
//!
//!     let row = fieldalias::type_of::<Row>()?;
//!     for r in &rows {
//!         let erased = Erased::of(r);
//!         let id = row.project_value(&erased, 0)?;
//!         let name = row.project_value(&erased, 1)?;
//!         assert_eq!(id.as_ptr(), std::ptr::from_ref(&r.id).cast());
//!         assert!(name.downcast_ref::<String>().is_some());
//!     }
//!
//!     // Or every field of every row, into one reusable buffer.
//!     let erased: Vec<Erased<'_>> = rows.iter().map(Erased::of).collect();
//!     let mut args = Vec::new();
//!     fieldalias::append_values(&mut args, &erased)?;
//!     assert_eq!(args.len(), 4);
//!     Ok(())
//! }
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Erased`] | `{identity, data pointer}` view of a borrowed value |
//! | [`TypeIdentity`] | Runtime token naming a concrete type |
//! | [`TypeDescriptor`] | Cached field layout of one type; projects fields |
//! | [`TypeRegistry`] | Builds and caches descriptors, never evicts |
//! | [`Reflect`] | Layout description a type hands to the registry |
//!
//! ## Safety
//!
//! Projections alias the aggregate. See the hazards listed on [`Erased`]:
//! mutating an aggregate while projections of it are used as hash keys, or
//! from another thread, is the caller's problem.

// Allow the derive macro to work inside this crate's tests
extern crate self as fieldalias;

mod batch;
/// Registry configuration and constants.
pub mod config;
mod error;
mod identity;
mod impls;
mod projector;
mod raw;
/// Layout descriptions and the `Reflect` trait.
pub mod shape;
/// Descriptors and the registry.
pub mod types;
mod value;

pub use config::RegistryConfig;
pub use error::{Error, Result};
pub use identity::TypeIdentity;
pub use shape::{FieldShape, Layout, PointerRepr, Reflect, SequenceAccess, Shape};
pub use types::{FieldDescriptor, Kind, RegistryStats, TypeDescriptor, TypeRegistry};
pub use value::Erased;

// Derive macro (for #[derive(fieldalias::Reflect)])
pub use fieldalias_codegen::Reflect;

/// Descriptor of `T` from the global registry.
pub fn type_of<T: Reflect>() -> Result<&'static TypeDescriptor> {
    TypeRegistry::global().type_of::<T>()
}

/// Descriptor of the static type of `sample` from the global registry.
pub fn type_of_val<T: Reflect>(sample: &T) -> Result<&'static TypeDescriptor> {
    TypeRegistry::global().type_of_val(sample)
}

/// Descriptor for an identity token from the global registry.
pub fn type_from_identity(identity: TypeIdentity) -> Result<&'static TypeDescriptor> {
    TypeRegistry::global().type_from_identity(identity)
}

/// [`TypeRegistry::append_values`] on the global registry.
pub fn append_values<'a>(out: &mut Vec<Erased<'a>>, aggregates: &[Erased<'a>]) -> Result<()> {
    TypeRegistry::global().append_values(out, aggregates)
}

/// [`TypeRegistry::append_addresses`] on the global registry.
pub fn append_addresses<'a>(out: &mut Vec<Erased<'a>>, aggregates: &[Erased<'a>]) -> Result<()> {
    TypeRegistry::global().append_addresses(out, aggregates)
}
