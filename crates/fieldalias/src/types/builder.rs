// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Turns a [`Shape`] into a published [`TypeDescriptor`].
//!
//! Each identity is claimed with a placeholder before any nested type is
//! resolved, so a type reachable from itself (through a pointer field, a
//! `Vec`, a `Box`...) finds its own placeholder instead of recursing forever.

use crate::config::ELEMENT_FIELD_NAME;
use crate::error::{Error, Result};
use crate::identity::TypeIdentity;
use crate::shape::{Layout, Shape};
use crate::types::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::types::registry::TypeRegistry;

/// Build and publish the descriptor for `identity`, or return the existing one.
pub(crate) fn build(
    registry: &TypeRegistry,
    identity: TypeIdentity,
) -> Result<&'static TypeDescriptor> {
    let shape = identity.shape();
    if registry.config().verify_layouts {
        verify_layout(&shape).inspect_err(|e| {
            log::error!("[TypeBuilder::build] rejected {}: {}", shape.type_name, e);
        })?;
    }

    registry.get_or_create(
        identity,
        || TypeDescriptor::placeholder(identity, &shape),
        |_| field_table(registry, &shape),
    )
}

fn field_table(registry: &TypeRegistry, shape: &Shape) -> Result<Box<[FieldDescriptor]>> {
    match &shape.layout {
        Layout::Opaque => Ok(Box::default()),
        Layout::Struct(fields) => fields
            .iter()
            .map(|field| entry(registry, field.name, field.offset, 0, field.ty))
            .collect(),
        Layout::Array { elem, stride, .. } | Layout::Slice { elem, stride, .. } => {
            let element = entry(registry, ELEMENT_FIELD_NAME, 0, *stride, *elem)?;
            Ok(vec![element].into_boxed_slice())
        }
        Layout::Pointer { target, .. } => {
            let pointee = entry(registry, ELEMENT_FIELD_NAME, 0, 0, *target)?;
            Ok(vec![pointee].into_boxed_slice())
        }
    }
}

fn entry(
    registry: &TypeRegistry,
    name: &'static str,
    offset: usize,
    stride: usize,
    ty: TypeIdentity,
) -> Result<FieldDescriptor> {
    let value = registry.type_from_identity(ty)?;
    let pointer = registry.type_from_identity(ty.pointer())?;
    Ok(FieldDescriptor::new(name, offset, stride, value, pointer))
}

/// Reject shapes whose members do not fit inside the parent.
pub(crate) fn verify_layout(shape: &Shape) -> Result<()> {
    match &shape.layout {
        Layout::Struct(fields) => fields
            .iter()
            .try_for_each(|field| check_span(shape, field.name, field.offset, field.size)),
        Layout::Array { stride, len, .. } => match stride.checked_mul(*len) {
            Some(span) => check_span(shape, ELEMENT_FIELD_NAME, 0, span),
            None => Err(invalid(shape, ELEMENT_FIELD_NAME, 0, usize::MAX)),
        },
        Layout::Opaque | Layout::Slice { .. } | Layout::Pointer { .. } => Ok(()),
    }
}

fn check_span(shape: &Shape, field: &str, offset: usize, size: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= shape.size => Ok(()),
        _ => Err(invalid(shape, field, offset, size)),
    }
}

fn invalid(shape: &Shape, field: &str, offset: usize, size: usize) -> Error {
    Error::InvalidLayout {
        type_name: shape.type_name.to_string(),
        field: field.to_string(),
        offset,
        size,
        parent_size: shape.size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{FieldShape, Reflect};
    use crate::types::Kind;

    #[allow(dead_code)]
    struct Overflowing {
        a: u32,
    }

    // SAFETY: never projected; the builder must reject it first.
    unsafe impl Reflect for Overflowing {
        fn shape() -> Shape {
            Shape::structure::<Self>(vec![FieldShape::of::<u64>("a", 2)])
        }
    }

    #[test]
    fn test_verify_rejects_field_past_parent() {
        let registry = TypeRegistry::new();
        let err = registry.type_of::<Overflowing>().unwrap_err();
        assert!(err.is_fatal());
        match err {
            Error::InvalidLayout {
                field,
                offset,
                size,
                parent_size,
                ..
            } => {
                assert_eq!(field, "a");
                assert_eq!(offset, 2);
                assert_eq!(size, 8);
                assert_eq!(parent_size, 4);
            }
            other => panic!("expected InvalidLayout, got {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_array_gets_single_synthetic_entry() {
        let registry = TypeRegistry::new();
        let desc = registry.type_of::<[u16; 5]>().unwrap();
        assert_eq!(desc.kind(), Kind::Array);
        assert_eq!(desc.field_count(), Some(5));

        let fields = desc.fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), ELEMENT_FIELD_NAME);
        assert_eq!(fields[0].stride(), 2);
        assert_eq!(fields[0].value().identity(), TypeIdentity::of::<u16>());
        assert_eq!(
            fields[0].pointer().identity(),
            TypeIdentity::of::<*mut u16>()
        );
        assert_eq!(desc.field_offset(3).unwrap(), 6);
    }

    #[test]
    fn test_pointer_entry_targets_pointee() {
        let registry = TypeRegistry::new();
        let desc = registry.type_of::<Box<u32>>().unwrap();
        assert_eq!(desc.kind(), Kind::Pointer);
        assert_eq!(desc.field_count(), Some(1));
        assert_eq!(desc.field(0).unwrap().value().type_name(), "u32");
        assert!(desc.field(1).is_err());
    }

    #[test]
    fn test_opaque_has_empty_table() {
        let registry = TypeRegistry::new();
        let desc = registry.type_of::<String>().unwrap();
        assert_eq!(desc.kind(), Kind::Opaque);
        assert!(desc.fields().unwrap().is_empty());
        assert!(matches!(
            desc.field(0),
            Err(Error::UnsupportedKind {
                kind: Kind::Opaque,
                ..
            })
        ));
    }

    #[test]
    fn test_verify_can_be_disabled() {
        let registry =
            TypeRegistry::with_config(crate::RegistryConfig::default().verify_layouts(false));
        let desc = registry.type_of::<Overflowing>().unwrap();
        assert_eq!(desc.field_offset(0).unwrap(), 2);
    }
}
