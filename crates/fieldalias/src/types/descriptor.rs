// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cached type descriptors: kind, size, identities and field table.
//!
//! A `TypeDescriptor` is published to the registry before its field table
//! exists (so recursive types can refer to it), and the table is set exactly
//! once afterwards. Nested descriptors are `&'static` references into the
//! registry, which never evicts.

use crate::error::{Error, Result};
use crate::identity::TypeIdentity;
use crate::shape::{Layout, PointerRepr, SequenceAccess, Shape};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

/// Type kind classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Declared fields at fixed offsets.
    Struct,
    /// Fixed-length inline elements.
    Array,
    /// Growable sequence; length read from each instance.
    Slice,
    /// Single pointee at offset 0.
    Pointer,
    /// Leaf without fields.
    Opaque,
}

/// How projections reach the memory fields are offset from.
#[derive(Clone, Copy)]
pub(crate) enum Access {
    /// Fields live inline at the value's address.
    Inline,
    /// Elements live behind the sequence's data pointer.
    Sequence(SequenceAccess),
    /// The single entry is the pointee.
    Deref(PointerRepr),
}

/// One field-table entry: a declared struct field, or the synthetic element
/// entry of an array, slice or pointer.
pub struct FieldDescriptor {
    name: &'static str,
    offset: usize,
    stride: usize,
    value: &'static TypeDescriptor,
    pointer: &'static TypeDescriptor,
}

impl FieldDescriptor {
    pub(crate) fn new(
        name: &'static str,
        offset: usize,
        stride: usize,
        value: &'static TypeDescriptor,
        pointer: &'static TypeDescriptor,
    ) -> Self {
        Self {
            name,
            offset,
            stride,
            value,
            pointer,
        }
    }

    /// Declared name (`"elem"` for synthetic entries).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Byte offset inside the parent (0 for synthetic entries).
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Element stride for array and slice entries, 0 otherwise.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Descriptor of the field's own type.
    #[must_use]
    pub fn value(&self) -> &'static TypeDescriptor {
        self.value
    }

    /// Descriptor of a raw pointer to the field's type.
    #[must_use]
    pub fn pointer(&self) -> &'static TypeDescriptor {
        self.pointer
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Nested descriptors are printed by name only: types may be cyclic.
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .field("value", &self.value.type_name())
            .field("pointer", &self.pointer.type_name())
            .finish()
    }
}

/// Cached metadata for one concrete type.
pub struct TypeDescriptor {
    identity: TypeIdentity,
    type_name: Cow<'static, str>,
    kind: Kind,
    size: usize,
    align: usize,
    /// Struct: declared fields. Array: element count. Pointer: 1.
    /// Slice and Opaque: 0 (slice length is per instance).
    len: usize,
    pub(crate) access: Access,
    fields: OnceLock<Box<[FieldDescriptor]>>,
}

impl TypeDescriptor {
    /// Descriptor with an empty field table, ready to be published.
    pub(crate) fn placeholder(identity: TypeIdentity, shape: &Shape) -> Self {
        let (kind, len, access) = match &shape.layout {
            Layout::Opaque => (Kind::Opaque, 0, Access::Inline),
            Layout::Struct(fields) => (Kind::Struct, fields.len(), Access::Inline),
            Layout::Array { len, .. } => (Kind::Array, *len, Access::Inline),
            Layout::Slice { access, .. } => (Kind::Slice, 0, Access::Sequence(*access)),
            Layout::Pointer { repr, .. } => (Kind::Pointer, 1, Access::Deref(*repr)),
        };
        Self {
            identity,
            type_name: shape.type_name.clone(),
            kind,
            size: shape.size,
            align: shape.align,
            len,
            access,
            fields: OnceLock::new(),
        }
    }

    /// Install the field table. Fails if one was already installed.
    pub(crate) fn publish(&self, table: Box<[FieldDescriptor]>) -> Result<()> {
        self.fields.set(table).map_err(|_| {
            Error::RecursionGuardViolation(format!(
                "field table of {} was published twice",
                self.type_name
            ))
        })
    }

    /// Whether the field table has been installed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fields.get().is_some()
    }

    /// Value-identity of the described type.
    #[must_use]
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Identity of a raw pointer to the described type.
    #[must_use]
    pub fn pointer_identity(&self) -> TypeIdentity {
        self.identity.pointer()
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn align(&self) -> usize {
        self.align
    }

    /// Whether erased values of this type carry the pointer in their data word.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.identity.is_direct()
    }

    /// Number of fields (Struct), elements (Array) or pointees (Pointer).
    ///
    /// `None` for slices, whose length belongs to each instance; see
    /// [`TypeDescriptor::len_of`]. `Some(0)` for opaque types.
    #[must_use]
    pub fn field_count(&self) -> Option<usize> {
        match self.kind {
            Kind::Slice => None,
            _ => Some(self.len),
        }
    }

    /// The field table: one entry per struct field, one synthetic entry for
    /// arrays, slices and pointers, none for opaque types.
    pub fn fields(&self) -> Result<&[FieldDescriptor]> {
        self.fields.get().map(|table| &**table).ok_or_else(|| {
            Error::RecursionGuardViolation(format!(
                "field table of {} read before it was built",
                self.type_name
            ))
        })
    }

    /// Field-table entry describing field or element `index`.
    ///
    /// Struct and array indexes are bounds-checked here; slice indexes can
    /// only be checked against an instance and are accepted as is.
    pub fn field(&self, index: usize) -> Result<&FieldDescriptor> {
        let fields = self.fields()?;
        match self.kind {
            Kind::Opaque => Err(self.unsupported()),
            Kind::Struct => fields.get(index).ok_or_else(|| self.out_of_range(index, self.len)),
            Kind::Array | Kind::Pointer if index >= self.len => {
                Err(self.out_of_range(index, self.len))
            }
            Kind::Array | Kind::Pointer | Kind::Slice => {
                fields.first().ok_or_else(|| self.missing_entry())
            }
        }
    }

    /// Byte offset of field or element `index` from the projection base.
    pub fn field_offset(&self, index: usize) -> Result<usize> {
        let entry = self.field(index)?;
        self.offset_in(entry, index)
    }

    /// Slice indexes are unbounded here, so the element offset is
    /// overflow-checked; no instance can hold more than `usize::MAX / stride`
    /// elements.
    pub(crate) fn offset_in(&self, entry: &FieldDescriptor, index: usize) -> Result<usize> {
        match self.kind {
            Kind::Array | Kind::Slice => index.checked_mul(entry.stride).ok_or_else(|| {
                self.out_of_range(index, usize::MAX / entry.stride.max(1))
            }),
            _ => Ok(entry.offset),
        }
    }

    pub(crate) fn unsupported(&self) -> Error {
        Error::UnsupportedKind {
            type_name: self.type_name.to_string(),
            kind: self.kind,
        }
    }

    pub(crate) fn out_of_range(&self, index: usize, len: usize) -> Error {
        Error::OutOfRange {
            type_name: self.type_name.to_string(),
            index,
            len,
        }
    }

    pub(crate) fn missing_entry(&self) -> Error {
        Error::RecursionGuardViolation(format!(
            "{} has no synthetic element entry",
            self.type_name
        ))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("align", &self.align)
            .field("len", &self.len)
            .field("fields", &self.fields.get())
            .finish()
    }
}
