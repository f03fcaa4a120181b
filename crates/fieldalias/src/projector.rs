// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field projection: erased views of one field or element of an erased
//! aggregate, aliasing the aggregate's memory.
//!
//! A projection never copies the field. It computes the field's address from
//! the aggregate's base address and the descriptor's offsets and pairs it
//! with the field's identity token. The aggregate may be passed by value
//! (`Erased::of(&row)`) or by address (`Erased::address_of(&mut row)`, i.e.
//! with the pointer-identity of the descriptor's type); both project the same
//! fields.
//!
//! ```
//! use fieldalias::{Erased, Reflect};
//!
//! #[derive(Reflect)]
//! struct Row {
//!     id: u64,
//!     score: f32,
//! }
//!
//! let mut row = Row { id: 7, score: 0.5 };
//! let desc = fieldalias::type_of::<Row>().unwrap();
//!
//! let id = desc.project_value(&Erased::of(&row), 0).unwrap();
//! assert_eq!(id.get::<u64>(), Some(7));
//!
//! let score = desc.project_address(&Erased::address_of(&mut row), 1).unwrap();
//! let score = score.downcast_ptr::<f32>().unwrap();
//! unsafe { *score = 2.0 };
//! assert_eq!(row.score, 2.0);
//! ```

use crate::error::{Error, Result};
use crate::raw;
use crate::types::descriptor::Access;
use crate::types::{FieldDescriptor, Kind, TypeDescriptor};
use crate::value::Erased;
use std::marker::PhantomData;
use std::panic::Location;

impl TypeDescriptor {
    /// Erased view of field or element `index`, with the field's
    /// value-identity.
    ///
    /// Raw-pointer fields come back direct: the data word is the pointer
    /// stored in the field, not the field's address. Such values are not
    /// trusted, so projecting through them again needs
    /// [`TypeDescriptor::project_value_unchecked`].
    #[track_caller]
    pub fn project_value<'a>(&self, aggregate: &Erased<'a>, index: usize) -> Result<Erased<'a>> {
        self.project_value_with(aggregate, index, true)
    }

    /// Pointer to field or element `index`, with the field's
    /// pointer-identity. Writing through it changes the aggregate.
    #[track_caller]
    pub fn project_address<'a>(
        &self,
        aggregate: &Erased<'a>,
        index: usize,
    ) -> Result<Erased<'a>> {
        self.project_address_with(aggregate, index, true)
    }

    /// Number of projectable fields or elements of this instance.
    ///
    /// Fixed for structs and arrays, 1 for pointers, the live length for
    /// slices.
    #[track_caller]
    pub fn len_of(&self, aggregate: &Erased<'_>) -> Result<usize> {
        self.base_of(aggregate, true).map(|(_, len)| len)
    }

    #[track_caller]
    pub(crate) fn project_value_with<'a>(
        &self,
        aggregate: &Erased<'a>,
        index: usize,
        checked: bool,
    ) -> Result<Erased<'a>> {
        let (entry, address) = self.locate(aggregate, index, checked)?;
        let value = entry.value();
        if value.is_direct() {
            // The loaded pointer is whatever the field holds.
            return Ok(projected(value, raw::load_direct(address), aggregate, false));
        }
        Ok(projected(value, address, aggregate, true))
    }

    #[track_caller]
    pub(crate) fn project_address_with<'a>(
        &self,
        aggregate: &Erased<'a>,
        index: usize,
        checked: bool,
    ) -> Result<Erased<'a>> {
        let (entry, address) = self.locate(aggregate, index, checked)?;
        Ok(projected(entry.pointer(), address, aggregate, true))
    }

    #[track_caller]
    fn locate(
        &self,
        aggregate: &Erased<'_>,
        index: usize,
        checked: bool,
    ) -> Result<(&FieldDescriptor, *mut u8)> {
        let (base, len) = self.base_of(aggregate, checked)?;
        if index >= len {
            return Err(self.out_of_range(index, len));
        }
        let entry = self.field(index)?;
        Ok((entry, raw::offset(base, self.offset_in(entry, index)?)))
    }

    /// Base address fields are offset from, and the field count.
    ///
    /// With `checked` set, pointers that are not backed by a borrow are
    /// refused before anything is read through them.
    #[track_caller]
    fn base_of(&self, aggregate: &Erased<'_>, checked: bool) -> Result<(*mut u8, usize)> {
        let via_pointer = if aggregate.identity == self.identity() {
            false
        } else if aggregate.identity == self.pointer_identity() {
            true
        } else {
            return Err(Error::TypeMismatch {
                expected: self.type_name().to_string(),
                found: aggregate.type_name().into_owned(),
                location: Location::caller(),
            });
        };
        if via_pointer && aggregate.data.is_null() {
            return Err(Error::NullPointer {
                type_name: aggregate.type_name().into_owned(),
            });
        }
        if checked && via_pointer && !aggregate.trusted {
            return Err(untrusted(aggregate.type_name().into_owned()));
        }

        match (self.kind(), self.access) {
            (Kind::Opaque, _) => Err(self.unsupported()),
            (_, Access::Sequence(access)) => Ok(raw::sequence_parts(access, aggregate.data)),
            (_, Access::Deref(repr)) => {
                let holds_pointer = self.is_direct() && !via_pointer;
                let (target, trusted) =
                    raw::pointer_target(repr, aggregate.data, holds_pointer, aggregate.trusted);
                if target.is_null() {
                    return Err(Error::NullPointer {
                        type_name: self.type_name().to_string(),
                    });
                }
                if checked && !trusted {
                    return Err(untrusted(self.type_name().to_string()));
                }
                Ok((target, 1))
            }
            (_, Access::Inline) => Ok((aggregate.data, self.field_count().unwrap_or(0))),
        }
    }
}

fn untrusted(type_name: String) -> Error {
    log::debug!("[project] refused to follow unchecked {}", type_name);
    Error::UntrustedPointer { type_name }
}

fn projected<'a>(
    desc: &TypeDescriptor,
    data: *mut u8,
    parent: &Erased<'a>,
    trusted: bool,
) -> Erased<'a> {
    Erased {
        identity: desc.identity(),
        data,
        mutable: parent.mutable,
        trusted,
        _borrow: PhantomData,
    }
}

#[cfg(test)]
mod tests;
