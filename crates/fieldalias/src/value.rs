// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The erased value container and its safe accessors.

use crate::identity::TypeIdentity;
use crate::raw;
use crate::shape::Reflect;
use std::fmt;
use std::marker::PhantomData;

/// A type-erased view of a value: `{identity token, data pointer}`.
///
/// For ordinary identities the data word points at the value. For pointer
/// identities (the identity of `*mut T`) the data word *is* the pointer, the
/// same representation field-address projections produce.
///
/// An `Erased<'a>` never owns its data: it borrows the aggregate it was
/// created from (or projected out of) for `'a`. Copies and projections alias
/// that memory. Reading is safe; writing needs [`Erased::downcast_mut`] or a
/// raw pointer from [`Erased::downcast_ptr`], and the caller owns the
/// aliasing rules from there.
///
/// A raw pointer erased with [`Erased::of`] (or loaded from a raw-pointer
/// field) is carried but not trusted: safe projections refuse to follow it
/// with [`Error::UntrustedPointer`](crate::Error::UntrustedPointer). Vouch
/// for it with [`Erased::from_ptr`] or use the `*_unchecked` projections.
///
/// Using a projected value as a hash key is allowed but fragile: if the
/// aggregate is mutated afterwards the key's contents change under the
/// container and lookups by either the old or the new value may miss.
#[derive(Clone, Copy)]
pub struct Erased<'a> {
    pub(crate) identity: TypeIdentity,
    pub(crate) data: *mut u8,
    pub(crate) mutable: bool,
    /// The data word may be followed without an `unsafe` promise from the
    /// caller. False only for direct values holding an unchecked pointer.
    pub(crate) trusted: bool,
    pub(crate) _borrow: PhantomData<&'a ()>,
}

impl<'a> Erased<'a> {
    /// Erase a shared reference.
    #[must_use]
    pub fn of<T: Reflect>(value: &'a T) -> Self {
        let (data, identity) = raw::erase(std::ptr::from_ref(value).cast_mut());
        Self {
            identity,
            data,
            mutable: false,
            trusted: !identity.is_direct(),
            _borrow: PhantomData,
        }
    }

    /// Erase a mutable reference; projections inherit write access.
    #[must_use]
    pub fn of_mut<T: Reflect>(value: &'a mut T) -> Self {
        let (data, identity) = raw::erase(std::ptr::from_mut(value));
        Self {
            identity,
            data,
            mutable: true,
            trusted: !identity.is_direct(),
            _borrow: PhantomData,
        }
    }

    /// Erase the address of a value: an aggregate passed "by reference",
    /// carrying the pointer-identity of `T`.
    #[must_use]
    pub fn address_of<T: Reflect>(value: &'a mut T) -> Self {
        Self {
            identity: TypeIdentity::of::<T>().pointer(),
            data: std::ptr::from_mut(value).cast(),
            mutable: true,
            trusted: true,
            _borrow: PhantomData,
        }
    }

    /// Identity token of the erased value.
    #[must_use]
    pub fn identity(&self) -> TypeIdentity {
        self.identity
    }

    /// Type name of the erased value.
    #[must_use]
    pub fn type_name(&self) -> std::borrow::Cow<'static, str> {
        self.identity.type_name()
    }

    /// Whether the erased value has identity `T`.
    #[must_use]
    pub fn is<T: Reflect>(&self) -> bool {
        self.identity == TypeIdentity::of::<T>()
    }

    /// Whether projections may be written through.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Whether safe projections may follow the data word. `false` for raw
    /// pointers erased by value or loaded from a raw-pointer field.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Raw data word.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.data
    }

    /// Shared view of the value if the identity is `T`.
    ///
    /// Always `None` for raw pointer types: their data word is the pointer,
    /// not a place holding one. Use [`Erased::downcast_ptr`] or
    /// [`Erased::get`] instead.
    #[must_use]
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&'a T> {
        let identity = TypeIdentity::of::<T>();
        if identity.is_direct() || self.identity != identity {
            return None;
        }
        Some(raw::value_ref(self))
    }

    /// The pointer carried by a value with the pointer-identity of `T`
    /// (e.g. the result of a field-address projection).
    #[must_use]
    pub fn downcast_ptr<T: Reflect>(&self) -> Option<*mut T> {
        (self.identity == TypeIdentity::of::<T>().pointer()).then(|| self.data.cast::<T>())
    }

    /// Copy of the value if the identity is `T`. Works for pointer types too.
    #[must_use]
    pub fn get<T: Reflect + Copy>(&self) -> Option<T> {
        let identity = TypeIdentity::of::<T>();
        if self.identity != identity {
            return None;
        }
        if identity.is_direct() {
            return Some(raw::pointer_as::<T>(self.data));
        }
        Some(*raw::value_ref::<T>(self))
    }
}

impl fmt::Debug for Erased<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Erased")
            .field("type", &self.identity.type_name())
            .field("data", &self.data)
            .field("mutable", &self.mutable)
            .field("trusted", &self.trusted)
            .finish()
    }
}
