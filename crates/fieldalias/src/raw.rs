// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw construction of erased values and all pointer arithmetic.
//!
//! This is the only module containing `unsafe` code. Everything here either
//! fabricates an [`Erased`] from loose parts or reads memory through an
//! address that a projection computed. The rest of the crate goes through
//! the safe API in [`value`](crate::value) and the projectors.
//!
//! # Hazards
//!
//! Erased values alias the aggregate they were projected from. Nothing here
//! copies field data, so:
//!
//! - mutating the aggregate changes what every projection reads, including
//!   projections already stored as keys in hash-based containers (their
//!   cached hash then no longer matches the live value, and lookups by either
//!   the old or the new value can fail);
//! - writing through a projection while another thread reads the aggregate
//!   is a data race;
//! - projecting *through* a raw pointer (field 0 of a `*mut T`, the pointee
//!   of a `NonNull<T>`, or the automatic dereference in batch projection)
//!   needs the pointer to be valid. Safe projections only follow pointers
//!   derived from a borrow ([`Erased::address_of`], `Box`, `Arc`...) or
//!   vouched for with [`Erased::from_ptr`]. The `*_unchecked` projections
//!   follow any non-null pointer, and a dangling one is undefined behavior.

use crate::error::Result;
use crate::identity::TypeIdentity;
use crate::shape::{PointerRepr, Reflect, SequenceAccess};
use crate::types::TypeDescriptor;
use crate::value::Erased;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;

impl<'a> Erased<'a> {
    /// Assemble an erased value from an identity token and a data word.
    ///
    /// # Safety
    ///
    /// - For non-pointer identities `data` must point at a live, properly
    ///   aligned value of that type, valid for reads for `'a` (and for writes
    ///   if `mutable` is set).
    /// - For pointer identities (`identity.is_direct()`) `data` is the
    ///   pointer value itself. It must be null or satisfy the same rules for
    ///   the pointee, since safe projections will follow it.
    #[must_use]
    pub unsafe fn from_raw_parts(identity: TypeIdentity, data: *mut u8, mutable: bool) -> Self {
        Self {
            identity,
            data,
            mutable,
            trusted: true,
            _borrow: PhantomData,
        }
    }

    /// Erase a raw pointer that safe projections may follow.
    ///
    /// The result carries the pointer-identity of `T`, like
    /// [`Erased::address_of`], and is read-only.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point at a live, properly aligned `T` that
    /// stays valid for reads for `'a` and is not mutated through another
    /// path while projections of it are in use.
    #[must_use]
    pub unsafe fn from_ptr<T: Reflect>(ptr: *mut T) -> Self {
        Self {
            identity: TypeIdentity::of::<T>().pointer(),
            data: ptr.cast(),
            mutable: false,
            trusted: true,
            _borrow: PhantomData,
        }
    }

    /// Split into identity token and data word.
    #[must_use]
    pub fn into_raw_parts(self) -> (TypeIdentity, *mut u8) {
        (self.identity, self.data)
    }

    /// Mutable view of the erased value.
    ///
    /// Returns `None` if the value was not created from a mutable borrow, if
    /// the identity differs from `T`, or if `T` is a raw pointer type (use
    /// [`Erased::downcast_ptr`] for those).
    ///
    /// # Safety
    ///
    /// Projections of the same field can coexist; the caller must ensure no
    /// other reference to the same memory is used while the returned
    /// reference is live.
    #[must_use]
    pub unsafe fn downcast_mut<T: Reflect>(&self) -> Option<&'a mut T> {
        let identity = TypeIdentity::of::<T>();
        if !self.mutable || identity.is_direct() || self.identity != identity {
            return None;
        }
        Some(&mut *self.data.cast::<T>())
    }
}

/// Erase the address of a borrowed value. Pointer types are stored directly.
///
/// `value` always comes from a live reference in [`Erased`]'s constructors.
pub(crate) fn erase<T: Reflect>(value: *mut T) -> (*mut u8, TypeIdentity) {
    let identity = TypeIdentity::of::<T>();
    let address = value.cast::<u8>();
    let data = if identity.is_direct() {
        // SAFETY: direct identities are exactly the thin raw pointer types,
        // so `value` holds one pointer word.
        unsafe { read_pointer(address) }
    } else {
        address
    };
    (data, identity)
}

/// Shared view of a non-pointer erased value with a matching identity.
pub(crate) fn value_ref<'a, T: Reflect>(erased: &Erased<'a>) -> &'a T {
    debug_assert!(!erased.identity.is_direct());
    // SAFETY: callers compared identities; safe constructors and projections
    // only produce data words that point at a live `T` for `'a`.
    unsafe { &*erased.data.cast::<T>() }
}

/// Reinterpret a direct data word as the raw pointer type `T`.
pub(crate) fn pointer_as<T: Reflect + Copy>(data: *mut u8) -> T {
    assert!(TypeIdentity::of::<T>().is_direct());
    // SAFETY: direct identities are thin raw pointer types, which share the
    // size and representation of `*mut u8`.
    unsafe { std::mem::transmute_copy::<*mut u8, T>(&data) }
}

/// Copy a pointer word out of memory.
///
/// # Safety
///
/// `address` must point at a readable pointer-sized, pointer-aligned value.
pub(crate) unsafe fn read_pointer(address: *const u8) -> *mut u8 {
    address.cast::<*mut u8>().read()
}

/// Address `offset` bytes past `base`.
///
/// Offsets come from verified shapes and are in bounds of the aggregate
/// (or of the sequence buffer for slices); `wrapping_add` keeps the
/// arithmetic itself free of preconditions.
pub(crate) fn offset(base: *mut u8, offset: usize) -> *mut u8 {
    base.wrapping_add(offset)
}

/// Data pointer and live length of a sequence instance.
pub(crate) fn sequence_parts(access: SequenceAccess, instance: *const u8) -> (*mut u8, usize) {
    // SAFETY: `instance` points at a live value of the sequence type whose
    // `Reflect` impl supplied these hooks.
    unsafe { ((access.data)(instance), (access.len)(instance)) }
}

/// Target address of a pointer-kind value, and whether that target is
/// backed by a borrow.
///
/// `holds_pointer` is true when `data` already is the pointer (a direct
/// erased value) rather than the address of one; `trusted` is the erased
/// value's own flag.
pub(crate) fn pointer_target(
    repr: PointerRepr,
    data: *mut u8,
    holds_pointer: bool,
    trusted: bool,
) -> (*mut u8, bool) {
    match repr {
        PointerRepr::Direct if holds_pointer => (data, trusted),
        // SAFETY: `data` addresses a live raw pointer slot.
        PointerRepr::Direct => (unsafe { read_pointer(data) }, false),
        // SAFETY: `data` addresses a live value of the type owning the hook.
        PointerRepr::Indirect(deref) => (unsafe { deref(data) }, true),
        // SAFETY: as above; only the returned target is unchecked.
        PointerRepr::Unchecked(deref) => (unsafe { deref(data) }, false),
    }
}

/// Load the pointer stored at a field address (value projection of a
/// raw-pointer field).
pub(crate) fn load_direct(address: *mut u8) -> *mut u8 {
    // SAFETY: the field descriptor is a pointer identity, so the field is a
    // thin raw pointer inside a live aggregate.
    unsafe { read_pointer(address) }
}

impl TypeDescriptor {
    /// [`TypeDescriptor::project_value`] that follows raw and `NonNull`
    /// pointers without asking for them to be vouched for.
    ///
    /// # Safety
    ///
    /// Every non-null pointer followed to reach the field must point at a
    /// live, properly aligned value of its pointee type, valid for reads for
    /// `'a`.
    #[track_caller]
    pub unsafe fn project_value_unchecked<'a>(
        &self,
        aggregate: &Erased<'a>,
        index: usize,
    ) -> Result<Erased<'a>> {
        self.project_value_with(aggregate, index, false)
    }

    /// [`TypeDescriptor::project_address`] that follows raw and `NonNull`
    /// pointers without asking for them to be vouched for.
    ///
    /// # Safety
    ///
    /// Same contract as [`TypeDescriptor::project_value_unchecked`].
    #[track_caller]
    pub unsafe fn project_address_unchecked<'a>(
        &self,
        aggregate: &Erased<'a>,
        index: usize,
    ) -> Result<Erased<'a>> {
        self.project_address_with(aggregate, index, false)
    }
}

// ---------------------------------------------------------------------------
// Accessor hooks used by the built-in Reflect impls
// ---------------------------------------------------------------------------

pub(crate) unsafe fn vec_data<T>(instance: *const u8) -> *mut u8 {
    (*instance.cast::<Vec<T>>()).as_ptr().cast_mut().cast()
}

pub(crate) unsafe fn vec_len<T>(instance: *const u8) -> usize {
    (*instance.cast::<Vec<T>>()).len()
}

pub(crate) unsafe fn box_target<T>(instance: *const u8) -> *mut u8 {
    let boxed = &*instance.cast::<Box<T>>();
    std::ptr::addr_of!(**boxed).cast_mut().cast()
}

pub(crate) unsafe fn arc_target<T>(instance: *const u8) -> *mut u8 {
    Arc::as_ptr(&*instance.cast::<Arc<T>>()).cast_mut().cast()
}

pub(crate) unsafe fn rc_target<T>(instance: *const u8) -> *mut u8 {
    Rc::as_ptr(&*instance.cast::<Rc<T>>()).cast_mut().cast()
}

pub(crate) unsafe fn non_null_target<T>(instance: *const u8) -> *mut u8 {
    (*instance.cast::<NonNull<T>>()).as_ptr().cast()
}

pub(crate) unsafe fn ref_target<T: 'static>(instance: *const u8) -> *mut u8 {
    std::ptr::from_ref::<T>(*instance.cast::<&'static T>())
        .cast_mut()
        .cast()
}
