// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static layout descriptions handed to the descriptor builder.
//!
//! A [`Shape`] is what a type knows about itself at compile time: its size,
//! its kind, and the identities and offsets of whatever it contains. The
//! registry turns shapes into cached [`TypeDescriptor`](crate::TypeDescriptor)s.
//! Nested types are referenced by [`TypeIdentity`], never by value, so
//! self-referential types produce finite shapes.

use crate::identity::TypeIdentity;
use std::borrow::Cow;
use std::mem;

/// Types whose layout can be described to the registry.
///
/// Implement it with `#[derive(Reflect)]` for structs, or with
/// [`reflect_opaque!`](crate::reflect_opaque) for leaf types.
///
/// # Safety
///
/// Projections trust the returned [`Shape`] blindly: every offset, stride,
/// length and accessor hook must describe the real memory layout of `Self`.
/// A wrong shape makes field projection read or write out of bounds.
pub unsafe trait Reflect: Sized + 'static {
    /// Describe the layout of `Self`.
    fn shape() -> Shape;

    /// Identity token of `Self`. Only raw-pointer impls override this.
    fn identity() -> TypeIdentity {
        TypeIdentity::base::<Self>()
    }
}

/// Reads the data pointer of a sequence instance.
pub type SequenceDataFn = unsafe fn(*const u8) -> *mut u8;
/// Reads the live element count of a sequence instance.
pub type SequenceLenFn = unsafe fn(*const u8) -> usize;
/// Reads the target address out of a pointer-like instance.
pub type DerefFn = unsafe fn(*const u8) -> *mut u8;

/// Hooks reading a growable sequence's header at projection time.
#[derive(Clone, Copy)]
pub struct SequenceAccess {
    /// Address of element 0.
    ///
    /// # Safety
    ///
    /// Called with the address of a live instance of the sequence type. Must
    /// return a pointer valid for reads of `len` elements while the instance
    /// is borrowed (any non-null aligned pointer when `len` is 0).
    pub data: SequenceDataFn,
    /// Current element count.
    ///
    /// # Safety
    ///
    /// Called with the address of a live instance of the sequence type. Must
    /// return the number of initialized elements behind `data`.
    pub len: SequenceLenFn,
}

/// How a pointer-kind type stores its target.
#[derive(Clone, Copy)]
pub enum PointerRepr {
    /// A raw pointer: erased values of this type carry the pointer itself.
    Direct,
    /// A smart pointer or reference: the target is read through the hook and
    /// lives at least as long as the pointer instance is borrowed.
    Indirect(DerefFn),
    /// A non-owning pointer (`NonNull<T>`): the target is read through the
    /// hook but nothing ties its lifetime to the instance, so safe
    /// projections refuse to follow it.
    Unchecked(DerefFn),
}

/// One declared struct member.
#[derive(Clone, Debug)]
pub struct FieldShape {
    /// Member name; the decimal index for tuple fields.
    pub name: &'static str,
    /// Byte offset from the start of the parent.
    pub offset: usize,
    /// `size_of` the member type.
    pub size: usize,
    /// Identity of the member type.
    pub ty: TypeIdentity,
}

impl FieldShape {
    /// Member of type `F` at `offset` bytes.
    #[must_use]
    pub fn of<F: Reflect>(name: &'static str, offset: usize) -> Self {
        Self {
            name,
            offset,
            size: mem::size_of::<F>(),
            ty: TypeIdentity::of::<F>(),
        }
    }
}

/// Layout variants understood by the builder.
#[derive(Clone)]
pub enum Layout {
    /// Leaf type: no fields.
    Opaque,
    /// Declared fields in declaration order.
    Struct(Vec<FieldShape>),
    /// `len` elements of `elem` laid out every `stride` bytes.
    Array {
        elem: TypeIdentity,
        stride: usize,
        len: usize,
    },
    /// Heap elements of `elem`; data pointer and length live in the instance.
    Slice {
        elem: TypeIdentity,
        stride: usize,
        access: SequenceAccess,
    },
    /// A single pointee.
    Pointer {
        target: TypeIdentity,
        repr: PointerRepr,
    },
}

/// Compile-time layout of one type.
#[derive(Clone)]
pub struct Shape {
    /// Name reported in errors and logs.
    pub type_name: Cow<'static, str>,
    /// `size_of` the type; members must fit inside it.
    pub size: usize,
    /// `align_of` the type.
    pub align: usize,
    /// Kind-specific contents.
    pub layout: Layout,
}

impl Shape {
    fn new<T>(layout: Layout) -> Self {
        Self {
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            layout,
        }
    }

    /// Leaf type without introspectable fields.
    #[must_use]
    pub fn opaque<T>() -> Self {
        Self::new::<T>(Layout::Opaque)
    }

    /// Struct with the given members (declaration order).
    #[must_use]
    pub fn structure<T>(fields: Vec<FieldShape>) -> Self {
        Self::new::<T>(Layout::Struct(fields))
    }

    /// Fixed-length array of `E`.
    #[must_use]
    pub fn array<T, E: Reflect>(len: usize) -> Self {
        Self::new::<T>(Layout::Array {
            elem: TypeIdentity::of::<E>(),
            stride: mem::size_of::<E>(),
            len,
        })
    }

    /// Growable sequence of `E`.
    #[must_use]
    pub fn slice<T, E: Reflect>(access: SequenceAccess) -> Self {
        Self::new::<T>(Layout::Slice {
            elem: TypeIdentity::of::<E>(),
            stride: mem::size_of::<E>(),
            access,
        })
    }

    /// Smart pointer or reference to `P`.
    #[must_use]
    pub fn pointer<T, P: Reflect>(deref: DerefFn) -> Self {
        Self::new::<T>(Layout::Pointer {
            target: TypeIdentity::of::<P>(),
            repr: PointerRepr::Indirect(deref),
        })
    }

    /// Non-owning pointer to `P` whose target may dangle.
    #[must_use]
    pub fn unchecked_pointer<T, P: Reflect>(deref: DerefFn) -> Self {
        Self::new::<T>(Layout::Pointer {
            target: TypeIdentity::of::<P>(),
            repr: PointerRepr::Unchecked(deref),
        })
    }
}
