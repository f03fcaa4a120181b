// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime identity tokens.
//!
//! A [`TypeIdentity`] names one concrete type: a base type (by [`TypeId`])
//! wrapped in zero or more raw-pointer levels. Depth 0 is the
//! *value-identity* of a type, depth 1 its *pointer-identity* (the identity
//! of `*mut T`), and so on. Keeping pointer levels as a counter means the
//! pointer-identity of any type exists without instantiating an unbounded
//! chain of `*mut *mut ...` types.

use crate::shape::{Layout, PointerRepr, Reflect, Shape};
use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque, stable token naming a concrete type at runtime.
///
/// Equality and hashing only look at the base [`TypeId`] and the pointer
/// depth; the remaining words are lazily-evaluated metadata hooks.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    base: TypeId,
    depth: u32,
    base_name: fn() -> &'static str,
    base_shape: fn() -> Shape,
}

impl TypeIdentity {
    /// Identity of `T` (`*mut U` and `*const U` map to `U`'s pointer-identity).
    #[must_use]
    pub fn of<T: Reflect>() -> Self {
        T::identity()
    }

    /// Value-identity of a non-pointer type. Used by the default
    /// [`Reflect::identity`]; raw-pointer impls build on top of it.
    #[must_use]
    pub fn base<T: Reflect>() -> Self {
        Self {
            base: TypeId::of::<T>(),
            depth: 0,
            base_name: std::any::type_name::<T>,
            base_shape: T::shape,
        }
    }

    /// Identity of a raw pointer to this type.
    #[must_use]
    pub fn pointer(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    /// Identity of the pointee, if this is a pointer-identity.
    #[must_use]
    pub fn pointee(self) -> Option<Self> {
        (self.depth > 0).then(|| Self {
            depth: self.depth - 1,
            ..self
        })
    }

    /// Number of raw-pointer levels around the base type.
    #[must_use]
    pub fn pointer_depth(&self) -> u32 {
        self.depth
    }

    /// Pointer identities keep the pointer itself in an erased value's data word.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.depth > 0
    }

    /// [`TypeId`] of the innermost non-pointer type.
    #[must_use]
    pub fn base_type_id(&self) -> TypeId {
        self.base
    }

    /// Human-readable type name, e.g. `*mut my_crate::Node`.
    #[must_use]
    pub fn type_name(&self) -> Cow<'static, str> {
        let base = (self.base_name)();
        if self.depth == 0 {
            Cow::Borrowed(base)
        } else {
            Cow::Owned(format!("{}{}", "*mut ".repeat(self.depth as usize), base))
        }
    }

    /// Layout description for this identity. Pointer levels are synthesized.
    pub(crate) fn shape(&self) -> Shape {
        match self.pointee() {
            None => (self.base_shape)(),
            Some(target) => Shape {
                type_name: self.type_name(),
                size: std::mem::size_of::<*mut u8>(),
                align: std::mem::align_of::<*mut u8>(),
                layout: Layout::Pointer {
                    target,
                    repr: PointerRepr::Direct,
                },
            },
        }
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.depth == other.depth
    }
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.base.hash(state);
        self.depth.hash(state);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeIdentity")
            .field(&self.type_name())
            .finish()
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}
