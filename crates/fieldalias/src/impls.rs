// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in [`Reflect`] impls for std types.

use crate::identity::TypeIdentity;
use crate::raw;
use crate::shape::{FieldShape, Reflect, SequenceAccess, Shape};
use std::mem::offset_of;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

/// Implement [`Reflect`] for leaf types that expose no fields.
///
/// ```
/// struct Uuid([u8; 16]);
/// struct Money(i64);
/// fieldalias::reflect_opaque!(Uuid, Money);
///
/// let desc = fieldalias::type_of::<Uuid>().unwrap();
/// assert_eq!(desc.kind(), fieldalias::Kind::Opaque);
/// ```
#[macro_export]
macro_rules! reflect_opaque {
    ($($ty:ty),+ $(,)?) => {
        $(
            // SAFETY: an opaque shape exposes no offsets or accessor hooks.
            unsafe impl $crate::Reflect for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::opaque::<Self>()
                }
            }
        )+
    };
}

reflect_opaque!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, (),
    String, &'static str, Duration,
);

// Option's layout is unspecified for arbitrary payloads, so it stays a leaf.
unsafe impl<T: Reflect> Reflect for Option<T> {
    fn shape() -> Shape {
        Shape::opaque::<Self>()
    }
}

unsafe impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn shape() -> Shape {
        Shape::array::<Self, T>(N)
    }
}

unsafe impl<T: Reflect> Reflect for Vec<T> {
    fn shape() -> Shape {
        Shape::slice::<Self, T>(SequenceAccess {
            data: raw::vec_data::<T>,
            len: raw::vec_len::<T>,
        })
    }
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

// Raw pointers are pointer identities of their pointee; `*const T` and
// `*mut T` are one identity.
unsafe impl<T: Reflect> Reflect for *mut T {
    fn shape() -> Shape {
        Self::identity().shape()
    }

    fn identity() -> TypeIdentity {
        T::identity().pointer()
    }
}

unsafe impl<T: Reflect> Reflect for *const T {
    fn shape() -> Shape {
        Self::identity().shape()
    }

    fn identity() -> TypeIdentity {
        T::identity().pointer()
    }
}

unsafe impl<T: Reflect> Reflect for Box<T> {
    fn shape() -> Shape {
        Shape::pointer::<Self, T>(raw::box_target::<T>)
    }
}

unsafe impl<T: Reflect> Reflect for Arc<T> {
    fn shape() -> Shape {
        Shape::pointer::<Self, T>(raw::arc_target::<T>)
    }
}

unsafe impl<T: Reflect> Reflect for Rc<T> {
    fn shape() -> Shape {
        Shape::pointer::<Self, T>(raw::rc_target::<T>)
    }
}

unsafe impl<T: Reflect> Reflect for NonNull<T> {
    fn shape() -> Shape {
        Shape::unchecked_pointer::<Self, T>(raw::non_null_target::<T>)
    }
}

unsafe impl<T: Reflect> Reflect for &'static T {
    fn shape() -> Shape {
        Shape::pointer::<Self, T>(raw::ref_target::<T>)
    }
}

// ---------------------------------------------------------------------------
// Tuples
// ---------------------------------------------------------------------------

macro_rules! reflect_tuple {
    ($($name:ident : $idx:tt),+) => {
        unsafe impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn shape() -> Shape {
                Shape::structure::<Self>(vec![
                    $(FieldShape::of::<$name>(stringify!($idx), offset_of!(Self, $idx)),)+
                ])
            }
        }
    };
}

reflect_tuple!(A: 0);
reflect_tuple!(A: 0, B: 1);
reflect_tuple!(A: 0, B: 1, C: 2);
reflect_tuple!(A: 0, B: 1, C: 2, D: 3);
reflect_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
reflect_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
