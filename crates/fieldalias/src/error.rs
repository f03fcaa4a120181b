// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the registry, the builder and the projectors.

use crate::types::Kind;
use std::fmt;
use std::panic::Location;

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by descriptor construction and field projection.
///
/// Every operation is deterministic and CPU-bound, so none of these is worth
/// retrying. [`Error::is_fatal`] separates caller mistakes from broken
/// `Reflect` impls and internal invariant breaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// The erased aggregate is neither the descriptor's type nor a pointer to it.
    TypeMismatch {
        expected: String,
        found: String,
        /// Call site that asked for the projection.
        location: &'static Location<'static>,
    },
    /// Field or element index outside `[0, len)`.
    OutOfRange {
        type_name: String,
        index: usize,
        len: usize,
    },
    /// Field operation on a type without fields.
    UnsupportedKind { type_name: String, kind: Kind },
    /// Projection through a null pointer.
    NullPointer { type_name: String },
    /// Safe projection through a pointer not derived from a live borrow (a
    /// raw pointer or `NonNull`). Use the `*_unchecked` projections or
    /// [`Erased::from_ptr`](crate::Erased::from_ptr) after checking it.
    UntrustedPointer { type_name: String },

    // ========================================================================
    // Fatal Errors
    // ========================================================================
    /// A `Reflect` impl reported a field that does not fit inside its parent.
    InvalidLayout {
        type_name: String,
        field: String,
        offset: usize,
        size: usize,
        parent_size: usize,
    },
    /// Descriptor construction observed a state that publish-before-recurse rules out.
    RecursionGuardViolation(String),
}

impl Error {
    /// `true` for errors that indicate a broken `Reflect` impl or a bug in
    /// this crate rather than a caller mistake.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidLayout { .. } | Self::RecursionGuardViolation(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                expected,
                found,
                location,
            } => write!(
                f,
                "Type mismatch at {}: cannot project {} with the descriptor of {}",
                location, found, expected
            ),
            Self::OutOfRange {
                type_name,
                index,
                len,
            } => write!(
                f,
                "Index out of range for {}: {} >= {}",
                type_name, index, len
            ),
            Self::UnsupportedKind { type_name, kind } => {
                write!(f, "{} has no fields ({:?} kind)", type_name, kind)
            }
            Self::NullPointer { type_name } => {
                write!(f, "Cannot project through a null {}", type_name)
            }
            Self::UntrustedPointer { type_name } => write!(
                f,
                "Cannot safely project through {}: the pointer is not backed by a borrow",
                type_name
            ),
            Self::InvalidLayout {
                type_name,
                field,
                offset,
                size,
                parent_size,
            } => write!(
                f,
                "Invalid layout for {}.{}: offset {} + size {} exceeds {} bytes",
                type_name, field, offset, size, parent_size
            ),
            Self::RecursionGuardViolation(msg) => {
                write!(f, "Descriptor construction invariant violated: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}
