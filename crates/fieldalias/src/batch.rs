// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batch projection: every field of every aggregate into one output vector.
//!
//! Intended for binding many rows through a uniform erased interface in a
//! tight loop: the output vector is reused across calls and each row costs
//! one registry lookup plus one projection per field, with no allocation
//! once the vector has grown.

use crate::error::Result;
use crate::types::{Kind, TypeDescriptor, TypeRegistry};
use crate::value::Erased;

impl TypeRegistry {
    /// Append the value projection of every field or element of each
    /// aggregate, in order.
    ///
    /// Pointer-kind aggregates (`Box<T>`, `*mut T`, ...) are dereferenced
    /// once and their pointee is enumerated. Raw pointers must come from
    /// [`Erased::from_ptr`]; unchecked ones fail with
    /// [`Error::UntrustedPointer`](crate::Error::UntrustedPointer). On error
    /// `out` is left as it was.
    pub fn append_values<'a>(
        &self,
        out: &mut Vec<Erased<'a>>,
        aggregates: &[Erased<'a>],
    ) -> Result<()> {
        self.append_all(out, aggregates, TypeDescriptor::project_value)
    }

    /// Same as [`TypeRegistry::append_values`], appending field addresses
    /// (pointer-identities) instead.
    pub fn append_addresses<'a>(
        &self,
        out: &mut Vec<Erased<'a>>,
        aggregates: &[Erased<'a>],
    ) -> Result<()> {
        self.append_all(out, aggregates, TypeDescriptor::project_address)
    }

    fn append_all<'a, F>(
        &self,
        out: &mut Vec<Erased<'a>>,
        aggregates: &[Erased<'a>],
        project: F,
    ) -> Result<()>
    where
        F: Fn(&TypeDescriptor, &Erased<'a>, usize) -> Result<Erased<'a>>,
    {
        let start = out.len();
        let result = aggregates
            .iter()
            .try_for_each(|aggregate| self.append_one(out, aggregate, &project));
        if result.is_err() {
            out.truncate(start);
        }
        result
    }

    fn append_one<'a, F>(
        &self,
        out: &mut Vec<Erased<'a>>,
        aggregate: &Erased<'a>,
        project: &F,
    ) -> Result<()>
    where
        F: Fn(&TypeDescriptor, &Erased<'a>, usize) -> Result<Erased<'a>>,
    {
        let mut desc = self.type_from_identity(aggregate.identity())?;
        let mut aggregate = *aggregate;
        if desc.kind() == Kind::Pointer {
            aggregate = desc.project_value(&aggregate, 0)?;
            desc = desc.field(0)?.value();
        }

        let count = desc.len_of(&aggregate)?;
        out.reserve(count);
        for index in 0..count {
            out.push(project(desc, &aggregate, index)?);
        }
        Ok(())
    }
}
