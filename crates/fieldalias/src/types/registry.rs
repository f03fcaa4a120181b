// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent, never-evicting registry of type descriptors.
//!
//! The registry ensures a type's descriptor is built only once per identity.
//! Completed descriptors are served from a sharded `DashMap` without taking
//! any registry-wide lock. First-time builds are serialized by a re-entrant
//! build lock: the building thread may recurse into nested types (and see
//! its own in-progress placeholders), while other threads asking for an
//! in-progress identity wait until it is complete.
//!
//! Descriptors are leaked to `&'static` on creation and never removed
//! (except a placeholder whose build failed), so references handed out stay
//! valid for the life of the process, even across [`TypeRegistry::reset`].

use crate::config::RegistryConfig;
use crate::error::Result;
use crate::identity::TypeIdentity;
use crate::shape::Reflect;
use crate::types::builder;
use crate::types::descriptor::{FieldDescriptor, TypeDescriptor};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Registry hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Queries answered by an existing descriptor.
    pub hits: u64,
    /// Queries that had to build a descriptor.
    pub misses: u64,
    /// Builds that completed and were published.
    pub builds: u64,
    /// Wall time of the most recent build, nested builds included.
    pub last_build_ns: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    last_build_ns: AtomicU64,
}

/// Memoizing map from [`TypeIdentity`] to [`TypeDescriptor`].
pub struct TypeRegistry {
    types: DashMap<TypeIdentity, &'static TypeDescriptor>,
    build_lock: ReentrantMutex<()>,
    stats: Counters,
    config: RegistryConfig,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Independent registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            types: DashMap::with_capacity(config.initial_capacity),
            build_lock: ReentrantMutex::new(()),
            stats: Counters::default(),
            config,
        }
    }

    /// Process-wide registry, created on first use and never torn down.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Descriptor of `T`, building it on first use.
    pub fn type_of<T: Reflect>(&self) -> Result<&'static TypeDescriptor> {
        self.type_from_identity(TypeIdentity::of::<T>())
    }

    /// Descriptor of the static type of `sample`.
    pub fn type_of_val<T: Reflect>(&self, _sample: &T) -> Result<&'static TypeDescriptor> {
        self.type_of::<T>()
    }

    /// Descriptor for an identity token, building it on first use.
    pub fn type_from_identity(&self, identity: TypeIdentity) -> Result<&'static TypeDescriptor> {
        if let Some(found) = self.peek(identity).filter(|found| found.is_complete()) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(found);
        }
        builder::build(self, identity)
    }

    /// Descriptor for an identity if one was published.
    ///
    /// While a descriptor is being built, only the building thread gets the
    /// in-progress placeholder; other threads wait for the build to finish.
    #[must_use]
    pub fn lookup(&self, identity: TypeIdentity) -> Option<&'static TypeDescriptor> {
        let found = self.peek(identity)?;
        if found.is_complete() {
            return Some(found);
        }
        let _guard = self.build_lock.lock();
        self.peek(identity)
    }

    /// Return the published descriptor for `identity`, or publish
    /// `placeholder()` and then fill it with `build`.
    ///
    /// The placeholder is visible to recursive lookups on this thread before
    /// `build` runs, which is what terminates cyclic types. If `build` fails
    /// (or unwinds) the placeholder is withdrawn.
    pub(crate) fn get_or_create<P, B>(
        &self,
        identity: TypeIdentity,
        placeholder: P,
        build: B,
    ) -> Result<&'static TypeDescriptor>
    where
        P: FnOnce() -> TypeDescriptor,
        B: FnOnce(&'static TypeDescriptor) -> Result<Box<[FieldDescriptor]>>,
    {
        let _guard = self.build_lock.lock();

        // Either completed while we waited for the lock, or in progress on
        // this very thread (a recursive reference).
        if let Some(found) = self.peek(identity) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(found);
        }

        let start = Instant::now();
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let descriptor = match self.types.entry(identity) {
            Entry::Occupied(winner) => {
                log::warn!(
                    "[TypeRegistry::get_or_create] lost publish race for {}, using winner",
                    identity
                );
                return Ok(*winner.get());
            }
            Entry::Vacant(slot) => {
                let descriptor: &'static TypeDescriptor = Box::leak(Box::new(placeholder()));
                slot.insert(descriptor);
                descriptor
            }
        };

        let pending = Pending {
            registry: self,
            identity,
            armed: true,
        };
        let table = build(descriptor)?;
        descriptor.publish(table)?;
        pending.disarm();

        let elapsed = start.elapsed().as_nanos() as u64;
        self.stats.builds.fetch_add(1, Ordering::Relaxed);
        self.stats.last_build_ns.store(elapsed, Ordering::Relaxed);
        log::debug!(
            "[TypeRegistry::get_or_create] built {} ({:?}, {} entries) in {} ns",
            descriptor.type_name(),
            descriptor.kind(),
            descriptor.fields().map_or(0, <[_]>::len),
            elapsed
        );
        Ok(descriptor)
    }

    /// Forget every descriptor.
    ///
    /// Descriptors already handed out stay valid, but later queries build
    /// fresh ones, so identity comparisons across a reset do not hold. Meant
    /// for test isolation.
    pub fn reset(&self) {
        let _guard = self.build_lock.lock();
        self.types.clear();
        self.stats.hits.store(0, Ordering::Relaxed);
        self.stats.misses.store(0, Ordering::Relaxed);
        self.stats.builds.store(0, Ordering::Relaxed);
        self.stats.last_build_ns.store(0, Ordering::Relaxed);
    }

    /// Number of published descriptors (in-progress ones included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            builds: self.stats.builds.load(Ordering::Relaxed),
            last_build_ns: self.stats.last_build_ns.load(Ordering::Relaxed),
        }
    }

    fn peek(&self, identity: TypeIdentity) -> Option<&'static TypeDescriptor> {
        self.types.get(&identity).map(|entry| *entry.value())
    }
}

/// Withdraws a placeholder whose build did not complete.
struct Pending<'r> {
    registry: &'r TypeRegistry,
    identity: TypeIdentity,
    armed: bool,
}

impl Pending<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::error!(
                "[TypeRegistry::get_or_create] build of {} failed, withdrawing placeholder",
                self.identity
            );
            self.registry.types.remove(&self.identity);
        }
    }
}
