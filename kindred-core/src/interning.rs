//! Hash-consing registry for canonical instances.
//!
//! An [`Interner`] maps a canonicalization key, computed from constructor
//! arguments, to a single shared instance. Two `get` calls with arguments
//! that reduce to the same key return handles to the same object, so identity
//! comparisons on [`Interned`] handles stand in for deep structural ones.
//!
//! The only way to obtain an [`Interned`] value is through [`Interner::get`];
//! the handle type has no public constructor.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{KindError, KindResult};

/// Source of process-unique ids, shared by every interner.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// A type whose instances are created exclusively through an [`Interner`].
pub trait Internable: Send + Sync + Sized + 'static {
    /// Constructor arguments.
    type Args;
    /// Comparable reduction of the arguments. Arguments that differ only in
    /// fields left out of the key share one instance (the first one built).
    type Key: Eq + Hash + Clone + Send + Sync + 'static;

    /// Reduces constructor arguments to the interning key.
    fn intern_key(args: &Self::Args) -> Self::Key;

    /// Builds a fresh instance. Called at most once per key and epoch.
    fn init(args: Self::Args) -> KindResult<Self>;
}

struct Slot<T> {
    id: u64,
    interner: u64,
    epoch: u64,
    value: T,
}

/// Shared handle to a canonical instance.
///
/// Equality and hashing use the interned identity, never the contents.
pub struct Interned<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Interned<T> {
    /// Process-unique id of this instance. Ids grow with creation order.
    #[inline]
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    /// Epoch of the interner at the time this instance was created.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.slot.epoch
    }

    /// Returns `true` if both handles point at the same instance.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.slot, &b.slot)
    }
}

impl<T> Clone for Interned<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Deref for Interned<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.slot.value
    }
}

impl<T> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for Interned<T> {}

impl<T> Hash for Interned<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.id.hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interned")
            .field("id", &self.slot.id)
            .field("epoch", &self.slot.epoch)
            .field("value", &self.slot.value)
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.slot.value.fmt(f)
    }
}

/// Thread-safe interning table for one [`Internable`] type.
pub struct Interner<T: Internable> {
    id: u64,
    epoch: AtomicU64,
    cache: RwLock<HashMap<T::Key, Interned<T>>>,
}

impl<T: Internable> Default for Interner<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Internable> Interner<T> {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            id: next_id(),
            epoch: AtomicU64::new(0),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the canonical instance for `args`, creating it on first use.
    ///
    /// The lookup-or-insert sequence runs under the write lock, so two threads
    /// racing on the same key always observe the same instance.
    pub fn get(&self, args: T::Args) -> KindResult<Interned<T>> {
        let key = T::intern_key(&args);

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&key) {
            return Ok(hit.clone());
        }

        let value = T::init(args)?;
        let interned = Interned {
            slot: Arc::new(Slot {
                id: next_id(),
                interner: self.id,
                epoch: self.epoch.load(Ordering::Acquire),
                value,
            }),
        };
        log::trace!(
            "Interned new {} instance #{}",
            std::any::type_name::<T>(),
            interned.id()
        );
        cache.insert(key, interned.clone());
        Ok(interned)
    }

    /// Returns the cached instance for `key`, if any.
    pub fn lookup(&self, key: &T::Key) -> Option<Interned<T>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns `true` if an instance is cached under `key`.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.lookup(key).is_some()
    }

    /// Verifies that `handle` was produced by this interner in the current epoch.
    pub fn check(&self, handle: &Interned<T>) -> KindResult<()> {
        if handle.slot.interner != self.id {
            return Err(KindError::InterningMisuse(format!(
                "instance #{} belongs to a different registry",
                handle.id()
            )));
        }
        let current = self.epoch();
        if handle.epoch() != current {
            return Err(KindError::InterningMisuse(format!(
                "instance #{} is from epoch {} but the registry is at epoch {}; \
                 handles do not survive clear()",
                handle.id(),
                handle.epoch(),
                current
            )));
        }
        Ok(())
    }

    /// Empties the cache and starts a new epoch.
    ///
    /// Handles from earlier epochs stay alive but no longer compare equal to
    /// anything built afterwards, and [`Interner::check`] rejects them.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.clear();
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!(
            "Cleared {} interner, now at epoch {}",
            std::any::type_name::<T>(),
            epoch
        );
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
