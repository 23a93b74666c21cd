//! The typed value pool (spec.md §4.1, C1).
//!
//! Decouples producers from consumers by name. A slot is keyed by
//! `(module, parameter)`; indexing into a sequence-valued slot is resolved at
//! read time through a small proxy rather than at graph-build time, so
//! producers stay free to resize their output across samples.
//!
//! Lazy binding: `get` before `put` is allowed and passively allocates a
//! default-constructed slot so graph construction never has to order
//! modules by data dependency up front (see DESIGN.md, "Lazy pool binding").
//! The indirection is a single level — slot key to `Arc<RwLock<T>>` — so the
//! producer installing its value later mutates the same storage every
//! existing handle already points at, rather than rebinding anything.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::input_tag::InputTag;

/// Values stored in the pool must be `Default`-constructible (for passive
/// allocation), thread-safe, and `Clone` (reads hand back a snapshot rather
/// than a borrow, which keeps the lock scope to the read itself).
pub trait PoolValue: Any + Default + Clone + Send + Sync + 'static {}
impl<T: Any + Default + Clone + Send + Sync + 'static> PoolValue for T {}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("indexed input tag '{0}' cannot be used as a non-indexed pool key")]
    IndexedTagForScalar(InputTag),

    #[error("tag '{0}' not found in pool")]
    TagNotFound(InputTag),

    #[error("a module already produced '{0}'")]
    DuplicateProducer(InputTag),

    #[error("type mismatch for '{tag}': slot holds '{stored}', requested '{requested}'")]
    TypeMismatch {
        tag: InputTag,
        stored: &'static str,
        requested: &'static str,
    },

    #[error("alias source '{0}' does not exist")]
    AliasSourceMissing(InputTag),

    #[error("alias target '{0}' already exists")]
    AliasTargetExists(InputTag),

    #[error("alias tags must be non-indexed ('{0}')")]
    AliasMustBeNonIndexed(InputTag),
}

struct SlotEntry {
    storage: Arc<dyn Any + Send + Sync>,
    has_producer: AtomicBool,
    type_name: &'static str,
}

/// Storage backing a resolved `ValueHandle<T>`: either a direct scalar slot
/// or a sequence slot accessed at a fixed index.
enum Storage<T> {
    Scalar(Arc<RwLock<T>>),
    Indexed(Arc<RwLock<Vec<T>>>, usize),
}

/// A resolved, typed read handle into the pool. Cloning is cheap (it clones
/// the underlying `Arc`, not the value).
pub struct ValueHandle<T>(Storage<T>);

impl<T: Clone> ValueHandle<T> {
    /// Read the current value. For an indexed handle, this reads
    /// `producer_value[i]` at the time of the call — the defining property
    /// that lets producers resize between samples.
    pub fn get(&self) -> T {
        match &self.0 {
            Storage::Scalar(arc) => arc.read().clone(),
            Storage::Indexed(arc, i) => arc.read()[*i].clone(),
        }
    }
}

impl<T> Clone for ValueHandle<T> {
    fn clone(&self) -> Self {
        match &self.0 {
            Storage::Scalar(arc) => ValueHandle(Storage::Scalar(arc.clone())),
            Storage::Indexed(arc, i) => ValueHandle(Storage::Indexed(arc.clone(), *i)),
        }
    }
}

/// A writable handle returned to a producing module by `Pool::put`.
pub struct ProducerHandle<T>(Arc<RwLock<T>>);

impl<T> ProducerHandle<T> {
    pub fn set(&self, value: T) {
        *self.0.write() = value;
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.write())
    }
}

impl<T: Clone> ProducerHandle<T> {
    pub fn get(&self) -> T {
        self.0.read().clone()
    }
}

impl<T> Clone for ProducerHandle<T> {
    fn clone(&self) -> Self {
        ProducerHandle(self.0.clone())
    }
}

/// Named storage of typed produced values, shared by every module on one
/// `Plan`. Never shared across plan/engine replicas (see the concurrency
/// contract in spec.md §4.7, §5).
#[derive(Default)]
pub struct Pool {
    slots: DashMap<(String, String), SlotEntry>,
    frozen: AtomicBool,
}

impl Pool {
    pub fn new() -> Self {
        Pool {
            slots: DashMap::new(),
            frozen: AtomicBool::new(false),
        }
    }

    fn key(tag: &InputTag) -> (String, String) {
        (tag.module.clone(), tag.parameter.clone())
    }

    fn fetch_or_allocate<U: PoolValue>(&self, key: (String, String)) -> Arc<dyn Any + Send + Sync> {
        self.slots
            .entry(key)
            .or_insert_with(|| SlotEntry {
                storage: Arc::new(RwLock::new(U::default())) as Arc<dyn Any + Send + Sync>,
                has_producer: AtomicBool::new(false),
                type_name: std::any::type_name::<U>(),
            })
            .storage
            .clone()
    }

    fn downcast<U: PoolValue>(
        tag: &InputTag,
        raw: Arc<dyn Any + Send + Sync>,
        stored_type_name: &'static str,
    ) -> Result<Arc<RwLock<U>>, PoolError> {
        raw.downcast::<RwLock<U>>().map_err(|_| {
            if tag.is_indexed() {
                PoolError::IndexedTagForScalar(tag.clone())
            } else {
                PoolError::TypeMismatch {
                    tag: tag.clone(),
                    stored: stored_type_name,
                    requested: std::any::type_name::<U>(),
                }
            }
        })
    }

    /// Allocate (or reuse) a producer slot and return a writable handle.
    /// Fails with `DuplicateProducer` if a producer already installed a
    /// value for this tag.
    pub fn put<T: PoolValue>(&self, tag: &InputTag) -> Result<ProducerHandle<T>, PoolError> {
        if tag.is_indexed() {
            return Err(PoolError::IndexedTagForScalar(tag.clone()));
        }
        let key = Self::key(tag);
        let raw = self.fetch_or_allocate::<T>(key.clone());
        let stored_type_name = self
            .slots
            .get(&key)
            .map(|e| e.type_name)
            .unwrap_or("<unknown>");
        let arc = Self::downcast::<T>(tag, raw, stored_type_name)?;

        let entry = self.slots.get(&key).expect("slot just allocated");
        if entry.has_producer.swap(true, Ordering::SeqCst) {
            return Err(PoolError::DuplicateProducer(tag.clone()));
        }

        Ok(ProducerHandle(arc))
    }

    /// Resolve a (possibly indexed) reference for reading. Passively
    /// allocates the slot if no producer has registered yet.
    pub fn get<T: PoolValue>(&self, tag: &InputTag) -> Result<ValueHandle<T>, PoolError> {
        let key = Self::key(tag);
        match tag.index {
            None => {
                let raw = self.fetch_or_allocate::<T>(key.clone());
                let stored_type_name = self.slots.get(&key).map(|e| e.type_name).unwrap_or("<unknown>");
                let arc = Self::downcast::<T>(tag, raw, stored_type_name)?;
                Ok(ValueHandle(Storage::Scalar(arc)))
            }
            Some(index) => {
                let raw = self.fetch_or_allocate::<Vec<T>>(key.clone());
                let stored_type_name = self.slots.get(&key).map(|e| e.type_name).unwrap_or("<unknown>");
                let arc = Self::downcast::<Vec<T>>(tag, raw, stored_type_name)?;
                Ok(ValueHandle(Storage::Indexed(arc, index)))
            }
        }
    }

    /// Declare that `to` shares storage with `from`. Both tags must be
    /// non-indexed; `from` must already have a slot, `to` must not.
    pub fn alias(&self, from: &InputTag, to: &InputTag) -> Result<(), PoolError> {
        if from.is_indexed() {
            return Err(PoolError::AliasMustBeNonIndexed(from.clone()));
        }
        if to.is_indexed() {
            return Err(PoolError::AliasMustBeNonIndexed(to.clone()));
        }
        let from_key = Self::key(from);
        let to_key = Self::key(to);
        if self.slots.contains_key(&to_key) {
            return Err(PoolError::AliasTargetExists(to.clone()));
        }
        let from_entry = self
            .slots
            .get(&from_key)
            .ok_or_else(|| PoolError::AliasSourceMissing(from.clone()))?;
        let cloned = SlotEntry {
            storage: from_entry.storage.clone(),
            has_producer: AtomicBool::new(from_entry.has_producer.load(Ordering::SeqCst)),
            type_name: from_entry.type_name,
        };
        drop(from_entry);
        self.slots.insert(to_key, cloned);
        Ok(())
    }

    /// Whether a slot has an installed producer (used by the graph builder
    /// when pruning and when checking invariant coverage).
    pub fn has_producer(&self, tag: &InputTag) -> bool {
        self.slots
            .get(&Self::key(tag))
            .map(|e| e.has_producer.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_before_put_then_put_is_visible() {
        let pool = Pool::new();
        let tag = InputTag::new("producer", "x");

        let reader: ValueHandle<f64> = pool.get(&tag).unwrap();
        assert_eq!(reader.get(), 0.0);

        let writer: ProducerHandle<f64> = pool.put(&tag).unwrap();
        writer.set(42.0);

        assert_eq!(reader.get(), 42.0);
    }

    #[test]
    fn duplicate_producer_is_rejected() {
        let pool = Pool::new();
        let tag = InputTag::new("producer", "x");
        let _first: ProducerHandle<f64> = pool.put(&tag).unwrap();
        let second = pool.put::<f64>(&tag);
        assert!(matches!(second, Err(PoolError::DuplicateProducer(_))));
    }

    #[test]
    fn indexed_read_against_scalar_producer_fails() {
        let pool = Pool::new();
        let scalar_tag = InputTag::new("producer", "x");
        let _writer: ProducerHandle<f64> = pool.put(&scalar_tag).unwrap();

        let indexed_tag = InputTag::indexed("producer", "x", 3);
        let result = pool.get::<f64>(&indexed_tag);
        assert!(matches!(result, Err(PoolError::IndexedTagForScalar(_))));
    }

    #[test]
    fn indexed_read_tracks_producer_resizing() {
        let pool = Pool::new();
        let vec_tag = InputTag::new("producer", "xs");
        let writer: ProducerHandle<Vec<f64>> = pool.put(&vec_tag).unwrap();
        writer.set(vec![1.0, 2.0, 3.0]);

        let idx1 = InputTag::indexed("producer", "xs", 1);
        let reader: ValueHandle<f64> = pool.get(&idx1).unwrap();
        assert_eq!(reader.get(), 2.0);

        writer.set(vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(reader.get(), 20.0);
    }

    #[test]
    fn alias_reads_hit_same_storage() {
        let pool = Pool::new();
        let from = InputTag::new("producer", "x");
        let to = InputTag::new("alias", "y");

        let writer: ProducerHandle<f64> = pool.put(&from).unwrap();
        pool.alias(&from, &to).unwrap();

        let reader_from: ValueHandle<f64> = pool.get(&from).unwrap();
        let reader_to: ValueHandle<f64> = pool.get(&to).unwrap();

        writer.set(7.0);
        assert_eq!(reader_from.get(), 7.0);
        assert_eq!(reader_to.get(), 7.0);
    }

    #[test]
    fn alias_target_must_not_already_exist() {
        let pool = Pool::new();
        let from = InputTag::new("producer", "x");
        let to = InputTag::new("other", "y");
        let _writer: ProducerHandle<f64> = pool.put(&from).unwrap();
        let _other: ProducerHandle<f64> = pool.put(&to).unwrap();

        assert!(matches!(
            pool.alias(&from, &to),
            Err(PoolError::AliasTargetExists(_))
        ));
    }
}
