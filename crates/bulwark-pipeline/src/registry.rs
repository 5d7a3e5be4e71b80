//! Type-keyed registries held by the pipeline builder.
//!
//! Both registries key entries by the exact [`TypeId`] of the stored value.
//! Lookups never consider trait objects or wrapper types: a value stored as
//! `Arc<T>` is not found when asking for `T`.

use crate::builder::PipelineBuilder;
use bulwark_core::BulwarkResult;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Upcasts to [`Any`] for exact-type downcasting.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts a boxed value into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Contributes stages and shared objects to a [`PipelineBuilder`].
///
/// Configurers are applied once per builder when it is built: `init` runs
/// for every pending configurer first, then `configure` for each. A
/// configurer may add further configurers from either hook; those are
/// applied in a follow-up pass.
///
/// # Example
///
/// ```
/// use bulwark_core::{BulwarkResult, StageKind};
/// use bulwark_pipeline::{Configurer, FnStage, PipelineBuilder};
///
/// struct Logout;
///
/// impl Configurer for Logout {
///     fn configure(&mut self, builder: &mut PipelineBuilder) -> BulwarkResult<()> {
///         builder.add_stage(
///             FnStage::new("logout", |invocation| invocation.proceed())
///                 .with_kind(StageKind::Logout),
///         )?;
///         Ok(())
///     }
/// }
///
/// let mut builder = PipelineBuilder::new();
/// builder.add_configurer(Logout);
/// let pipeline = builder.build().unwrap();
/// assert_eq!(pipeline.stage_names(), vec!["logout"]);
/// ```
pub trait Configurer: AsAny + Send + Sync {
    /// Prepares shared state before any configurer's `configure` runs.
    fn init(&mut self, builder: &mut PipelineBuilder) -> BulwarkResult<()> {
        let _ = builder;
        Ok(())
    }

    /// Adds stages to the builder.
    fn configure(&mut self, builder: &mut PipelineBuilder) -> BulwarkResult<()>;
}

pub(crate) fn downcast_ref<C: Configurer>(configurer: &dyn Configurer) -> Option<&C> {
    AsAny::as_any(configurer).downcast_ref::<C>()
}

pub(crate) fn downcast_mut<C: Configurer>(configurer: &mut dyn Configurer) -> Option<&mut C> {
    AsAny::as_any_mut(configurer).downcast_mut::<C>()
}

pub(crate) fn downcast_box<C: Configurer>(configurer: Box<dyn Configurer>) -> Option<C> {
    AsAny::into_any(configurer).downcast::<C>().ok().map(|boxed| *boxed)
}

/// Objects shared between configurers, one per type. Last write wins.
#[derive(Default)]
pub struct SharedObjects {
    objects: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl SharedObjects {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning whether a value of the same type was replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> bool {
        self.objects
            .insert(TypeId::of::<T>(), Arc::new(value))
            .is_some()
    }

    /// Returns the value stored for `T`.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.objects
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|object| object.downcast::<T>().ok())
    }

    /// Removes the value stored for `T`.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<Arc<T>> {
        self.objects
            .remove(&TypeId::of::<T>())
            .and_then(|object| object.downcast::<T>().ok())
    }

    /// Returns true if a value is stored for `T`.
    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.objects.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl fmt::Debug for SharedObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedObjects")
            .field("len", &self.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Realm(&'static str);

    #[test]
    fn test_shared_objects_last_write_wins() {
        let mut shared = SharedObjects::new();
        assert!(!shared.insert(Realm("first")));
        assert!(shared.insert(Realm("second")));
        assert_eq!(shared.get::<Realm>().unwrap().0, "second");
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn test_shared_objects_exact_type_only() {
        let mut shared = SharedObjects::new();
        shared.insert(Arc::new(Realm("wrapped")));
        assert!(shared.get::<Realm>().is_none());
        assert!(shared.contains::<Arc<Realm>>());
    }

    #[test]
    fn test_shared_objects_remove() {
        let mut shared = SharedObjects::new();
        shared.insert(7_u32);
        assert_eq!(shared.remove::<u32>().as_deref(), Some(&7));
        assert!(shared.is_empty());
        assert!(shared.remove::<u32>().is_none());
    }

    struct Noop;

    impl Configurer for Noop {
        fn configure(&mut self, _builder: &mut PipelineBuilder) -> BulwarkResult<()> {
            Ok(())
        }
    }

    struct Other;

    impl Configurer for Other {
        fn configure(&mut self, _builder: &mut PipelineBuilder) -> BulwarkResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_downcast_exact_type() {
        let boxed: Box<dyn Configurer> = Box::new(Noop);
        assert!(downcast_ref::<Noop>(&*boxed).is_some());
        assert!(downcast_ref::<Other>(&*boxed).is_none());
        assert!(downcast_box::<Noop>(boxed).is_some());
    }
}
