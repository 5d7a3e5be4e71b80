//! The pipeline builder.
//!
//! [`PipelineBuilder`] is populated during a single-threaded assembly
//! phase: stages, configurers and shared objects go in, and
//! [`PipelineBuilder::build`] emits an immutable [`SecurityPipeline`]
//! snapshot. Mutating the builder afterwards does not affect pipelines it
//! already built.

use crate::order::{self, Placement};
use crate::pipeline::SecurityPipeline;
use crate::registry::{self, Configurer, SharedObjects};
use bulwark_core::{BulwarkError, BulwarkResult, Stage, StageKind};
use bulwark_matcher::{AnyRequestMatcher, RequestMatcher};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Upper bound on configurer application passes per build.
const MAX_CONFIGURER_PASSES: usize = 8;

/// Identifies the stage a custom stage is placed next to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The stage occupying a canonical slot.
    Kind(StageKind),
    /// The first registered stage of a concrete type.
    Type(TypeId, &'static str),
    /// The first registered stage with this name.
    Name(&'static str),
}

impl Anchor {
    /// Anchors on the first registered stage of type `S`.
    #[must_use]
    pub fn of<S: Stage>() -> Self {
        Self::Type(TypeId::of::<S>(), std::any::type_name::<S>())
    }
}

impl From<StageKind> for Anchor {
    fn from(kind: StageKind) -> Self {
        Self::Kind(kind)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => write!(f, "kind {kind}"),
            Self::Type(_, name) => write!(f, "type {name}"),
            Self::Name(name) => write!(f, "stage '{name}'"),
        }
    }
}

struct StageEntry {
    stage: Arc<dyn Stage>,
    type_id: TypeId,
    placement: Placement,
}

/// Assembles stages into an ordered [`SecurityPipeline`].
///
/// # Example
///
/// ```
/// use bulwark_core::StageKind;
/// use bulwark_pipeline::{FnStage, PipelineBuilder};
///
/// let mut builder = PipelineBuilder::new();
/// builder
///     .add_stage(FnStage::new("access", |i| i.proceed()).with_kind(StageKind::AccessDecision))?
///     .add_stage(FnStage::new("channel", |i| i.proceed()).with_kind(StageKind::ChannelProcessing))?
///     .add_stage_before(FnStage::new("audit", |i| i.proceed()), StageKind::AccessDecision)?;
///
/// let pipeline = builder.build()?;
/// assert_eq!(pipeline.stage_names(), vec!["channel", "audit", "access"]);
/// # Ok::<(), bulwark_core::BulwarkError>(())
/// ```
pub struct PipelineBuilder {
    stages: Vec<StageEntry>,
    configurers: IndexMap<TypeId, Box<dyn Configurer>>,
    applied: HashSet<TypeId>,
    shared: SharedObjects,
    matcher: Arc<dyn RequestMatcher>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates an empty builder whose pipeline matches every request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            configurers: IndexMap::new(),
            applied: HashSet::new(),
            shared: SharedObjects::new(),
            matcher: Arc::new(AnyRequestMatcher),
        }
    }

    /// Adds a stage at its canonical position.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the stage has no canonical kind,
    /// or if a stage of the same kind is already registered.
    pub fn add_stage<S: Stage>(&mut self, stage: S) -> BulwarkResult<&mut Self> {
        let Some(kind) = stage.kind() else {
            return Err(BulwarkError::configuration(format!(
                "stage '{}' has no canonical kind; add it before or after an existing stage",
                stage.name()
            )));
        };

        if let Some(existing) = self.canonical_index(kind) {
            return Err(BulwarkError::configuration(format!(
                "cannot add stage '{}': '{}' already occupies {kind}",
                stage.name(),
                self.stages[existing].stage.name()
            )));
        }

        tracing::trace!(stage = stage.name(), %kind, "stage registered");
        self.push(stage, Placement::Canonical(kind));
        Ok(self)
    }

    /// Adds a stage immediately before `anchor`.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the stage has a canonical kind,
    /// or if no registered stage matches `anchor`.
    pub fn add_stage_before<S: Stage>(
        &mut self,
        stage: S,
        anchor: impl Into<Anchor>,
    ) -> BulwarkResult<&mut Self> {
        Self::reject_kinded(&stage)?;
        let index = self.resolve_anchor(anchor.into(), stage.name())?;
        tracing::trace!(stage = stage.name(), anchor = self.stages[index].stage.name(), "stage registered before anchor");
        self.push(stage, Placement::Before(index));
        Ok(self)
    }

    /// Adds a stage immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the stage has a canonical kind,
    /// or if no registered stage matches `anchor`.
    pub fn add_stage_after<S: Stage>(
        &mut self,
        stage: S,
        anchor: impl Into<Anchor>,
    ) -> BulwarkResult<&mut Self> {
        Self::reject_kinded(&stage)?;
        let index = self.resolve_anchor(anchor.into(), stage.name())?;
        tracing::trace!(stage = stage.name(), anchor = self.stages[index].stage.name(), "stage registered after anchor");
        self.push(stage, Placement::After(index));
        Ok(self)
    }

    /// Returns true if a stage occupies the canonical slot for `kind`.
    #[must_use]
    pub fn has_stage(&self, kind: StageKind) -> bool {
        self.canonical_index(kind).is_some()
    }

    /// Returns the number of registered stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Sets the matcher deciding which requests the built pipeline handles.
    pub fn request_matcher(&mut self, matcher: Arc<dyn RequestMatcher>) -> &mut Self {
        self.matcher = matcher;
        self
    }

    /// Registers a configurer, replacing any configurer of the same type.
    ///
    /// Returns the replaced configurer.
    pub fn add_configurer<C: Configurer>(&mut self, configurer: C) -> Option<C> {
        let id = TypeId::of::<C>();
        self.applied.remove(&id);
        self.configurers
            .insert(id, Box::new(configurer))
            .and_then(registry::downcast_box::<C>)
    }

    /// Returns the configurer of exactly type `C`.
    #[must_use]
    pub fn get_configurer<C: Configurer>(&self) -> Option<&C> {
        self.configurers
            .get(&TypeId::of::<C>())
            .and_then(|configurer| registry::downcast_ref::<C>(&**configurer))
    }

    /// Returns the configurer of exactly type `C` mutably.
    pub fn get_configurer_mut<C: Configurer>(&mut self) -> Option<&mut C> {
        self.configurers
            .get_mut(&TypeId::of::<C>())
            .and_then(|configurer| registry::downcast_mut::<C>(&mut **configurer))
    }

    /// Removes and returns the configurer of exactly type `C`.
    pub fn remove_configurer<C: Configurer>(&mut self) -> Option<C> {
        let id = TypeId::of::<C>();
        self.applied.remove(&id);
        self.configurers
            .shift_remove(&id)
            .and_then(registry::downcast_box::<C>)
    }

    /// Stores a shared object, replacing any value of the same type.
    pub fn set_shared_object<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        if self.shared.insert(value) {
            tracing::debug!(shared_type = std::any::type_name::<T>(), "shared object replaced");
        }
        self
    }

    /// Returns the shared object of exactly type `T`.
    #[must_use]
    pub fn shared_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.shared.get::<T>()
    }

    /// Returns the shared object table.
    #[must_use]
    pub fn shared_objects(&self) -> &SharedObjects {
        &self.shared
    }

    /// Applies pending configurers, orders the stages and returns the pipeline.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if a configurer fails, if
    /// configurers keep registering new configurers, or if the stage
    /// placements are contradictory.
    pub fn build(&mut self) -> BulwarkResult<SecurityPipeline> {
        self.apply_configurers()?;

        let names: Vec<&'static str> = self.stages.iter().map(|entry| entry.stage.name()).collect();
        let placements: Vec<Placement> = self.stages.iter().map(|entry| entry.placement).collect();
        let order = order::resolve(&names, &placements)?;

        let stages: Vec<Arc<dyn Stage>> = order
            .into_iter()
            .map(|index| Arc::clone(&self.stages[index].stage))
            .collect();

        let pipeline = SecurityPipeline::new(Arc::clone(&self.matcher), stages);
        tracing::info!(
            stages = ?pipeline.stage_names(),
            matcher = ?self.matcher,
            "security pipeline built"
        );
        Ok(pipeline)
    }

    fn push<S: Stage>(&mut self, stage: S, placement: Placement) {
        self.stages.push(StageEntry {
            stage: Arc::new(stage),
            type_id: TypeId::of::<S>(),
            placement,
        });
    }

    /// Kinded stages only ever take their canonical slot.
    fn reject_kinded<S: Stage>(stage: &S) -> BulwarkResult<()> {
        match stage.kind() {
            Some(kind) => Err(BulwarkError::configuration(format!(
                "stage '{}' has canonical kind {kind}; add it with add_stage",
                stage.name()
            ))),
            None => Ok(()),
        }
    }

    fn canonical_index(&self, kind: StageKind) -> Option<usize> {
        self.stages.iter().position(|entry| {
            entry.placement == Placement::Canonical(kind) || entry.stage.kind() == Some(kind)
        })
    }

    fn resolve_anchor(&self, anchor: Anchor, stage: &str) -> BulwarkResult<usize> {
        let found = match anchor {
            Anchor::Kind(kind) => self.canonical_index(kind),
            Anchor::Type(type_id, _) => self.stages.iter().position(|entry| entry.type_id == type_id),
            Anchor::Name(name) => self.stages.iter().position(|entry| entry.stage.name() == name),
        };
        found.ok_or_else(|| {
            BulwarkError::configuration(format!(
                "cannot place stage '{stage}': no registered stage matches {anchor}"
            ))
        })
    }

    fn apply_configurers(&mut self) -> BulwarkResult<()> {
        for pass in 0..MAX_CONFIGURER_PASSES {
            let pending: Vec<TypeId> = self
                .configurers
                .keys()
                .filter(|id| !self.applied.contains(*id))
                .copied()
                .collect();
            if pending.is_empty() {
                return Ok(());
            }
            tracing::debug!(pass, pending = pending.len(), "applying configurers");

            // A replacement registered mid-pass is applied from scratch next pass.
            let mut replaced = HashSet::new();
            for id in &pending {
                if !self.with_configurer(*id, |configurer, builder| configurer.init(builder))? {
                    replaced.insert(*id);
                }
            }
            for id in pending.iter().filter(|id| !replaced.contains(*id)) {
                if self.with_configurer(*id, |configurer, builder| configurer.configure(builder))? {
                    self.applied.insert(*id);
                }
            }
        }

        Err(BulwarkError::configuration(format!(
            "configurers still pending after {MAX_CONFIGURER_PASSES} passes"
        )))
    }

    /// Takes the configurer out while it runs so it can mutate the builder.
    ///
    /// Returns false if the configurer registered a replacement of its own
    /// type, or was already gone.
    fn with_configurer<F>(&mut self, id: TypeId, f: F) -> BulwarkResult<bool>
    where
        F: FnOnce(&mut dyn Configurer, &mut Self) -> BulwarkResult<()>,
    {
        let Some((index, _, mut configurer)) = self.configurers.shift_remove_full(&id) else {
            return Ok(false);
        };

        let result = f(&mut *configurer, self);

        // A configurer that replaced itself keeps its replacement.
        if self.configurers.contains_key(&id) {
            return result.map(|()| false);
        }
        let index = index.min(self.configurers.len());
        self.configurers.shift_insert(index, id, configurer);
        result.map(|()| true)
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&'static str> = self.stages.iter().map(|entry| entry.stage.name()).collect();
        f.debug_struct("PipelineBuilder")
            .field("stages", &stages)
            .field("configurers", &self.configurers.len())
            .field("shared", &self.shared)
            .field("matcher", &self.matcher)
            .finish()
    }
}
