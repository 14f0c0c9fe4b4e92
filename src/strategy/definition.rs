//! Dynamically composed strategy types.
//!
//! A [`StrategyType`] is built from an optional parent type and a body of
//! member definitions. Members resolve through the type's own layer, then
//! the capability modules it includes (most recent first), then the parent,
//! recursively. Resolution always reads the current layers, so reopening a
//! type or module is observed by every handle, subtype and instance.
//!
//! # Thread Safety
//!
//! Each type keeps its layer behind an `RwLock`. Reopening stages the body
//! on a copy of the layer and swaps the copy in under the write lock, so a
//! reader sees either the old layer or the new one, never a half-applied
//! body. Reopens of the same type are serialized by a per-type mutex.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::StrategyError;
use crate::types::{Ancestor, AncestorKind, Params};

use super::attempt::Attempt;
use super::contract;
use super::instance::Strategy;
use super::traits::Authenticate;

type AuthenticateFn = Arc<dyn Authenticate>;
type ValidFn = Arc<dyn Fn(&Attempt<'_>) -> bool + Send + Sync>;

/// A member entry in one layer.
#[derive(Clone)]
enum Slot<T> {
    Defined(T),
    /// Hides every definition further up the ancestry
    Undefined,
}

/// Member definitions of one layer (a type's own layer or a module).
#[derive(Clone, Default)]
pub struct Members {
    authenticate: Option<Slot<AuthenticateFn>>,
    valid: Option<Slot<ValidFn>>,
    config: HashMap<String, Value>,
}

impl Members {
    /// Define the authenticate-attempt operation from a closure.
    pub fn authenticate<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Attempt<'_>) -> Result<(), StrategyError> + Send + Sync + 'static,
    {
        self.authenticate_with(f)
    }

    /// Define the authenticate-attempt operation from any implementor.
    pub fn authenticate_with<A: Authenticate + 'static>(&mut self, strategy: A) -> &mut Self {
        let strategy: AuthenticateFn = Arc::new(strategy);
        self.authenticate = Some(Slot::Defined(strategy));
        self
    }

    /// Drop this layer's own `authenticate`; an inherited one becomes visible again.
    pub fn remove_authenticate(&mut self) -> &mut Self {
        self.authenticate = None;
        self
    }

    /// Hide `authenticate` entirely, including inherited definitions.
    pub fn undef_authenticate(&mut self) -> &mut Self {
        self.authenticate = Some(Slot::Undefined);
        self
    }

    /// Define the predicate deciding whether the strategy applies to a request.
    pub fn valid<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Attempt<'_>) -> bool + Send + Sync + 'static,
    {
        let valid: ValidFn = Arc::new(f);
        self.valid = Some(Slot::Defined(valid));
        self
    }

    /// Set an auxiliary configuration value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Whether this layer itself defines `authenticate`.
    pub fn defines_authenticate(&self) -> bool {
        matches!(self.authenticate, Some(Slot::Defined(_)))
    }
}

#[derive(Clone, Default)]
struct Layer {
    members: Members,
    modules: Vec<CapabilityModule>,
    revision: u64,
}

impl Layer {
    fn resolve<R>(&self, pick: &dyn Fn(&Members) -> Option<Slot<R>>) -> Option<Slot<R>> {
        if let Some(slot) = pick(&self.members) {
            return Some(slot);
        }
        self.modules
            .iter()
            .rev()
            .find_map(|module| pick(&*module.read()))
    }
}

fn pick_authenticate(members: &Members) -> Option<Slot<AuthenticateFn>> {
    members.authenticate.clone()
}

fn pick_valid(members: &Members) -> Option<Slot<ValidFn>> {
    members.valid.clone()
}

/// Body builder handed to type definitions and extensions.
///
/// Dereferences to [`Members`] for member definitions and adds
/// [`include`](Self::include) for capability modules.
pub struct Definition<'a> {
    layer: &'a mut Layer,
}

impl Definition<'_> {
    /// Include a capability module. Including the same module twice is a no-op.
    pub fn include(&mut self, module: &CapabilityModule) -> &mut Self {
        if !self.includes(module) {
            self.layer.modules.push(module.clone());
        }
        self
    }

    /// Whether this layer already includes `module`.
    pub fn includes(&self, module: &CapabilityModule) -> bool {
        self.layer.modules.iter().any(|m| m.id() == module.id())
    }
}

impl Deref for Definition<'_> {
    type Target = Members;

    fn deref(&self) -> &Members {
        &self.layer.members
    }
}

impl DerefMut for Definition<'_> {
    fn deref_mut(&mut self) -> &mut Members {
        &mut self.layer.members
    }
}

/// A named, reusable set of members that types can include.
#[derive(Clone)]
pub struct CapabilityModule {
    inner: Arc<ModuleInner>,
}

struct ModuleInner {
    id: Uuid,
    name: String,
    members: RwLock<Members>,
    edit: Mutex<()>,
}

impl CapabilityModule {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut Members),
    {
        let mut members = Members::default();
        body(&mut members);
        Self {
            inner: Arc::new(ModuleInner {
                id: Uuid::new_v4(),
                name: name.into(),
                members: RwLock::new(members),
                edit: Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Apply more member definitions in place; every including type observes them.
    ///
    /// Reopens of the same module are serialized. The body must not reopen
    /// this same module.
    pub fn reopen<F>(&self, body: F)
    where
        F: FnOnce(&mut Members),
    {
        let _edit = self
            .inner
            .edit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut staged = self.read().clone();
        body(&mut staged);
        *self
            .inner
            .members
            .write()
            .unwrap_or_else(PoisonError::into_inner) = staged;
        debug!("Reopened capability module {}", self.name());
    }

    fn read(&self) -> RwLockReadGuard<'_, Members> {
        self.inner
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ancestor(&self) -> Ancestor {
        Ancestor {
            id: self.id(),
            name: self.name().to_string(),
            kind: AncestorKind::Module,
        }
    }
}

impl fmt::Debug for CapabilityModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityModule")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for CapabilityModule {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for CapabilityModule {}

/// A strategy implementation: identity, parent, and a mutable member layer.
///
/// Cloning yields another handle to the same type; reopening through any
/// handle is visible through all of them.
#[derive(Clone)]
pub struct StrategyType {
    inner: Arc<TypeInner>,
}

struct TypeInner {
    id: Uuid,
    name: String,
    parent: Option<StrategyType>,
    layer: RwLock<Layer>,
    edit: Mutex<()>,
}

/// A reopened layer that has not been committed yet.
pub(crate) struct Staged<'a> {
    definition: &'a StrategyType,
    layer: &'a Layer,
}

impl Staged<'_> {
    pub(crate) fn has_authenticate(&self) -> bool {
        let own = self.layer.resolve::<AuthenticateFn>(&pick_authenticate);
        self.definition.settle(own, &pick_authenticate).is_some()
    }
}

impl StrategyType {
    pub(crate) fn build<F>(name: impl Into<String>, parent: Option<StrategyType>, body: F) -> Self
    where
        F: FnOnce(&mut Definition<'_>),
    {
        let mut layer = Layer::default();
        body(&mut Definition { layer: &mut layer });
        Self {
            inner: Arc::new(TypeInner {
                id: Uuid::new_v4(),
                name: name.into(),
                parent,
                layer: RwLock::new(layer),
                edit: Mutex::new(()),
            }),
        }
    }

    /// The canonical base every registrable type must derive from.
    pub fn base() -> Self {
        contract::base()
    }

    /// Define a new type deriving from the canonical base.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut Definition<'_>),
    {
        Self::build(name, Some(contract::base()), body)
    }

    /// Define a type with no parent at all.
    ///
    /// Such a type may expose `authenticate` and so satisfy the capability
    /// check, but the registry rejects it as a base.
    pub fn standalone<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut Definition<'_>),
    {
        Self::build(name, None, body)
    }

    /// Define a new type deriving from this one.
    pub fn subclass<F>(&self, name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(&mut Definition<'_>),
    {
        Self::build(name, Some(self.clone()), body)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&StrategyType> {
        self.inner.parent.as_ref()
    }

    /// Number of reopens applied to this type's own layer.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    /// Whether both handles refer to the same type.
    pub fn ptr_eq(&self, other: &StrategyType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Ancestry in resolution order, starting with this type.
    pub fn ancestors(&self) -> Vec<Ancestor> {
        let mut ancestors = Vec::new();
        let mut current = Some(self);
        while let Some(ty) = current {
            ancestors.push(Ancestor {
                id: ty.id(),
                name: ty.name().to_string(),
                kind: AncestorKind::Type,
            });
            ancestors.extend(ty.read().modules.iter().rev().map(CapabilityModule::ancestor));
            current = ty.parent();
        }
        ancestors
    }

    /// Whether `other` is this type or one of its parents.
    pub fn descends_from(&self, other: &StrategyType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.id() == other.id() {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Whether `module` is included anywhere in the ancestry.
    pub fn includes(&self, module: &CapabilityModule) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.read().modules.iter().any(|m| m.id() == module.id()) {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Whether `authenticate` resolves anywhere in the ancestry.
    pub fn has_authenticate(&self) -> bool {
        self.resolve_authenticate().is_some()
    }

    /// Resolve an auxiliary configuration value.
    pub fn config(&self, key: &str) -> Option<Value> {
        self.resolve::<Value>(&|members: &Members| {
            members.config.get(key).cloned().map(Slot::Defined)
        })
    }

    /// Create a per-request instance of this type.
    pub fn instantiate(
        &self,
        label: impl Into<String>,
        scope: impl Into<String>,
        params: Params,
    ) -> Strategy {
        Strategy::new(label, self.clone(), scope, params)
    }

    /// Apply more member definitions to this type in place.
    ///
    /// Returns the new revision. The body must not reopen this same type.
    pub fn reopen<F>(&self, body: F) -> u64
    where
        F: FnOnce(&mut Definition<'_>),
    {
        match self.reopen_checked(body, |_| Ok::<(), Infallible>(())) {
            Ok(revision) => revision,
            Err(never) => match never {},
        }
    }

    /// Stage `body` on a copy of the layer, run `check`, then commit.
    ///
    /// Nothing is changed when `check` fails.
    pub(crate) fn reopen_checked<F, C, E>(&self, body: F, check: C) -> Result<u64, E>
    where
        F: FnOnce(&mut Definition<'_>),
        C: FnOnce(&Staged<'_>) -> Result<(), E>,
    {
        let _edit = self
            .inner
            .edit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut staged = self.read().clone();
        body(&mut Definition {
            layer: &mut staged,
        });
        check(&Staged {
            definition: self,
            layer: &staged,
        })?;

        let mut layer = self.write();
        staged.revision = layer.revision + 1;
        let revision = staged.revision;
        *layer = staged;
        debug!("Reopened strategy type {} at revision {}", self.name(), revision);
        Ok(revision)
    }

    pub(crate) fn resolve_authenticate(&self) -> Option<AuthenticateFn> {
        self.resolve::<AuthenticateFn>(&pick_authenticate)
    }

    pub(crate) fn resolve_valid(&self) -> Option<ValidFn> {
        self.resolve::<ValidFn>(&pick_valid)
    }

    fn resolve<R>(&self, pick: &dyn Fn(&Members) -> Option<Slot<R>>) -> Option<R> {
        let own = self.read().resolve(pick);
        self.settle(own, pick)
    }

    /// Finish a lookup that started in this type's layer (live or staged).
    fn settle<R>(
        &self,
        found: Option<Slot<R>>,
        pick: &dyn Fn(&Members) -> Option<Slot<R>>,
    ) -> Option<R> {
        match found {
            Some(Slot::Defined(value)) => Some(value),
            Some(Slot::Undefined) => None,
            None => self.parent().and_then(|parent| parent.resolve(pick)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Layer> {
        self.inner
            .layer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Layer> {
        self.inner
            .layer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyType")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("parent", &self.parent().map(StrategyType::name))
            .field("revision", &self.revision())
            .finish()
    }
}

impl PartialEq for StrategyType {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for StrategyType {}
