//! Bear Base Types
//!
//! This module defines the contract every analysis unit ("bear") satisfies
//! and the handles the scheduler passes around.
//!
//! # Kinds and Instances
//!
//! A bear *kind* ([`BearKind`]) is the type-level identity of a bear: its
//! name, which kinds it depends on, which options it takes and how to build
//! an instance. Dependencies are always declared between kinds.
//!
//! A bear *instance* ([`BearHandle`]) is a kind bound to one section and one
//! file dictionary. Every instance gets a unique [`BearId`]; the dependency
//! tracker and the scheduler key everything by it.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{BearError, CoreError};
use crate::settings::{FileDict, FunctionMetadata, Options, Section};

/// Bounds every result item must satisfy.
///
/// Results are cloned into the buffers of every dependant and shared with
/// worker threads, hence `Clone + Send + Sync`.
pub trait ResultItem: Clone + Send + Sync + 'static {}

impl<T> ResultItem for T where T: Clone + Send + Sync + 'static {}

/// Unique identifier for a bear instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BearId(u64);

impl BearId {
    /// Generate a new unique bear ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for BearId {
    fn default() -> Self {
        Self::new()
    }
}

type Constructor<R> = fn(Arc<Section>, Arc<FileDict>) -> Result<BearHandle<R>, CoreError>;

/// The identity of a bear type.
///
/// Two kinds are equal when they describe the same Rust type.
pub struct BearKind<R> {
    type_id: TypeId,
    name: &'static str,
    dependencies: fn() -> Vec<BearKind<R>>,
    metadata: fn() -> FunctionMetadata,
    construct: Constructor<R>,
}

impl<R> BearKind<R> {
    /// Describe the bear type `B`.
    ///
    /// The variant traits ([`GlobalBear`](super::GlobalBear),
    /// [`LocalBear`](super::LocalBear), [`DependencyBear`](super::DependencyBear))
    /// call this for you; use it directly only for hand-written [`Bear`] impls.
    pub fn new<B: 'static>(
        name: &'static str,
        dependencies: fn() -> Vec<BearKind<R>>,
        metadata: fn() -> FunctionMetadata,
        construct: Constructor<R>,
    ) -> Self {
        Self {
            type_id: TypeId::of::<B>(),
            name,
            dependencies,
            metadata,
            construct,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The kinds this kind depends on.
    pub fn dependencies(&self) -> Vec<BearKind<R>> {
        (self.dependencies)()
    }

    /// The options this kind's analysis accepts.
    pub fn metadata(&self) -> FunctionMetadata {
        (self.metadata)()
    }

    /// Build an instance bound to `section` and `file_dict`.
    pub fn instantiate(
        &self,
        section: Arc<Section>,
        file_dict: Arc<FileDict>,
    ) -> Result<BearHandle<R>, CoreError> {
        (self.construct)(section, file_dict)
    }
}

impl<R> Clone for BearKind<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for BearKind<R> {}

impl<R> PartialEq for BearKind<R> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl<R> Eq for BearKind<R> {}

impl<R> Hash for BearKind<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl<R> fmt::Debug for BearKind<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl<R> fmt::Display for BearKind<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Static description shared by all bear variants.
///
/// `Default` builds the analysis state; configuration arrives through the
/// options declared in [`metadata`](Self::metadata).
pub trait BearDefinition<R>: Default + Send + Sync + 'static {
    /// Display name. Defaults to the unqualified type name.
    fn name() -> &'static str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// The bear kinds whose results this bear consumes.
    fn dependencies() -> Vec<BearKind<R>> {
        Vec::new()
    }

    /// The named options of this bear's analysis.
    fn metadata() -> FunctionMetadata {
        FunctionMetadata::default()
    }
}

/// The section, corpus and resolved options an instance is bound to.
#[derive(Debug, Clone)]
pub struct BearBinding {
    pub section: Arc<Section>,
    pub file_dict: Arc<FileDict>,
    pub options: Arc<Options>,
}

impl BearBinding {
    /// Resolve `B`'s options from `section`.
    pub fn resolve<R, B: BearDefinition<R>>(
        section: Arc<Section>,
        file_dict: Arc<FileDict>,
    ) -> Result<Self, CoreError> {
        let options = Options::resolve(B::name(), &section, &B::metadata())?;
        Ok(Self {
            section,
            file_dict,
            options: Arc::new(options),
        })
    }
}

/// Results one dependency produced, together with the instance that
/// produced them.
pub struct DependencyOutput<R> {
    pub bear: BearHandle<R>,
    pub results: Vec<R>,
}

impl<R: 'static> fmt::Debug for DependencyOutput<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyOutput")
            .field("bear", &self.bear)
            .field("results", &self.results.len())
            .finish()
    }
}

/// Results delivered to a bear by its dependencies, keyed by dependency kind.
pub struct DependencyResults<R> {
    by_kind: IndexMap<BearKind<R>, DependencyOutput<R>>,
}

impl<R: 'static> DependencyResults<R> {
    pub fn new() -> Self {
        Self {
            by_kind: IndexMap::new(),
        }
    }

    /// Append `results` produced by `dependency`.
    pub fn extend(&mut self, dependency: &BearHandle<R>, results: impl IntoIterator<Item = R>) {
        self.by_kind
            .entry(dependency.kind())
            .or_insert_with(|| DependencyOutput {
                bear: dependency.clone(),
                results: Vec::new(),
            })
            .results
            .extend(results);
    }

    /// Results of the dependency of kind `kind`, empty if none arrived.
    pub fn results_of(&self, kind: &BearKind<R>) -> &[R] {
        self.by_kind
            .get(kind)
            .map(|output| output.results.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, kind: &BearKind<R>) -> Option<&DependencyOutput<R>> {
        self.by_kind.get(kind)
    }

    /// Iterate in the order dependencies first delivered results.
    pub fn iter(&self) -> impl Iterator<Item = (&BearKind<R>, &DependencyOutput<R>)> {
        self.by_kind.iter()
    }

    /// Total number of result items across all dependencies.
    pub fn total(&self) -> usize {
        self.by_kind.values().map(|output| output.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

impl<R: 'static> Default for DependencyResults<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> fmt::Debug for DependencyResults<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.by_kind.iter()).finish()
    }
}

/// What a single task works on.
pub enum TaskInput<R> {
    /// The whole file dictionary.
    Corpus,
    /// One file.
    File { filename: String, lines: Arc<[String]> },
    /// One result item of one dependency.
    DependencyResult { dependency: BearHandle<R>, result: R },
}

impl<R: 'static> fmt::Debug for TaskInput<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskInput::Corpus => f.write_str("Corpus"),
            TaskInput::File { filename, lines } => f
                .debug_struct("File")
                .field("filename", filename)
                .field("lines", &lines.len())
                .finish(),
            TaskInput::DependencyResult { dependency, .. } => f
                .debug_struct("DependencyResult")
                .field("dependency", dependency)
                .finish_non_exhaustive(),
        }
    }
}

/// One unit of work submitted to the executor.
pub struct Task<R> {
    pub input: TaskInput<R>,
    pub options: Arc<Options>,
    /// Frozen snapshot of everything the bear's dependencies produced.
    pub dependency_results: Arc<DependencyResults<R>>,
}

impl<R: 'static> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("input", &self.input)
            .field("options", &self.options)
            .field("dependency_results", &self.dependency_results)
            .finish()
    }
}

/// Everything an analysis may read besides its task input.
pub struct AnalysisContext<'a, R> {
    pub section: &'a Section,
    pub options: &'a Options,
    pub dependency_results: &'a DependencyResults<R>,
}

impl<'a, R> AnalysisContext<'a, R> {
    pub(crate) fn new(binding: &'a BearBinding, task: &'a Task<R>) -> Self {
        Self {
            section: &binding.section,
            options: &task.options,
            dependency_results: &task.dependency_results,
        }
    }
}

/// The contract the scheduler relies on.
///
/// Bear authors normally implement one of the variant traits instead, which
/// provide this through a runner.
pub trait Bear<R>: Send + Sync + 'static {
    fn kind(&self) -> BearKind<R>;

    fn section(&self) -> &Arc<Section>;

    fn file_dict(&self) -> &Arc<FileDict>;

    fn options(&self) -> &Arc<Options>;

    /// Split the work into tasks. Called once per run, after every
    /// dependency has delivered its results.
    fn generate_tasks(&self, dependency_results: Arc<DependencyResults<R>>) -> Vec<Task<R>>;

    /// Run one task. Called on a worker thread.
    fn execute_task(&self, task: Task<R>) -> Result<Vec<R>, BearError>;
}

/// A shared, identity-compared reference to a bear instance.
pub struct BearHandle<R> {
    id: BearId,
    bear: Arc<dyn Bear<R>>,
}

impl<R: 'static> BearHandle<R> {
    pub fn new(bear: impl Bear<R>) -> Self {
        Self {
            id: BearId::new(),
            bear: Arc::new(bear),
        }
    }

    pub fn id(&self) -> BearId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.bear.kind().name()
    }

    /// Whether both handles are bound to the same section and corpus
    /// objects.
    pub fn same_group(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.section(), other.section())
            && Arc::ptr_eq(self.file_dict(), other.file_dict())
    }
}

impl<R: 'static> Deref for BearHandle<R> {
    type Target = dyn Bear<R>;

    fn deref(&self) -> &Self::Target {
        self.bear.as_ref()
    }
}

impl<R> Clone for BearHandle<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            bear: Arc::clone(&self.bear),
        }
    }
}

impl<R> PartialEq for BearHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for BearHandle<R> {}

impl<R> Hash for BearHandle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<R: 'static> fmt::Debug for BearHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name(), self.id.raw())
    }
}

impl<R: 'static> fmt::Display for BearHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
