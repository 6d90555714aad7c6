//! Dependency Initialization
//!
//! Expands a set of caller-supplied bears with the dependency instances they
//! need and wires everything into a [`DependencyTracker`].
//!
//! # Grouping
//!
//! Bears are grouped by the section and file dictionary they are bound to
//! (compared by `Arc` identity). Within a group there is exactly one
//! instance per bear kind: supplied instances are reused, missing
//! dependencies are constructed once and shared by every consumer in the
//! group. Different groups never share instances.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::bears::{BearHandle, BearKind, ResultItem};
use crate::error::CoreError;
use crate::graph::{traverse_graph, DependencyTracker};
use crate::settings::{FileDict, Section};

type GroupKey = (*const Section, *const FileDict);

/// Build the dependency tracker for `bears` and pick the bears that can run
/// right away.
///
/// Returns the tracker and the entrypoints: every supplied or constructed
/// bear that does not wait on anything, in first-seen order.
pub fn initialize_dependencies<R, I>(
    bears: I,
) -> Result<(DependencyTracker<BearHandle<R>>, Vec<BearHandle<R>>), CoreError>
where
    R: ResultItem,
    I: IntoIterator<Item = BearHandle<R>>,
{
    let mut groups: IndexMap<GroupKey, IndexMap<BearKind<R>, BearHandle<R>>> = IndexMap::new();

    for bear in bears {
        let key = (Arc::as_ptr(bear.section()), Arc::as_ptr(bear.file_dict()));
        let instances = groups.entry(key).or_default();
        match instances.get(&bear.kind()) {
            Some(existing) if *existing != bear => {
                debug!(
                    bear = ?bear,
                    kept = ?existing,
                    "collapsing duplicate bear within its group"
                );
            }
            Some(_) => {}
            None => {
                instances.insert(bear.kind(), bear);
            }
        }
    }

    let mut tracker = DependencyTracker::new();
    let mut all_bears: IndexSet<BearHandle<R>> = IndexSet::new();

    for instances in groups.into_values() {
        let supplied: Vec<BearHandle<R>> = instances.values().cloned().collect();
        all_bears.extend(supplied.iter().cloned());

        let mut group = Group {
            instances,
            minted: Vec::new(),
        };

        traverse_graph(
            supplied,
            |bear: &BearHandle<R>| group.dependencies_of(bear),
            |dependant: &BearHandle<R>, dependency: &BearHandle<R>| {
                tracker.add(dependency.clone(), dependant.clone());
            },
        )?;

        all_bears.extend(group.minted);
    }

    let entrypoints = all_bears
        .into_iter()
        .filter(|bear| !tracker.has_dependencies(bear))
        .collect();

    Ok((tracker, entrypoints))
}

/// Instances of one (section, file dictionary) group.
struct Group<R> {
    instances: IndexMap<BearKind<R>, BearHandle<R>>,
    minted: Vec<BearHandle<R>>,
}

impl<R: ResultItem> Group<R> {
    /// Instances for the declared dependencies of `bear`, constructing
    /// missing ones bound to the same section and corpus.
    fn dependencies_of(&mut self, bear: &BearHandle<R>) -> Result<Vec<BearHandle<R>>, CoreError> {
        let mut resolved = Vec::new();
        let mut seen = HashSet::new();

        for kind in bear.kind().dependencies() {
            if !seen.insert(kind) {
                continue;
            }
            let instance = match self.instances.get(&kind) {
                Some(instance) => instance.clone(),
                None => {
                    let instance =
                        kind.instantiate(Arc::clone(bear.section()), Arc::clone(bear.file_dict()))?;
                    debug!(dependency = ?instance, dependant = ?bear, "instantiated dependency");
                    self.instances.insert(kind, instance.clone());
                    self.minted.push(instance.clone());
                    instance
                }
            };
            resolved.push(instance);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bears::{AnalysisContext, BearDefinition, GlobalBear};
    use crate::error::BearError;

    macro_rules! global_bear {
        ($name:ident, [$($dep:ident),*]) => {
            #[derive(Default)]
            struct $name;

            impl BearDefinition<String> for $name {
                fn dependencies() -> Vec<BearKind<String>> {
                    vec![$($dep::kind()),*]
                }
            }

            impl GlobalBear<String> for $name {
                fn analyze(
                    &self,
                    _: &FileDict,
                    _: &AnalysisContext<'_, String>,
                ) -> Result<Vec<String>, BearError> {
                    Ok(vec![stringify!($name).to_string()])
                }
            }
        };
    }

    global_bear!(Z, []);
    global_bear!(X, [Z]);
    global_bear!(Y, [Z]);
    global_bear!(Top, [X, Y]);
    global_bear!(P, [Q]);
    global_bear!(Q, [P]);

    fn set<const N: usize>(bears: [BearHandle<String>; N]) -> IndexSet<BearHandle<String>> {
        bears.into_iter().collect()
    }

    fn binding() -> (Arc<Section>, Arc<FileDict>) {
        (Arc::new(Section::new("all")), Arc::new(FileDict::new()))
    }

    #[test]
    fn mints_one_shared_dependency_per_group() {
        let (section, files) = binding();
        let x = X::instantiate(section.clone(), files.clone()).unwrap();
        let y = Y::instantiate(section, files).unwrap();

        let (tracker, entrypoints) = initialize_dependencies([x.clone(), y.clone()]).unwrap();

        assert_eq!(entrypoints.len(), 1);
        let z = entrypoints[0].clone();
        assert_eq!(z.kind(), Z::kind());
        assert_eq!(tracker.get_dependants(&z), set([x.clone(), y.clone()]));
        assert!(Arc::ptr_eq(z.section(), x.section()));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn reuses_supplied_dependency_instances() {
        let (section, files) = binding();
        let x = X::instantiate(section.clone(), files.clone()).unwrap();
        let z = Z::instantiate(section, files).unwrap();

        let (tracker, entrypoints) = initialize_dependencies([x.clone(), z.clone()]).unwrap();

        assert_eq!(entrypoints, [z.clone()]);
        assert_eq!(tracker.get_dependencies(&x), set([z]));
    }

    #[test]
    fn groups_do_not_share_dependencies() {
        let files = Arc::new(FileDict::new());
        let x = X::instantiate(Arc::new(Section::new("one")), files.clone()).unwrap();
        let y = Y::instantiate(Arc::new(Section::new("two")), files).unwrap();

        let (tracker, entrypoints) = initialize_dependencies([x.clone(), y.clone()]).unwrap();

        assert_eq!(entrypoints.len(), 2);
        assert!(entrypoints.iter().all(|bear| bear.kind() == Z::kind()));
        assert_ne!(entrypoints[0], entrypoints[1]);
        assert_eq!(tracker.get_dependants(&entrypoints[0]), set([x]));
        assert_eq!(tracker.get_dependants(&entrypoints[1]), set([y]));
    }

    #[test]
    fn transitive_dependencies_are_minted() {
        let (section, files) = binding();
        let top = Top::instantiate(section, files).unwrap();

        let (tracker, entrypoints) = initialize_dependencies([top.clone()]).unwrap();

        assert_eq!(entrypoints.len(), 1);
        assert_eq!(entrypoints[0].kind(), Z::kind());
        let all = tracker.get_all_dependencies(&top).unwrap();
        let kinds: Vec<_> = all.iter().map(|bear| bear.kind().name()).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&"X") && kinds.contains(&"Y") && kinds.contains(&"Z"));
    }

    #[test]
    fn duplicate_kinds_collapse_within_group() {
        let (section, files) = binding();
        let first = Z::instantiate(section.clone(), files.clone()).unwrap();
        let second = Z::instantiate(section, files).unwrap();

        let (tracker, entrypoints) =
            initialize_dependencies([first.clone(), second, first.clone()]).unwrap();

        assert_eq!(entrypoints, [first]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let (section, files) = binding();
        let p = P::instantiate(section, files).unwrap();

        let error = initialize_dependencies([p]).unwrap_err();

        match error {
            CoreError::CircularDependency(cycle) => {
                let names: Vec<_> = cycle
                    .cycle()
                    .iter()
                    .map(|name| name.split('#').next().unwrap_or_default())
                    .collect();
                assert_eq!(names, ["P", "Q", "P"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_bears_no_entrypoints() {
        let (tracker, entrypoints) =
            initialize_dependencies(Vec::<BearHandle<String>>::new()).unwrap();
        assert!(tracker.is_empty());
        assert!(entrypoints.is_empty());
    }
}
