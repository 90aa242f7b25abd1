//! Explicit dependency graph for push-based recomputation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use clipline_common::error::{ClipError, ClipResult};

/// Static description of which derived nodes read which other nodes.
///
/// A derived node may only read nodes declared before it, so the
/// declaration order is a topological order and cycles cannot be built.
#[derive(Debug, Clone)]
pub struct DependencyGraph<K> {
    sources: HashSet<K>,
    inputs: HashMap<K, Vec<K>>,
    dependents: HashMap<K, Vec<K>>,
    /// Derived nodes in declaration order.
    order: Vec<K>,
}

impl<K> Default for DependencyGraph<K> {
    fn default() -> Self {
        Self {
            sources: HashSet::new(),
            inputs: HashMap::new(),
            dependents: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K> DependencyGraph<K>
where
    K: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: K) -> bool {
        self.sources.contains(&key) || self.inputs.contains_key(&key)
    }

    /// Declare a leaf node.
    pub fn add_source(&mut self, key: K) -> ClipResult<()> {
        if self.contains(key) {
            return Err(ClipError::estimate(format!("node {key:?} declared twice")));
        }
        self.sources.insert(key);
        Ok(())
    }

    /// Declare a derived node reading `inputs`, all of which must exist.
    pub fn add_derived(&mut self, key: K, inputs: &[K]) -> ClipResult<()> {
        if self.contains(key) {
            return Err(ClipError::estimate(format!("node {key:?} declared twice")));
        }
        if let Some(missing) = inputs.iter().find(|input| !self.contains(**input)) {
            return Err(ClipError::estimate(format!(
                "node {key:?} reads undeclared node {missing:?}"
            )));
        }

        for input in inputs {
            self.dependents.entry(*input).or_default().push(key);
        }
        self.inputs.insert(key, inputs.to_vec());
        self.order.push(key);
        Ok(())
    }

    pub fn inputs_of(&self, key: K) -> &[K] {
        self.inputs.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_source(&self, key: K) -> bool {
        self.sources.contains(&key)
    }

    /// Every derived node that (transitively) reads `changed`, in the order
    /// they must be recomputed.
    pub fn affected_by(&self, changed: K) -> Vec<K> {
        let mut reached = HashSet::new();
        let mut queue = VecDeque::from([changed]);

        while let Some(key) = queue.pop_front() {
            for dependent in self.dependents.get(&key).into_iter().flatten() {
                if reached.insert(*dependent) {
                    queue.push_back(*dependent);
                }
            }
        }

        self.order
            .iter()
            .copied()
            .filter(|key| reached.contains(key))
            .collect()
    }

    /// All derived nodes in recomputation order.
    pub fn derived_order(&self) -> &[K] {
        &self.order
    }
}
