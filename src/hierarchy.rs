//! State topology: an arena of state nodes linked to their superstates by index.
//!
//! The hierarchy is built once, validated (single top, no cycles, bounded
//! nesting) and never changes afterwards. Everything the engine needs to know
//! about the shape of the tree lives here: ancestor walks, least common
//! ancestor distances and the entry/exit paths traced during a transition.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::Error;

/// Nesting limit used when the builder is not told otherwise. Top counts as
/// the first level.
pub const DEFAULT_MAX_NESTING: usize = 8;

#[derive(Debug, Clone)]
struct Node<S> {
    id: S,
    name: String,
    parent: Option<usize>,
    depth: usize,
}

/// Immutable state tree rooted at the top state.
#[derive(Debug, Clone)]
pub struct Hierarchy<S> {
    nodes: Vec<Node<S>>,
    index: HashMap<S, usize>,
    max_nesting: usize,
    // exit_levels[source * len + target]
    exit_levels: Vec<usize>,
}

impl<S> Hierarchy<S>
where
    S: Clone + Debug + Eq + Hash,
{
    /// Build a hierarchy from a top state and `(state, superstate)` pairs.
    ///
    /// State names default to the `Debug` rendering of the id.
    pub fn new<I>(top: S, states: I, max_nesting: usize) -> Result<Self, Error<S>>
    where
        I: IntoIterator<Item = (S, S)>,
    {
        let top_name = format!("{:?}", top);
        let states = states
            .into_iter()
            .map(|(state, parent)| {
                let name = format!("{:?}", state);
                (state, name, parent)
            })
            .collect();
        Self::with_names((top, top_name), states, max_nesting)
    }

    pub(crate) fn with_names(
        top: (S, String),
        states: Vec<(S, String, S)>,
        max_nesting: usize,
    ) -> Result<Self, Error<S>> {
        let (top_id, top_name) = top;
        let mut nodes = Vec::with_capacity(states.len() + 1);
        let mut index = HashMap::with_capacity(states.len() + 1);

        index.insert(top_id.clone(), 0);
        nodes.push(Node {
            id: top_id,
            name: top_name,
            parent: None,
            depth: 1,
        });

        for (id, name, _) in &states {
            if index.contains_key(id) {
                return Err(Error::DuplicateState(id.clone()));
            }
            index.insert(id.clone(), nodes.len());
            nodes.push(Node {
                id: id.clone(),
                name: name.clone(),
                parent: None,
                depth: 0,
            });
        }

        for (i, (id, _, parent)) in states.iter().enumerate() {
            let parent_idx = index.get(parent).copied().ok_or_else(|| Error::UnknownSuperstate {
                state: id.clone(),
                superstate: parent.clone(),
            })?;
            nodes[i + 1].parent = Some(parent_idx);
        }

        // Depth of every node; a walk longer than the node count never reaches top.
        for i in 1..nodes.len() {
            let mut depth = 1;
            let mut cursor = i;
            while let Some(parent) = nodes[cursor].parent {
                depth += 1;
                cursor = parent;
                if depth > nodes.len() {
                    return Err(Error::CyclicHierarchy(nodes[i].id.clone()));
                }
            }
            if cursor != 0 {
                return Err(Error::CyclicHierarchy(nodes[i].id.clone()));
            }
            if depth > max_nesting {
                return Err(Error::NestingTooDeep {
                    state: nodes[i].id.clone(),
                    depth,
                    limit: max_nesting,
                });
            }
            nodes[i].depth = depth;
        }

        let mut hierarchy = Self {
            nodes,
            index,
            max_nesting,
            exit_levels: Vec::new(),
        };

        let len = hierarchy.nodes.len();
        let mut table = Vec::with_capacity(len * len);
        for source in 0..len {
            for target in 0..len {
                table.push(hierarchy.lca_distance_idx(source, target));
            }
        }
        hierarchy.exit_levels = table;

        Ok(hierarchy)
    }

    /// The top state
    pub fn top(&self) -> &S {
        &self.nodes[0].id
    }

    /// Number of states, top included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a hierarchy holds at least the top state
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Configured nesting limit
    pub fn max_nesting(&self) -> usize {
        self.max_nesting
    }

    /// Whether `state` belongs to this hierarchy
    pub fn contains(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// All states in registration order, top first
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Diagnostic name of a state
    pub fn name(&self, state: &S) -> Option<&str> {
        self.index.get(state).map(|&i| self.nodes[i].name.as_str())
    }

    /// Direct superstate, `None` for top or unknown states
    pub fn parent(&self, state: &S) -> Option<&S> {
        let idx = *self.index.get(state)?;
        self.nodes[idx].parent.map(|p| &self.nodes[p].id)
    }

    /// Direct substates of `state`
    pub fn substates<'a>(&'a self, state: &S) -> impl Iterator<Item = &'a S> + 'a {
        let idx = self.index.get(state).copied();
        self.nodes
            .iter()
            .filter(move |n| idx.is_some() && n.parent == idx)
            .map(|n| &n.id)
    }

    /// Nesting depth, top being 1
    pub fn depth(&self, state: &S) -> Option<usize> {
        self.index.get(state).map(|&i| self.nodes[i].depth)
    }

    /// `state` followed by each of its superstates up to and including top
    pub fn ancestors<'a>(&'a self, state: &S) -> impl Iterator<Item = &'a S> + 'a {
        let mut cursor = self.index.get(state).copied();
        std::iter::from_fn(move || {
            let idx = cursor?;
            cursor = self.nodes[idx].parent;
            Some(&self.nodes[idx].id)
        })
    }

    /// True if `ancestor` is `state` itself or one of its superstates
    pub fn is_ancestor(&self, ancestor: &S, state: &S) -> bool {
        match (self.index.get(ancestor), self.index.get(state)) {
            (Some(&a), Some(&s)) => self.is_ancestor_idx(a, s),
            _ => false,
        }
    }

    /// Least common ancestor of two states
    pub fn lca(&self, a: &S, b: &S) -> Result<&S, Error<S>> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        let mut cursor = Some(a);
        while let Some(idx) = cursor {
            if self.is_ancestor_idx(idx, b) {
                return Ok(&self.nodes[idx].id);
            }
            cursor = self.nodes[idx].parent;
        }
        Ok(self.top())
    }

    /// Number of levels to exit from `source` to reach the least common
    /// ancestor of `source` and `target`. A self-transition counts as one
    /// level: the state is exited and entered again.
    pub fn lca_distance(&self, source: &S, target: &S) -> Result<usize, Error<S>> {
        let source = self.index_of(source)?;
        let target = self.index_of(target)?;
        Ok(self.exit_levels(source, target))
    }

    /// States to enter when moving from `stop` down to `target`, outermost
    /// first. `stop` itself is not included.
    pub fn entry_path(&self, target: &S, stop: &S) -> Result<Vec<S>, Error<S>> {
        let path = self.entry_path_idx(self.index_of(target)?, self.index_of(stop)?)?;
        Ok(path.into_iter().map(|i| self.nodes[i].id.clone()).collect())
    }

    /// States to exit when leaving `from` up to `stop`, innermost first.
    /// `stop` itself is not included.
    pub fn exit_path(&self, from: &S, stop: &S) -> Result<Vec<S>, Error<S>> {
        let path = self.path_up(self.index_of(from)?, self.index_of(stop)?)?;
        Ok(path.into_iter().map(|i| self.nodes[i].id.clone()).collect())
    }

    pub(crate) fn index_of(&self, state: &S) -> Result<usize, Error<S>> {
        self.index
            .get(state)
            .copied()
            .ok_or_else(|| Error::StateNotRegistered(state.clone()))
    }

    pub(crate) fn id(&self, idx: usize) -> &S {
        &self.nodes[idx].id
    }

    pub(crate) fn name_of(&self, idx: usize) -> &str {
        &self.nodes[idx].name
    }

    pub(crate) fn parent_idx(&self, idx: usize) -> Option<usize> {
        self.nodes[idx].parent
    }

    pub(crate) fn exit_levels(&self, source: usize, target: usize) -> usize {
        self.exit_levels[source * self.nodes.len() + target]
    }

    pub(crate) fn is_ancestor_idx(&self, ancestor: usize, state: usize) -> bool {
        let mut cursor = Some(state);
        while let Some(idx) = cursor {
            if idx == ancestor {
                return true;
            }
            cursor = self.nodes[idx].parent;
        }
        false
    }

    pub(crate) fn entry_path_idx(
        &self,
        target: usize,
        stop: usize,
    ) -> Result<Vec<usize>, Error<S>> {
        let mut path = self.path_up(target, stop)?;
        path.reverse();
        Ok(path)
    }

    /// Walk from `from` toward top, collecting every state before `stop`.
    pub(crate) fn path_up(&self, from: usize, stop: usize) -> Result<Vec<usize>, Error<S>> {
        let mut path = Vec::new();
        let mut cursor = from;
        while cursor != stop {
            if path.len() >= self.max_nesting {
                return Err(Error::NestingExceeded {
                    from: self.nodes[from].id.clone(),
                    limit: self.max_nesting,
                });
            }
            path.push(cursor);
            cursor = self.nodes[cursor].parent.ok_or_else(|| Error::NotAnAncestor {
                state: self.nodes[from].id.clone(),
                ancestor: self.nodes[stop].id.clone(),
            })?;
        }
        Ok(path)
    }

    fn lca_distance_idx(&self, source: usize, target: usize) -> usize {
        if source == target {
            return 1;
        }
        let mut levels = 0;
        let mut s = Some(source);
        while let Some(si) = s {
            let mut t = Some(target);
            while let Some(ti) = t {
                if si == ti {
                    return levels;
                }
                t = self.nodes[ti].parent;
            }
            levels += 1;
            s = self.nodes[si].parent;
        }
        levels
    }
}
