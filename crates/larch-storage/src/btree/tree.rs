//! B-tree facade over the shared node arena.

use std::sync::Arc;

use larch_common::{IndexConfig, LarchError, Result, Value};
use tracing::debug;

use super::arena::{NodeArena, NodeId};
use super::node;

/// Balanced multi-way search tree of degree `t` over [`Value`] keys.
///
/// Every node holds at most `2t-1` keys and every non-root node at least
/// `t-1`. Nodes live in a [`NodeArena`] that several trees may share; one
/// tree operation holds the arena mutex from start to finish, so trees
/// sharing a pool write safely, one at a time.
///
/// Keys are unique under [`Value`] equality: inserting an equal key replaces
/// the stored one in place.
pub struct BTree {
    arena: Arc<NodeArena>,
    root: Option<NodeId>,
    degree: usize,
    length: usize,
}

impl BTree {
    /// Creates an empty tree of the given degree (`t >= 2`).
    pub fn new(degree: usize, arena: Arc<NodeArena>) -> Result<Self> {
        if degree < 2 {
            return Err(LarchError::InvalidParameter {
                name: "degree".to_string(),
                value: degree.to_string(),
            });
        }
        Ok(Self {
            arena,
            root: None,
            degree,
            length: 0,
        })
    }

    /// Builds a tree with a dedicated arena sized by `config`.
    pub fn from_config(config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let arena = Arc::new(NodeArena::new(config.arena_capacity));
        Self::new(config.degree, arena)
    }

    /// The branching degree `t`.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Overflow threshold passed to the insert path: one past the `2t-1`
    /// steady-state node capacity.
    pub fn max_values(&self) -> usize {
        self.degree * 2
    }

    /// Minimum key count for every non-root node.
    pub fn min_values(&self) -> usize {
        self.degree - 1
    }

    /// Number of keys in the tree.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The arena this tree allocates from.
    pub fn arena(&self) -> &Arc<NodeArena> {
        &self.arena
    }

    /// Inserts `key`, replacing an equal stored key in place. Returns the
    /// replaced value, `None` on a true insert.
    ///
    /// Fails with [`LarchError::ArenaExhausted`] when the arena cannot cover
    /// the splits the insert would trigger; the tree is left unchanged.
    pub fn insert_or_replace(&mut self, key: Value) -> Result<Option<Value>> {
        let mut slots = self.arena.lock();
        let root = match self.root {
            Some(root) => root,
            None => {
                let root = slots.checkout()?;
                self.root = Some(root);
                root
            }
        };
        let (top, replaced) = node::insert(&mut slots, root, key, self.max_values())?;
        // Splits may have grown new ancestors above the returned node;
        // re-walk the parent links to refresh the root pointer.
        let mut new_root = top;
        while let Some(parent) = slots.node(new_root).parent() {
            new_root = parent;
        }
        if self.root != Some(new_root) {
            debug!(root = %new_root, "tree root changed");
            self.root = Some(new_root);
        }
        if replaced.is_none() {
            self.length += 1;
        }
        Ok(replaced)
    }

    /// Removes `key`. Returns the stored value, `None` when absent.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let root = self.root?;
        let mut slots = self.arena.lock();
        let removed = node::remove(&mut slots, root, key, self.min_values());
        if removed.is_some() {
            self.length -= 1;
            if slots.node(root).values().is_empty() {
                // A merge chain drained the root: promote its sole child,
                // or release the last node of a now-empty tree.
                match slots.node(root).children().first().copied() {
                    Some(child) => {
                        slots.node_mut(child).parent = None;
                        slots.checkin(root);
                        self.root = Some(child);
                        debug!(root = %child, "tree root collapsed");
                    }
                    None => {
                        slots.checkin(root);
                        self.root = None;
                    }
                }
            }
        }
        removed
    }

    /// Returns a clone of the stored key equal to `key`.
    ///
    /// The `Null` sentinel is never a stored key, so it always misses.
    pub fn get(&self, key: &Value) -> Option<Value> {
        if key.is_null() {
            return None;
        }
        let root = self.root?;
        let slots = self.arena.lock();
        let holder = node::get(&slots, root, key)?;
        slots
            .node(holder)
            .values()
            .iter()
            .find(|v| *v == key)
            .cloned()
    }

    /// True when an equal key is stored.
    pub fn contains(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// Collects the keys inside the window in ascending order. A
    /// [`Value::Null`] bound is unbounded on that side.
    pub fn range(
        &self,
        start: &Value,
        end: &Value,
        include_start: bool,
        include_end: bool,
    ) -> Vec<Value> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let slots = self.arena.lock();
        let mut out = Vec::new();
        node::collect_range(&slots, root, start, end, include_start, include_end, &mut out);
        out
    }

    /// Smallest key in the tree.
    pub fn min(&self) -> Option<Value> {
        let root = self.root?;
        let slots = self.arena.lock();
        if slots.node(root).values().is_empty() {
            return None;
        }
        Some(node::min_value(&slots, root))
    }

    /// Largest key in the tree.
    pub fn max(&self) -> Option<Value> {
        let root = self.root?;
        let slots = self.arena.lock();
        if slots.node(root).values().is_empty() {
            return None;
        }
        Some(node::max_value(&slots, root))
    }

    /// Removes and returns the smallest key.
    pub fn remove_min(&mut self) -> Option<Value> {
        let smallest = self.min()?;
        self.remove(&smallest)
    }

    /// Removes and returns the largest key.
    pub fn remove_max(&mut self) -> Option<Value> {
        let largest = self.max()?;
        self.remove(&largest)
    }

    /// Replaces `old` with `new`: a removal followed by an insert. Returns
    /// the removed value, `None` when `old` was absent.
    pub fn update(&mut self, old: &Value, new: Value) -> Result<Option<Value>> {
        let removed = self.remove(old);
        self.insert_or_replace(new)?;
        Ok(removed)
    }

    /// Walks the whole tree checking the structural invariants: strictly
    /// ascending values, fill bounds, child/value count relation, parent
    /// links, and uniform leaf depth. Intended for tests and debugging;
    /// violations surface as [`LarchError::TreeCorrupted`].
    pub fn check_invariants(&self) -> Result<()> {
        let Some(root) = self.root else {
            if self.length != 0 {
                return Err(LarchError::TreeCorrupted(format!(
                    "empty tree reports {} keys",
                    self.length
                )));
            }
            return Ok(());
        };
        let slots = self.arena.lock();
        node::validate(
            &slots,
            root,
            self.min_values(),
            self.max_values(),
            None,
            None,
            None,
        )?;
        Ok(())
    }
}
