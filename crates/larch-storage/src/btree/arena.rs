//! Fixed-capacity arena for B-tree nodes.

use larch_common::{LarchError, Result, Value};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

/// Index of a node slot in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A single B-tree node.
///
/// `values` is kept strictly ascending; `children[i]` roots the subtree of
/// keys between `values[i-1]` and `values[i]` (unbounded at the ends), so an
/// internal node has exactly one more child than values. `parent` is a
/// non-owning back link used for upward split and rebalance propagation.
///
/// A node may transiently hold `2t` values right after an insert, before the
/// mandatory split restores the `2t-1` bound.
#[derive(Debug, Default)]
pub struct Node {
    pub(crate) values: Vec<Value>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    fn new() -> Self {
        Self::default()
    }

    /// True when the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Keys held by this node, ascending.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Child slots, one more than `values` unless this is a leaf.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent slot, `None` for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Slot storage guarded by the arena mutex.
///
/// The free stack is initialized with every index so the first checkout
/// hands out the highest slot, matching the cursor order of a bump pool.
pub(crate) struct NodeSlots {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeSlots {
    fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity);
        let mut free = Vec::with_capacity(capacity);
        for i in 0..capacity {
            nodes.push(Node::new());
            free.push(NodeId::new(i));
        }
        Self { nodes, free }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn available(&self) -> usize {
        self.free.len()
    }

    /// Hands out a free slot holding an empty node. Ownership passes to the
    /// caller until the slot is checked back in.
    pub(crate) fn checkout(&mut self) -> Result<NodeId> {
        let id = self.free.pop().ok_or(LarchError::ArenaExhausted {
            capacity: self.capacity(),
        })?;
        trace!(node = %id, "checked out node slot");
        Ok(id)
    }

    /// Returns a slot to the pool. The old contents are discarded and a
    /// brand-new empty node takes their place. Returns `false` as a no-op
    /// when the pool is already at full capacity.
    pub(crate) fn checkin(&mut self, id: NodeId) -> bool {
        if self.free.len() >= self.capacity() {
            return false;
        }
        self.nodes[id.index()] = Node::new();
        self.free.push(id);
        trace!(node = %id, "checked in node slot");
        true
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

/// Shared, bounded pool of pre-allocated node slots.
///
/// Several trees may hold one arena through an `Arc`; the mutex serializes
/// allocation and structural mutation so two trees never touch the same slot
/// concurrently. The arena never grows: exhaustion is a hard
/// [`LarchError::ArenaExhausted`] failure and the caller decides whether to
/// rebuild with a larger pool.
///
/// The arena does no reference counting. A caller must not retain a
/// [`NodeId`] after checking the slot back in.
pub struct NodeArena {
    slots: Mutex<NodeSlots>,
}

impl NodeArena {
    /// Creates an arena with `capacity` pre-allocated node slots.
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "creating node arena");
        Self {
            slots: Mutex::new(NodeSlots::new(capacity)),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.lock().capacity()
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.slots.lock().available()
    }

    /// Checks out an empty node slot.
    pub fn checkout(&self) -> Result<NodeId> {
        self.slots.lock().checkout()
    }

    /// Returns a slot to the pool, installing a fresh empty node.
    pub fn checkin(&self, id: NodeId) -> bool {
        self.slots.lock().checkin(id)
    }

    /// Locks the slot storage for the duration of one tree operation.
    pub(crate) fn lock(&self) -> MutexGuard<'_, NodeSlots> {
        self.slots.lock()
    }
}
