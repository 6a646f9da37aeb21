//! B-tree node algorithms: search, insertion with bottom-up splitting,
//! deletion with sibling rebalancing, and bounded range collection.
//!
//! Every function here operates on slots inside a locked
//! [`NodeSlots`](super::arena::NodeSlots); the caller (the
//! [`BTree`](super::tree::BTree) facade) holds the arena mutex for the whole
//! operation.

use larch_common::{LarchError, Result, Value};
use tracing::trace;

use super::arena::{NodeId, NodeSlots};

/// Where a key lives relative to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Locate {
    /// `values[i]` equals the key.
    Found(usize),
    /// The key sorts into the subtree under `children[i]`.
    Subtree(usize),
    /// The node holds no values at all.
    Empty,
}

/// Linear scan of one node's values.
pub(crate) fn locate(slots: &NodeSlots, id: NodeId, key: &Value) -> Locate {
    let node = slots.node(id);
    if node.values.is_empty() {
        return Locate::Empty;
    }
    for (i, v) in node.values.iter().enumerate() {
        if v == key {
            return Locate::Found(i);
        }
        if key.is_less(v) {
            return Locate::Subtree(i);
        }
    }
    Locate::Subtree(node.values.len())
}

/// Resolves the node holding `key`, descending from `id`.
pub(crate) fn get(slots: &NodeSlots, id: NodeId, key: &Value) -> Option<NodeId> {
    match locate(slots, id, key) {
        Locate::Found(_) => Some(id),
        Locate::Empty => None,
        Locate::Subtree(i) => {
            let child = *slots.node(id).children.get(i)?;
            get(slots, child, key)
        }
    }
}

/// Position of `child` among its parent's child links.
fn child_position(slots: &NodeSlots, parent: NodeId, child: NodeId) -> Option<usize> {
    slots.node(parent).children.iter().position(|&c| c == child)
}

// =============================================================================
// Insertion
// =============================================================================

/// Inserts `key` into the subtree rooted at `id`, splitting overfull nodes
/// bottom-up through parent links.
///
/// Returns the topmost node touched by split propagation (possibly a brand
/// new root) plus the value replaced in place, `None` on a true insert.
pub(crate) fn insert(
    slots: &mut NodeSlots,
    id: NodeId,
    key: Value,
    max_values: usize,
) -> Result<(NodeId, Option<Value>)> {
    match locate(slots, id, &key) {
        Locate::Found(i) => {
            let old = std::mem::replace(&mut slots.node_mut(id).values[i], key);
            Ok((id, Some(old)))
        }
        Locate::Empty => {
            // A node with no values has no children either; this is the
            // first key of a fresh root.
            slots.node_mut(id).values.push(key);
            Ok((id, None))
        }
        Locate::Subtree(i) => match slots.node(id).children.get(i).copied() {
            Some(child) => insert(slots, child, key, max_values),
            None => {
                // Leaf. Reserve arena capacity for the worst-case split
                // cascade first, so a failed insert leaves no mutation.
                ensure_split_capacity(slots, id, max_values)?;
                slots.node_mut(id).values.insert(i, key);
                let top = split_propagate(slots, id, max_values)?;
                Ok((top, None))
            }
        },
    }
}

/// Checks that enough free slots exist for every split this insert can
/// trigger: one per overflowing ancestor plus one if a new root is grown.
fn ensure_split_capacity(slots: &NodeSlots, leaf: NodeId, max_values: usize) -> Result<()> {
    if slots.node(leaf).values.len() + 1 < max_values {
        return Ok(());
    }
    let mut needed = 1;
    let mut cur = leaf;
    loop {
        match slots.node(cur).parent {
            Some(parent) => {
                if slots.node(parent).values.len() + 1 < max_values {
                    break;
                }
                needed += 1;
                cur = parent;
            }
            None => {
                needed += 1; // the split reaches the root and grows a new one
                break;
            }
        }
    }
    if slots.available() < needed {
        return Err(LarchError::ArenaExhausted {
            capacity: slots.capacity(),
        });
    }
    Ok(())
}

/// Restores the overflow invariant from `id` upward: while a node holds
/// `max_values` keys, split it and push the median into its parent,
/// growing a new root if the overfull node has none.
///
/// Returns the topmost node the propagation reached.
pub(crate) fn split_propagate(
    slots: &mut NodeSlots,
    id: NodeId,
    max_values: usize,
) -> Result<NodeId> {
    if slots.node(id).values.len() < max_values {
        return Ok(id);
    }
    let parent = slots.node(id).parent;
    let (median, right) = split(slots, id, max_values / 2)?;
    trace!(node = %id, right = %right, "split overfull node");
    match parent {
        None => {
            let root = slots.checkout()?;
            {
                let r = slots.node_mut(root);
                r.values.push(median);
                r.children.push(id);
                r.children.push(right);
            }
            slots.node_mut(id).parent = Some(root);
            slots.node_mut(right).parent = Some(root);
            trace!(root = %root, "grew a new root");
            Ok(root)
        }
        Some(parent_id) => {
            let pos = child_position(slots, parent_id, id).ok_or_else(|| {
                LarchError::TreeCorrupted(format!("node {id} missing from parent {parent_id}"))
            })?;
            let p = slots.node_mut(parent_id);
            p.values.insert(pos, median);
            p.children.insert(pos + 1, right);
            slots.node_mut(right).parent = Some(parent_id);
            split_propagate(slots, parent_id, max_values)
        }
    }
}

/// Splits `id` at `median_index`: the median pops out, everything after it
/// moves into a freshly checked-out right half, and the moved children are
/// re-parented to that half. The right half is linked in by the caller.
pub(crate) fn split(
    slots: &mut NodeSlots,
    id: NodeId,
    median_index: usize,
) -> Result<(Value, NodeId)> {
    let right_id = slots.checkout()?;
    let node = slots.node_mut(id);
    let right_values: Vec<Value> = node.values.drain(median_index + 1..).collect();
    let median = match node.values.pop() {
        Some(v) => v,
        None => {
            return Err(LarchError::TreeCorrupted(format!(
                "split of an empty node {id}"
            )))
        }
    };
    let right_children: Vec<NodeId> = if node.children.is_empty() {
        Vec::new()
    } else {
        node.children.drain(median_index + 1..).collect()
    };
    for &child in &right_children {
        slots.node_mut(child).parent = Some(right_id);
    }
    let right = slots.node_mut(right_id);
    right.values = right_values;
    right.children = right_children;
    Ok((median, right_id))
}

// =============================================================================
// Deletion
// =============================================================================

/// Removes `key` from the subtree rooted at `id`, rebalancing underfull
/// nodes bottom-up. Returns the removed value, `None` when absent.
pub(crate) fn remove(
    slots: &mut NodeSlots,
    id: NodeId,
    key: &Value,
    min_values: usize,
) -> Option<Value> {
    match locate(slots, id, key) {
        Locate::Empty => None,
        Locate::Subtree(i) => {
            let child = slots.node(id).children.get(i).copied()?;
            remove(slots, child, key, min_values)
        }
        Locate::Found(i) => {
            if slots.node(id).is_leaf() {
                let out = slots.node_mut(id).values.remove(i);
                rebalance_upward(slots, id, min_values);
                Some(out)
            } else {
                remove_internal(slots, id, i, min_values)
            }
        }
    }
}

/// An internal key separates two subtrees and cannot be removed in place.
/// The boundary key of the richer flanking child is promoted into its slot,
/// then removed from the subtree it came from.
fn remove_internal(
    slots: &mut NodeSlots,
    id: NodeId,
    i: usize,
    min_values: usize,
) -> Option<Value> {
    let (left, right) = {
        let node = slots.node(id);
        (node.children[i], node.children[i + 1])
    };
    let left_len = slots.node(left).values.len();
    let right_len = slots.node(right).values.len();
    // Ties favor the successor side.
    let (donor, boundary) = if right_len >= left_len {
        (right, min_value(slots, right))
    } else {
        (left, max_value(slots, left))
    };
    let old = std::mem::replace(&mut slots.node_mut(id).values[i], boundary.clone());
    let moved = remove(slots, donor, &boundary, min_values);
    debug_assert!(moved.is_some(), "boundary key missing from donor subtree");
    Some(old)
}

/// Smallest key in the subtree rooted at `id`.
pub(crate) fn min_value(slots: &NodeSlots, mut id: NodeId) -> Value {
    loop {
        let node = slots.node(id);
        match node.children.first() {
            Some(&child) => id = child,
            None => return node.values[0].clone(),
        }
    }
}

/// Largest key in the subtree rooted at `id`.
pub(crate) fn max_value(slots: &NodeSlots, mut id: NodeId) -> Value {
    loop {
        let node = slots.node(id);
        match node.children.last() {
            Some(&child) => id = child,
            None => return node.values[node.values.len() - 1].clone(),
        }
    }
}

/// Restores the minimum-fill invariant from `id` upward. A sibling with
/// surplus lends one key through the parent separator; otherwise the node
/// merges with a sibling, which can leave the parent underfull in turn, so
/// the check climbs the parent chain.
fn rebalance_upward(slots: &mut NodeSlots, mut id: NodeId, min_values: usize) {
    loop {
        if slots.node(id).values.len() >= min_values {
            return;
        }
        let Some(parent) = slots.node(id).parent else {
            return; // the root is exempt from the minimum fill
        };
        let Some(idx) = child_position(slots, parent, id) else {
            debug_assert!(false, "node {id} missing from parent {parent}");
            return;
        };
        let (left, right) = {
            let p = slots.node(parent);
            let left = if idx > 0 {
                Some(p.children[idx - 1])
            } else {
                None
            };
            (left, p.children.get(idx + 1).copied())
        };
        let left_len = left.map_or(0, |l| slots.node(l).values.len());
        let right_len = right.map_or(0, |r| slots.node(r).values.len());
        let can_left = left.is_some() && left_len > min_values;
        let can_right = right.is_some() && right_len > min_values;

        // Borrow from the richer sibling; equal surplus favors the right.
        if can_right && (!can_left || right_len >= left_len) {
            borrow_from_right(slots, parent, idx);
            return;
        }
        if can_left {
            borrow_from_left(slots, parent, idx);
            return;
        }

        // Neither sibling can lend: merge, preferring the right one.
        if right.is_some() {
            merge_children(slots, parent, idx);
        } else if left.is_some() {
            merge_children(slots, parent, idx - 1);
        } else {
            debug_assert!(false, "underfull node {id} has no siblings");
            return;
        }
        id = parent;
    }
}

/// Rotates one key from the right sibling: the parent separator drops into
/// the underfull child and the sibling's first key replaces it. The
/// sibling's first child link moves along when the nodes are internal.
fn borrow_from_right(slots: &mut NodeSlots, parent: NodeId, idx: usize) {
    let (child, sibling) = {
        let p = slots.node(parent);
        (p.children[idx], p.children[idx + 1])
    };
    let stolen = slots.node_mut(sibling).values.remove(0);
    let sep = std::mem::replace(&mut slots.node_mut(parent).values[idx], stolen);
    slots.node_mut(child).values.push(sep);
    if !slots.node(sibling).children.is_empty() {
        let moved = slots.node_mut(sibling).children.remove(0);
        slots.node_mut(moved).parent = Some(child);
        slots.node_mut(child).children.push(moved);
    }
    trace!(child = %child, sibling = %sibling, "borrowed from right sibling");
}

/// Mirror of [`borrow_from_right`] for the left sibling.
fn borrow_from_left(slots: &mut NodeSlots, parent: NodeId, idx: usize) {
    let (child, sibling) = {
        let p = slots.node(parent);
        (p.children[idx], p.children[idx - 1])
    };
    let stolen = {
        let s = slots.node_mut(sibling);
        let last = s.values.len() - 1;
        s.values.remove(last)
    };
    let sep = std::mem::replace(&mut slots.node_mut(parent).values[idx - 1], stolen);
    slots.node_mut(child).values.insert(0, sep);
    if !slots.node(sibling).children.is_empty() {
        let moved = {
            let s = slots.node_mut(sibling);
            let last = s.children.len() - 1;
            s.children.remove(last)
        };
        slots.node_mut(moved).parent = Some(child);
        slots.node_mut(child).children.insert(0, moved);
    }
    trace!(child = %child, sibling = %sibling, "borrowed from left sibling");
}

/// Merges `children[sep + 1]` into `children[sep]`, pulling the separator
/// down between them. The absorbed node goes back to the arena.
fn merge_children(slots: &mut NodeSlots, parent: NodeId, sep: usize) {
    let (left, right) = {
        let p = slots.node(parent);
        (p.children[sep], p.children[sep + 1])
    };
    let sep_value = slots.node_mut(parent).values.remove(sep);
    slots.node_mut(parent).children.remove(sep + 1);

    let (mut moved_values, moved_children) = {
        let r = slots.node_mut(right);
        (
            std::mem::take(&mut r.values),
            std::mem::take(&mut r.children),
        )
    };
    for &child in &moved_children {
        slots.node_mut(child).parent = Some(left);
    }
    let l = slots.node_mut(left);
    l.values.push(sep_value);
    l.values.append(&mut moved_values);
    l.children.extend(moved_children);

    slots.checkin(right);
    trace!(left = %left, right = %right, "merged siblings");
}

// =============================================================================
// Range Iteration
// =============================================================================

fn above_start(v: &Value, start: &Value, include_start: bool) -> bool {
    start.is_null() || start.is_less(v) || (include_start && v == start)
}

fn below_end(v: &Value, end: &Value, include_end: bool) -> bool {
    end.is_null() || v.is_less(end) || (include_end && v == end)
}

/// Collects the keys inside the window in ascending order via a bounded
/// in-order walk. A `Null` bound is unbounded on that side.
pub(crate) fn collect_range(
    slots: &NodeSlots,
    id: NodeId,
    start: &Value,
    end: &Value,
    include_start: bool,
    include_end: bool,
    out: &mut Vec<Value>,
) {
    let node = slots.node(id);
    if node.values.is_empty() {
        return;
    }
    if node.is_leaf() {
        // Prune the whole leaf when its key range misses the window.
        let first = &node.values[0];
        let last = &node.values[node.values.len() - 1];
        if !above_start(last, start, include_start) || !below_end(first, end, include_end) {
            return;
        }
        for v in &node.values {
            if !below_end(v, end, include_end) {
                return;
            }
            if above_start(v, start, include_start) {
                out.push(v.clone());
            }
        }
        return;
    }
    for i in 0..node.values.len() {
        let v = &node.values[i];
        // children[i] holds keys below values[i]; skip the subtree when
        // none of them can reach the start bound.
        if start.is_null() || start.is_less(v) {
            collect_range(
                slots,
                node.children[i],
                start,
                end,
                include_start,
                include_end,
                out,
            );
        }
        if !below_end(v, end, include_end) {
            return;
        }
        if above_start(v, start, include_start) {
            out.push(v.clone());
        }
        if !end.is_null() && !v.is_less(end) {
            // v sits on the inclusive end; nothing further qualifies.
            return;
        }
    }
    if let Some(&last) = node.children.last() {
        collect_range(slots, last, start, end, include_start, include_end, out);
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Walks the subtree under `id` checking every structural invariant:
/// strictly ascending values, fill bounds, the child/value count relation,
/// parent links, separator bounds, and uniform leaf depth. Returns the
/// subtree height.
pub(crate) fn validate(
    slots: &NodeSlots,
    id: NodeId,
    min_values: usize,
    max_values: usize,
    expected_parent: Option<NodeId>,
    lower: Option<&Value>,
    upper: Option<&Value>,
) -> Result<usize> {
    let node = slots.node(id);
    if node.parent != expected_parent {
        return Err(LarchError::TreeCorrupted(format!(
            "node {id} has a stale parent link"
        )));
    }
    let n = node.values.len();
    if n == 0 {
        if expected_parent.is_none() && node.children.is_empty() {
            return Ok(1);
        }
        return Err(LarchError::TreeCorrupted(format!(
            "node {id} holds no values"
        )));
    }
    if expected_parent.is_some() && n < min_values {
        return Err(LarchError::TreeCorrupted(format!(
            "node {id} is underfull: {n} values"
        )));
    }
    if n >= max_values {
        return Err(LarchError::TreeCorrupted(format!(
            "node {id} is overfull: {n} values"
        )));
    }
    for pair in node.values.windows(2) {
        if !pair[0].is_less(&pair[1]) {
            return Err(LarchError::TreeCorrupted(format!(
                "node {id} values are not strictly ascending"
            )));
        }
    }
    if let Some(lo) = lower {
        if !lo.is_less(&node.values[0]) {
            return Err(LarchError::TreeCorrupted(format!(
                "node {id} violates its lower separator bound"
            )));
        }
    }
    if let Some(hi) = upper {
        if !node.values[n - 1].is_less(hi) {
            return Err(LarchError::TreeCorrupted(format!(
                "node {id} violates its upper separator bound"
            )));
        }
    }
    if node.children.is_empty() {
        return Ok(1);
    }
    if node.children.len() != n + 1 {
        return Err(LarchError::TreeCorrupted(format!(
            "node {id} child count mismatch: {} children for {n} values",
            node.children.len()
        )));
    }
    let mut depth: Option<usize> = None;
    for i in 0..=n {
        let lo = if i == 0 { lower } else { Some(&node.values[i - 1]) };
        let hi = if i == n { upper } else { Some(&node.values[i]) };
        let child_depth = validate(
            slots,
            node.children[i],
            min_values,
            max_values,
            Some(id),
            lo,
            hi,
        )?;
        match depth {
            None => depth = Some(child_depth),
            Some(previous) if previous != child_depth => {
                return Err(LarchError::TreeCorrupted(format!(
                    "node {id} has children of uneven depth"
                )));
            }
            _ => {}
        }
    }
    Ok(depth.unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::arena::NodeArena;

    fn int(v: i32) -> Value {
        Value::Int32(v)
    }

    #[test]
    fn test_locate_on_leaf() {
        let arena = NodeArena::new(4);
        let id = arena.checkout().unwrap();
        let mut slots = arena.lock();
        slots.node_mut(id).values = vec![int(10), int(20), int(30)];

        assert_eq!(locate(&slots, id, &int(20)), Locate::Found(1));
        assert_eq!(locate(&slots, id, &int(5)), Locate::Subtree(0));
        assert_eq!(locate(&slots, id, &int(25)), Locate::Subtree(2));
        assert_eq!(locate(&slots, id, &int(99)), Locate::Subtree(3));
    }

    #[test]
    fn test_locate_on_empty_node() {
        let arena = NodeArena::new(4);
        let id = arena.checkout().unwrap();
        let slots = arena.lock();
        assert_eq!(locate(&slots, id, &int(1)), Locate::Empty);
    }

    #[test]
    fn test_split_moves_tail_and_reparents() {
        let arena = NodeArena::new(9);
        let parent = arena.checkout().unwrap();
        let kids: Vec<NodeId> = (0..7).map(|_| arena.checkout().unwrap()).collect();
        let mut slots = arena.lock();
        {
            let p = slots.node_mut(parent);
            p.values = (0..6).map(int).collect();
            p.children = kids.clone();
        }
        for &k in &kids {
            slots.node_mut(k).parent = Some(parent);
        }

        let (median, right) = split(&mut slots, parent, 3).unwrap();
        assert_eq!(median, int(3));
        assert_eq!(slots.node(parent).values(), &[int(0), int(1), int(2)]);
        assert_eq!(slots.node(right).values(), &[int(4), int(5)]);
        assert_eq!(slots.node(parent).children(), &kids[..4]);
        assert_eq!(slots.node(right).children(), &kids[4..]);
        for &k in &kids[4..] {
            assert_eq!(slots.node(k).parent(), Some(right));
        }
        for &k in &kids[..4] {
            assert_eq!(slots.node(k).parent(), Some(parent));
        }
    }

    #[test]
    fn test_insert_splits_overfull_leaf_into_new_root() {
        // Degree 3: overflow threshold is 6 values.
        let arena = NodeArena::new(8);
        let root = arena.checkout().unwrap();
        let mut slots = arena.lock();

        let mut top = root;
        for v in 0..6 {
            let (t, replaced) = insert(&mut slots, top, int(v), 6).unwrap();
            assert!(replaced.is_none());
            top = t;
        }
        // The sixth insert overflowed the leaf and grew a root.
        assert_ne!(top, root);
        assert_eq!(slots.node(top).values(), &[int(3)]);
        assert_eq!(slots.node(top).children().len(), 2);
        assert_eq!(slots.node(root).parent(), Some(top));
        validate(&slots, top, 2, 6, None, None, None).unwrap();
    }

    #[test]
    fn test_insert_replaces_equal_key() {
        let arena = NodeArena::new(4);
        let root = arena.checkout().unwrap();
        let mut slots = arena.lock();
        insert(&mut slots, root, int(7), 6).unwrap();
        let (top, replaced) = insert(&mut slots, root, int(7), 6).unwrap();
        assert_eq!(top, root);
        assert_eq!(replaced, Some(int(7)));
        assert_eq!(slots.node(root).values().len(), 1);
    }

    #[test]
    fn test_get_descends_to_the_holding_node() {
        let arena = NodeArena::new(8);
        let root = arena.checkout().unwrap();
        let mut slots = arena.lock();
        let mut top = root;
        for v in 0..10 {
            top = insert(&mut slots, top, int(v), 6).unwrap().0;
            while let Some(p) = slots.node(top).parent() {
                top = p;
            }
        }
        for v in 0..10 {
            let holder = get(&slots, top, &int(v)).unwrap();
            assert!(slots.node(holder).values().contains(&int(v)));
        }
        assert!(get(&slots, top, &int(42)).is_none());
    }
}
