//! B-tree index over polymorphic values with an arena-backed node pool.
//!
//! The index is an in-memory B-tree of degree `t`: every node holds at most
//! `2t-1` keys, every non-root node at least `t-1`. Nodes live in a
//! [`NodeArena`], a fixed-capacity slab addressed by [`NodeId`]; child and
//! parent links are slot indices, never owning references, so the slab owns
//! all node storage and sibling trees can share one pool.
//!
//! ```text
//! BTree ──root──▶ NodeArena slots
//!                 ┌──────┬──────┬──────┬──────┐
//!                 │ node │ node │ node │ free │
//!                 └──────┴──────┴──────┴──────┘
//!                    ▲  children/parent by index
//! ```
//!
//! Inserts descend to a leaf and split overfull nodes bottom-up through
//! parent links; removals promote a boundary key for internal hits and
//! restore the minimum fill by borrowing from or merging with a sibling.

pub mod arena;
pub(crate) mod node;
pub mod tree;

pub use arena::{Node, NodeArena, NodeId};
pub use tree::BTree;
