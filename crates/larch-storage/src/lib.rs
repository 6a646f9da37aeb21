//! Storage engine core for LarchDB.
//!
//! This crate provides:
//! - An in-memory B-tree index over polymorphic [`larch_common::Value`] keys
//! - A fixed-capacity node arena that trees may share
//! - A wire codec for value payloads

mod btree;
mod codec;

pub use btree::{BTree, Node, NodeArena, NodeId};
pub use codec::{decode_composite, decode_value, encode_value};
