//! # KVCacheLib
//!
//! KVCacheLib is a library for simulating key-value cache replacement policies and multilevel
//! cache hierarchies
//!
//! It provides a generic cache implementation which can be parameterised by a replacement policy
//! (FIFO, LRU or LFU), a hierarchy which chains caches together with promotion and latency
//! accounting, reproducible workload generators, and a simulator to run workloads against either
//!
//! Everything is single threaded and deterministic. Each simulation owns its caches, so separate
//! simulations can run in parallel without sharing anything

/// Index based doubly linked lists, used by the replacement policies
pub mod arena;

/// Models of the storage devices hierarchy levels stand in for
pub mod backend;

/// Contains the implementation of the cache, and a utility enum for the provided cache types
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// The error type shared by the whole library
pub mod error;

/// Contains the multilevel cache hierarchy
pub mod hierarchy;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to run a workload against a cache or a hierarchy
pub mod simulator;

/// Per-cache counters and the snapshots taken from them
pub mod stats;

/// Contains the workload generators
pub mod workload;

#[cfg(test)]
mod test;

pub use error::{CacheError, Result};
