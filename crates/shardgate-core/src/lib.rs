//! # Shardgate Core
//!
//! Core library for the shardgate sharded-observer gateway.
//!
//! This crate provides the foundational components for:
//!
//! - **[`observer`]**: The sharded node registry with synced/out-of-sync/fallback/
//!   snapshotless classification, the circular-queue and simple routing providers,
//!   and the periodic sync-state checker that keeps routing decisions fresh.
//!
//! - **[`proxy`]**: Multi-shard fan-out and merge: blocks-by-round collection,
//!   hyperblock assembly, heartbeat aggregation and ESDT supply aggregation.
//!
//! - **[`transport`]**: The REST client seam used to reach observer nodes, with a
//!   reqwest-backed default implementation.
//!
//! - **[`config`]**: Layered TOML + environment configuration with validation.
//!
//! ## Request Flow
//!
//! ```text
//! Client Request (target shard or "all shards")
//!       │
//!       ▼
//! ┌──────────────────┐
//! │  NodesProvider   │  circular-queue or simple policy
//! │  (routing core)  │
//! └────────┬─────────┘
//!          │ ordered candidate list
//!          ▼
//! ┌──────────────────┐
//! │ BaseNodeProvider │  synced > fallback > backup > stale
//! │  (degradation)   │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Observer HTTP   │  first success wins, next candidate on failure
//! │   Request(s)     │
//! └──────────────────┘
//! ```
//!
//! A background sync checker periodically probes every configured node and pushes
//! fresh sync flags into the registry, so the next routing decision reflects
//! current node health.

pub mod config;
pub mod observer;
pub mod proxy;
pub mod transport;
pub mod types;
