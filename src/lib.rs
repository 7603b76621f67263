//! AI Warden - overseer bridge for real-time block-world simulations
//!
//! Decouples a slow AI chat endpoint from a fast simulation loop: world
//! events and player-activity stats accumulate in thread-safe queues, an
//! adaptive scheduler batches them out to the overseer, a separate ping
//! activity collects decided actions, and the simulation replays those
//! actions at a bounded per-tick rate on its own thread.

pub mod actions;
pub mod core;
pub mod events;
pub mod overseer;
pub mod runtime;
pub mod stats;
