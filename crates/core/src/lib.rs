//! Shared types for the network-monitor agent and backend protocol.
//!
//! Contains the probe result data model, the JSON wire envelope types
//! exchanged over the agent-to-backend WebSocket uplink, and the
//! canonical message-type discriminator constants.

pub mod report;
pub mod types;
pub mod wire;
