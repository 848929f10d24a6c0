//! Well-known WebSocket message type discriminators.
//!
//! These are the canonical `"type"` values used in the agent-to-backend
//! WebSocket protocol. The agent tags every outgoing report with one of
//! them and dispatches incoming commands on them.

/// WebSocket message type discriminator for probe report payloads.
///
/// Used by the agent when sending a completed probe pass and by the
/// backend when parsing it.
pub const MSG_TYPE_CHECK_REPORT: &str = "check_report";

/// WebSocket message type discriminator for the immediate-check command.
///
/// Sent by the backend to request a probe pass outside the regular
/// interval.
pub const MSG_TYPE_CHECK_NOW: &str = "check_now";
