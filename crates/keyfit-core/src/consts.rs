/// Preference key holding the selected layout variant.
pub const PREF_KEY_LAYOUT: &str = "keyLayout";

/// Shown when monitoring is confirmed running.
pub const STATUS_MONITORING: &str = "✅ Monitoring";

/// Shown when monitoring is stopped or its status is unknown.
pub const STATUS_STOPPED: &str = "❌ Stopped";

/// Default window of the initial query, in days.
pub const DEFAULT_QUERY_DAYS: u32 = 7;

/// Capacity of the controller's settlement channel.
pub const SETTLEMENT_BUFFER: usize = 64;

/// Capacity of the monitoring event channel handed to the gateway.
pub const MONITOR_EVENT_BUFFER: usize = 16;
