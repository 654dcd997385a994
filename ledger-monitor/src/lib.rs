//! Ledger Monitor - Shared Library
//!
//! Polls the banking platform API and turns its loosely shaped JSON into typed
//! view models for the terminal dashboard:
//! - connectivity status of the blockchain, XRP ledger, payment gateways, API and database
//! - high-availability cluster state, with failover / backup / reset actions
//! - transaction analytics charts
//!
//! Nothing here panics on malformed server data. Every failure is contained at the
//! component that issued the request and surfaces as a status report or notification.

/// Transaction analytics snapshots and their loading fallbacks.
pub mod analytics;

/// HTTP access to the platform API.
pub mod client;

pub mod config;

/// Polling orchestration and last-known dashboard state.
pub mod controller;

/// Bearer token lookup across ordered stores.
pub mod credential;

/// Ordered field fallbacks for loosely shaped payloads.
pub mod decode;

pub mod error;

/// High-availability cluster panels and admin actions.
pub mod ha;

/// Static currency display metadata.
pub mod metadata;

/// Fixed-interval scheduler for independent poll sources.
pub mod poller;

/// Status normalisation of subsystem responses.
pub mod status;

/// Render-agnostic view models.
pub mod view;

// Re-export commonly used types for convenience
pub use analytics::{AnalyticsCache, AnalyticsSnapshot, Bucket};
pub use client::{ActionOutcome, ApiClient};
pub use config::DashboardConfig;
pub use controller::{
    CONNECTIVITY_ENDPOINTS, ConnectivityEndpoint, DashboardController, DashboardSnapshot,
    DashboardState, Notification, NotificationLevel, PollingStatus,
};
pub use credential::{CredentialAccessor, CredentialToken, TokenStore};
pub use error::{AnalyticsError, ConfigError, CredentialError, FetchError};
pub use ha::{AdminAction, HaDashboard, Loadable, RoutingPolicy};
pub use poller::{PollSource, Poller};
pub use status::{StatusReport, StatusState, normalize};
