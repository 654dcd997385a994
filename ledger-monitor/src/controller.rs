//! Dashboard controller: owns the poller, the API client and the last-known view state.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use indexmap::IndexMap;
use itertools::Itertools;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::{
    analytics::{AnalyticsCache, AnalyticsSnapshot, analytics_candidates, load_analytics},
    client::ApiClient,
    config::DashboardConfig,
    credential::MemoryStore,
    error::ConfigError,
    ha::{
        AdminAction, ClusterNode, DatabaseServer, HA_CLUSTER_NODES_PATH, HA_METRICS_PATH,
        HA_NODE_PATH, HA_SERVERS_PATH, HA_STATUS_PATH, HaDashboard, HaMetrics, HaStatus, Loadable,
        NodeInfo, RoutingPolicy, ensure_success,
    },
    poller::{PollSource, Poller, run_once},
    status::{StatusReport, normalize},
};

/// Most recent notifications kept for display.
pub const NOTIFICATION_HISTORY: usize = 20;

/// One monitored subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityEndpoint {
    pub key: &'static str,
    pub title: &'static str,
    pub path: &'static str,
}

/// Monitored subsystems, in display order.
pub const CONNECTIVITY_ENDPOINTS: [ConnectivityEndpoint; 5] = [
    ConnectivityEndpoint {
        key: "blockchain",
        title: "Blockchain",
        path: "/api/blockchain/status",
    },
    ConnectivityEndpoint {
        key: "xrp",
        title: "XRP Ledger",
        path: "/api/xrp/status",
    },
    ConnectivityEndpoint {
        key: "payments",
        title: "Payment Gateways",
        path: "/api/payments/gateways/status",
    },
    ConnectivityEndpoint {
        key: "api",
        title: "API",
        path: "/api/status",
    },
    ConnectivityEndpoint {
        key: "database",
        title: "Database",
        path: "/api/database/status",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Last-known state written by probes and read by renderers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    /// Latest report per subsystem key
    pub connectivity: IndexMap<SmolStr, StatusReport>,
    pub ha: HaDashboard,
    /// Oldest first, bounded by [`NOTIFICATION_HISTORY`]
    pub notifications: VecDeque<Notification>,
}

impl DashboardState {
    /// Record a notification, dropping the oldest beyond [`NOTIFICATION_HISTORY`].
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        let notification = Notification {
            level,
            message: message.into(),
            at: Utc::now(),
        };
        debug!(?level, message = %notification.message, "notification");

        self.notifications.push_back(notification.clone());
        while self.notifications.len() > NOTIFICATION_HISTORY {
            self.notifications.pop_front();
        }
        notification
    }

    /// Report for `key`, if that subsystem has been checked yet.
    pub fn report(&self, key: &str) -> Option<&StatusReport> {
        self.connectivity.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollingStatus {
    pub running: bool,
    pub paused: bool,
    pub cycles: u64,
    pub interval: Duration,
}

/// Point-in-time copy of everything a renderer needs.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub state: DashboardState,
    pub analytics: Arc<AnalyticsSnapshot>,
    pub polling: PollingStatus,
}

type SharedState = Arc<RwLock<DashboardState>>;

#[derive(Debug)]
pub struct DashboardController {
    config: DashboardConfig,
    client: ApiClient,
    state: SharedState,
    analytics: AnalyticsCache,
    poller: Mutex<Poller>,
    session: Arc<MemoryStore>,
}

impl DashboardController {
    /// Build a controller, resolving the bearer token once from the configured stores.
    pub fn new(config: DashboardConfig) -> Result<Self, ConfigError> {
        let session = Arc::new(MemoryStore::new());
        let bearer = match config.credential_accessor(Arc::clone(&session)).resolve() {
            Some((store, token)) => {
                info!(store, "using bearer token");
                Some(token)
            }
            None => {
                info!("no bearer token found, requests are unauthenticated");
                None
            }
        };

        let client = ApiClient::new(config.api_base()?)
            .with_bearer(bearer)
            .with_csrf_token(config.csrf_token.clone())
            .with_timeout(config.request_timeout);

        Ok(Self {
            config,
            client,
            state: Arc::default(),
            analytics: AnalyticsCache::new(),
            poller: Mutex::new(Poller::new()),
            session,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Session-scoped token store consulted after the token file.
    pub fn session(&self) -> &Arc<MemoryStore> {
        &self.session
    }

    /// Every probe: the connectivity endpoints followed by the HA panels.
    pub fn sources(&self) -> Vec<PollSource> {
        CONNECTIVITY_ENDPOINTS
            .iter()
            .map(|endpoint| connectivity_source(&self.client, &self.state, *endpoint))
            .chain(self.ha_sources())
            .collect()
    }

    fn ha_sources(&self) -> Vec<PollSource> {
        vec![
            ha_source(
                &self.client,
                &self.state,
                HA_STATUS_PATH,
                "HA status",
                HaStatus::decode,
                |ha, panel| ha.status = panel,
            ),
            ha_source(
                &self.client,
                &self.state,
                HA_NODE_PATH,
                "node info",
                NodeInfo::decode,
                |ha, panel| ha.node = panel,
            ),
            self.servers_source(),
            ha_source(
                &self.client,
                &self.state,
                HA_CLUSTER_NODES_PATH,
                "cluster nodes",
                ClusterNode::decode_list,
                |ha, panel| ha.cluster_nodes = panel,
            ),
            ha_source(
                &self.client,
                &self.state,
                HA_METRICS_PATH,
                "metrics",
                HaMetrics::decode,
                |ha, panel| ha.metrics = panel,
            ),
        ]
    }

    fn servers_source(&self) -> PollSource {
        ha_source(
            &self.client,
            &self.state,
            HA_SERVERS_PATH,
            "database servers",
            DatabaseServer::decode_list,
            |ha, panel| ha.servers = panel,
        )
    }

    /// Run every probe now and then on the configured interval.
    pub fn start(&self) {
        let sources = self.sources();
        info!(
            sources = %sources.iter().map(|source| source.name.as_str()).join(", "),
            "starting dashboard polling"
        );
        self.poller.lock().start(sources, self.config.poll_interval);
    }

    pub fn stop(&self) {
        self.poller.lock().stop();
    }

    // The poller lock is released before any state lock is taken.
    pub fn pause(&self) {
        let paused = {
            let mut poller = self.poller.lock();
            let running = poller.is_running();
            if running {
                poller.pause();
            }
            running
        };
        if paused {
            self.notify(NotificationLevel::Info, "Auto-refresh paused");
        }
    }

    pub fn resume(&self) {
        let resumed = {
            let mut poller = self.poller.lock();
            let paused = poller.is_paused();
            if paused {
                poller.resume();
            }
            paused
        };
        if resumed {
            self.notify(NotificationLevel::Info, "Auto-refresh resumed");
        }
    }

    pub fn toggle_pause(&self) {
        if self.poller.lock().is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Stop polling for good. Also runs on drop.
    pub fn dispose(&self) {
        self.stop();
    }

    pub fn polling_status(&self) -> PollingStatus {
        let poller = self.poller.lock();
        PollingStatus {
            running: poller.is_running(),
            paused: poller.is_paused(),
            cycles: poller.cycles(),
            interval: self.config.poll_interval,
        }
    }

    /// Run one full cycle inline, independent of the timer.
    pub async fn refresh_all(&self) {
        run_once(&self.sources()).await;
        self.notify(NotificationLevel::Success, "All data refreshed successfully");
    }

    /// Analytics snapshot, loaded from the configured source on first use.
    pub fn analytics(&self) -> Arc<AnalyticsSnapshot> {
        self.analytics.get_or_load(|| {
            let candidates = self
                .config
                .analytics_file
                .as_deref()
                .map(analytics_candidates)
                .unwrap_or_default();
            load_analytics(&candidates, Utc::now().date_naive())
        })
    }

    /// Forget the cached analytics so the next read loads them again.
    pub fn refresh_analytics(&self) {
        self.analytics.refresh();
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let polling = self.polling_status();
        let analytics = self.analytics();
        let state = self.state.read().clone();

        DashboardSnapshot {
            state,
            analytics,
            polling,
        }
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> Notification {
        self.state.write().notify(level, message)
    }

    /// Perform an admin action and record its outcome as a notification.
    pub async fn run_action(&self, action: AdminAction) -> Notification {
        info!(?action, "running admin action");
        let result = self.client.post_action(action.path(), action.body()).await;
        if let Err(error) = &result {
            warn!(?action, %error, "admin action failed");
        }

        let summary = action.summarize(&result);
        let succeeded = summary.is_ok();
        let (level, message) = match summary {
            Ok(message) => (NotificationLevel::Success, message),
            Err(message) => (NotificationLevel::Danger, message),
        };

        let notification = self.state.write().notify(level, message);

        if succeeded {
            match action {
                AdminAction::Failover => run_once(&[self.servers_source()]).await,
                AdminAction::Reset => run_once(&self.sources()).await,
                _ => {}
            }
        }

        notification
    }

    pub async fn initiate_failover(&self) -> Notification {
        self.run_action(AdminAction::Failover).await
    }

    pub async fn update_routing_policy(&self, policy: RoutingPolicy) -> Notification {
        self.run_action(AdminAction::UpdateRoutingPolicy(policy)).await
    }

    pub async fn initiate_backup(&self) -> Notification {
        self.run_action(AdminAction::Backup).await
    }

    pub async fn reset_ha(&self) -> Notification {
        self.run_action(AdminAction::Reset).await
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.poller.get_mut().stop();
    }
}

fn connectivity_source(
    client: &ApiClient,
    state: &SharedState,
    endpoint: ConnectivityEndpoint,
) -> PollSource {
    let client = client.clone();
    let state = Arc::clone(state);

    PollSource::new(endpoint.key, move || {
        let client = client.clone();
        let state = Arc::clone(&state);
        async move {
            let result = client.get_json(endpoint.path).await;
            let report = match &result {
                Ok(raw) => normalize(raw, endpoint.key),
                Err(error) => StatusReport::failure(endpoint.key, error.user_message()),
            };
            let mut guard = state.write();
            guard
                .connectivity
                .insert(SmolStr::new(endpoint.key), report);
            guard
                .connectivity
                .sort_by(|a, _, b, _| endpoint_rank(a).cmp(&endpoint_rank(b)));
            result.map(drop)
        }
        .boxed()
    })
}

/// Display position of a subsystem key, unknown keys last.
fn endpoint_rank(key: &str) -> usize {
    CONNECTIVITY_ENDPOINTS
        .iter()
        .position(|endpoint| endpoint.key == key)
        .unwrap_or(CONNECTIVITY_ENDPOINTS.len())
}

fn ha_source<T>(
    client: &ApiClient,
    state: &SharedState,
    path: &'static str,
    subject: &'static str,
    decode: fn(&Value) -> T,
    store: fn(&mut HaDashboard, Loadable<T>),
) -> PollSource
where
    T: Send + 'static,
{
    let client = client.clone();
    let state = Arc::clone(state);

    PollSource::new(path, move || {
        let client = client.clone();
        let state = Arc::clone(&state);
        async move {
            let result = client
                .get_json(path)
                .await
                .and_then(ensure_success)
                .map(|raw| decode(&raw));

            let mut guard = state.write();
            let outcome = match &result {
                Ok(_) => Ok(()),
                Err(error) => {
                    guard.notify(
                        NotificationLevel::Danger,
                        format!("Error fetching {subject}: {}", error.user_message()),
                    );
                    Err(error.clone())
                }
            };
            store(&mut guard.ha, Loadable::from_result(result));
            outcome
        }
        .boxed()
    })
}
