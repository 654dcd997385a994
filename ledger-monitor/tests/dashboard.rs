use std::{collections::HashMap, sync::Arc, time::Duration};

use ledger_monitor::{
    DashboardConfig, DashboardController, DashboardState, Loadable, NotificationLevel,
    RoutingPolicy, StatusState,
};
use parking_lot::Mutex;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// Canned response served for one path.
#[derive(Debug, Clone)]
struct Route {
    status: u16,
    body: &'static str,
}

impl Route {
    fn ok(body: &'static str) -> Self {
        Self { status: 200, body }
    }
}

/// Request line and headers seen by the stub server.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
struct StubServer {
    routes: Arc<HashMap<&'static str, Route>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    async fn spawn(routes: Vec<(&'static str, Route)>) -> (String, Self) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = Self {
            routes: Arc::new(routes.into_iter().collect()),
            requests: Arc::default(),
        };

        let accept = server.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let server = accept.clone();
                tokio::spawn(async move { server.serve(stream).await });
            }
        });

        (format!("http://{address}"), server)
    }

    async fn serve(&self, mut stream: TcpStream) {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                return;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if let Some(index) = find_header_end(&buffer) {
                break index;
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let path = request_line.next().unwrap_or_default().to_string();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect::<HashMap<_, _>>();

        let content_length = headers
            .get("content-length")
            .and_then(|length| length.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body_read = buffer.len() - (header_end + 4);
        while body_read < content_length {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            body_read += read;
        }

        self.requests.lock().push(Recorded {
            method,
            path: path.clone(),
            headers,
        });

        let route = self.routes.get(path.as_str()).cloned().unwrap_or(Route {
            status: 404,
            body: r#"{"error":"not found"}"#,
        });
        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            route.status,
            route.body.len(),
            route.body
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn connectivity_routes() -> Vec<(&'static str, Route)> {
    vec![
        (
            "/api/blockchain/status",
            Route::ok(r#"{"status":"ok","message":"Synced","latency":12,"version":"1.4.0"}"#),
        ),
        (
            "/api/xrp/status",
            Route::ok(r#"{"status":"warning","message":"Ledger lagging"}"#),
        ),
        (
            "/api/payments/gateways/status",
            Route {
                status: 503,
                body: r#"{"status":"error"}"#,
            },
        ),
        ("/api/status", Route::ok("<html>maintenance</html>")),
        ("/api/database/status", Route::ok(r#"{"status":false}"#)),
    ]
}

fn ha_routes() -> Vec<(&'static str, Route)> {
    vec![
        (
            "/api/v1/ha/status",
            Route::ok(
                r#"{"success":true,"ha_enabled":true,"database":{"status":"degraded"},"cluster":{"state":"stable"}}"#,
            ),
        ),
        (
            "/api/v1/ha/node",
            Route::ok(r#"{"success":false,"message":"Node agent offline"}"#),
        ),
        (
            "/api/v1/ha/database/servers",
            Route::ok(
                r#"{"success":true,"servers":[
                    {"id":"db-1","role":"primary","host":"10.0.0.1","status":"online","connections":14,"latency_ms":3},
                    {"id":"db-2","role":"replica","host":"10.0.0.2","status":"degraded","replication_lag":"4"}
                ]}"#,
            ),
        ),
        (
            "/api/v1/ha/database/failover",
            Route::ok(r#"{"success":true,"new_primary":"db-2"}"#),
        ),
        (
            "/api/v1/ha/database/routing-policy",
            Route::ok(r#"{"success":false,"message":"Policy locked"}"#),
        ),
    ]
}

async fn controller(routes: Vec<(&'static str, Route)>) -> (DashboardController, StubServer) {
    let (url, server) = StubServer::spawn(routes).await;
    let config = DashboardConfig::new(url)
        .with_csrf_token("csrf-value")
        .with_jwt_token("integration-token");
    (DashboardController::new(config).unwrap(), server)
}

/// Poll the dashboard state until `ready` holds.
async fn wait_for(
    controller: &DashboardController,
    ready: impl Fn(&DashboardState) -> bool,
) -> DashboardState {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let state = controller.snapshot().state;
            if ready(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("dashboard state never became ready")
}

#[tokio::test]
async fn test_polling_isolates_a_failing_subsystem() {
    let (url, server) = StubServer::spawn(vec![
        ("/api/blockchain/status", Route::ok(r#"{"status":"ok"}"#)),
        (
            "/api/xrp/status",
            Route {
                status: 503,
                body: r#"{"status":"ok"}"#,
            },
        ),
        ("/api/payments/gateways/status", Route::ok(r#"{"status":"ok"}"#)),
        ("/api/status", Route::ok(r#"{"status":"ok"}"#)),
        ("/api/database/status", Route::ok(r#"{"status":"ok"}"#)),
    ])
    .await;
    let controller = DashboardController::new(
        DashboardConfig::new(url).with_poll_interval(Duration::from_millis(250)),
    )
    .unwrap();
    controller.start();

    let first = wait_for(&controller, |state| state.connectivity.len() == 5).await;
    let second = wait_for(&controller, |state| {
        state.connectivity.iter().all(|(key, report)| {
            report.last_checked_at > first.connectivity[key].last_checked_at
        })
    })
    .await;

    for key in ["blockchain", "payments", "api", "database"] {
        let report = second.report(key).unwrap();
        assert_eq!(report.state, StatusState::Ok, "{key} failed");
    }

    let xrp = second.report("xrp").unwrap();
    assert_eq!(xrp.state, StatusState::Error);
    assert_eq!(xrp.message.as_deref(), Some("Service unavailable"));

    let polling = controller.polling_status();
    assert!(polling.running);
    assert!(polling.cycles >= 2);

    let xrp_requests = server
        .requests()
        .iter()
        .filter(|request| request.path == "/api/xrp/status")
        .count();
    assert!(xrp_requests >= 2);

    controller.dispose();
}

#[tokio::test]
async fn test_refresh_all_normalizes_connectivity() {
    let (controller, _server) = controller(connectivity_routes()).await;
    controller.refresh_all().await;

    let state = controller.snapshot().state;
    let keys = state
        .connectivity
        .keys()
        .map(|key| key.as_str())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["blockchain", "xrp", "payments", "api", "database"]);

    struct Expected {
        key: &'static str,
        state: StatusState,
        message: &'static str,
    }

    let expected = vec![
        Expected {
            // TC0: healthy subsystem keeps the server message
            key: "blockchain",
            state: StatusState::Ok,
            message: "Synced",
        },
        Expected {
            // TC1: warning status
            key: "xrp",
            state: StatusState::Warning,
            message: "Ledger lagging",
        },
        Expected {
            // TC2: non-2xx becomes an error report with the mapped message
            key: "payments",
            state: StatusState::Error,
            message: "Service unavailable",
        },
        Expected {
            // TC3: non-json body
            key: "api",
            state: StatusState::Error,
            message: "Invalid response",
        },
    ];

    for (index, test) in expected.into_iter().enumerate() {
        let report = state.report(test.key).unwrap();
        assert_eq!(report.state, test.state, "TC{} failed", index);
        assert_eq!(report.message.as_deref(), Some(test.message), "TC{} failed", index);
    }

    // boolean false status
    assert_eq!(state.report("database").unwrap().state, StatusState::Error);

    let blockchain = state.report("blockchain").unwrap();
    assert_eq!(blockchain.latency_ms, Some(12.0));
    assert_eq!(blockchain.version.as_deref(), Some("1.4.0"));

    let last = state.notifications.back().unwrap();
    assert_eq!(last.level, NotificationLevel::Success);
    assert_eq!(last.message, "All data refreshed successfully");
}

#[tokio::test]
async fn test_refresh_all_decodes_ha_panels() {
    let (controller, server) = controller(ha_routes()).await;
    controller.refresh_all().await;

    let ha = controller.snapshot().state.ha;

    let status = ha.status.ready().unwrap();
    assert!(status.ha_enabled);
    assert_eq!(status.database_state(), StatusState::Warning);
    assert_eq!(status.cluster_state(), StatusState::Ok);
    assert_eq!(status.cluster_label(), "Stable");

    let servers = ha.servers.ready().unwrap();
    assert_eq!(servers.len(), 2);
    assert!(servers[0].is_primary());
    assert_eq!(servers[0].connections, "14");
    assert_eq!(servers[0].latency_text(), "3 ms");
    assert_eq!(servers[1].replication_lag.as_deref(), Some("4"));

    // success:false is surfaced with the server message
    assert_eq!(ha.node, Loadable::Failed("Node agent offline".to_string()));
    // unrouted endpoints
    assert_eq!(
        ha.cluster_nodes,
        Loadable::Failed("Service API not found".to_string())
    );
    assert_eq!(ha.metrics, Loadable::Failed("Service API not found".to_string()));

    let requests = server.requests();
    assert!(requests.iter().all(|request| request.method == "GET"));
    assert!(requests.iter().all(|request| {
        request.headers.get("authorization").map(String::as_str)
            == Some("Bearer integration-token")
    }));
}

#[tokio::test]
async fn test_admin_actions_notify() {
    let (controller, server) = controller(ha_routes()).await;

    let notification = controller.initiate_failover().await;
    assert_eq!(notification.level, NotificationLevel::Success);
    assert_eq!(notification.message, "Failover successful! New primary: db-2");

    // successful failover refreshes the server list
    assert!(controller.snapshot().state.ha.servers.ready().is_some());

    let notification = controller
        .update_routing_policy(RoutingPolicy::LeastLoaded)
        .await;
    assert_eq!(notification.level, NotificationLevel::Danger);
    assert_eq!(notification.message, "Failed to update policy: Policy locked");

    let notification = controller.initiate_backup().await;
    assert_eq!(notification.level, NotificationLevel::Danger);
    assert_eq!(
        notification.message,
        "Error initiating backup: Service API not found"
    );

    let posts = server
        .requests()
        .into_iter()
        .filter(|request| request.method == "POST")
        .collect::<Vec<_>>();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].path, "/api/v1/ha/database/failover");
    assert!(posts.iter().all(|request| {
        request.headers.get("x-csrftoken").map(String::as_str) == Some("csrf-value")
    }));
}

#[tokio::test]
async fn test_unreachable_server_marks_every_subsystem_disconnected() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let controller =
        DashboardController::new(DashboardConfig::new(format!("http://{address}"))).unwrap();
    controller.refresh_all().await;

    let state = controller.snapshot().state;
    assert_eq!(state.connectivity.len(), 5);
    for (index, report) in state.connectivity.values().enumerate() {
        assert_eq!(report.state, StatusState::Error, "TC{} failed", index);
        assert_eq!(
            report.message.as_deref(),
            Some("Connection error"),
            "TC{} failed",
            index
        );
    }
}
