//! End-to-end worker behaviour against a stub network and in-memory cache.

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, StatusCode};
use shellcache_core::{AppConfig, CacheDb, Error};
use std::sync::Arc;
use tokio::sync::oneshot;
use url::Url;

use super::testing::{ORIGIN, StubFetcher, shell_fetcher, test_config, test_worker, worker_with};
use super::*;
use crate::http::Request;

fn get(path: &str) -> Request {
    Request::get(Url::parse(&format!("{ORIGIN}{path}")).unwrap())
}

fn navigate(path: &str) -> Request {
    get(path).with_header(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"))
}

fn served(outcome: FetchOutcome) -> Served {
    match outcome {
        FetchOutcome::Responded { served, .. } => served,
        FetchOutcome::Passthrough(reason) => panic!("expected a response, got passthrough ({reason:?})"),
    }
}

#[tokio::test]
async fn test_precached_shell_served_without_network() {
    let fetcher = Arc::new(shell_fetcher());
    let worker = test_worker(fetcher.clone()).await;

    let (installed, activated) = worker.register().await.unwrap();
    assert_eq!(installed.partition, "holy-grail-static-v2");
    assert_eq!(installed.precached, 2);
    assert!(activated.is_some());
    assert_eq!(worker.state(), WorkerState::Activated);
    assert!(worker.is_claimed());

    let urls = worker.cache().partition_urls("holy-grail-static-v2").await.unwrap();
    assert_eq!(urls, vec![format!("{ORIGIN}/"), format!("{ORIGIN}/manifest.json")]);

    let calls = fetcher.calls();
    let outcome = worker.handle_fetch(&get("/manifest.json")).await.unwrap();
    let FetchOutcome::Responded { route, served } = outcome else { panic!("manifest must be intercepted") };

    assert_eq!(route, Route::CacheFirst);
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.status, StatusCode::OK);
    assert_eq!(served.response.body.as_ref(), br#"{"name":"Holy Grail"}"#);
    assert_eq!(fetcher.calls(), calls);
}

#[tokio::test]
async fn test_install_twice_keeps_exactly_the_manifest() {
    let fetcher = Arc::new(shell_fetcher());
    let cache = CacheDb::open_in_memory().await.unwrap();
    let worker = worker_with(&test_config(), cache.clone(), fetcher.clone());

    worker.install().await.unwrap();
    worker.install().await.unwrap();

    let second = worker_with(&test_config(), cache.clone(), fetcher);
    second.install().await.unwrap();

    let urls = cache.partition_urls("holy-grail-static-v2").await.unwrap();
    assert_eq!(urls, vec![format!("{ORIGIN}/"), format!("{ORIGIN}/manifest.json")]);
}

#[tokio::test]
async fn test_version_bump_retires_previous_generation() {
    let fetcher = Arc::new(shell_fetcher().route("/assets/app.js", 200, "application/javascript", "boot()"));
    let cache = CacheDb::open_in_memory().await.unwrap();
    cache.open_partition("other-app").await.unwrap();

    let v2 = worker_with(&test_config(), cache.clone(), fetcher.clone());
    v2.register().await.unwrap();
    v2.handle_fetch(&get("/assets/app.js")).await.unwrap();
    v2.settle().await;
    assert!(cache.has_partition("holy-grail-dynamic-v2").await.unwrap());

    cache.open_partition("holy-grail-v3").await.unwrap();

    let config = AppConfig { cache_version: "v3".into(), ..test_config() };
    let v3 = worker_with(&config, cache.clone(), fetcher);
    let (_, activated) = v3.register().await.unwrap();

    let mut deleted = activated.unwrap().deleted;
    deleted.sort();
    assert_eq!(deleted, vec!["holy-grail-dynamic-v2", "holy-grail-static-v2", "holy-grail-v3"]);
    assert_eq!(cache.partition_names().await.unwrap(), vec!["other-app", "holy-grail-static-v3"]);
}

#[tokio::test]
async fn test_api_requests_are_never_intercepted_or_stored() {
    let fetcher = Arc::new(shell_fetcher().route("/api/portfolio", 200, "application/json", r#"{"holdings":[]}"#));
    let worker = test_worker(fetcher.clone()).await;
    worker.register().await.unwrap();

    let request = get("/api/portfolio");
    let calls = fetcher.calls();
    let outcome = worker.handle_fetch(&request).await.unwrap();
    worker.settle().await;

    assert!(matches!(outcome, FetchOutcome::Passthrough(PassReason::Api)));
    assert_eq!(fetcher.calls(), calls);
    assert!(worker.cache().match_response(&request.cache_key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_offline_is_passthrough_not_503() {
    let fetcher = Arc::new(shell_fetcher());
    let worker = test_worker(fetcher.clone()).await;
    worker.register().await.unwrap();
    fetcher.set_online(false);

    let outcome = worker.handle_fetch(&get("/api/portfolio")).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Passthrough(PassReason::Api)));
}

#[tokio::test]
async fn test_non_get_is_passthrough() {
    let worker = test_worker(Arc::new(shell_fetcher())).await;
    let request = Request::new(Method::POST, Url::parse(&format!("{ORIGIN}/manifest.json")).unwrap());

    let outcome = worker.handle_fetch(&request).await.unwrap();
    assert!(matches!(outcome, FetchOutcome::Passthrough(PassReason::NonGet)));
}

#[tokio::test]
async fn test_script_survives_going_offline() {
    let fetcher = Arc::new(shell_fetcher().route("/app.js", 200, "application/javascript", "render(App)"));
    let worker = test_worker(fetcher.clone()).await;
    worker.register().await.unwrap();

    let first = served(worker.handle_fetch(&get("/app.js")).await.unwrap());
    assert_eq!(first.source, ResponseSource::Network);
    worker.settle().await;

    let urls = worker.cache().partition_urls("holy-grail-dynamic-v2").await.unwrap();
    assert_eq!(urls, vec![format!("{ORIGIN}/app.js")]);

    fetcher.set_online(false);
    let second = served(worker.handle_fetch(&get("/app.js")).await.unwrap());

    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.response.status, first.response.status);
    assert_eq!(second.response.body, first.response.body);
    assert_eq!(second.response.content_type(), Some("application/javascript"));
}

#[tokio::test]
async fn test_navigation_offline_falls_back_to_cached_root() {
    let fetcher = Arc::new(shell_fetcher());
    let worker = test_worker(fetcher.clone()).await;
    worker.register().await.unwrap();
    fetcher.set_online(false);

    let outcome = worker.handle_fetch(&navigate("/analysis")).await.unwrap();
    let FetchOutcome::Responded { route, served } = outcome else { panic!("navigation must be intercepted") };

    assert_eq!(route, Route::NetworkFirst(NetworkReason::Navigation));
    assert_eq!(served.source, ResponseSource::OfflineShell);
    assert_eq!(served.response.status, StatusCode::OK);
    assert_eq!(served.response.body.as_ref(), b"<html><body>shell</body></html>");
}

#[tokio::test]
async fn test_navigation_offline_without_shell_is_503() {
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set_online(false);
    let worker = test_worker(fetcher).await;

    let served = served(worker.handle_fetch(&navigate("/analysis")).await.unwrap());
    assert_eq!(served.source, ResponseSource::Offline);
    assert_eq!(served.response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(served.response.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_non_html_offline_without_entry_is_503_even_with_shell() {
    let fetcher = Arc::new(shell_fetcher());
    let worker = test_worker(fetcher.clone()).await;
    worker.register().await.unwrap();
    fetcher.set_online(false);

    let served = served(worker.handle_fetch(&get("/data/history.json")).await.unwrap());
    assert_eq!(served.source, ResponseSource::Offline);
    assert_eq!(served.response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(served.response.body.as_ref(), b"Offline");
    assert_eq!(served.response.content_type(), Some("text/plain"));
}

#[tokio::test]
async fn test_network_first_prefers_live_response() {
    let fetcher = Arc::new(shell_fetcher().route("/app.js", 200, "application/javascript", "v1"));
    let worker = test_worker(fetcher.clone()).await;

    served(worker.handle_fetch(&get("/app.js")).await.unwrap());
    worker.settle().await;
    fetcher.set_route("/app.js", 200, "application/javascript", "v2");

    let second = served(worker.handle_fetch(&get("/app.js")).await.unwrap());
    assert_eq!(second.source, ResponseSource::Network);
    assert_eq!(second.response.body.as_ref(), b"v2");

    worker.settle().await;
    let key = get("/app.js").cache_key();
    let stored = worker.cache().match_in_partition("holy-grail-dynamic-v2", &key).await.unwrap().unwrap();
    assert_eq!(stored.body, b"v2");
}

#[tokio::test]
async fn test_error_status_is_returned_but_not_stored() {
    let fetcher = Arc::new(StubFetcher::new());
    let worker = test_worker(fetcher).await;

    let served = served(worker.handle_fetch(&get("/missing.js")).await.unwrap());
    worker.settle().await;

    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.status, StatusCode::NOT_FOUND);
    assert!(worker.cache().partition_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_first_miss_fetches_and_stores_static() {
    let fetcher = Arc::new(shell_fetcher());
    let worker = test_worker(fetcher.clone()).await;

    let first = served(worker.handle_fetch(&get("/manifest.json")).await.unwrap());
    assert_eq!(first.source, ResponseSource::Network);
    worker.settle().await;

    let urls = worker.cache().partition_urls("holy-grail-static-v2").await.unwrap();
    assert_eq!(urls, vec![format!("{ORIGIN}/manifest.json")]);

    let calls = fetcher.calls();
    let second = served(worker.handle_fetch(&get("/manifest.json")).await.unwrap());
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(fetcher.calls(), calls);
}

#[tokio::test]
async fn test_cache_first_offline_miss_is_bare_503() {
    let fetcher = Arc::new(StubFetcher::new());
    fetcher.set_online(false);
    let worker = test_worker(fetcher).await;

    let served = served(worker.handle_fetch(&get("/manifest.json")).await.unwrap());
    assert_eq!(served.source, ResponseSource::Offline);
    assert_eq!(served.response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(served.response.content_type(), None);
}

#[tokio::test]
async fn test_precache_failure_writes_nothing() {
    let fetcher = Arc::new(StubFetcher::new().route("/", 200, "text/html", "<html></html>"));
    let worker = test_worker(fetcher).await;

    let result = worker.install().await;

    assert!(matches!(result, Err(Error::PrecacheFailed { ref path, .. }) if path == "/manifest.json"));
    assert_eq!(worker.state(), WorkerState::Redundant);
    assert!(worker.cache().partition_names().await.unwrap().is_empty());
    assert!(matches!(worker.activate().await, Err(Error::InvalidState(_))));
}

#[tokio::test]
async fn test_precache_offline_fails_install() {
    let fetcher = Arc::new(shell_fetcher());
    fetcher.set_online(false);
    let worker = test_worker(fetcher.clone()).await;

    assert!(matches!(worker.register().await, Err(Error::PrecacheFailed { .. })));

    fetcher.set_online(true);
    let (installed, _) = worker.register().await.unwrap();
    assert_eq!(installed.precached, 2);
    assert_eq!(worker.state(), WorkerState::Activated);
}

#[tokio::test]
async fn test_clear_cache_removes_everything_and_replies() {
    let fetcher = Arc::new(shell_fetcher().route("/app.js", 200, "application/javascript", "boot()"));
    let worker = test_worker(fetcher).await;
    worker.register().await.unwrap();
    worker.handle_fetch(&get("/app.js")).await.unwrap();
    worker.cache().open_partition("other-app").await.unwrap();

    let (port, reply) = oneshot::channel();
    worker.handle_message(ControlMessage::ClearCache, Some(port)).await.unwrap();

    assert_eq!(reply.await.unwrap(), ClearCacheReply { success: true });
    assert!(worker.cache().partition_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_skip_waiting_message_activates_installed_worker() {
    let worker = test_worker(Arc::new(shell_fetcher())).await;
    worker.install().await.unwrap();
    assert_eq!(worker.state(), WorkerState::Installed);

    assert!(worker.handle_raw_message("SKIP_WAITING", None).await.unwrap());
    assert_eq!(worker.state(), WorkerState::Activated);

    assert!(worker.handle_raw_message("SKIP_WAITING", None).await.unwrap());
    assert_eq!(worker.state(), WorkerState::Activated);
}

#[tokio::test]
async fn test_unknown_message_is_ignored() {
    let worker = test_worker(Arc::new(shell_fetcher())).await;
    assert!(!worker.handle_raw_message("PING", None).await.unwrap());
    assert_eq!(worker.state(), WorkerState::Parsed);
}

#[tokio::test]
async fn test_concurrent_fetches_leave_one_entry() {
    let fetcher = Arc::new(shell_fetcher().route("/assets/index.css", 200, "text/css", "body{margin:0}"));
    let worker = Arc::new(test_worker(fetcher).await);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let worker = worker.clone();
        tasks.spawn(async move { worker.handle_fetch(&get("/assets/index.css")).await.map(|_| ()) });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }
    worker.settle().await;

    let urls = worker.cache().partition_urls("holy-grail-dynamic-v2").await.unwrap();
    assert_eq!(urls, vec![format!("{ORIGIN}/assets/index.css")]);
}

#[tokio::test]
async fn test_install_with_empty_manifest() {
    let config = AppConfig { static_assets: Vec::new(), ..test_config() };
    let cache = CacheDb::open_in_memory().await.unwrap();
    let worker = worker_with(&config, cache.clone(), Arc::new(StubFetcher::new()));

    let report = worker.install().await.unwrap();
    assert_eq!(report.precached, 0);
    assert_eq!(worker.state(), WorkerState::Installed);
    assert!(cache.partition_urls("holy-grail-static-v2").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_skip_waiting_activates_once() {
    let worker = Arc::new(test_worker(Arc::new(shell_fetcher())).await);
    worker.install().await.unwrap();
    assert_eq!(worker.state(), WorkerState::Installed);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let worker = worker.clone();
            tokio::spawn(async move { worker.handle_message(ControlMessage::SkipWaiting, None).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(worker.state(), WorkerState::Activated);
    assert!(worker.is_claimed());
}
