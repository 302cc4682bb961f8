//! Session reuse and resilience composition, exercised through the
//! session manager and the resilient client against a scripted portal.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cartable_common::{CircuitState, MockClock};
use cartable_core::ports::PortalGateway;
use cartable_domain::{PortalError, SessionSettings};
use cartable_infra::portal::{ResilientPortalClient, SessionManager};

use support::*;

fn session_manager(client: &Arc<MockPortalClient>, freshness_secs: u64) -> SessionManager {
    SessionManager::new(
        client.clone(),
        credentials(),
        &SessionSettings { freshness_secs },
    )
}

#[tokio::test]
async fn fresh_session_is_reused_without_login_or_probe() {
    let client = MockPortalClient::new();
    let sessions = session_manager(&client, 3_600);

    let first = sessions.ensure_session().await.unwrap();
    let second = sessions.ensure_session().await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(client.login_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.alive_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stale_but_alive_session_is_probed_and_reused() {
    let client = MockPortalClient::new();
    let sessions = session_manager(&client, 0);

    let first = sessions.ensure_session().await.unwrap();
    let second = sessions.ensure_session().await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(client.login_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.alive_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dead_session_triggers_exactly_one_relogin() {
    let client = MockPortalClient::new();
    let sessions = session_manager(&client, 0);

    let first = sessions.ensure_session().await.unwrap();

    client.set_alive(false);
    let second = sessions.ensure_session().await.unwrap();

    assert_ne!(first.id, second.id, "a replacement session must be minted");
    assert_eq!(client.login_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_relogin_after_live_session_reports_session_expired() {
    let client = MockPortalClient::new();
    let sessions = session_manager(&client, 0);

    sessions.ensure_session().await.unwrap();

    client.set_alive(false);
    client.fail_login(PortalError::Connection("login endpoint unreachable".into()));

    match sessions.ensure_session().await {
        Err(PortalError::SessionExpired(_)) => {}
        other => panic!("expected SessionExpired, got {other:?}"),
    }
}

#[tokio::test]
async fn initial_login_failure_keeps_its_classification() {
    let client = MockPortalClient::new();
    client.fail_login(PortalError::Connection("dns failure".into()));
    let sessions = session_manager(&client, 3_600);

    match sessions.ensure_session().await {
        Err(PortalError::Connection(_)) => {}
        other => panic!("expected Connection, got {other:?}"),
    }
    assert!(!sessions.has_session().await);
}

#[tokio::test]
async fn breaker_opens_after_threshold_and_stops_calling_upstream() {
    let client = MockPortalClient::new();
    let t2 = period("t2", 2, true);
    client.set_periods(vec![t2.clone()]);
    client.fail_grades(&t2.id, PortalError::Connection("connection reset".into()));

    let gateway =
        ResilientPortalClient::new(client.clone(), credentials(), &test_config())
            .unwrap();

    for _ in 0..3 {
        assert!(gateway.grades(&t2).await.is_err());
    }
    assert_eq!(gateway.circuit_state(), CircuitState::Open);
    assert_eq!(client.grades_calls.load(Ordering::SeqCst), 3);

    // Fast-fail: no further upstream invocation while open.
    match gateway.grades(&t2).await {
        Err(PortalError::Connection(msg)) => assert!(msg.contains("circuit breaker open")),
        other => panic!("expected fast-fail Connection, got {other:?}"),
    }
    assert_eq!(client.grades_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn probe_after_cooldown_recovers_and_resets_the_breaker() {
    let client = MockPortalClient::new();
    let t2 = period("t2", 2, true);
    client.set_periods(vec![t2.clone()]);
    client.fail_grades(&t2.id, PortalError::Connection("connection reset".into()));

    let clock = MockClock::new();
    let gateway = ResilientPortalClient::with_clock(
        client.clone(),
        credentials(),
        &test_config(),
        clock.clone(),
    )
    .unwrap();

    for _ in 0..3 {
        assert!(gateway.grades(&t2).await.is_err());
    }
    assert_eq!(gateway.circuit_state(), CircuitState::Open);

    // Upstream recovers while the breaker cools down.
    client.set_grades(&t2.id, vec![grade("g1", "Maths", 3)]);
    clock.advance(std::time::Duration::from_secs(301));

    let fetched = gateway.grades(&t2).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(gateway.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn mid_use_expiry_with_successful_relogin_completes_the_call() {
    let client = MockPortalClient::new();
    let t2 = period("t2", 2, true);
    client.set_periods(vec![t2.clone()]);
    client.set_grades(&t2.id, vec![grade("g1", "Maths", 3)]);

    let gateway =
        ResilientPortalClient::new(client.clone(), credentials(), &test_config())
            .unwrap();

    // Establish the session, then have the upstream reject it once.
    gateway.periods().await.unwrap();
    client.expire_next_fetches(1);

    let fetched = gateway.grades(&t2).await.unwrap();
    assert_eq!(fetched.len(), 1);
    // Initial login plus one re-authentication, nothing surfaced.
    assert_eq!(client.login_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn mid_use_expiry_with_failed_relogin_reports_session_expired() {
    let client = MockPortalClient::new();
    let t2 = period("t2", 2, true);
    client.set_periods(vec![t2.clone()]);
    client.set_grades(&t2.id, vec![grade("g1", "Maths", 3)]);

    let gateway =
        ResilientPortalClient::new(client.clone(), credentials(), &test_config())
            .unwrap();

    gateway.periods().await.unwrap();
    client.expire_next_fetches(1);
    client.fail_login(PortalError::Connection("login rejected".into()));

    match gateway.grades(&t2).await {
        Err(PortalError::SessionExpired(_)) => {}
        other => panic!("expected SessionExpired, got {other:?}"),
    }
}

#[tokio::test]
async fn spent_rate_limit_budget_maps_to_rate_limited() {
    let client = MockPortalClient::new();
    client.set_periods(vec![period("t1", 1, true)]);

    let mut config = test_config();
    config.rate_limit.max_requests = 1;
    config.rate_limit.window_secs = 60;
    config.rate_limit.max_wait_secs = 0;

    let gateway =
        ResilientPortalClient::new(client.clone(), credentials(), &config).unwrap();

    gateway.periods().await.unwrap();
    match gateway.periods().await {
        Err(PortalError::RateLimited { retry_after, .. }) => {
            assert!(retry_after.is_some(), "local limiter must carry a retry-after hint");
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    // The raw client saw only the first call.
    assert_eq!(client.periods_calls.load(Ordering::SeqCst), 1);
}
