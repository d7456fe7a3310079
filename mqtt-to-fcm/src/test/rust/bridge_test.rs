use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;

use mqtt_to_fcm::domain::value_objects::routing_table::{
    cistern_topic, device_subscriptions, garage_door_topic,
};
use mqtt_to_fcm::{
    AuthError, BridgeService, BusClient, BusEvent, BusNotification, ConnectionState, Credential,
    CredentialProvider, DispatchError, DispatchResult, DomainError, EventRouter, MetricsReporter,
    NotificationPayload, NotificationSender, Result, RoutingTable, TokenExchanger,
};

const SYSTEM_ID: &str = "123456-garage";

#[derive(Default)]
struct RecordingMetrics {
    routed: AtomicUsize,
    ignored: AtomicUsize,
    dispatch_failures: AtomicUsize,
    token_exchanges: AtomicUsize,
    reconnects: AtomicUsize,
    states: Mutex<Vec<ConnectionState>>,
}

impl MetricsReporter for RecordingMetrics {
    fn report_state_change(&self, state: &ConnectionState) {
        self.states.lock().unwrap().push(*state);
    }

    fn report_reconnect_attempt(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }

    fn report_event_received(&self, routed: bool) {
        if routed {
            self.routed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.ignored.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report_dispatch(&self, result: &DispatchResult) {
        if !result.success {
            self.dispatch_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report_token_exchange(&self, _success: bool) {
        self.token_exchanges.fetch_add(1, Ordering::SeqCst);
    }
}

/// Exchanger handing out `token-N` after a short delay
struct FakeExchanger {
    calls: AtomicUsize,
    lifetimes: Mutex<VecDeque<Duration>>,
    fail: AtomicBool,
}

impl FakeExchanger {
    fn new(lifetimes: &[u64]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            lifetimes: Mutex::new(lifetimes.iter().copied().map(Duration::from_secs).collect()),
            fail: AtomicBool::new(false),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchanger for FakeExchanger {
    async fn exchange(&self) -> std::result::Result<Credential, AuthError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(50)).await;

        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("identity provider down".to_string()));
        }

        let lifetime = self
            .lifetimes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Duration::from_secs(3600));
        Ok(Credential::expiring_in(format!("token-{}", n), lifetime))
    }
}

/// Sender recording payloads and answering with a fixed outcome
struct RecordingSender {
    sent: Mutex<Vec<NotificationPayload>>,
    reject: bool,
}

impl RecordingSender {
    fn new(reject: bool) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject,
        }
    }

    fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }

    async fn wait_for(&self, count: usize) {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} dispatches, got {}", count, self.sent().len());
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, payload: &NotificationPayload) -> DispatchResult {
        let n = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(payload.clone());
            sent.len()
        };

        if self.reject {
            DispatchResult::failed(DispatchError::Rejected {
                status: 400,
                body: "invalid topic".to_string(),
            })
        } else {
            DispatchResult::delivered(Some(format!("projects/x/messages/{}", n)))
        }
    }
}

/// Bus replaying a fixed script, then closing
struct ScriptedBus {
    script: VecDeque<BusNotification>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    reject_subscriptions: bool,
}

impl ScriptedBus {
    fn new(script: Vec<BusNotification>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let bus = Self {
            script: script.into(),
            subscriptions: Arc::clone(&subscriptions),
            reject_subscriptions: false,
        };
        (bus, subscriptions)
    }

    fn rejecting_subscriptions(mut self) -> Self {
        self.reject_subscriptions = true;
        self
    }
}

#[async_trait]
impl BusClient for ScriptedBus {
    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.subscriptions.lock().unwrap().push(topic.to_string());
        if self.reject_subscriptions {
            return Err(DomainError::Bus(format!("subscribe to '{}' failed", topic)));
        }
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<BusNotification> {
        self.script.pop_front()
    }
}

/// Bus that never delivers anything
struct SilentBus;

#[async_trait]
impl BusClient for SilentBus {
    async fn subscribe(&mut self, _topic: &str) -> Result<()> {
        Ok(())
    }

    async fn next_notification(&mut self) -> Option<BusNotification> {
        std::future::pending().await
    }
}

fn router(sender: Arc<RecordingSender>, metrics: Arc<RecordingMetrics>) -> EventRouter {
    EventRouter::new(
        RoutingTable::for_system(SYSTEM_ID),
        "homa".to_string(),
        sender,
        metrics,
    )
}

fn garage_event(payload: &str) -> BusEvent {
    BusEvent::new(garage_door_topic(SYSTEM_ID), payload)
}

#[tokio::test]
async fn test_cached_token_is_reused() {
    let exchanger = Arc::new(FakeExchanger::new(&[3600]));
    let metrics = Arc::new(RecordingMetrics::default());
    let provider = CredentialProvider::new(exchanger.clone(), Duration::from_secs(300), metrics.clone());

    let first = provider.get_token().await.unwrap();
    let second = provider.get_token().await.unwrap();

    assert_eq!(first.access_token(), "token-1");
    assert_eq!(first, second);
    assert_eq!(exchanger.calls(), 1);
    assert_eq!(metrics.token_exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_token_is_refreshed_once_for_concurrent_callers() {
    let exchanger = Arc::new(FakeExchanger::new(&[60, 3600]));
    let provider = CredentialProvider::new(
        exchanger.clone(),
        Duration::ZERO,
        Arc::new(RecordingMetrics::default()),
    );

    let expired = provider.get_token().await.unwrap();
    assert_eq!(expired.access_token(), "token-1");

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(expired.is_expired_at(tokio::time::Instant::now()));

    let results = join_all((0..10).map(|_| provider.get_token())).await;

    assert_eq!(exchanger.calls(), 2);
    for result in results {
        assert_eq!(result.unwrap().access_token(), "token-2");
    }
    assert!(!provider.is_refreshing());
}

#[tokio::test(start_paused = true)]
async fn test_token_inside_margin_is_refreshed_once() {
    let exchanger = Arc::new(FakeExchanger::new(&[3600, 3600]));
    let provider = CredentialProvider::new(
        exchanger.clone(),
        Duration::from_secs(300),
        Arc::new(RecordingMetrics::default()),
    );

    assert_eq!(provider.get_token().await.unwrap().access_token(), "token-1");

    // Still valid, but within the refresh margin
    tokio::time::advance(Duration::from_secs(3400)).await;
    let results = join_all((0..10).map(|_| provider.get_token())).await;

    assert_eq!(exchanger.calls(), 2);
    for result in results {
        assert_eq!(result.unwrap().access_token(), "token-2");
    }
}

#[tokio::test(start_paused = true)]
async fn test_short_lived_token_is_still_cached() {
    let exchanger = Arc::new(FakeExchanger::new(&[60, 3600]));
    let provider = CredentialProvider::new(
        exchanger.clone(),
        Duration::from_secs(300),
        Arc::new(RecordingMetrics::default()),
    );

    for _ in 0..3 {
        assert_eq!(provider.get_token().await.unwrap().access_token(), "token-1");
    }
    assert_eq!(exchanger.calls(), 1);

    // Margin is capped at half the 60 s lifetime
    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(provider.get_token().await.unwrap().access_token(), "token-2");
    assert_eq!(exchanger.calls(), 2);
}

#[tokio::test]
async fn test_concurrent_first_use_triggers_one_exchange() {
    let exchanger = Arc::new(FakeExchanger::new(&[]));
    let provider = Arc::new(CredentialProvider::new(
        exchanger.clone(),
        Duration::from_secs(300),
        Arc::new(RecordingMetrics::default()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().access_token(), "token-1");
    }
    assert_eq!(exchanger.calls(), 1);
}

#[tokio::test]
async fn test_failed_exchange_is_not_cached() {
    let exchanger = Arc::new(FakeExchanger::new(&[]));
    exchanger.fail.store(true, Ordering::SeqCst);
    let provider = CredentialProvider::new(
        exchanger.clone(),
        Duration::from_secs(300),
        Arc::new(RecordingMetrics::default()),
    );

    let error = provider.get_token().await.unwrap_err();
    assert!(matches!(error, AuthError::Transport(_)));

    exchanger.fail.store(false, Ordering::SeqCst);
    let credential = provider.get_token().await.unwrap();

    assert_eq!(credential.access_token(), "token-2");
    assert_eq!(exchanger.calls(), 2);
}

#[tokio::test]
async fn test_garage_open_is_red() {
    let sender = Arc::new(RecordingSender::new(false));
    let metrics = Arc::new(RecordingMetrics::default());
    let router = router(sender.clone(), metrics.clone());

    let result = router.on_event(garage_event("open")).unwrap().await.unwrap();

    assert!(result.success);
    assert_eq!(result.server_message_id.as_deref(), Some("projects/x/messages/1"));

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target_topic(), "homa");
    assert_eq!(sent[0].title(), "Garage door");
    assert_eq!(sent[0].body(), "open");
    assert_eq!(sent[0].android().color.as_deref(), Some("#FF0000"));
    assert_eq!(sent[0].android().tag.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_other_garage_states_are_green() {
    let sender = Arc::new(RecordingSender::new(false));
    let router = router(sender.clone(), Arc::new(RecordingMetrics::default()));

    for payload in ["closed", "opening", "Open", ""] {
        router.on_event(garage_event(payload)).unwrap().await.unwrap();
    }

    for (payload, sent) in ["closed", "opening", "Open", ""].iter().zip(sender.sent()) {
        assert_eq!(sent.title(), "Garage door");
        assert_eq!(sent.body(), *payload);
        assert_eq!(sent.android().color.as_deref(), Some("#00FF00"));
        assert_eq!(sent.android().tag.as_deref(), Some("2"));
    }
}

#[tokio::test]
async fn test_unmapped_topics_are_ignored() {
    let sender = Arc::new(RecordingSender::new(false));
    let metrics = Arc::new(RecordingMetrics::default());
    let router = router(sender.clone(), metrics.clone());

    let topics = [
        cistern_topic(SYSTEM_ID),
        "/devices/other-system/controls/Garage door".to_string(),
        "/devices/123456-garage/controls/Garage door/on".to_string(),
    ];
    for topic in topics {
        assert!(router.on_event(BusEvent::new(topic, "open")).is_none());
    }

    assert!(sender.sent().is_empty());
    assert_eq!(metrics.ignored.load(Ordering::SeqCst), 3);
    assert_eq!(metrics.dispatch_failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_dispatch_does_not_stop_router() {
    let sender = Arc::new(RecordingSender::new(true));
    let metrics = Arc::new(RecordingMetrics::default());
    let router = router(sender.clone(), metrics.clone());

    let first = router.on_event(garage_event("open")).unwrap();
    let second = router.on_event(garage_event("closed")).unwrap();

    for handle in [first, second] {
        let result = handle.await.unwrap();
        assert!(!result.success);
        assert!(matches!(
            result.error,
            Some(DispatchError::Rejected { status: 400, .. })
        ));
    }
    assert_eq!(metrics.dispatch_failures.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bridge_resubscribes_after_reconnect() {
    let (bus, subscriptions) = ScriptedBus::new(vec![
        BusNotification::Connected,
        BusNotification::Event(garage_event("open")),
        BusNotification::Event(BusEvent::new(cistern_topic(SYSTEM_ID), "1")),
        BusNotification::ConnectionLost {
            reason: "keep-alive timeout".to_string(),
        },
        BusNotification::Connected,
        BusNotification::Event(garage_event("closed")),
    ]);
    let sender = Arc::new(RecordingSender::new(false));
    let metrics = Arc::new(RecordingMetrics::default());

    let mut service = BridgeService::new(
        Box::new(bus),
        router(sender.clone(), metrics.clone()),
        device_subscriptions(SYSTEM_ID),
        metrics.clone(),
    );
    service.run(std::future::pending()).await.unwrap();

    let expected: Vec<String> = device_subscriptions(SYSTEM_ID)
        .into_iter()
        .cycle()
        .take(4)
        .collect();
    assert_eq!(*subscriptions.lock().unwrap(), expected);

    sender.wait_for(2).await;
    let mut bodies: Vec<String> = sender.sent().iter().map(|p| p.body().to_string()).collect();
    bodies.sort();
    assert_eq!(bodies, vec!["closed", "open"]);

    assert_eq!(service.current_state(), ConnectionState::Stopped);
    assert_eq!(service.lifecycle().connect_count(), 2);
    assert_eq!(metrics.reconnects.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.ignored.load(Ordering::SeqCst), 1);
    assert_eq!(
        *metrics.states.lock().unwrap(),
        vec![
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting { attempt: 1 },
            ConnectionState::Connected,
            ConnectionState::Stopped,
        ]
    );
}

#[tokio::test]
async fn test_bridge_keeps_running_after_dispatch_failure() {
    let (bus, _) = ScriptedBus::new(vec![
        BusNotification::Connected,
        BusNotification::Event(garage_event("open")),
        BusNotification::Event(garage_event("closed")),
        BusNotification::Event(garage_event("open")),
    ]);
    let sender = Arc::new(RecordingSender::new(true));
    let metrics = Arc::new(RecordingMetrics::default());

    let mut service = BridgeService::new(
        Box::new(bus),
        router(sender.clone(), metrics.clone()),
        device_subscriptions(SYSTEM_ID),
        metrics.clone(),
    );
    service.run(std::future::pending()).await.unwrap();

    sender.wait_for(3).await;
    assert_eq!(metrics.routed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_bridge_keeps_running_after_subscribe_failure() {
    let (bus, subscriptions) = ScriptedBus::new(vec![
        BusNotification::Connected,
        BusNotification::Event(garage_event("open")),
        BusNotification::Event(garage_event("closed")),
    ]);
    let sender = Arc::new(RecordingSender::new(false));
    let metrics = Arc::new(RecordingMetrics::default());

    let mut service = BridgeService::new(
        Box::new(bus.rejecting_subscriptions()),
        router(sender.clone(), metrics.clone()),
        device_subscriptions(SYSTEM_ID),
        metrics.clone(),
    );
    service.run(std::future::pending()).await.unwrap();

    // Every topic is still attempted
    assert_eq!(*subscriptions.lock().unwrap(), device_subscriptions(SYSTEM_ID));
    sender.wait_for(2).await;
    assert_eq!(metrics.routed.load(Ordering::SeqCst), 2);
    assert_eq!(service.current_state(), ConnectionState::Stopped);
}

#[tokio::test]
async fn test_bridge_stops_on_shutdown() {
    let metrics = Arc::new(RecordingMetrics::default());
    let mut service = BridgeService::new(
        Box::new(SilentBus),
        router(Arc::new(RecordingSender::new(false)), metrics.clone()),
        device_subscriptions(SYSTEM_ID),
        metrics,
    );

    tokio::time::timeout(
        Duration::from_secs(1),
        service.run(tokio::time::sleep(Duration::from_millis(20))),
    )
    .await
    .expect("shutdown should stop the bridge")
    .unwrap();

    assert_eq!(service.current_state(), ConnectionState::Stopped);
}
