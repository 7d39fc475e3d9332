//! # Directive Round Trips
//!
//! Gateway → bus → simulated node → bus → gateway, in both calling
//! conventions.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use receptor_gateway::{
        DirectiveError, DirectiveMode, DirectiveOutcome, DirectiveParams, GatewayClient,
        GatewayConfig,
    };
    use serde_json::json;
    use shared_bus::InMemoryEventBus;
    use tokio::sync::oneshot;

    use crate::integration::node::{NodeBehaviour, SimulatedNode};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.timeouts.sweep_interval = Duration::from_millis(10);
        config
    }

    fn started_client(bus: &Arc<InMemoryEventBus>, config: GatewayConfig) -> GatewayClient {
        let client = GatewayClient::with_event_bus(config, Arc::clone(bus)).unwrap();
        client.start().unwrap();
        client
    }

    fn ping(node_id: &str) -> DirectiveParams {
        DirectiveParams::new("0001", node_id, "receptor:ping", json!({"ping": true}))
    }

    async fn run_blocking(client: &GatewayClient, params: DirectiveParams) -> DirectiveOutcome {
        client
            .directive(params, DirectiveMode::Blocking)
            .into_blocking()
            .unwrap()
            .execute()
            .await
    }

    async fn run_non_blocking(client: &GatewayClient, params: DirectiveParams) -> DirectiveOutcome {
        let (tx, rx) = oneshot::channel();
        client
            .directive(params, DirectiveMode::NonBlocking)
            .into_non_blocking()
            .unwrap()
            .execute(move |outcome| {
                let _ = tx.send(outcome);
            })
            .await;
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("callback fired")
            .expect("callback sender kept")
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_blocking_round_trip() {
        let bus = Arc::new(InMemoryEventBus::new());
        let node = SimulatedNode::spawn(
            Arc::clone(&bus),
            "node-a",
            NodeBehaviour::Reply(json!({"result": "ok"})),
        );
        let client = started_client(&bus, config());

        let outcome = run_blocking(&client, ping("node-a")).await;

        assert_eq!(outcome, Ok(json!({"result": "ok"})));
        assert_eq!(node.received().len(), 1);
        assert_eq!(client.stats().resolved, 1);
        assert_eq!(client.stats().pending, 0);
    }

    #[tokio::test]
    async fn test_non_blocking_round_trip() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(
            Arc::clone(&bus),
            "node-a",
            NodeBehaviour::Reply(json!({"result": "ok"})),
        );
        let client = started_client(&bus, config());

        let outcome = run_non_blocking(&client, ping("node-a")).await;
        assert_eq!(outcome, Ok(json!({"result": "ok"})));
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces_as_remote_error() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(
            Arc::clone(&bus),
            "node-a",
            NodeBehaviour::Fail(json!({"error": "unknown directive"})),
        );
        let client = started_client(&bus, config());

        let outcome = run_blocking(&client, ping("node-a")).await;
        assert_eq!(
            outcome,
            Err(DirectiveError::Remote(json!({"error": "unknown directive"})))
        );

        let outcome = run_non_blocking(&client, ping("node-a")).await;
        assert!(matches!(outcome, Err(DirectiveError::Remote(_))));
    }

    #[tokio::test]
    async fn test_silent_node_times_out() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(Arc::clone(&bus), "node-a", NodeBehaviour::Silent);
        let client = started_client(&bus, config());

        let blocking = run_blocking(&client, ping("node-a").with_timeout(Duration::from_millis(50))).await;
        assert_eq!(blocking, Err(DirectiveError::Timeout(Duration::from_millis(50))));

        let non_blocking =
            run_non_blocking(&client, ping("node-a").with_timeout(Duration::from_millis(50))).await;
        assert_eq!(non_blocking, Err(DirectiveError::Timeout(Duration::from_millis(50))));

        assert_eq!(client.stats().timed_out, 2);
    }

    #[tokio::test]
    async fn test_directive_for_other_node_is_not_answered() {
        let bus = Arc::new(InMemoryEventBus::new());
        let node = SimulatedNode::spawn(
            Arc::clone(&bus),
            "node-a",
            NodeBehaviour::Reply(json!({"result": "ok"})),
        );
        let client = started_client(&bus, config());

        let outcome = run_blocking(&client, ping("node-b").with_timeout(Duration::from_millis(50))).await;
        assert!(matches!(outcome, Err(DirectiveError::Timeout(_))));
        assert!(node.received().is_empty());
    }

    #[tokio::test]
    async fn test_second_answer_is_discarded() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(Arc::clone(&bus), "node-a", NodeBehaviour::AnswerTwice);
        let client = started_client(&bus, config());

        let outcome = run_blocking(&client, ping("node-a")).await;
        assert_eq!(outcome, Ok(json!({"answer": 1})));

        // Give the listener time to see the duplicate.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.stats().late_discarded, 1);
        assert_eq!(client.stats().resolved, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_directives_get_their_own_responses() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(Arc::clone(&bus), "node-a", NodeBehaviour::Mirror);
        let client = Arc::new(started_client(&bus, config()));

        let mut handles = Vec::new();
        for n in 0..20 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                let params = DirectiveParams::new("0001", "node-a", "receptor:echo", json!({"n": n}));
                (n, run_blocking(&client, params).await)
            }));
        }

        for handle in handles {
            let (n, outcome) = handle.await.unwrap();
            assert_eq!(outcome, Ok(json!({"n": n})));
        }
        assert_eq!(client.stats().resolved, 20);
    }

    #[tokio::test]
    async fn test_directive_carries_psk_headers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let node = SimulatedNode::spawn(
            Arc::clone(&bus),
            "node-a",
            NodeBehaviour::Reply(json!({"result": "ok"})),
        );
        let mut config = config();
        config.auth.pre_shared_key = Some("abc".into());
        let client = started_client(&bus, config);

        run_blocking(&client, ping("node-a")).await.unwrap();

        let received = node.received();
        let headers = &received[0].headers;
        assert_eq!(headers["x-rh-receptor-controller-psk"], "abc");
        assert_eq!(headers["x-rh-receptor-controller-client-id"], "topological-inventory");
        assert_eq!(headers["x-rh-receptor-controller-account"], "0001");
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(received[0].directive, "receptor:ping");
    }
}
