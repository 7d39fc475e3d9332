//! # Shutdown Flows
//!
//! `stop()` releases every waiting caller, and a dead bus surfaces as a
//! transport error.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use receptor_gateway::{
        DirectiveError, DirectiveMode, DirectiveOutcome, DirectiveParams, GatewayClient,
        GatewayConfig, GatewayError,
    };
    use serde_json::json;
    use shared_bus::InMemoryEventBus;

    use crate::integration::node::{NodeBehaviour, SimulatedNode};

    fn ping() -> DirectiveParams {
        DirectiveParams::new("0001", "node-a", "receptor:ping", json!({}))
    }

    fn started_client(bus: &Arc<InMemoryEventBus>) -> Arc<GatewayClient> {
        let client = GatewayClient::with_event_bus(GatewayConfig::default(), Arc::clone(bus)).unwrap();
        client.start().unwrap();
        Arc::new(client)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_releases_blocked_callers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let node = SimulatedNode::spawn(Arc::clone(&bus), "node-a", NodeBehaviour::Silent);
        let client = started_client(&bus);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    client
                        .directive(ping(), DirectiveMode::Blocking)
                        .into_blocking()
                        .unwrap()
                        .execute()
                        .await
                })
            })
            .collect();

        // Wait until all three are published and pending.
        while node.received().len() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(client.stats().pending, 3);

        client.stop();

        for handle in handles {
            let outcome = tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .expect("released by stop")
                .unwrap();
            assert_eq!(outcome, Err(DirectiveError::ShuttingDown));
        }
        assert_eq!(client.stats().shut_down, 3);
    }

    #[tokio::test]
    async fn test_stop_notifies_callbacks() {
        let bus = Arc::new(InMemoryEventBus::new());
        let _node = SimulatedNode::spawn(Arc::clone(&bus), "node-a", NodeBehaviour::Silent);
        let client = started_client(&bus);
        let outcomes: Arc<Mutex<Vec<DirectiveOutcome>>> = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let sink = Arc::clone(&outcomes);
            client
                .directive(ping(), DirectiveMode::NonBlocking)
                .into_non_blocking()
                .unwrap()
                .execute(move |outcome| sink.lock().unwrap().push(outcome))
                .await;
        }

        client.stop();

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .all(|o| *o == Err(DirectiveError::ShuttingDown)));
    }

    #[tokio::test]
    async fn test_directives_after_stop_are_refused() {
        let bus = Arc::new(InMemoryEventBus::new());
        let client = started_client(&bus);
        client.stop();

        let outcome = client
            .directive(ping(), DirectiveMode::Blocking)
            .into_blocking()
            .unwrap()
            .execute()
            .await;
        assert_eq!(outcome, Err(DirectiveError::ShuttingDown));
        assert!(matches!(client.start(), Err(GatewayError::ShuttingDown)));
    }

    #[tokio::test]
    async fn test_closed_bus_is_transport_error() {
        let bus = Arc::new(InMemoryEventBus::new());
        let client = started_client(&bus);
        bus.close();

        let outcome = client
            .directive(ping(), DirectiveMode::Blocking)
            .into_blocking()
            .unwrap()
            .execute()
            .await;
        assert!(matches!(outcome, Err(DirectiveError::Transport(_))));
        assert_eq!(client.stats().pending, 0);
    }

    #[tokio::test]
    async fn test_start_on_closed_bus_fails() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.close();
        let client = GatewayClient::with_event_bus(GatewayConfig::default(), bus).unwrap();
        assert!(matches!(client.start(), Err(GatewayError::Bus(_))));
    }
}
