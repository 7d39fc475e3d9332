//! Simulated managed node.
//!
//! Subscribes to directives addressed to one node ID and answers on the
//! response topic according to its [`NodeBehaviour`].

use std::sync::{Arc, Mutex};

use futures::StreamExt;
use serde_json::{json, Value};
use shared_bus::{
    BusEvent, DirectiveEnvelope, EventFilter, EventPublisher, EventTopic, InMemoryEventBus,
    ResponseEnvelope,
};
use tokio::task::JoinHandle;

/// How the node answers each directive.
#[derive(Debug, Clone)]
pub enum NodeBehaviour {
    /// Answer with a fixed success payload.
    Reply(Value),
    /// Answer with the directive's own payload.
    Mirror,
    /// Answer with a failure response.
    Fail(Value),
    /// Never answer.
    Silent,
    /// Answer twice with two different payloads.
    AnswerTwice,
}

/// Handle to a running simulated node.
pub struct SimulatedNode {
    received: Arc<Mutex<Vec<DirectiveEnvelope>>>,
    task: JoinHandle<()>,
}

impl SimulatedNode {
    /// Start a node. The subscription exists by the time this returns.
    pub fn spawn(bus: Arc<InMemoryEventBus>, node_id: &str, behaviour: NodeBehaviour) -> Self {
        let filter = EventFilter {
            topics: vec![EventTopic::Directives],
            node_ids: vec![node_id.to_string()],
        };
        let mut directives = bus.event_stream(filter).expect("bus is open");
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&received);

        let task = tokio::spawn(async move {
            while let Some(event) = directives.next().await {
                let BusEvent::Directive(directive) = event else {
                    continue;
                };
                log.lock().unwrap().push(directive.clone());

                for response in answers(&behaviour, &directive) {
                    if bus.publish(BusEvent::Response(response)).await.is_err() {
                        return;
                    }
                }
            }
        });

        Self { received, task }
    }

    /// Directives seen so far.
    pub fn received(&self) -> Vec<DirectiveEnvelope> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for SimulatedNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn answers(behaviour: &NodeBehaviour, directive: &DirectiveEnvelope) -> Vec<ResponseEnvelope> {
    let id = directive.correlation_id.as_str();
    let node = directive.node_id.as_str();
    match behaviour {
        NodeBehaviour::Reply(payload) => vec![ResponseEnvelope::ok(id, node, payload.clone())],
        NodeBehaviour::Mirror => vec![ResponseEnvelope::ok(id, node, directive.payload.clone())],
        NodeBehaviour::Fail(payload) => vec![ResponseEnvelope::failed(id, node, payload.clone())],
        NodeBehaviour::Silent => Vec::new(),
        NodeBehaviour::AnswerTwice => vec![
            ResponseEnvelope::ok(id, node, json!({"answer": 1})),
            ResponseEnvelope::ok(id, node, json!({"answer": 2})),
        ],
    }
}
