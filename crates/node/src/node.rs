//! The networking node: per-message security and routing pipeline.
//!
//! Every message moves through the same states:
//!
//! ```text
//! Received -> PolicyChecked -> Decided -> Routed -> Delivered
//!                                                 | Rejected
//!                                                 | Dropped
//! ```
//!
//! Verification errors abort before any forwarding decision runs;
//! Drop/Reject decisions short-circuit routing. A cancellation signal is
//! checked between steps and aborts the current message only; shared state
//! (routing table, rule sets) is never left partially mutated because the
//! pipeline touches it only at the final transmit step.

use crate::error::{NodeError, Result};
use gridlink_core::{MessageContext, MessageEnvelope, NodeIdentity};
use gridlink_policy::{SignOutcome, SignaturePolicy, VerifyOutcome};
use gridlink_routing::{DecisionEngine, DecisionHook, ForwardingOutcome, RoutingTable};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Outbound transport binding for one peer.
///
/// The transport layer drains the receiving half and writes to the socket;
/// the pipeline only ever sees this sender.
pub type PeerLink = mpsc::Sender<MessageEnvelope>;

/// Pipeline state, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Received,
    PolicyChecked,
    Decided,
    Routed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Received => "received",
            PipelineState::PolicyChecked => "policy_checked",
            PipelineState::Decided => "decided",
            PipelineState::Routed => "routed",
        };
        f.write_str(name)
    }
}

/// Terminal state of one message's trip through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Handed to the destination's transport binding
    Delivered,
    /// Not delivered; the sender was (or should be) told why
    Rejected { reason: Option<String> },
    /// Not delivered, silently
    Dropped { reason: Option<String> },
}

/// A local controller node: verifies, decides, routes and re-signs messages
/// between its attached peers.
pub struct NetworkingNode {
    identity: NodeIdentity,
    policy: Arc<SignaturePolicy>,
    decisions: Arc<DecisionEngine>,
    routes: Arc<RoutingTable<PeerLink>>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl NetworkingNode {
    /// Create a node with an empty routing table and no decision hooks.
    pub fn new(identity: NodeIdentity, policy: Arc<SignaturePolicy>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            identity,
            policy,
            decisions: Arc::new(DecisionEngine::new()),
            routes: Arc::new(RoutingTable::new()),
            cancel_tx,
            cancel_rx,
        }
    }

    /// Replace the routing table, e.g. to enable binding aging.
    pub fn with_routing_table(mut self, routes: RoutingTable<PeerLink>) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    /// This node's identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// The signature policy in force.
    pub fn policy(&self) -> &SignaturePolicy {
        &self.policy
    }

    /// The routing table.
    pub fn routes(&self) -> &RoutingTable<PeerLink> {
        &self.routes
    }

    /// Register the binding for a newly connected peer.
    ///
    /// Returns the superseded binding when the peer was already attached
    /// (reconnect).
    pub fn attach_peer(
        &self,
        peer: NodeIdentity,
        link: PeerLink,
        priority: u8,
    ) -> Option<PeerLink> {
        tracing::info!(node = %self.identity, %peer, "peer attached");
        self.routes.set(peer, link, priority)
    }

    /// Tear down the binding for a disconnected peer.
    pub fn detach_peer(&self, peer: &NodeIdentity) -> Option<PeerLink> {
        tracing::info!(node = %self.identity, %peer, "peer detached");
        self.routes.remove(peer)
    }

    /// Register a forwarding decision hook for a message context.
    pub fn register_decision_hook(&self, context: MessageContext, hook: DecisionHook) {
        self.decisions.register(context, hook);
    }

    /// Signal cancellation: in-flight messages abort at their next step
    /// boundary.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Originate a message from this node: sign, route, transmit.
    pub async fn send_message(&self, mut envelope: MessageEnvelope) -> Result<PipelineOutcome> {
        match self.policy.sign(&mut envelope, &[])? {
            SignOutcome::Signed(_) | SignOutcome::Unsigned => {}
            SignOutcome::Dropped => {
                return Ok(PipelineOutcome::Dropped {
                    reason: Some("signing policy".to_string()),
                })
            }
            SignOutcome::Rejected => {
                return Ok(PipelineOutcome::Rejected {
                    reason: Some("signing policy".to_string()),
                })
            }
        }
        self.check_cancelled(&envelope)?;

        envelope.network_path.push(self.identity.clone());
        self.transmit(envelope).await
    }

    /// Run an inbound message through the full pipeline.
    pub async fn process_message(&self, mut envelope: MessageEnvelope) -> Result<PipelineOutcome> {
        let identification = envelope.identification.clone();
        tracing::debug!(
            node = %self.identity,
            %identification,
            context = %envelope.context,
            state = %PipelineState::Received,
            "message received"
        );
        self.check_cancelled(&envelope)?;

        // Verification first; an error here means no decision hook ever sees
        // the message.
        match self.policy.verify(&mut envelope)? {
            VerifyOutcome::Accepted => {}
            VerifyOutcome::Dropped => {
                tracing::warn!(node = %self.identity, %identification, "dropped by verification policy");
                return Ok(PipelineOutcome::Dropped {
                    reason: Some("verification policy".to_string()),
                });
            }
            VerifyOutcome::Rejected => {
                tracing::warn!(node = %self.identity, %identification, "rejected by verification policy");
                return Ok(PipelineOutcome::Rejected {
                    reason: Some("verification policy".to_string()),
                });
            }
        }
        tracing::trace!(node = %self.identity, %identification, state = %PipelineState::PolicyChecked, "signatures checked");
        self.check_cancelled(&envelope)?;

        // A path already containing this node is a loop.
        if envelope.network_path.contains(&self.identity) {
            tracing::warn!(node = %self.identity, %identification, "routing loop detected");
            return Ok(PipelineOutcome::Dropped {
                reason: Some("routing loop".to_string()),
            });
        }

        let decision = self.decisions.decide(&envelope);
        tracing::trace!(
            node = %self.identity,
            %identification,
            state = %PipelineState::Decided,
            outcome = ?decision.outcome,
            "forwarding decision made"
        );
        self.check_cancelled(&envelope)?;

        match decision.outcome {
            ForwardingOutcome::Drop => Ok(PipelineOutcome::Dropped {
                reason: decision.reason,
            }),
            ForwardingOutcome::Reject => {
                if let Some(response) = decision.rejection {
                    // Best effort; the rejection itself is already decided.
                    if let Err(e) = self.send_message(response).await {
                        tracing::warn!(node = %self.identity, %identification, error = %e, "rejection response undeliverable");
                    }
                }
                Ok(PipelineOutcome::Rejected {
                    reason: decision.reason,
                })
            }
            ForwardingOutcome::Forward => {
                envelope.network_path.push(self.identity.clone());
                self.transmit(envelope).await
            }
            ForwardingOutcome::Replace => {
                // The substitute is a new message originated here and goes
                // through the local signing rules.
                let Some(mut substitute) = decision.replacement else {
                    return Ok(PipelineOutcome::Dropped {
                        reason: Some("replace decision without substitute".to_string()),
                    });
                };
                match self.policy.sign(&mut substitute, &[])? {
                    SignOutcome::Signed(_) | SignOutcome::Unsigned => {}
                    SignOutcome::Dropped => {
                        return Ok(PipelineOutcome::Dropped {
                            reason: Some("signing policy".to_string()),
                        })
                    }
                    SignOutcome::Rejected => {
                        return Ok(PipelineOutcome::Rejected {
                            reason: Some("signing policy".to_string()),
                        })
                    }
                }
                self.check_cancelled(&substitute)?;
                substitute.network_path.push(self.identity.clone());
                self.transmit(substitute).await
            }
        }
    }

    async fn transmit(&self, envelope: MessageEnvelope) -> Result<PipelineOutcome> {
        let identification = envelope.identification.clone();
        let link = self.routes.resolve(&envelope.destination)?;
        tracing::trace!(
            node = %self.identity,
            %identification,
            destination = %envelope.destination,
            state = %PipelineState::Routed,
            "binding resolved"
        );
        link.send(envelope)
            .await
            .map_err(|e| NodeError::Transport(format!("peer binding closed: {e}")))?;
        tracing::debug!(node = %self.identity, %identification, "message delivered");
        Ok(PipelineOutcome::Delivered)
    }

    fn check_cancelled(&self, envelope: &MessageEnvelope) -> Result<()> {
        if *self.cancel_rx.borrow() {
            return Err(NodeError::Cancelled {
                identification: envelope.identification.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for NetworkingNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkingNode")
            .field("identity", &self.identity)
            .field("policy", &self.policy.identification())
            .field("peers", &self.routes.len())
            .finish()
    }
}
