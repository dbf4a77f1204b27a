//! End-to-end relay scenarios through real networking nodes.

use crate::test_utils::{init_tracing, open_policy, TestStation};
use gridlink_core::{MessageContext, NodeIdentity};
use gridlink_crypto::KeyPair;
use gridlink_policy::rules::{SigningAction, SigningRule, VerificationAction, VerificationRule};
use gridlink_policy::{SignaturePolicy, SignerCredential};
use gridlink_routing::ForwardingDecision;
use gridlink_node::{NetworkingNode, PipelineOutcome};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Station -> local controller -> CSMS, with the controller verifying
/// station signatures before relaying.
#[tokio::test]
async fn test_two_hop_relay_with_verification() {
    init_tracing();

    let station = TestStation::new("CS-001");
    let lc_policy = open_policy("lc-policy");
    lc_policy.add_verification_rule(
        VerificationRule::new("ocpp/metering...", VerificationAction::VerifyAll),
        None,
    );

    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), lc_policy);
    let (csms_tx, mut csms_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CSMS-001"), csms_tx, 0);

    // The station signs its reading before sending it to the controller
    let mut reading = station.message(
        "meter-001",
        "ocpp/metering/values",
        "CSMS-001",
        serde_json::json!({"connector": 1, "wh": 15230}),
    );
    let station_policy = open_policy("station-policy");
    station_policy
        .sign(
            &mut reading,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    let outcome = lc.process_message(reading).await.unwrap();
    assert_eq!(outcome, PipelineOutcome::Delivered);

    let relayed = csms_rx.recv().await.unwrap();
    assert_eq!(relayed.identification, "meter-001");
    // Both hops are on the path, in order
    assert_eq!(
        relayed.network_path.hops(),
        &[NodeIdentity::from("CS-001"), NodeIdentity::from("LC-1")]
    );
    // The station's signature rides along unchanged
    assert_eq!(relayed.signatures.len(), 1);
    assert_eq!(relayed.signatures[0].key_id, station.key_pair.public_key_hex());
}

#[tokio::test]
async fn test_tampered_relay_never_reaches_the_csms() {
    let station = TestStation::new("CS-001");
    let lc_policy = open_policy("lc-policy");
    lc_policy.add_verification_rule(
        VerificationRule::new("ocpp/metering...", VerificationAction::VerifyAll),
        None,
    );

    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), lc_policy);
    let (csms_tx, mut csms_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CSMS-001"), csms_tx, 0);

    let mut reading = station.message(
        "meter-002",
        "ocpp/metering/values",
        "CSMS-001",
        serde_json::json!({"connector": 1, "wh": 100}),
    );
    open_policy("station-policy")
        .sign(
            &mut reading,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    // A hop in the middle inflates the reading
    reading.payload["wh"] = serde_json::json!(999_999);

    assert!(lc.process_message(reading).await.is_err());
    assert!(csms_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_reject_hook_sends_prebuilt_response_back() {
    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), open_policy("lc-policy"));
    let (station_tx, mut station_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CS-001"), station_tx, 0);

    lc.register_decision_hook(
        MessageContext::from("ocpp/charging/profile"),
        Arc::new(|request| {
            let mut response = request.clone();
            response.destination = request.source.clone();
            response.source = NodeIdentity::from("LC-1");
            response.payload = serde_json::json!({"status": "Rejected"});
            response.network_path = Default::default();
            ForwardingDecision::reject_with_response("profiles are managed locally", response)
        }),
    );

    let station = TestStation::new("CS-001");
    let request = station.message(
        "req-9",
        "ocpp/charging/profile",
        "CSMS-001",
        serde_json::json!({"limit": 32}),
    );

    let outcome = lc.process_message(request).await.unwrap();
    assert!(matches!(outcome, PipelineOutcome::Rejected { .. }));

    let response = station_rx.recv().await.unwrap();
    assert_eq!(response.destination, NodeIdentity::from("CS-001"));
    assert_eq!(response.payload["status"], serde_json::json!("Rejected"));
}

#[tokio::test]
async fn test_replace_hook_substitute_is_resigned_by_the_controller() {
    let lc_pair = KeyPair::generate("secp256r1");
    let lc_policy = open_policy("lc-policy");
    lc_policy.add_signing_rule(
        SigningRule::new("ocpp/display...", SigningAction::Sign).with_key_pair(lc_pair.clone()),
        None,
    );

    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), lc_policy);
    let (csms_tx, mut csms_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CSMS-001"), csms_tx, 0);

    lc.register_decision_hook(
        MessageContext::from("ocpp/display/message"),
        Arc::new(|original| {
            let mut substitute = original.clone();
            substitute.payload = serde_json::json!({"text": "[filtered]"});
            substitute.signatures.clear();
            ForwardingDecision::replace(substitute)
        }),
    );

    let station = TestStation::new("CS-001");
    let original = station.message(
        "disp-1",
        "ocpp/display/message",
        "CSMS-001",
        serde_json::json!({"text": "free tacos at bay 4"}),
    );

    let outcome = lc.process_message(original).await.unwrap();
    assert_eq!(outcome, PipelineOutcome::Delivered);

    let delivered = csms_rx.recv().await.unwrap();
    assert_eq!(delivered.payload["text"], serde_json::json!("[filtered]"));
    // Signed by the controller, not the station
    assert_eq!(delivered.signatures.len(), 1);
    assert_eq!(delivered.signatures[0].key_id, lc_pair.public_key_hex());
}

/// A station reconnecting gets its newest binding; messages routed to it
/// use the replacement transparently.
#[tokio::test]
async fn test_reconnect_supersedes_binding() {
    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), open_policy("lc-policy"));

    let (old_tx, mut old_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CS-001"), old_tx, 0);

    // Station reconnects through a fresh channel
    let (new_tx, mut new_rx) = mpsc::channel(8);
    let superseded = lc.attach_peer(NodeIdentity::from("CS-001"), new_tx, 0);
    assert!(superseded.is_some());

    let station = TestStation::new("CSMS-001");
    let command = station.message(
        "cmd-1",
        "ocpp/availability/change",
        "CS-001",
        serde_json::json!({"operative": false}),
    );

    let outcome = lc.process_message(command).await.unwrap();
    assert_eq!(outcome, PipelineOutcome::Delivered);

    assert!(old_rx.try_recv().is_err());
    assert_eq!(new_rx.recv().await.unwrap().identification, "cmd-1");
}

#[tokio::test]
async fn test_strict_policy_drops_unwanted_contexts_end_to_end() {
    // Verification Drop rule: message vanishes without reaching the peer and
    // without an error.
    let lc_policy = open_policy("lc-policy");
    lc_policy.add_verification_rule(
        VerificationRule::new("ocpp/datatransfer...", VerificationAction::Drop),
        None,
    );

    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), lc_policy);
    let (csms_tx, mut csms_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CSMS-001"), csms_tx, 0);

    let station = TestStation::new("CS-001");
    let mut message = station.message(
        "dt-1",
        "ocpp/datatransfer/vendor",
        "CSMS-001",
        serde_json::json!({"vendorId": "x"}),
    );
    open_policy("station-policy")
        .sign(
            &mut message,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    let outcome = lc.process_message(message).await.unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dropped { .. }));
    assert!(csms_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_controller_originates_signed_messages() {
    let lc_pair = KeyPair::generate("secp384r1");
    let lc_policy = open_policy("lc-policy");
    lc_policy.add_signing_rule(
        SigningRule::new("ocpp/firmware...", SigningAction::Sign).with_key_pair(lc_pair.clone()),
        None,
    );

    let lc = NetworkingNode::new(NodeIdentity::from("LC-1"), lc_policy);
    let (cs_tx, mut cs_rx) = mpsc::channel(8);
    lc.attach_peer(NodeIdentity::from("CS-001"), cs_tx, 0);

    let command = gridlink_core::MessageEnvelope::new(
        "fw-1",
        MessageContext::from("ocpp/firmware/update"),
        NodeIdentity::from("LC-1"),
        NodeIdentity::from("CS-001"),
        serde_json::json!({"location": "https://updates.local/fw.bin"}),
    );

    let outcome = lc.send_message(command).await.unwrap();
    assert_eq!(outcome, PipelineOutcome::Delivered);

    let delivered = cs_rx.recv().await.unwrap();
    assert_eq!(delivered.signatures.len(), 1);
    assert_eq!(delivered.signatures[0].key_id, lc_pair.public_key_hex());
    assert_eq!(delivered.network_path.hops(), &[NodeIdentity::from("LC-1")]);

    // The station can verify what the controller signed
    let station_policy = SignaturePolicy::new(
        "station-policy",
        SigningAction::ForwardUnsigned,
        None,
        VerificationAction::VerifyAll,
        Some(lc_pair),
    )
    .unwrap();
    station_policy.add_verification_rule(
        VerificationRule::new("ocpp/firmware...", VerificationAction::VerifyAll),
        None,
    );
    let mut received = delivered;
    assert_eq!(
        station_policy.verify(&mut received).unwrap(),
        gridlink_policy::VerifyOutcome::Accepted
    );
}
