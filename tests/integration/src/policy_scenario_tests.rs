//! Signature policy scenarios over the full sign/verify path.

use crate::test_utils::{current_timestamp_ms, init_tracing, TestStation};
use gridlink_core::{
    KeyHint, MessageContext, MessageEnvelope, SignatureStatus, SignerInfoHint,
};
use gridlink_crypto::KeyPair;
use gridlink_policy::rules::{
    ContextPattern, SigningAction, SigningRule, VerificationAction, VerificationRule,
};
use gridlink_policy::{PolicyError, SignOutcome, SignaturePolicy, SignerCredential, VerifyOutcome};

fn metering_message(station: &TestStation) -> MessageEnvelope {
    station.message(
        "meter-001",
        "ocpp/metering/values",
        "CSMS-001",
        serde_json::json!({"connector": 1, "wh": 15230}),
    )
}

#[test]
fn test_scenario_unsigned_send_under_permissive_default() {
    // Default ForwardUnsigned, no rules, no keys anywhere: the message goes
    // out untouched.
    init_tracing();
    let policy = SignaturePolicy::new(
        "lc-policy",
        SigningAction::ForwardUnsigned,
        None,
        VerificationAction::AcceptUnverified,
        None,
    )
    .unwrap();

    let station = TestStation::new("CS-001");
    let mut envelope = metering_message(&station);

    assert_eq!(policy.sign(&mut envelope, &[]).unwrap(), SignOutcome::Unsigned);
    assert!(envelope.signatures.is_empty());
}

#[test]
fn test_scenario_required_signature_without_credentials_fails() {
    // Default Sign with a default key pair configured: the default key is
    // never an implicit signer, so a send with no credentials errors out.
    let policy = SignaturePolicy::new(
        "lc-policy",
        SigningAction::Sign,
        Some(KeyPair::generate("secp256r1")),
        VerificationAction::AcceptUnverified,
        None,
    )
    .unwrap();

    let station = TestStation::new("CS-001");
    let mut envelope = metering_message(&station);

    assert!(matches!(
        policy.sign(&mut envelope, &[]),
        Err(PolicyError::MissingSigningCredentials { .. })
    ));
    assert!(envelope.signatures.is_empty());
}

#[test]
fn test_scenario_verify_any_with_mixed_signatures() {
    // Two signatures, first invalid, second valid; VerifyAny accepts and
    // stops at the valid one.
    let station = TestStation::new("CS-001");
    let stranger = KeyPair::generate("secp256r1");

    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_verification_rule(
        VerificationRule::new("ocpp/metering...", VerificationAction::VerifyAny),
        None,
    );

    let mut envelope = metering_message(&station);
    policy
        .sign(
            &mut envelope,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    // Prepend a signature whose key never signed this message
    let mut forged = envelope.signatures[0].clone();
    forged.key_id = stranger.public_key_hex().to_string();
    envelope.signatures.insert(0, forged);

    assert_eq!(policy.verify(&mut envelope).unwrap(), VerifyOutcome::Accepted);
    assert_eq!(envelope.signatures[0].status, SignatureStatus::InvalidSignature);
    assert_eq!(envelope.signatures[1].status, SignatureStatus::ValidSignature);
}

#[test]
fn test_scenario_verify_all_fails_on_one_bad_signature() {
    let station = TestStation::new("CS-001");

    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_verification_rule(
        VerificationRule::new("ocpp/metering...", VerificationAction::VerifyAll),
        None,
    );

    let mut envelope = metering_message(&station);
    policy
        .sign(
            &mut envelope,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    let mut corrupted = envelope.signatures[0].clone();
    corrupted.value[6] ^= 0x01;
    envelope.signatures.push(corrupted);

    assert!(matches!(
        policy.verify(&mut envelope),
        Err(PolicyError::VerificationFailed { .. })
    ));
}

#[test]
fn test_wildcard_pattern_scopes_rules() {
    let pattern = ContextPattern::from("ocpp/charging...");
    assert!(pattern.matches(&MessageContext::from("ocpp/charging/profile")));
    assert!(pattern.matches(&MessageContext::from("ocpp/charging")));
    assert!(!pattern.matches(&MessageContext::from("ocpp/other")));

    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_verification_rule(
        VerificationRule::new("ocpp/charging...", VerificationAction::Reject),
        None,
    );

    let station = TestStation::new("CS-001");
    let mut in_scope = station.message(
        "req-1",
        "ocpp/charging/profile",
        "CSMS-001",
        serde_json::json!({"limit": 16}),
    );
    policy
        .sign(
            &mut in_scope,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();
    assert_eq!(policy.verify(&mut in_scope).unwrap(), VerifyOutcome::Rejected);

    let mut out_of_scope = metering_message(&station);
    policy
        .sign(
            &mut out_of_scope,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();
    assert_eq!(
        policy.verify(&mut out_of_scope).unwrap(),
        VerifyOutcome::Accepted
    );
}

#[test]
fn test_signatures_survive_the_wire() {
    // Serialize the signed envelope to JSON, reparse with its object keys in
    // a different order, verify: the canonical form makes order irrelevant.
    let station = TestStation::new("CS-001");
    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_verification_rule(
        VerificationRule::new("ocpp...", VerificationAction::VerifyAll),
        None,
    );

    let mut envelope = metering_message(&station);
    policy
        .sign(
            &mut envelope,
            &[SignerCredential::from_key_pair(station.key_pair.clone())],
        )
        .unwrap();

    let wire = serde_json::to_string(&envelope).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&wire).unwrap();
    // Reorder the payload object keys
    if let serde_json::Value::Object(payload) = &mut value["payload"] {
        let reversed: serde_json::Map<String, serde_json::Value> =
            payload.iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        *payload = reversed;
    }
    let mut received: MessageEnvelope = serde_json::from_value(value).unwrap();

    assert_eq!(policy.verify(&mut received).unwrap(), VerifyOutcome::Accepted);
}

#[test]
fn test_multi_curve_signing_round_trip() {
    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_verification_rule(
        VerificationRule::new("ocpp...", VerificationAction::VerifyAll),
        None,
    );

    for algorithm in ["secp256r1", "secp384r1", "secp521r1"] {
        let pair = KeyPair::generate(algorithm);
        let station = TestStation::new("CS-001");
        let mut envelope = metering_message(&station);

        policy
            .sign(&mut envelope, &[SignerCredential::from_key_pair(pair)])
            .unwrap();
        assert_eq!(
            policy.verify(&mut envelope).unwrap(),
            VerifyOutcome::Accepted,
            "{algorithm}"
        );
    }
}

#[test]
fn test_envelope_hints_drive_signing() {
    // sign_keys / sign_infos attached to the envelope are picked up without
    // explicit credentials; signer-info metadata lands on the signature.
    let policy = crate::test_utils::open_policy("lc-policy");
    let pair = KeyPair::generate("secp256r1");
    let stamp = current_timestamp_ms();

    let station = TestStation::new("CS-001");
    let mut envelope = metering_message(&station);
    envelope.sign_infos.push(SignerInfoHint {
        key: KeyHint {
            algorithm: pair.algorithm.clone(),
            private_key_hex: hex::encode(pair.private_key_bytes().unwrap()),
            public_key_hex: pair.public_key_hex().to_string(),
        },
        name: Some("CS-001 meter".to_string()),
        description: Some("periodic reading".to_string()),
        timestamp: Some(stamp),
    });

    assert_eq!(
        policy.sign(&mut envelope, &[]).unwrap(),
        SignOutcome::Signed(1)
    );
    let signature = &envelope.signatures[0];
    assert_eq!(signature.name.as_deref(), Some("CS-001 meter"));
    assert_eq!(signature.timestamp, Some(stamp));
    assert_eq!(signature.key_id, pair.public_key_hex());
}

#[test]
fn test_signing_rule_action_gates_the_send() {
    // Drop and Reject signing rules prevent the send as decisions, not
    // errors.
    let policy = crate::test_utils::open_policy("lc-policy");
    policy.add_signing_rule(SigningRule::new("ocpp/debug...", SigningAction::Drop), None);
    policy.add_signing_rule(
        SigningRule::new("ocpp/legacy...", SigningAction::Reject),
        None,
    );

    let station = TestStation::new("CS-001");
    let mut dropped = station.message("d-1", "ocpp/debug/trace", "CSMS-001", serde_json::json!({}));
    assert_eq!(policy.sign(&mut dropped, &[]).unwrap(), SignOutcome::Dropped);

    let mut rejected =
        station.message("r-1", "ocpp/legacy/call", "CSMS-001", serde_json::json!({}));
    assert_eq!(policy.sign(&mut rejected, &[]).unwrap(), SignOutcome::Rejected);
}

#[test]
fn test_policy_validity_window_boundaries() {
    let now = current_timestamp_ms();
    let policy = SignaturePolicy::new(
        "windowed",
        SigningAction::ForwardUnsigned,
        None,
        VerificationAction::AcceptUnverified,
        None,
    )
    .unwrap()
    .with_validity_window(now - 1_000, Some(now + 60_000));

    assert!(policy.is_active(now));
    assert!(!policy.is_active(now - 2_000));
    assert!(!policy.is_active(now + 120_000));
}
