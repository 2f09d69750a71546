/*!
 * Approval Scenario Integration Tests
 */

use approval_policy::evaluator::{CaseInsensitive, StaticLabelSource};
use approval_policy::report::DecisionStatus;
use approval_policy::{
    load_policy, AccessRequest, Decision, DecisionReport, DenialReason, Evaluator,
    EvaluatorConfig, ExitStatus, Label, PolicyLoader, UnknownLabelPolicy,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const POLICY: &str = r#"
# Legal sign-off for customer data exports
label: legal_approval
users:
  - legal1
  - legal2
---
label: prod_admin_approval
users:
  - prod1
  - prod2
  - prod3
num_approvers_required: 2
requester_must_be_authorized: true
"#;

const NONE: [&str; 0] = [];

fn evaluator() -> Evaluator {
    let table = load_policy(POLICY).expect("policy should load");
    Evaluator::new(Arc::new(table))
}

fn decide(requester: &str, labels: &[&str], approvers: &[&str]) -> Decision {
    let request = AccessRequest::new(
        requester,
        labels.iter().copied(),
        approvers.iter().copied(),
    )
    .expect("request should be valid");
    evaluator().evaluate(&request)
}

#[test]
fn test_single_label_quorum_one_granted() {
    let decision = decide("alice", &["legal_approval"], &["legal1"]);
    assert_eq!(decision, Decision::Granted { per_label: vec![] });
}

#[test]
fn test_single_label_non_member_approver_denied() {
    let decision = decide("alice", &["legal_approval"], &["bob"]);
    assert_eq!(
        decision.reasons(),
        &[DenialReason::InsufficientApprovers {
            label: Label::from("legal_approval"),
            have: 0,
            need: 1,
        }]
    );
}

#[test]
fn test_requester_in_group_with_two_others_granted() {
    let decision = decide("prod1", &["prod_admin_approval"], &["prod2", "prod3"]);
    assert!(decision.is_granted());
}

#[test]
fn test_self_approval_discarded() {
    let decision = decide("prod1", &["prod_admin_approval"], &["prod2", "prod1"]);
    assert_eq!(
        decision.reasons(),
        &[DenialReason::InsufficientApprovers {
            label: Label::from("prod_admin_approval"),
            have: 1,
            need: 2,
        }]
    );
}

#[test]
fn test_requester_outside_group_denied() {
    let decision = decide("alice", &["prod_admin_approval"], &["prod1", "prod2"]);
    assert_eq!(
        decision.reasons(),
        &[DenialReason::RequesterNotAuthorized {
            label: Label::from("prod_admin_approval"),
        }]
    );
}

#[test]
fn test_multi_label_conjunction_granted() {
    let decision = decide(
        "prod1",
        &["legal_approval", "prod_admin_approval"],
        &["legal1", "prod2", "prod3"],
    );
    assert!(decision.is_granted());
}

#[test]
fn test_multi_label_one_unsatisfied_denies_all() {
    let decision = decide(
        "prod1",
        &["legal_approval", "prod_admin_approval"],
        &["prod2", "prod3"],
    );
    assert!(decision.is_denied());
    assert_eq!(decision.reasons().len(), 1);
    assert_eq!(decision.reasons()[0].label().as_str(), "legal_approval");
}

#[test]
fn test_unknown_label_denied_by_default() {
    let decision = decide("alice", &["secret"], &["legal1", "prod1"]);
    assert_eq!(
        decision.reasons(),
        &[DenialReason::NoRuleForLabel {
            label: Label::from("secret"),
        }]
    );
}

#[test]
fn test_unknown_label_allowed_when_configured() {
    let evaluator = evaluator().with_config(
        EvaluatorConfig::default().with_unknown_label_policy(UnknownLabelPolicy::Allow),
    );
    let request = AccessRequest::new("alice", ["secret"], NONE).unwrap();
    assert!(evaluator.evaluate(&request).is_granted());
}

#[test]
fn test_no_labels_granted() {
    let decision = decide("alice", &[], &[]);
    assert!(decision.is_granted());
}

#[test]
fn test_missing_requester_is_invalid() {
    let err = AccessRequest::new("", ["legal_approval"], ["legal1"]).unwrap_err();
    assert!(err.to_string().contains("requester"));
}

#[test]
fn test_explain_report_for_granted_request() {
    let request = AccessRequest::new(
        "prod1",
        ["prod_admin_approval", "legal_approval"],
        ["legal2", "prod3", "prod2"],
    )
    .unwrap();
    let decision = evaluator().explain(&request);
    let report = DecisionReport::from(&decision);

    assert_eq!(report.decision, DecisionStatus::Granted);
    let labels: Vec<&str> = report.per_label.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["legal_approval", "prod_admin_approval"]);
    assert!(report.per_label.iter().all(|l| l.missing_approvers_count == 0));
    assert_eq!(ExitStatus::from(&decision).code(), 0);
}

#[test]
fn test_denied_report_json() {
    let decision = decide("alice", &["prod_admin_approval", "secret"], &["prod2"]);
    let json = serde_json::to_value(DecisionReport::from(&decision)).unwrap();

    assert_eq!(json["decision"], "denied");
    assert_eq!(json["per_label"][0]["label"], "prod_admin_approval");
    assert_eq!(json["per_label"][0]["missing_approvers_count"], 1);
    assert_eq!(json["per_label"][0]["missing_requester_authorization"], true);
    assert_eq!(json["per_label"][1]["label"], "secret");
    assert_eq!(json["per_label"][1]["unknown_label"], true);
    assert_eq!(ExitStatus::from(&decision).code(), 1);
}

#[test]
fn test_endpoint_labels_from_inventory() {
    let inventory = StaticLabelSource::new()
        .with_endpoint("db-prod-01", ["prod_admin_approval"])
        .with_endpoint("laptop-17", NONE);
    let evaluator = evaluator();

    let decision = evaluator
        .evaluate_endpoint(&inventory, "db-prod-01", "prod2", ["prod1", "prod3"])
        .unwrap();
    assert!(decision.is_granted());

    let decision = evaluator
        .evaluate_endpoint(&inventory, "laptop-17", "alice", NONE)
        .unwrap();
    assert!(decision.is_granted());

    let err = evaluator
        .evaluate_endpoint(&inventory, "unlisted", "alice", NONE)
        .unwrap_err();
    assert!(err.to_string().contains("unlisted"));
}

#[test]
fn test_case_insensitive_identities() {
    let loader = PolicyLoader::default().with_resolver(Arc::new(CaseInsensitive));
    let loaded = loader.load(POLICY).unwrap();
    let evaluator = Evaluator::new(Arc::new(loaded.table)).with_resolver(loader.resolver());

    let request = evaluator
        .request(" Prod1 ", ["prod_admin_approval"], ["PROD2", "prod3", "PROD1"])
        .unwrap();
    assert!(evaluator.evaluate(&request).is_granted());

    let request = evaluator
        .request("PROD1", ["prod_admin_approval"], ["prod2", "Prod1"])
        .unwrap();
    assert!(evaluator.evaluate(&request).is_denied());
}

#[test]
fn test_verbatim_request_keeps_exact_identities() {
    let loader = PolicyLoader::default().with_resolver(Arc::new(CaseInsensitive));
    let evaluator =
        Evaluator::new(Arc::new(loader.load(POLICY).unwrap().table)).with_resolver(loader.resolver());

    // Built outside the evaluator: "PROD2" is not the member "prod2"
    let verbatim = AccessRequest::new("Prod1", ["prod_admin_approval"], ["PROD2", "PROD3"]).unwrap();
    assert_eq!(verbatim.requester().as_str(), "Prod1");
    assert!(evaluator.evaluate(&verbatim).is_denied());

    let resolved = evaluator
        .request("Prod1", ["prod_admin_approval"], ["PROD2", "PROD3"])
        .unwrap();
    assert_eq!(resolved.requester().as_str(), "prod1");
    assert!(evaluator.evaluate(&resolved).is_granted());
}
