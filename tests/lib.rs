// Integration tests test your crate's public API. They only have access to items
// in your crate that are marked pub. See the Cargo Targets page of the Cargo Book
// for more information.
//
//   https://doc.rust-lang.org/cargo/reference/cargo-targets.html#integration-tests
//

use docflow_sim::*;

mod routing_tests;

#[test]
fn test_core_id_types() {
    assert_eq!(DocumentId(7).to_string(), "DOC_00000007");
    assert!(PacketId(3).to_string().starts_with("PKT_"));
    assert_ne!(RunId::new(), RunId::new());
    assert!(RunId::new().to_string().starts_with("RUN_"));
}

#[test]
fn test_job_wraps_both_kinds() {
    let doc = Document::new(DocumentId(1), 0.0);
    let bound = vec![Document::new(DocumentId(2), 0.0), Document::new(DocumentId(3), 0.0)];
    let packet = Packet::new(PacketId(1), 0.0, CategoryId(2), bound, 8, 8);
    assert_eq!(Job::from(doc).document_count(), 1);
    assert_eq!(Job::from(packet).document_count(), 2);
}

#[test]
fn test_change_orders_never_count_as_submitted() {
    let change_order = Document::change_order(DocumentId(9), 10.0);
    assert!(change_order.rework_event);
    assert!(!change_order.counts_as_submitted());

    let mut doc = Document::new(DocumentId(10), 10.0);
    doc.classify(CategoryId(1), 3, true);
    assert!(!doc.counts_as_submitted());
    doc.only_classification = false;
    assert!(doc.counts_as_submitted());
}

#[test]
fn test_default_configuration_is_valid() {
    let config = SimulationConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.day_length(), config.productivity * 28_800.0);
}
