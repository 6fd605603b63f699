use crate::common::*;
use tokio_test::{assert_err, assert_ok};
use txsender_core::messaging::{decode_envelope, Envelope};
use txsender_core::models::JobType;
use txsender_core::{ErrorCode, JobStatus, PipelineError};

fn committed(fixture: &SignFixture, envelope: &Envelope) -> Option<i64> {
    let partition = fixture.broker.partition_for_key(&envelope.partition_key());
    fixture.broker.committed_offset(GROUP, INPUT_TOPIC, partition)
}

fn forwarded(fixture: &SignFixture) -> Vec<Envelope> {
    fixture
        .broker
        .messages(SENDER_TOPIC)
        .iter()
        .map(|m| decode_envelope(&m.value).expect("forwarded envelope decodes"))
        .collect()
}

#[tokio::test]
async fn test_signed_envelope_is_forwarded() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 1);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].job_uuid(), "job-1");
    assert_eq!(sent[0].tx.raw.as_deref(), Some(SIGNED_RAW));
    assert_eq!(sent[0].tx.hash.as_deref(), Some(TX_HASH));
    assert_eq!(committed(&fixture, &envelope), Some(1));
    assert_eq!(fixture.registry.status("job-1"), Some(JobStatus::Stored));
}

#[tokio::test]
async fn test_raw_transaction_skips_signature() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthRawTransaction)
        .raw("0xf8670a8504a817c800")
        .build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 0);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tx.raw.as_deref(), Some("0xf8670a8504a817c800"));
}

#[tokio::test]
async fn test_each_signed_type_reaches_its_signer() {
    let fixture = SignFixture::new(3);
    let cases = [
        ("job-1", JobType::EthTransaction),
        ("job-2", JobType::OrionMarkingTransaction),
        ("job-3", JobType::OrionEeaTransaction),
        ("job-4", JobType::TesseraMarkingTransaction),
    ];
    for (uuid, job_type) in cases {
        fixture.publish(&EnvelopeBuilder::new(uuid, job_type).build()).await;
    }

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.signed_jobs(), vec!["job-1", "job-2"]);
    assert_eq!(fixture.eea_signer.signed_jobs(), vec!["job-3"]);
    assert_eq!(fixture.tessera_signer.signed_jobs(), vec!["job-4"]);

    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 4);
    assert!(sent.iter().all(|e| e.tx.raw.as_deref() == Some(SIGNED_RAW)));
}

#[tokio::test]
async fn test_tessera_private_is_forwarded_unsigned() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::TesseraPrivateTransaction)
        .raw("0xf8670a8504a817c800")
        .build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 0);
    assert_eq!(fixture.eea_signer.calls(), 0);
    assert_eq!(fixture.tessera_signer.calls(), 0);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tx.raw, None);
    assert_eq!(sent[0].tx.hash, None);
}

#[tokio::test]
async fn test_raw_job_without_payload_is_not_signed() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthRawTransaction).build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 0);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tx.raw, None);
}

#[tokio::test]
async fn test_public_job_with_stale_raw_is_signed_again() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction)
        .raw("0xf8670a8504a817c800")
        .build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 1);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tx.raw.as_deref(), Some(SIGNED_RAW));
    assert_eq!(sent[0].tx.hash.as_deref(), Some(TX_HASH));
}

#[tokio::test]
async fn test_signer_connection_errors_are_retried() {
    let fixture = SignFixture::new(3);
    fixture
        .signer
        .push_error(PipelineError::service_connection("key manager unreachable"));
    fixture
        .signer
        .push_error(PipelineError::service_connection("key manager unreachable"));
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 3);
    assert_eq!(forwarded(&fixture).len(), 1);
    assert_eq!(committed(&fixture, &envelope), Some(1));
}

#[tokio::test]
async fn test_signer_terminal_error_recovers() {
    let fixture = SignFixture::new(3);
    fixture
        .signer
        .push_error(PipelineError::not_found("no key for account"));
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert!(forwarded(&fixture).is_empty());
    assert_eq!(fixture.registry.status("job-1"), Some(JobStatus::Failed));

    let recovered = fixture.broker.messages(RECOVER_TOPIC);
    assert_eq!(recovered.len(), 1);
    let decoded = decode_envelope(&recovered[0].value).expect("recover message decodes");
    assert_eq!(decoded.errors[0].code, ErrorCode::NOT_FOUND);
    assert_eq!(committed(&fixture, &envelope), Some(1));
}

#[tokio::test]
async fn test_unknown_job_type_is_not_signed() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction)
        .with_job_type("eth://unknown")
        .build();
    fixture.publish(&envelope).await;

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.signer.calls(), 0);
    assert_eq!(fixture.registry.status("job-1"), Some(JobStatus::Failed));
    assert_eq!(fixture.broker.messages(RECOVER_TOPIC).len(), 1);
}

#[tokio::test]
async fn test_forward_failure_retries_attempt() {
    let fixture = SignFixture::new(3);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;
    fixture
        .broker
        .fail_next_sends(1, PipelineError::connection("broker unavailable"));

    assert_ok!(fixture.run().await);

    // The retried attempt signs again rather than forwarding the first signature
    assert_eq!(fixture.signer.calls(), 2);
    let sent = forwarded(&fixture);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tx.raw.as_deref(), Some(SIGNED_RAW));
}

#[tokio::test]
async fn test_persistent_forward_failure_is_fatal() {
    let fixture = SignFixture::new(1);
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;
    fixture
        .broker
        .fail_next_sends(5, PipelineError::connection("broker unavailable"));

    let error = assert_err!(fixture.run().await);

    assert_eq!(error.code(), Some(ErrorCode::KAFKA_CONNECTION));
    assert_eq!(fixture.signer.calls(), 2);
    assert_eq!(committed(&fixture, &envelope), None);
}
