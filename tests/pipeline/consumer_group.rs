use crate::common::*;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use txsender_core::messaging::{run_consumer_group_session, ConsumerGroupHandler, InMemoryBroker};
use txsender_core::models::JobType;
use txsender_core::{ErrorCode, JobStatus, PipelineError};

/// Sender address whose partition key lands on a different partition than `FROM`
fn address_on_other_partition(broker: &InMemoryBroker) -> String {
    let taken = broker.partition_for_key(&format!("{FROM}@{CHAIN_ID}"));
    (1u64..)
        .map(|i| format!("0x{i:040x}"))
        .find(|address| broker.partition_for_key(&format!("{address}@{CHAIN_ID}")) != taken)
        .expect("some address maps elsewhere")
}

#[tokio::test]
async fn test_partition_messages_are_marked_in_order() {
    let fixture = SendFixture::new(0);
    let other = address_on_other_partition(&fixture.broker);
    for i in 0..5 {
        let envelope = EnvelopeBuilder::new(&format!("a-{i}"), JobType::EthTransaction).build();
        fixture.publish(&envelope).await;
        let envelope = EnvelopeBuilder::new(&format!("b-{i}"), JobType::EthTransaction)
            .from(&other)
            .build();
        fixture.publish(&envelope).await;
    }

    let session = fixture
        .broker
        .session(GROUP, INPUT_TOPIC, CancellationToken::new());
    let claims = fixture.broker.claims(GROUP, INPUT_TOPIC);
    assert_ok!(run_consumer_group_session(session.clone(), claims, fixture.listener.clone()).await);

    let marked = session.marked();
    assert_eq!(marked.len(), 10);
    for partition in 0..fixture.broker.partitions() {
        let offsets: Vec<i64> = marked
            .iter()
            .filter(|m| m.partition == partition)
            .map(|m| m.offset)
            .collect();
        let expected: Vec<i64> = (0..offsets.len() as i64).collect();
        assert_eq!(offsets, expected, "partition {partition} marked out of order");
    }

    let order: Vec<String> = fixture
        .public
        .invocations()
        .into_iter()
        .map(|i| i.job.uuid)
        .filter(|uuid| uuid.starts_with("a-"))
        .collect();
    assert_eq!(order, vec!["a-0", "a-1", "a-2", "a-3", "a-4"]);
}

#[tokio::test]
async fn test_failing_claim_stops_the_session() {
    let fixture = SendFixture::with_public(0, ScriptedUseCase::hanging());
    let other = address_on_other_partition(&fixture.broker);

    let hanging = EnvelopeBuilder::new("hanging", JobType::EthTransaction).build();
    let fatal = EnvelopeBuilder::new("fatal", JobType::EthRawTransaction)
        .from(&other)
        .raw("0xf8670a8504a817c800")
        .build();
    fixture.publish(&hanging).await;
    fixture.publish(&fatal).await;
    fixture
        .raw
        .push(Err(PipelineError::invalid_parameter("bad signature")));
    fixture
        .registry
        .fail_next_updates(1, PipelineError::internal("registry exploded"));

    let error = assert_err!(fixture.run().await);

    assert_eq!(error.code(), Some(ErrorCode::INTERNAL));
    assert_eq!(fixture.committed(&hanging), None);
    assert_eq!(fixture.committed(&fatal), None);
}

#[tokio::test]
async fn test_next_generation_resumes_unmarked_message() {
    let fixture = SendFixture::new(0);
    fixture
        .public
        .push_many(2, Err(PipelineError::invalid_parameter("bad data")));
    fixture
        .registry
        .fail_next_updates(1, PipelineError::internal("registry exploded"));
    let envelope = EnvelopeBuilder::new("job-1", JobType::EthTransaction).build();
    fixture.publish(&envelope).await;

    assert_err!(fixture.run().await);
    assert_eq!(fixture.committed(&envelope), None);

    assert_ok!(fixture.run().await);

    assert_eq!(fixture.public.calls(), 2);
    assert_eq!(fixture.committed(&envelope), Some(1));
    assert_eq!(fixture.registry.status("job-1"), Some(JobStatus::Failed));
    // At-least-once: the first generation already emitted before failing
    assert_eq!(fixture.broker.messages(RECOVER_TOPIC).len(), 2);
}

#[tokio::test]
async fn test_each_claim_reports_its_own_result() {
    let fixture = SendFixture::new(0);
    let other = address_on_other_partition(&fixture.broker);

    let fatal = EnvelopeBuilder::new("fatal", JobType::EthRawTransaction)
        .raw("0xf8670a8504a817c800")
        .build();
    let healthy = EnvelopeBuilder::new("healthy", JobType::EthTransaction)
        .from(&other)
        .build();
    fixture.publish(&fatal).await;
    fixture.publish(&healthy).await;
    fixture
        .raw
        .push(Err(PipelineError::invalid_parameter("bad signature")));
    fixture
        .registry
        .fail_next_updates(1, PipelineError::internal("registry exploded"));

    let session = fixture
        .broker
        .session(GROUP, INPUT_TOPIC, CancellationToken::new());
    let fatal_partition = fixture.broker.partition_for_key(&fatal.partition_key());
    let healthy_partition = fixture.broker.partition_for_key(&healthy.partition_key());
    let mut claims = fixture.broker.claims(GROUP, INPUT_TOPIC);
    let fatal_claim = claims.remove(
        claims
            .iter()
            .position(|c| c.partition() == fatal_partition)
            .expect("claim for the fatal partition"),
    );
    let healthy_claim = claims.remove(
        claims
            .iter()
            .position(|c| c.partition() == healthy_partition)
            .expect("claim for the healthy partition"),
    );

    let listener = fixture.listener.clone();
    assert_ok!(listener.setup(session.as_ref()).await);
    let error = assert_err!(listener.consume_claim(session.as_ref(), fatal_claim).await);
    assert_eq!(error.code(), Some(ErrorCode::INTERNAL));
    assert_ok!(listener.consume_claim(session.as_ref(), healthy_claim).await);
    // Claim failures travel through consume_claim only
    assert_ok!(listener.cleanup(session.as_ref()).await);

    assert_eq!(fixture.committed(&fatal), None);
    assert_eq!(fixture.committed(&healthy), Some(1));
}
