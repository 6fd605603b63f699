use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use txsender_core::client::{InMemoryJobClient, JobContext};
use txsender_core::config::PipelineConfig;
use txsender_core::messaging::{Envelope, InMemoryBroker, MessageProducer, ProducerMessage};
use txsender_core::models::{Job, SendStrategy};
use txsender_core::orchestration::{
    EnvelopeEmitter, JobDispatcher, JobStatusUpdater, MessageListener, SendProcessor,
    SendTxUseCase, SendUseCases, SignProcessor, SignTransactionUseCase, SignUseCases,
    SignedTransaction,
};
use txsender_core::resilience::ExponentialBackoff;
use txsender_core::{JobStatus, PipelineResult};

pub const INPUT_TOPIC: &str = "topic-tx-input";
pub const SENDER_TOPIC: &str = "topic-tx-sender";
pub const RECOVER_TOPIC: &str = "topic-tx-recover";
pub const GROUP: &str = "group-test";

/// Invocation seen by a fake use case
#[derive(Debug, Clone)]
pub struct Invocation {
    pub job: Job,
    pub authorization: Option<String>,
    pub tenant_id: String,
}

/// Send use case returning scripted results, then `Ok(())` once the script runs out
#[derive(Default)]
pub struct ScriptedUseCase {
    script: Mutex<VecDeque<PipelineResult<()>>>,
    invocations: Mutex<Vec<Invocation>>,
    /// Block until cancelled instead of returning
    hang: bool,
}

impl ScriptedUseCase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Default::default()
        })
    }

    pub fn push(&self, result: PipelineResult<()>) {
        self.script.lock().push_back(result);
    }

    pub fn push_many(&self, count: usize, result: PipelineResult<()>) {
        for _ in 0..count {
            self.push(result.clone());
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.invocations.lock().len()
    }
}

#[async_trait]
impl SendTxUseCase for ScriptedUseCase {
    async fn execute(&self, ctx: &JobContext, job: &mut Job) -> PipelineResult<()> {
        self.invocations.lock().push(Invocation {
            job: job.clone(),
            authorization: ctx.authorization.clone(),
            tenant_id: ctx.tenant_id.clone(),
        });
        if self.hang {
            return ctx.guard(std::future::pending()).await;
        }
        let next = self.script.lock().pop_front();
        next.unwrap_or(Ok(()))
    }
}

/// Signer returning scripted results, then a fixed signature
#[derive(Default)]
pub struct ScriptedSigner {
    script: Mutex<VecDeque<PipelineResult<SignedTransaction>>>,
    invocations: Mutex<Vec<Job>>,
}

pub const SIGNED_RAW: &str = "0xf86c808504a817c80082520894";

impl ScriptedSigner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_error(&self, error: txsender_core::PipelineError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.invocations.lock().len()
    }

    pub fn signed_jobs(&self) -> Vec<String> {
        self.invocations.lock().iter().map(|job| job.uuid.clone()).collect()
    }
}

#[async_trait]
impl SignTransactionUseCase for ScriptedSigner {
    async fn execute(&self, _ctx: &JobContext, job: &Job) -> PipelineResult<SignedTransaction> {
        self.invocations.lock().push(job.clone());
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| {
            Ok(SignedTransaction {
                raw: SIGNED_RAW.to_string(),
                tx_hash: super::TX_HASH.to_string(),
            })
        })
    }
}

pub fn test_config(max_retries: u32) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.kafka.consumer_group = GROUP.to_string();
    config.kafka.input_topic = INPUT_TOPIC.to_string();
    config.kafka.sender_topic = SENDER_TOPIC.to_string();
    config.kafka.recover_topic = RECOVER_TOPIC.to_string();
    config.backoff.max_retries = max_retries;
    config.backoff.initial_interval_ms = 1;
    config.backoff.max_interval_ms = 1;
    config.backoff.randomization_factor = 0.0;
    config.listener.key_store_name = "test-store".to_string();
    config
}

async fn publish_to(broker: &InMemoryBroker, envelope: &Envelope) {
    broker
        .send_message(ProducerMessage::new(
            INPUT_TOPIC,
            envelope.partition_key(),
            txsender_core::messaging::encode_request(envelope),
        ))
        .await
        .expect("publish envelope");
}

/// Send pipeline wired over the in-memory broker and registry
pub struct SendFixture {
    pub config: PipelineConfig,
    pub broker: Arc<InMemoryBroker>,
    pub registry: Arc<InMemoryJobClient>,
    pub raw: Arc<ScriptedUseCase>,
    pub public: Arc<ScriptedUseCase>,
    pub eea_private: Arc<ScriptedUseCase>,
    pub tessera_marking: Arc<ScriptedUseCase>,
    pub tessera_private: Arc<ScriptedUseCase>,
    pub listener: Arc<MessageListener<SendProcessor>>,
}

impl SendFixture {
    pub fn new(max_retries: u32) -> Self {
        Self::with_public(max_retries, ScriptedUseCase::new())
    }

    pub fn with_public(max_retries: u32, public: Arc<ScriptedUseCase>) -> Self {
        let config = test_config(max_retries);
        let broker = InMemoryBroker::new(3);
        let registry = Arc::new(InMemoryJobClient::new());
        let raw = ScriptedUseCase::new();
        let eea_private = ScriptedUseCase::new();
        let tessera_marking = ScriptedUseCase::new();
        let tessera_private = ScriptedUseCase::new();

        let use_cases = SendUseCases {
            raw: raw.clone(),
            public: public.clone(),
            eea_private: eea_private.clone(),
            tessera_marking: tessera_marking.clone(),
            tessera_private: tessera_private.clone(),
        };
        let processor = SendProcessor::from_config(
            &config,
            Arc::new(JobDispatcher::new(use_cases)),
            EnvelopeEmitter::new(broker.clone()),
            JobStatusUpdater::new(registry.clone()),
        );
        let listener = Arc::new(MessageListener::new(Arc::new(processor)));

        Self {
            config,
            broker,
            registry,
            raw,
            public,
            eea_private,
            tessera_marking,
            tessera_private,
            listener,
        }
    }

    pub fn use_case(&self, strategy: SendStrategy) -> &Arc<ScriptedUseCase> {
        match strategy {
            SendStrategy::Raw => &self.raw,
            SendStrategy::Public => &self.public,
            SendStrategy::EeaPrivate => &self.eea_private,
            SendStrategy::TesseraMarking => &self.tessera_marking,
            SendStrategy::TesseraPrivate => &self.tessera_private,
        }
    }

    /// Publish an envelope and register its job as pending
    pub async fn publish(&self, envelope: &Envelope) {
        if self.registry.status(envelope.job_uuid()).is_none() {
            self.registry.insert_status(envelope.job_uuid(), JobStatus::Pending);
        }
        publish_to(&self.broker, envelope).await;
    }

    pub async fn run(&self) -> PipelineResult<()> {
        self.run_with(CancellationToken::new()).await
    }

    pub async fn run_with(&self, cancellation: CancellationToken) -> PipelineResult<()> {
        tokio::time::timeout(
            Duration::from_secs(10),
            self.broker
                .run_consumer_group(GROUP, INPUT_TOPIC, self.listener.clone(), cancellation),
        )
        .await
        .expect("consumer group session timed out")
    }

    /// Next offset the group will read on the partition the envelope landed on
    pub fn committed(&self, envelope: &Envelope) -> Option<i64> {
        let partition = self.broker.partition_for_key(&envelope.partition_key());
        self.broker.committed_offset(GROUP, INPUT_TOPIC, partition)
    }
}

/// Sign pipeline wired over the in-memory broker and registry
pub struct SignFixture {
    pub broker: Arc<InMemoryBroker>,
    pub registry: Arc<InMemoryJobClient>,
    /// Signer for public jobs
    pub signer: Arc<ScriptedSigner>,
    pub eea_signer: Arc<ScriptedSigner>,
    pub tessera_signer: Arc<ScriptedSigner>,
    pub listener: Arc<MessageListener<SignProcessor>>,
}

impl SignFixture {
    pub fn new(max_retries: u32) -> Self {
        let config = test_config(max_retries);
        let broker = InMemoryBroker::new(3);
        let registry = Arc::new(InMemoryJobClient::new());
        let signer = ScriptedSigner::new();
        let eea_signer = ScriptedSigner::new();
        let tessera_signer = ScriptedSigner::new();

        let signers = SignUseCases {
            transaction: signer.clone(),
            eea_transaction: eea_signer.clone(),
            tessera_marking: tessera_signer.clone(),
        };
        let processor = SignProcessor::from_config(
            &config,
            signers,
            EnvelopeEmitter::new(broker.clone()),
            JobStatusUpdater::new(registry.clone()),
        )
        .expect("sign stage config is valid");
        let listener = Arc::new(MessageListener::new(Arc::new(processor)));

        Self {
            broker,
            registry,
            signer,
            eea_signer,
            tessera_signer,
            listener,
        }
    }

    pub async fn publish(&self, envelope: &Envelope) {
        self.registry.insert_status(envelope.job_uuid(), JobStatus::Stored);
        publish_to(&self.broker, envelope).await;
    }

    pub async fn run(&self) -> PipelineResult<()> {
        tokio::time::timeout(
            Duration::from_secs(10),
            self.broker.run_consumer_group(
                GROUP,
                INPUT_TOPIC,
                self.listener.clone(),
                CancellationToken::new(),
            ),
        )
        .await
        .expect("consumer group session timed out")
    }
}

/// Producer that always fails, for emitter wiring checks
pub struct UnavailableProducer;

#[async_trait]
impl MessageProducer for UnavailableProducer {
    async fn send_message(&self, _message: ProducerMessage) -> PipelineResult<(i32, i64)> {
        Err(txsender_core::PipelineError::kafka_connection("broker unreachable"))
    }
}

pub fn constant_backoff(max_retries: u32) -> ExponentialBackoff {
    ExponentialBackoff::constant(Duration::from_millis(1), max_retries)
}
