//! Consumer-group session driver.

use super::consumer::{ConsumerGroupClaim, ConsumerGroupHandler, ConsumerGroupSession};
use crate::error::{PipelineError, PipelineResult};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Drive one consumer-group generation
///
/// Calls `setup`, runs every claim on its own task, cancels the session as soon as a
/// claim fails so the others stop promptly, then calls `cleanup`. The first claim
/// error wins over whatever `cleanup` reports.
pub async fn run_consumer_group_session<H>(
    session: Arc<dyn ConsumerGroupSession>,
    claims: Vec<ConsumerGroupClaim>,
    handler: Arc<H>,
) -> PipelineResult<()>
where
    H: ConsumerGroupHandler + 'static,
{
    handler.setup(session.as_ref()).await?;

    let mut join_set = JoinSet::new();
    for claim in claims {
        let session = Arc::clone(&session);
        let handler = Arc::clone(&handler);
        let topic = claim.topic().to_string();
        let partition = claim.partition();

        join_set.spawn(async move {
            let result = handler.consume_claim(session.as_ref(), claim).await;
            (topic, partition, result)
        });
    }

    let mut first_error: Option<PipelineError> = None;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((topic, partition, Ok(()))) => {
                debug!(topic = %topic, partition = partition, "Claim loop finished");
            }
            Ok((topic, partition, Err(e))) => {
                error!(
                    topic = %topic,
                    partition = partition,
                    error = %e,
                    "Claim loop failed, cancelling session"
                );
                session.cancellation().cancel();
                first_error.get_or_insert(e);
            }
            Err(join_error) => {
                error!(error = %join_error, "Claim task aborted, cancelling session");
                session.cancellation().cancel();
                first_error.get_or_insert_with(|| {
                    PipelineError::internal(format!("claim task aborted: {join_error}"))
                });
            }
        }
    }

    let cleanup = handler.cleanup(session.as_ref()).await;

    info!(
        generation_id = session.generation_id(),
        member_id = %session.member_id(),
        failed = first_error.is_some(),
        "Consumer group session ended"
    );

    match first_error {
        Some(e) => Err(e),
        None => cleanup,
    }
}
