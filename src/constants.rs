//! # Pipeline Constants
//!
//! Wire-level names shared by the envelope model, the listener and the emitters.

/// Envelope header names
pub mod headers {
    pub const TENANT_ID: &str = "X-Tenant-ID";
    pub const USERNAME: &str = "X-Username";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const BEARER_PREFIX: &str = "Bearer ";
}

/// Internal labels carried alongside the envelope payload
pub mod labels {
    pub const JOB_UUID: &str = "jobUUID";
    pub const SCHEDULE_UUID: &str = "scheduleUUID";
    pub const CHAIN_ID: &str = "chainID";
    pub const CHAIN_UUID: &str = "chainUUID";
    pub const PARENT_JOB_UUID: &str = "parentJobUUID";
    pub const ONE_TIME_KEY: &str = "enableTxFromOneTimeKey";
    pub const TX_HASH: &str = "txHash";

    // Context labels
    pub const NEXT_JOB_UUID: &str = "nextJobUUID";
    pub const PRIORITY: &str = "priority";
}

/// Component names used to tag errors as they cross layers
pub mod components {
    pub const MESSAGE_LISTENER: &str = "service.message-listener";
    pub const SEND_PROCESSOR: &str = "service.send-processor";
    pub const SIGN_PROCESSOR: &str = "service.sign-processor";
    pub const ENVELOPE_EMITTER: &str = "service.envelope-emitter";
    pub const JOB_STATUS_UPDATER: &str = "service.job-status-updater";
    pub const DISPATCHER: &str = "use-case.dispatch";
    pub const ENVELOPE_CODEC: &str = "encoding.envelope";
}

pub mod topics {
    pub const DEFAULT_CONSUMER_GROUP: &str = "group-sender";
    pub const DEFAULT_SENDER_TOPIC: &str = "topic-tx-sender";
    pub const DEFAULT_RECOVER_TOPIC: &str = "topic-tx-recover";
}
