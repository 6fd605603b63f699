//! Envelope codec: protobuf bytes to and from the [`Envelope`] domain object.
//!
//! Malformed protobuf yields an `ENCODING` error; well-formed protobuf that does not
//! describe a valid envelope yields `DATA_CORRUPTED`.

use super::envelope::Envelope;
use super::proto::{self, tx_envelope::Msg};
use crate::constants::{components, labels};
use crate::error::{CodedError, ErrorCode, PipelineError, PipelineResult};
use crate::models::{normalize_address, transaction, EthTransaction};
use bytes::Bytes;
use prost::Message;

/// Decode a `TxEnvelope` carrying either a request or a response
pub fn decode_envelope(payload: &[u8]) -> PipelineResult<Envelope> {
    let wire = proto::TxEnvelope::decode(payload).map_err(|e| {
        PipelineError::encoding(format!("failed to decode request message: {e}"))
            .extend_component(components::ENVELOPE_CODEC)
    })?;

    envelope_from_wire(wire).map_err(|e| e.extend_component(components::ENVELOPE_CODEC))
}

fn envelope_from_wire(wire: proto::TxEnvelope) -> PipelineResult<Envelope> {
    let mut envelope = match wire.msg {
        Some(Msg::TxRequest(request)) => from_request(request)?,
        Some(Msg::TxResponse(response)) => from_response(response)?,
        None => return Err(PipelineError::data_corrupted("invalid tx envelope")),
    };

    if envelope.id.is_empty() {
        return Err(PipelineError::data_corrupted("envelope is missing an id"));
    }

    envelope.internal_labels.extend(wire.internal_labels);

    let tx_hash = envelope.internal_label(labels::TX_HASH).to_string();
    if !tx_hash.is_empty() {
        envelope.set_tx_hash(&tx_hash)?;
    }

    Ok(envelope)
}

fn optional_string(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn optional_address(value: &str) -> PipelineResult<Option<String>> {
    if value.is_empty() {
        return Ok(None);
    }
    normalize_address(value).map(Some)
}

fn from_request(request: proto::TxRequest) -> PipelineResult<Envelope> {
    let params = request.params.unwrap_or_default();

    let tx = EthTransaction {
        from: optional_address(&params.from)?,
        to: optional_address(&params.to)?,
        nonce: transaction::parse_quantity(&params.nonce, "nonce")?,
        value: transaction::parse_decimal(&params.value, "value")?,
        gas_price: transaction::parse_decimal(&params.gas_price, "gas price")?,
        gas: transaction::parse_quantity(&params.gas, "gas")?,
        data: optional_string(params.data),
        raw: optional_string(params.raw),
        hash: None,
        private_from: optional_string(params.private_from),
        private_for: params.private_for,
        mandatory_for: params.mandatory_for,
        privacy_group_id: optional_string(params.privacy_group_id),
        privacy_flag: params.privacy_flag,
    };

    Ok(Envelope {
        id: request.id,
        headers: request.headers,
        context_labels: request.context_labels,
        internal_labels: Default::default(),
        job_type: request.job_type,
        chain_name: request.chain,
        tx,
        errors: Vec::new(),
    })
}

fn from_response(response: proto::TxResponse) -> PipelineResult<Envelope> {
    let wire_tx = response.transaction.unwrap_or_default();

    let mut tx = EthTransaction {
        from: optional_address(&wire_tx.from)?,
        to: optional_address(&wire_tx.to)?,
        nonce: transaction::parse_quantity(&wire_tx.nonce, "nonce")?,
        value: transaction::parse_decimal(&wire_tx.value, "value")?,
        gas_price: transaction::parse_decimal(&wire_tx.gas_price, "gas price")?,
        gas: transaction::parse_quantity(&wire_tx.gas, "gas")?,
        data: optional_string(wire_tx.data),
        raw: optional_string(wire_tx.raw),
        ..Default::default()
    };
    if !wire_tx.tx_hash.is_empty() {
        tx.hash = Some(crate::models::normalize_hash(&wire_tx.tx_hash)?);
    }

    let mut envelope = Envelope {
        id: response.id,
        headers: response.headers,
        context_labels: response.context_labels,
        chain_name: response.chain,
        tx,
        errors: response
            .errors
            .into_iter()
            .map(|e| CodedError {
                code: ErrorCode(e.code),
                message: e.message,
                component: e.component,
            })
            .collect(),
        ..Default::default()
    };
    if !response.job_uuid.is_empty() {
        envelope.set_internal_label(labels::JOB_UUID, response.job_uuid);
    }

    Ok(envelope)
}

fn wire_labels(envelope: &Envelope) -> std::collections::HashMap<String, String> {
    let mut internal_labels = envelope.internal_labels.clone();
    match &envelope.tx.hash {
        Some(hash) => {
            internal_labels.insert(labels::TX_HASH.to_string(), hash.clone());
        }
        None => {
            internal_labels.remove(labels::TX_HASH);
        }
    }
    internal_labels
}

fn string_or_empty<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Encode the envelope as a request, the form consumed by the sender stage
pub fn encode_request(envelope: &Envelope) -> Bytes {
    let tx = &envelope.tx;
    let request = proto::TxRequest {
        id: envelope.id.clone(),
        headers: envelope.headers.clone(),
        chain: envelope.chain_name.clone(),
        job_type: envelope.job_type.clone(),
        params: Some(proto::Params {
            from: string_or_empty(&tx.from),
            to: string_or_empty(&tx.to),
            gas: string_or_empty(&tx.gas),
            gas_price: string_or_empty(&tx.gas_price),
            value: string_or_empty(&tx.value),
            nonce: string_or_empty(&tx.nonce),
            data: string_or_empty(&tx.data),
            raw: string_or_empty(&tx.raw),
            private_for: tx.private_for.clone(),
            private_from: string_or_empty(&tx.private_from),
            privacy_group_id: string_or_empty(&tx.privacy_group_id),
            mandatory_for: tx.mandatory_for.clone(),
            privacy_flag: tx.privacy_flag,
        }),
        context_labels: envelope.context_labels.clone(),
    };

    let wire = proto::TxEnvelope {
        msg: Some(Msg::TxRequest(request)),
        internal_labels: wire_labels(envelope),
    };
    Bytes::from(wire.encode_to_vec())
}

/// Encode the envelope as a response, the form consumed from the recover topic
pub fn encode_response(envelope: &Envelope) -> Bytes {
    let tx = &envelope.tx;
    let response = proto::TxResponse {
        headers: envelope.headers.clone(),
        id: envelope.id.clone(),
        job_uuid: envelope.job_uuid().to_string(),
        context_labels: envelope.context_labels.clone(),
        transaction: Some(proto::Transaction {
            from: string_or_empty(&tx.from),
            nonce: string_or_empty(&tx.nonce),
            to: string_or_empty(&tx.to),
            value: string_or_empty(&tx.value),
            gas: string_or_empty(&tx.gas),
            gas_price: string_or_empty(&tx.gas_price),
            data: string_or_empty(&tx.data),
            raw: string_or_empty(&tx.raw),
            tx_hash: string_or_empty(&tx.hash),
        }),
        chain: envelope.chain_name.clone(),
        errors: envelope
            .errors
            .iter()
            .map(|e| proto::Error {
                message: e.message.clone(),
                code: e.code.0,
                component: e.component.clone(),
            })
            .collect(),
    };

    let wire = proto::TxEnvelope {
        msg: Some(Msg::TxResponse(response)),
        internal_labels: wire_labels(envelope),
    };
    Bytes::from(wire.encode_to_vec())
}

/// Whether an encoded envelope carries a response (recovery) message
pub fn is_response(payload: &[u8]) -> bool {
    matches!(
        proto::TxEnvelope::decode(payload),
        Ok(proto::TxEnvelope {
            msg: Some(Msg::TxResponse(_)),
            ..
        })
    )
}
