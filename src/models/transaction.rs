//! Ethereum transaction fields carried by envelopes and jobs.

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Transaction payload, including privacy fields for private transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthTransaction {
    pub from: Option<String>,
    pub to: Option<String>,
    pub nonce: Option<u64>,
    /// Wei amount as a decimal string
    pub value: Option<String>,
    pub gas_price: Option<String>,
    pub gas: Option<u64>,
    pub data: Option<String>,
    pub raw: Option<String>,
    pub hash: Option<String>,
    pub private_from: Option<String>,
    pub private_for: Vec<String>,
    pub mandatory_for: Vec<String>,
    pub privacy_group_id: Option<String>,
    pub privacy_flag: i32,
}

impl EthTransaction {
    /// Clear the fields that must be recomputed when a transaction is re-sent
    pub fn reset(&mut self) {
        self.nonce = None;
        self.hash = None;
        self.raw = None;
    }
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn normalize_hex(value: &str, digits: usize, what: &str) -> PipelineResult<String> {
    let body = strip_hex_prefix(value.trim());
    if body.len() != digits || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(PipelineError::data_corrupted(format!("invalid {what} {value:?}")));
    }
    Ok(format!("0x{}", body.to_ascii_lowercase()))
}

/// Normalise an address to lower-case `0x` + 40 hex digits
pub fn normalize_address(value: &str) -> PipelineResult<String> {
    normalize_hex(value, 40, "address")
}

/// Normalise a transaction hash to lower-case `0x` + 64 hex digits
pub fn normalize_hash(value: &str) -> PipelineResult<String> {
    normalize_hex(value, 64, "transaction hash")
}

/// Parse an optional unsigned quantity; empty strings mean "unset"
pub fn parse_quantity(value: &str, field: &str) -> PipelineResult<Option<u64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| PipelineError::data_corrupted(format!("invalid {field} {value:?}")))
}

/// Parse an optional decimal big-number string (value, gas price)
pub fn parse_decimal(value: &str, field: &str) -> PipelineResult<Option<String>> {
    if value.is_empty() {
        return Ok(None);
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(PipelineError::data_corrupted(format!(
            "invalid {field} {value:?}"
        )));
    }
    Ok(Some(value.to_string()))
}
