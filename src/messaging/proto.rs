//! Protobuf wire types for transaction envelopes.

use std::collections::HashMap;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxEnvelope {
    #[prost(oneof = "tx_envelope::Msg", tags = "1, 2")]
    pub msg: Option<tx_envelope::Msg>,
    #[prost(map = "string, string", tag = "3")]
    pub internal_labels: HashMap<String, String>,
}

pub mod tx_envelope {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Msg {
        #[prost(message, tag = "1")]
        TxRequest(super::TxRequest),
        #[prost(message, tag = "2")]
        TxResponse(super::TxResponse),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(map = "string, string", tag = "2")]
    pub headers: HashMap<String, String>,
    #[prost(string, tag = "3")]
    pub chain: String,
    #[prost(string, tag = "4")]
    pub job_type: String,
    #[prost(message, optional, tag = "5")]
    pub params: Option<Params>,
    #[prost(map = "string, string", tag = "6")]
    pub context_labels: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Params {
    #[prost(string, tag = "1")]
    pub from: String,
    #[prost(string, tag = "2")]
    pub to: String,
    #[prost(string, tag = "3")]
    pub gas: String,
    #[prost(string, tag = "4")]
    pub gas_price: String,
    #[prost(string, tag = "5")]
    pub value: String,
    #[prost(string, tag = "6")]
    pub nonce: String,
    #[prost(string, tag = "7")]
    pub data: String,
    #[prost(string, tag = "8")]
    pub raw: String,
    #[prost(string, repeated, tag = "9")]
    pub private_for: Vec<String>,
    #[prost(string, tag = "10")]
    pub private_from: String,
    #[prost(string, tag = "11")]
    pub privacy_group_id: String,
    #[prost(string, repeated, tag = "12")]
    pub mandatory_for: Vec<String>,
    #[prost(int32, tag = "13")]
    pub privacy_flag: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxResponse {
    #[prost(map = "string, string", tag = "1")]
    pub headers: HashMap<String, String>,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub job_uuid: String,
    #[prost(map = "string, string", tag = "4")]
    pub context_labels: HashMap<String, String>,
    #[prost(message, optional, tag = "5")]
    pub transaction: Option<Transaction>,
    #[prost(string, tag = "6")]
    pub chain: String,
    #[prost(message, repeated, tag = "7")]
    pub errors: Vec<Error>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(string, tag = "1")]
    pub from: String,
    #[prost(string, tag = "2")]
    pub nonce: String,
    #[prost(string, tag = "3")]
    pub to: String,
    #[prost(string, tag = "4")]
    pub value: String,
    #[prost(string, tag = "5")]
    pub gas: String,
    #[prost(string, tag = "6")]
    pub gas_price: String,
    #[prost(string, tag = "7")]
    pub data: String,
    #[prost(string, tag = "8")]
    pub raw: String,
    #[prost(string, tag = "9")]
    pub tx_hash: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(uint64, tag = "2")]
    pub code: u64,
    #[prost(string, tag = "3")]
    pub component: String,
}
