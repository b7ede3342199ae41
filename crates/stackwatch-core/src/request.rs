//! JSON-RPC 2.0 envelopes as anvil and wallet endpoints exchange them.
//!
//! Requests always carry positional params. Responses keep `result` and
//! `error` optional because nodes answer `null` results for lookups that
//! found nothing, and some omit the field entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request id as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl RpcId {
    /// Our clients only issue numeric ids; anything else is a foreign reply.
    pub fn as_number(&self) -> Option<u64> {
        if let Self::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => n.fmt(f),
            Self::String(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
        }
    }
}

pub type RpcParam = Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<RpcParam>,
    pub id: RpcId,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<RpcParam>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }
}

/// The `error` member of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: RpcId::Number(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: RpcId::Number(id),
            result: None,
            error: Some(error),
        }
    }

    /// `false` only when the node sent an error member.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the result or the error member. An absent result reads as
    /// `null`, which is how `eth_getTransactionReceipt` reports unknown hashes.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        self.error
            .map_or_else(|| Ok(self.result.unwrap_or(Value::Null)), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_info_request_on_the_wire() {
        let req = JsonRpcRequest::new(7, "anvil_nodeInfo", vec![]);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "method": "anvil_nodeInfo", "params": [], "id": 7})
        );
    }

    #[test]
    fn unknown_receipt_reads_as_null() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.into_result().unwrap(), Value::Null);

        let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn method_not_found_is_surfaced() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"a","error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.id.as_number(), None);
        assert_eq!(resp.id.to_string(), "a");
        assert_eq!(
            resp.into_result().unwrap_err(),
            JsonRpcError::new(-32601, "Method not found")
        );
    }

    #[test]
    fn failure_skips_result_member() {
        let resp = JsonRpcResponse::failure(3, JsonRpcError::new(4001, "User rejected"));
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], 4001);
    }
}
