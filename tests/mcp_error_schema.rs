use jsonschema::validator_for;
use serde_json::Value;

use elfa_mcp_server::protocol::{JsonRpcError, JsonRpcResponse, RpcId, ToolError, ToolResult};

const ERROR_RESPONSE_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "JSON-RPC 2.0 error response",
  "type": "object",
  "required": ["jsonrpc", "id", "error"],
  "additionalProperties": false,
  "properties": {
    "jsonrpc": { "const": "2.0" },
    "id": { "type": ["integer", "string"] },
    "error": {
      "type": "object",
      "required": ["code", "message"],
      "additionalProperties": false,
      "properties": {
        "code": { "type": "integer" },
        "message": { "type": "string", "minLength": 1 },
        "data": { "type": "object" }
      }
    }
  }
}"#;

const TOOL_RESULT_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "MCP tool result",
  "type": "object",
  "required": ["content", "isError"],
  "additionalProperties": false,
  "properties": {
    "content": {
      "type": "array",
      "minItems": 1,
      "items": {
        "type": "object",
        "required": ["type", "text"],
        "additionalProperties": false,
        "properties": {
          "type": { "const": "text" },
          "text": { "type": "string" }
        }
      }
    },
    "isError": { "type": "boolean" },
    "_meta": { "type": "object" }
  }
}"#;

fn validator(schema: &str) -> jsonschema::Validator {
    let schema: Value = serde_json::from_str(schema).unwrap();
    validator_for(&schema).unwrap()
}

#[test]
fn golden_method_not_found_response() {
    let response = JsonRpcResponse::error(Some(RpcId::Number(4.into())), JsonRpcError::method_not_found("foo/bar"));
    let json_value = serde_json::to_value(&response).unwrap();

    assert!(validator(ERROR_RESPONSE_SCHEMA).is_valid(&json_value));

    let expected = r#"{
  "jsonrpc": "2.0",
  "id": 4,
  "error": {
    "code": -32601,
    "message": "Method not found",
    "data": {
      "method": "foo/bar"
    }
  }
}"#;
    assert_eq!(serde_json::to_string_pretty(&response).unwrap(), expected);
}

#[test]
fn golden_tool_not_found_response() {
    let response = JsonRpcResponse::error(
        Some(RpcId::Str("abc".into())),
        JsonRpcError::tool_not_found("elfa_nope"),
    );
    let json_value = serde_json::to_value(&response).unwrap();

    assert!(validator(ERROR_RESPONSE_SCHEMA).is_valid(&json_value));
    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        r#"{"jsonrpc":"2.0","id":"abc","error":{"code":-32601,"message":"Tool not found","data":{"name":"elfa_nope"}}}"#
    );
}

#[test]
fn protocol_error_codes_validate() {
    let v = validator(ERROR_RESPONSE_SCHEMA);
    for (error, code) in [
        (JsonRpcError::invalid_request_with("Unsupported jsonrpc version: 1.0"), -32600),
        (JsonRpcError::invalid_params("Missing params for tools/call"), -32602),
        (JsonRpcError::internal_error("boom"), -32603),
    ] {
        assert_eq!(error.code, code);
        let json_value = serde_json::to_value(JsonRpcResponse::error(Some(RpcId::Number(1.into())), error)).unwrap();
        assert!(v.is_valid(&json_value), "{json_value}");
    }
}

#[test]
fn tool_error_becomes_error_result() {
    let result: ToolResult = ToolError::invalid_arguments("ta_rsi", "'values' is required").into();
    let json_value = serde_json::to_value(&result).unwrap();

    assert!(validator(TOOL_RESULT_SCHEMA).is_valid(&json_value));
    assert_eq!(json_value["isError"], true);
    assert!(json_value.get("_meta").is_none());

    let text: Value = serde_json::from_str(json_value["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text["error"], true);
    assert_eq!(text["message"], "invalid arguments for ta_rsi: 'values' is required");
}

#[test]
fn success_result_always_carries_is_error() {
    let result = ToolResult::json(&serde_json::json!({ "ok": true })).unwrap();
    let json_value = serde_json::to_value(&result).unwrap();

    assert!(validator(TOOL_RESULT_SCHEMA).is_valid(&json_value));
    assert_eq!(
        serde_json::to_string(&result).unwrap(),
        r#"{"content":[{"type":"text","text":"{\"ok\":true}"}],"isError":false}"#
    );
}

#[test]
fn tool_result_schema_rejects_missing_content() {
    let bad: Value = serde_json::json!({ "content": [], "isError": false });
    assert!(!validator(TOOL_RESULT_SCHEMA).is_valid(&bad));
}
