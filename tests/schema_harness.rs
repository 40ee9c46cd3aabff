use std::collections::HashSet;

use elfa_mcp_server::schema::{check, compile, SchemaValidationError};
use elfa_mcp_server::protocol::ToolError;
use elfa_mcp_server::tools::{Tool, ToolCatalogue};
use serde_json::json;

#[test]
fn json_schema_harness_reports_every_violation() {
    let validator = compile(&json!({
        "type": "object",
        "required": ["values"],
        "properties": {
            "values": { "type": "array" },
            "period": { "type": "integer", "minimum": 1 }
        }
    }))
    .expect("schema compiles");

    check(&validator, &json!({ "values": [1, 2], "period": 3 })).expect("valid instance");

    match check(&validator, &json!({ "period": 0 })) {
        Err(SchemaValidationError::Invalid(message)) => {
            assert!(message.contains("values"), "{message}");
            assert!(message.contains("; "), "both violations are listed: {message}");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn invalid_schema_does_not_compile() {
    let err = compile(&json!({ "type": "not-a-type" })).unwrap_err();
    assert!(matches!(err, SchemaValidationError::SchemaCompile(_)));
}

#[test]
fn catalogue_schemas_compile_and_names_are_unique() {
    let catalogue = ToolCatalogue::new().expect("all input schemas compile");
    let definitions = catalogue.definitions();
    assert_eq!(definitions.len(), Tool::ALL.len());

    let names: HashSet<&str> = definitions.iter().map(|d| d.name).collect();
    assert_eq!(names.len(), definitions.len());

    for (tool, def) in Tool::ALL.iter().zip(definitions) {
        assert_eq!(tool.name(), def.name);
        assert_eq!(Tool::from_name(def.name), Some(*tool));
        assert_eq!(catalogue.lookup(def.name), Some(*tool));
    }
    assert_eq!(catalogue.lookup("ELFA_STATUS"), None);
}

#[test]
fn catalogue_validates_arguments_per_tool() {
    let catalogue = ToolCatalogue::new().unwrap();

    catalogue
        .validate_arguments(Tool::Rsi, &json!({ "values": [1, "2", null], "period": 14 }))
        .expect("loose values are allowed");
    catalogue
        .validate_arguments(Tool::Summary, &json!({ "values": [1, true, { "close": 2 }, [3], "x"] }))
        .expect("non-numeric entries are left to normalization");
    catalogue
        .validate_arguments(Tool::KeywordMentions, &json!({ "keywords": ["a", "b"] }))
        .expect("keyword list");
    catalogue
        .validate_arguments(Tool::KeywordMentions, &json!({ "keywords": "a,b" }))
        .expect("keyword string");
    catalogue
        .validate_arguments(Tool::TrendingTokens, &json!({ "start": 1, "end": "2024-01-02" }))
        .expect("scalar bounds");

    for (tool, arguments) in [
        (Tool::Rsi, json!({ "values": "1,2,3" })),
        (Tool::Rsi, json!({ "values": [1], "period": "14" })),
        (Tool::Bollinger, json!({ "values": [1], "mult": -0.5 })),
        (Tool::Summary, json!({ "values": [1], "bbPeriod": 0 })),
        (Tool::SetBase, json!({})),
        (Tool::Query, json!({ "method": "GET" })),
        (Tool::Query, json!({ "path": "/v2/x", "query": "a=b" })),
        (Tool::KeywordMentions, json!({ "keywords": [1, 2] })),
        (Tool::TokenNews, json!({ "start": true })),
    ] {
        assert!(
            catalogue.validate_arguments(tool, &arguments).is_err(),
            "{} accepted {arguments}",
            tool.name()
        );
    }
}

#[test]
fn every_tool_has_its_own_validator() {
    let catalogue = ToolCatalogue::new().unwrap();

    for tool in Tool::ALL {
        let err = catalogue
            .validate_arguments(tool, &json!([]))
            .expect_err("arguments must be an object");
        assert!(
            matches!(err, ToolError::InvalidArguments { tool: name, .. } if name == tool.name()),
            "{}: {err}",
            tool.name()
        );
    }

    // Each required field is reported by the tool that declares it.
    for (tool, missing) in [
        (Tool::SetAuth, "key"),
        (Tool::SetBase, "base"),
        (Tool::Query, "path"),
        (Tool::Rsi, "values"),
        (Tool::Bollinger, "values"),
        (Tool::Summary, "values"),
    ] {
        let err = catalogue.validate_arguments(tool, &json!({})).unwrap_err();
        assert!(err.to_string().contains(missing), "{}: {err}", tool.name());
    }
    for tool in [
        Tool::ReloadEnv,
        Tool::Status,
        Tool::Trending,
        Tool::TrendingTokens,
        Tool::TokenNews,
        Tool::KeywordMentions,
    ] {
        catalogue.validate_arguments(tool, &json!({})).expect(tool.name());
    }
}
