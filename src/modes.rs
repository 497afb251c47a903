//! Catalog of test-generation modes and the request each one produces

use serde::{Deserialize, Serialize};
use log::debug;

/// Example document sent by the OpenAPI-driven modes.
/// Placeholder: these modes do not yet take an operator-supplied
/// specification, so user text is ignored for them.
pub const SAMPLE_OPENAPI: &str = "openapi: 3.0.0\n\
info:\n  title: Example API\n  version: 1.0.0\n\
paths:\n  /test:\n    get:\n      responses:\n        '200':\n          description: OK";

pub const SAMPLE_ENDPOINT_PATH: &str = "/test";
pub const SAMPLE_METHOD: &str = "GET";

/// Number of tests requested by the bulk modes
pub const BULK_COUNT: u32 = 15;

/// Closed set of generation modes selectable by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode
{   /// Manual UI test (calculator)
    #[default]
    ManualUi
  , /// Automated UI end-to-end test (calculator)
    UiE2e
  , /// Automated API test
    ApiTest
  , /// Manual API test
    ApiManual
  , /// Fifteen manual tests in one call
    BulkManual
  , /// Fifteen API tests in one call
    BulkApi
}

/// How a mode turns input text into a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadRule
{   Requirements
  , BulkRequirements { count: u32 }
  , SampleOpenApi
  , BulkSampleOpenApi { count: u32 }
}

/// One row of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpec
{   pub label: &'static str
  , pub endpoint: &'static str
  , pub rule: PayloadRule
}

impl Mode
{   pub const ALL: [Mode; 6] = [
        Mode::ManualUi
      , Mode::UiE2e
      , Mode::ApiTest
      , Mode::ApiManual
      , Mode::BulkManual
      , Mode::BulkApi
    ];

    pub fn spec(self) -> ModeSpec
    {   match self
        {   Mode::ManualUi => ModeSpec
            {   label: "Manual UI test (calculator)"
              , endpoint: "/llm/manual-test"
              , rule: PayloadRule::Requirements
            }
          , Mode::UiE2e => ModeSpec
            {   label: "Automated UI E2E test (calculator)"
              , endpoint: "/llm/generate-ui-e2e-test"
              , rule: PayloadRule::Requirements
            }
          , Mode::ApiTest => ModeSpec
            {   label: "Automated API test (Evolution Compute)"
              , endpoint: "/llm/generate-api-test"
              , rule: PayloadRule::SampleOpenApi
            }
          , Mode::ApiManual => ModeSpec
            {   label: "Manual API test (Evolution Compute)"
              , endpoint: "/llm/generate-api-manual-test"
              , rule: PayloadRule::SampleOpenApi
            }
          , Mode::BulkManual => ModeSpec
            {   label: "Bulk manual tests (15)"
              , endpoint: "/llm/bulk-manual-tests"
              , rule: PayloadRule::BulkRequirements { count: BULK_COUNT }
            }
          , Mode::BulkApi => ModeSpec
            {   label: "Bulk API tests (15)"
              , endpoint: "/llm/bulk-api-tests"
              , rule: PayloadRule::BulkSampleOpenApi { count: BULK_COUNT }
            }
        }
    }

    pub fn id(self) -> &'static str
    {   match self
        {   Mode::ManualUi => "manual-ui"
          , Mode::UiE2e => "ui-e2e"
          , Mode::ApiTest => "api-test"
          , Mode::ApiManual => "api-manual"
          , Mode::BulkManual => "bulk-manual"
          , Mode::BulkApi => "bulk-api"
        }
    }

    pub fn label(self) -> &'static str
    {   self.spec().label
    }

    pub fn endpoint(self) -> &'static str
    {   self.spec().endpoint
    }

    /// Parse a mode id; anything unrecognized selects `ManualUi`
    pub fn from_id(id: &str) -> Mode
    {   let id = id.trim();
        Mode::ALL.into_iter()
          .find(|m| m.id() == id)
          .unwrap_or_else(|| {
            debug!("Unknown mode {:?}, using manual-ui", id);
            Mode::ManualUi
          })
    }

    /// Build the request this mode sends for `input`
    pub fn resolve(self, input: &str)
      -> crate::request::GenerationRequest
    {   let spec = self.spec();
        let payload = match spec.rule
        {   PayloadRule::Requirements => {
              crate::request::Payload::Requirements
              {   requirements: input.to_string()
              }
            }
          , PayloadRule::BulkRequirements { count } => {
              crate::request::Payload::BulkRequirements
              {   requirements: input.to_string()
                , count
              }
            }
          , PayloadRule::SampleOpenApi => {
              crate::request::Payload::OpenApi(sample_openapi_target())
            }
          , PayloadRule::BulkSampleOpenApi { count } => {
              crate::request::Payload::BulkOpenApi
              {   target: sample_openapi_target()
                , count
              }
            }
        };
        crate::request::GenerationRequest
        {   endpoint: spec.endpoint.to_string()
          , payload
        }
    }
}

impl std::fmt::Display for Mode
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.write_str(self.id())
    }
}

/// Free-function form of [`Mode::resolve`]
pub fn resolve(mode: Mode, input: &str)
  -> crate::request::GenerationRequest
{   mode.resolve(input)
}

fn sample_openapi_target() -> crate::request::OpenApiTarget
{   crate::request::OpenApiTarget
    {   openapi: SAMPLE_OPENAPI.to_string()
      , endpoint_path: SAMPLE_ENDPOINT_PATH.to_string()
      , method: SAMPLE_METHOD.to_string()
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    fn body(mode: Mode, input: &str) -> (String, serde_json::Value)
    {   let req = resolve(mode, input);
        (req.endpoint.clone(), req.payload_json().unwrap())
    }

    #[test]
    fn requirement_modes_forward_text()
    {   assert_eq!(
          body(Mode::ManualUi, "add two numbers"),
          ( "/llm/manual-test".to_string()
          , json!({ "requirements": "add two numbers" })
          )
        );
        assert_eq!(
          body(Mode::UiE2e, "add two numbers"),
          ( "/llm/generate-ui-e2e-test".to_string()
          , json!({ "requirements": "add two numbers" })
          )
        );
    }

    #[test]
    fn bulk_manual_adds_count()
    {   assert_eq!(
          body(Mode::BulkManual, "login flow"),
          ( "/llm/bulk-manual-tests".to_string()
          , json!({ "requirements": "login flow", "count": 15 })
          )
        );
    }

    #[test]
    fn openapi_modes_ignore_text()
    {   let expected = json!({
          "openapi": SAMPLE_OPENAPI,
          "endpoint_path": "/test",
          "method": "GET"
        });
        for input in ["", "anything at all"]
        {   assert_eq!(
              body(Mode::ApiTest, input),
              ("/llm/generate-api-test".to_string(), expected.clone())
            );
            assert_eq!(
              body(Mode::ApiManual, input),
              ("/llm/generate-api-manual-test".to_string(), expected.clone())
            );
        }

        let (endpoint, payload) = body(Mode::BulkApi, "ignored");
        assert_eq!(endpoint, "/llm/bulk-api-tests");
        assert_eq!(payload, json!({
          "openapi": SAMPLE_OPENAPI,
          "endpoint_path": "/test",
          "method": "GET",
          "count": 15
        }));
    }

    #[test]
    fn sample_document_is_yaml_shaped()
    {   assert!(SAMPLE_OPENAPI.starts_with("openapi: 3.0.0\ninfo:\n"));
        assert!(SAMPLE_OPENAPI.ends_with("          description: OK"));
        assert!(SAMPLE_OPENAPI.contains("\n  /test:\n    get:\n"));
    }

    #[test]
    fn ids_round_trip_and_unknown_falls_back()
    {   for mode in Mode::ALL
        {   assert_eq!(Mode::from_id(mode.id()), mode);
            let as_json = serde_json::to_value(mode).unwrap();
            assert_eq!(as_json, json!(mode.id()));
        }
        assert_eq!(Mode::from_id("security-scan"), Mode::ManualUi);
        assert_eq!(Mode::default(), Mode::ManualUi);
    }

    #[test]
    fn every_mode_has_a_distinct_endpoint()
    {   let mut endpoints: Vec<_>
          = Mode::ALL.iter().map(|m| m.endpoint()).collect();
        endpoints.sort();
        endpoints.dedup();
        assert_eq!(endpoints.len(), Mode::ALL.len());
    }
}
