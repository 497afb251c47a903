//! Request and result types exchanged with the generation service

use serde::{Deserialize, Serialize};

/// Endpoint plus body for one generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest
{   /// Path appended to the service base URL
    pub endpoint: String
  , /// JSON body
    pub payload: Payload
}

impl GenerationRequest
{   pub fn payload_json(&self)
      -> Result<serde_json::Value, crate::error::Error>
    {   Ok(serde_json::to_value(&self.payload)?)
    }
}

/// Target endpoint inside an OpenAPI document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenApiTarget
{   pub openapi: String
  , pub endpoint_path: String
  , pub method: String
}

/// Body shapes accepted by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload
{   Requirements
    {   requirements: String
    }
  , BulkRequirements
    {   requirements: String
      , count: u32
    }
  , OpenApi(OpenApiTarget)
  , BulkOpenApi
    {   #[serde(flatten)]
        target: OpenApiTarget
      , count: u32
    }
}

/// Diagnostics attached to generated code
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validation
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>
  , /// Per-check flags and anything else the service reports
    #[serde(flatten)]
    pub checks: serde_json::Map<String, serde_json::Value>
}

/// Outcome shown to the operator after a generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationResult
{   pub code: String
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>
  , /// Remaining top-level fields, kept as the service sent them
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>
}

/// Key holding a response body that is not a JSON object
pub const RAW_BODY_KEY: &str = "body";

impl Validation
{   fn from_map(mut map: serde_json::Map<String, serde_json::Value>) -> Self
    {   let errors = take_string_list(&mut map, "errors");
        let warnings = take_string_list(&mut map, "warnings");
        Validation
        {   errors
          , warnings
          , checks: map
        }
    }
}

impl GenerationResult
{   /// Build a result from whatever JSON the service returned.
    /// Nothing is rejected: fields that do not have the expected shape
    /// stay in `extra` (or `Validation::checks`) untouched.
    pub fn from_value(body: serde_json::Value) -> Self
    {   let mut map = match body
        {   serde_json::Value::Object(map) => map
          , other => {
              let mut map = serde_json::Map::new();
              map.insert(RAW_BODY_KEY.to_string(), other);
              return GenerationResult
              {   extra: map
                , ..GenerationResult::default()
              };
            }
        };

        let code = match map.remove("code")
        {   Some(serde_json::Value::String(code)) => code
          , Some(other) => {
              map.insert("code".to_string(), other);
              String::new()
            }
          , None => String::new()
        };

        let validation = match map.remove("validation")
        {   Some(serde_json::Value::Object(fields)) => {
              Some(Validation::from_map(fields))
            }
          , Some(other) => {
              map.insert("validation".to_string(), other);
              None
            }
          , None => None
        };

        GenerationResult
        {   code
          , validation
          , extra: map
        }
    }

    /// Synthesize the result for a call that yielded no usable data.
    /// Status, transport and decode failures all land here.
    pub fn from_failure(
      error: &crate::error::Error
    , base_url: &str
    ) -> Self
    {   let message = error.user_message();
        GenerationResult
        {   code: format!(
              "// Request to the generation service failed:\n\
               // {}\n\
               // Make sure the service is running at {}",
              message, base_url
            )
          , validation: Some(Validation
            {   errors: Some(vec![format!("Network error: {}", message)])
              , ..Validation::default()
            })
          , extra: serde_json::Map::new()
        }
    }

    pub fn errors(&self) -> &[String]
    {   self.validation.as_ref()
          .and_then(|v| v.errors.as_deref())
          .unwrap_or(&[])
    }

    pub fn warnings(&self) -> &[String]
    {   self.validation.as_ref()
          .and_then(|v| v.warnings.as_deref())
          .unwrap_or(&[])
    }

    /// Text to show and to copy. Bodies without `code` (the bulk
    /// endpoints) fall back to the pretty-printed remaining fields.
    pub fn display_code(&self) -> String
    {   if !self.code.is_empty() || self.extra.is_empty()
        {   return self.code.clone();
        }
        serde_json::to_string_pretty(&self.extra)
          .unwrap_or_else(|_| format!("{:?}", self.extra))
    }
}

fn take_string_list(
  map: &mut serde_json::Map<String, serde_json::Value>
, key: &str
) -> Option<Vec<String>>
{   let items = map.get(key)?.as_array()?;
    let list = items.iter()
      .map(|item| item.as_str().map(str::to_string))
      .collect::<Option<Vec<_>>>()?;
    map.remove(key);
    Some(list)
}

/// Service reachability as last reported by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState
{   #[default]
    Unknown
  , Alive
  , Dead
}

impl LivenessState
{   pub fn notification_text(self) -> &'static str
    {   match self
        {   LivenessState::Alive => "Model available"
          , LivenessState::Dead => "Model unavailable"
          , LivenessState::Unknown => "Model status unknown"
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn result_without_validation_parses()
    {   let result: GenerationResult
          = GenerationResult::from_value(json!({ "code": "def test(): pass" }));
        assert_eq!(result.code, "def test(): pass");
        assert!(result.validation.is_none());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn service_checks_are_preserved()
    {   let result = GenerationResult::from_value(json!({
          "code": "import allure",
          "validation": {
            "is_python": true,
            "errors": [],
            "warnings": ["no steps"]
          }
        }));
        let validation = result.validation.as_ref().unwrap();
        assert_eq!(validation.checks.get("is_python"), Some(&json!(true)));
        assert_eq!(result.warnings(), ["no steps".to_string()]);
    }

    #[test]
    fn bulk_body_displays_as_json()
    {   let result = GenerationResult::from_value(json!({
          "generated_tests": 1,
          "results": [{ "test_number": 1, "code": "x" }]
        }));
        assert!(result.code.is_empty());
        assert!(result.display_code().contains("\"generated_tests\": 1"));
    }

    #[test]
    fn mistyped_fields_are_kept_not_rejected()
    {   let result = GenerationResult::from_value(json!({
          "code": null,
          "validation": { "errors": "one string", "warnings": ["w", 2] }
        }));
        assert!(result.code.is_empty());
        assert_eq!(result.extra.get("code"), Some(&json!(null)));
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
        let checks = &result.validation.as_ref().unwrap().checks;
        assert_eq!(checks.get("errors"), Some(&json!("one string")));
        assert_eq!(checks.get("warnings"), Some(&json!(["w", 2])));
    }

    #[test]
    fn non_object_body_is_kept_whole()
    {   let result = GenerationResult::from_value(json!(["not", "an", "object"]));
        assert!(result.code.is_empty());
        assert!(result.validation.is_none());
        assert_eq!(
          result.extra.get(RAW_BODY_KEY),
          Some(&json!(["not", "an", "object"]))
        );
        assert!(result.display_code().contains("\"object\""));
    }

    #[test]
    fn failure_names_status_once()
    {   let result = GenerationResult::from_failure(
          &crate::error::Error::HttpStatus(500),
          "http://localhost:8000"
        );
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("500"));
        assert!(result.code.starts_with("// "));
        assert!(result.code.contains("http://localhost:8000"));
    }

    #[test]
    fn liveness_serializes_lowercase()
    {   assert_eq!(
          serde_json::to_value(LivenessState::Dead).unwrap(),
          json!("dead")
        );
        assert_eq!(LivenessState::default(), LivenessState::Unknown);
    }
}
