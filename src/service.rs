//! HTTP client for the remote generation service

use log::{debug, trace, error, info};

/// Connection to the generation service.
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ServiceClient
{   config: crate::config::CopilotConfig
  , http_client: reqwest::Client
}

impl ServiceClient
{   pub fn new(config: crate::config::CopilotConfig)
      -> Result<Self, crate::error::Error>
    {   debug!("Creating ServiceClient for {}", config.base_url);
        config.validate()?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout()
        {   builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })?;

        Ok(ServiceClient
        {   config
          , http_client
        })
    }

    pub fn config(&self) -> &crate::config::CopilotConfig
    {   &self.config
    }

    pub fn base_url(&self) -> &str
    {   &self.config.base_url
    }

    /// Resolve `mode` against `input` and run the call.
    /// Blank input is refused before anything is sent.
    pub async fn generate(
      &self
    , mode: crate::modes::Mode
    , input: &str
    ) -> Result<crate::request::GenerationResult, crate::error::Error>
    {   if input.trim().is_empty()
        {   debug!("generate skipped: empty input");
            return Err(crate::error::Error::EmptyInput);
        }
        let request = mode.resolve(input);
        Ok(self.execute(&request).await)
    }

    /// Run one generation call. Every failure is folded into a
    /// synthesized result, so this never returns an error.
    pub async fn execute(
      &self
    , request: &crate::request::GenerationRequest
    ) -> crate::request::GenerationResult
    {   match self.send_generation(request).await
        {   Ok(result) => result
          , Err(e) => {
              error!("Generation via {} failed: {}", request.endpoint, e);
              crate::request::GenerationResult::from_failure(
                &e,
                self.base_url()
              )
            }
        }
    }

    async fn send_generation(
      &self
    , request: &crate::request::GenerationRequest
    ) -> Result<crate::request::GenerationResult, crate::error::Error>
    {   let url = self.config.url_for(&request.endpoint);
        debug!("POST {}", url);
        trace!("Generation payload: {:?}", request.payload);

        let response = self.http_client
          .post(&url)
          .header("Content-Type", "application/json")
          .json(&request.payload)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::Transport(e.to_string())
          })?;

        let status = response.status();
        trace!("Generation response status: {}", status);

        if !status.is_success()
        {   return Err(crate::error::Error::HttpStatus(status.as_u16()));
        }

        let body: serde_json::Value
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::Decode(e.to_string())
          })?;
        let result = crate::request::GenerationResult::from_value(body);

        debug!(
          "Generation returned {} bytes of code, {} errors",
          result.code.len(),
          result.errors().len()
        );
        Ok(result)
    }

    /// Probe the health path. Any failure reads as `Dead`.
    pub async fn check_liveness(&self)
      -> crate::request::LivenessState
    {   let url = self.config.url_for(&self.config.health_path);
        debug!("GET {}", url);

        match self.http_client.get(&url).send().await
        {   Ok(response) if response.status().is_success() => {
              info!("Generation service is alive");
              crate::request::LivenessState::Alive
            }
          , Ok(response) => {
              info!("Liveness probe answered {}", response.status());
              crate::request::LivenessState::Dead
            }
          , Err(e) => {
              info!("Liveness probe failed: {}", e);
              crate::request::LivenessState::Dead
            }
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn rejects_invalid_config()
    {   let config = crate::config::CopilotConfig::with_base_url("localhost");
        assert!(matches!(
          ServiceClient::new(config),
          Err(crate::error::Error::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn blank_input_is_not_sent()
    {   // Nothing listens here; a request would surface as a failure result
        let client = ServiceClient::new(
          crate::config::CopilotConfig::with_base_url("http://127.0.0.1:9")
        ).unwrap();
        let outcome = client
          .generate(crate::modes::Mode::ManualUi, "  \n\t ")
          .await;
        assert_eq!(outcome, Err(crate::error::Error::EmptyInput));
    }
}
