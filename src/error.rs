use std::fmt;

/// Custom error type for copilot operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Service answered with a non-success status
    HttpStatus(u16)
  , /// Request never produced a response (refused, DNS, ...)
    Transport(String)
  , /// Response body was not the expected JSON
    Decode(String)
  , /// Input text is empty or whitespace-only
    EmptyInput
  , /// A generation is already in flight for this session
    GenerationPending
  , /// File extension is not one of the accepted input kinds
    UnsupportedFile(String)
  , /// Input file could not be read
    Io(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Session loop is gone
    SessionClosed
}

impl Error
{   /// Message used when a failure is shown to the operator.
    pub fn user_message(&self) -> String
    {   match self
        {   Error::HttpStatus(status) => {
              format!("HTTP error! status: {}", status)
            }
          , Error::Transport(msg) | Error::Decode(msg) => msg.clone()
          , other => other.to_string()
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::HttpStatus(status) => {
              write!(f, "HTTP error: status {}", status)
            }
          , Error::Transport(msg) => {
              write!(f, "Transport error: {}", msg)
            }
          , Error::Decode(msg) => {
              write!(f, "Decode error: {}", msg)
            }
          , Error::EmptyInput => {
              write!(f, "Input text is empty")
            }
          , Error::GenerationPending => {
              write!(f, "A generation is already in progress")
            }
          , Error::UnsupportedFile(path) => {
              write!(f,
                "Unsupported input file (expected .yaml, .yml or .txt): {}",
                path
              )
            }
          , Error::Io(msg) => {
              write!(f, "I/O error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::SessionClosed => {
              write!(f, "Session loop disconnected")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error
{   fn from(e: std::io::Error) -> Self
    {   Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn status_message_names_the_code()
    {   let msg = Error::HttpStatus(503).user_message();
        assert_eq!(msg, "HTTP error! status: 503");
    }

    #[test]
    fn transport_and_decode_share_the_raw_message()
    {   assert_eq!(
          Error::Transport("connection refused".into()).user_message(),
          Error::Decode("connection refused".into()).user_message()
        );
    }
}
