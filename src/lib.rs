pub mod error;
pub mod config;
pub mod modes;
pub mod request;
pub mod service;
pub mod client;

pub use client::{CopilotSession, SessionSnapshot};
pub use config::CopilotConfig;
pub use modes::Mode;
pub use request::{GenerationRequest, GenerationResult, LivenessState};
pub use service::ServiceClient;

/*

testops-copilot: async client for the TestOps test-generation service.
The operator picks a mode, types (or loads) a requirement, and the
session forwards it to the service and keeps the latest result.

testops-copilot/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Session command interface and re-exports
│   ├── error.rs        # Error type shared through reply channels
│   ├── config.rs       # Service address, probe path, notification window
│   ├── modes.rs        # Mode catalog: endpoint + payload per mode
│   ├── request.rs      # Request / result / liveness types
│   ├── service.rs      # HTTP calls and failure folding
│   ├── client.rs       # Session loop owning all interactive state
│   └── main.rs         # CLI front-end
└── tests/              # Integration tests against a mock service

*/

/// SESSION API INTERFACE:

// ===== Generate =====

pub type GenerateReply
  = Result<crate::request::GenerationResult, crate::error::Error>;
pub type GenerateReplySender
  = tokio::sync::mpsc::UnboundedSender<GenerateReply>;

pub struct GenerateArgs
{   pub reply: GenerateReplySender
}

// ===== SelectMode =====

pub type SelectModeReply = Result<(), crate::error::Error>;
pub type SelectModeReplySender
  = tokio::sync::mpsc::UnboundedSender<SelectModeReply>;

pub struct SelectModeArgs
{   pub mode: crate::modes::Mode
  , pub reply: SelectModeReplySender
}

// ===== SetInput =====

pub type SetInputReply = Result<(), crate::error::Error>;
pub type SetInputReplySender
  = tokio::sync::mpsc::UnboundedSender<SetInputReply>;

pub struct SetInputArgs
{   pub text: String
  , pub reply: SetInputReplySender
}

// ===== CheckLiveness =====

pub type CheckLivenessReply = crate::request::LivenessState;
pub type CheckLivenessReplySender
  = tokio::sync::mpsc::UnboundedSender<CheckLivenessReply>;

pub struct CheckLivenessArgs
{   pub reply: CheckLivenessReplySender
}

// ===== Shutdown =====

pub type ShutdownReply = Result<(), crate::error::Error>;
pub type ShutdownReplySender
  = tokio::sync::mpsc::UnboundedSender<ShutdownReply>;

pub struct ShutdownArgs
{   pub reply: ShutdownReplySender
}

// ===== SessionHand (sender side) =====

pub struct SessionHand
{   pub generate_tx
      : tokio::sync::mpsc::UnboundedSender<GenerateArgs>
  , pub select_mode_tx
      : tokio::sync::mpsc::UnboundedSender<SelectModeArgs>
  , pub set_input_tx
      : tokio::sync::mpsc::UnboundedSender<SetInputArgs>
  , pub check_liveness_tx
      : tokio::sync::mpsc::UnboundedSender<CheckLivenessArgs>
  , pub shutdown_tx
      : tokio::sync::mpsc::UnboundedSender<ShutdownArgs>
}

// ===== SessionFoot (receiver side) =====

pub struct SessionFoot
{   pub generate_rx
      : tokio::sync::mpsc::UnboundedReceiver<GenerateArgs>
  , pub select_mode_rx
      : tokio::sync::mpsc::UnboundedReceiver<SelectModeArgs>
  , pub set_input_rx
      : tokio::sync::mpsc::UnboundedReceiver<SetInputArgs>
  , pub check_liveness_rx
      : tokio::sync::mpsc::UnboundedReceiver<CheckLivenessArgs>
  , pub shutdown_rx
      : tokio::sync::mpsc::UnboundedReceiver<ShutdownArgs>
}
