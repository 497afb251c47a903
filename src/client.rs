use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};
use log::{debug, error, info};
use crate::SessionFoot;

/// Extensions accepted for file-sourced input
pub const INPUT_FILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "txt"];

/// Everything the presentation layer renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot
{   pub mode: crate::modes::Mode
  , pub input: String
  , pub result: Option<crate::request::GenerationResult>
  , pub loading: bool
  , pub liveness: crate::request::LivenessState
  , pub notification_visible: bool
}

impl SessionSnapshot
{   /// Whether a generate command would be accepted now
    pub fn can_generate(&self) -> bool
    {   !self.loading && !self.input.trim().is_empty()
    }
}

/// Completions reported back to the session loop by spawned calls
enum SessionEvent
{   GenerationFinished
    {   result: crate::request::GenerationResult
      , reply: crate::GenerateReplySender
    }
  , ProbeFinished
    {   liveness: crate::request::LivenessState
      , reply: crate::CheckLivenessReplySender
    }
}

/// Re-armable hide deadline for the liveness notification.
/// Arming while already armed moves the deadline instead of adding one.
pub struct NotificationTimer
{   window: Duration
  , sleep: Pin<Box<Sleep>>
  , armed: bool
}

impl NotificationTimer
{   pub fn new(window: Duration) -> Self
    {   NotificationTimer
        {   window
          , sleep: Box::pin(tokio::time::sleep(window))
          , armed: false
        }
    }

    pub fn arm(&mut self)
    {   self.sleep.as_mut().reset(Instant::now() + self.window);
        self.armed = true;
    }

    pub fn is_armed(&self) -> bool
    {   self.armed
    }

    /// Resolves when the armed deadline passes; never resolves unarmed.
    /// Cancel-safe.
    pub async fn expired(&mut self)
    {   if !self.armed
        {   std::future::pending::<()>().await;
        }
        self.sleep.as_mut().await;
        self.armed = false;
    }
}

/// Session state machine. Owned by the session loop only.
pub struct SessionState
{   pub view: SessionSnapshot
  , pub client: crate::service::ServiceClient
  , snapshot_tx: watch::Sender<SessionSnapshot>
}

impl SessionState
{   pub fn new(
      client: crate::service::ServiceClient
    , snapshot_tx: watch::Sender<SessionSnapshot>
    ) -> Self
    {   debug!("Initializing SessionState");
        SessionState
        {   view: SessionSnapshot::default()
          , client
          , snapshot_tx
        }
    }

    fn publish(&self)
    {   self.snapshot_tx.send_replace(self.view.clone());
    }

    fn start_generation(
      &mut self
    , reply: crate::GenerateReplySender
    , events: &mpsc::UnboundedSender<SessionEvent>
    )
    {   if self.view.input.trim().is_empty()
        {   debug!("Generate ignored: empty input");
            let _ = reply.send(Err(crate::error::Error::EmptyInput));
            return;
        }
        if self.view.loading
        {   debug!("Generate ignored: already pending");
            let _ = reply.send(Err(crate::error::Error::GenerationPending));
            return;
        }

        self.view.loading = true;
        self.view.result = None;
        self.publish();

        let request = self.view.mode.resolve(&self.view.input);
        info!("Generating {} via {}", self.view.mode, request.endpoint);
        let client = self.client.clone();
        let events = events.clone();
        tokio::spawn(async move {
          let base_url = client.base_url().to_string();
          let call = tokio::spawn(async move {
            client.execute(&request).await
          });
          // A panicked call still has to clear the pending state
          let result = call.await.unwrap_or_else(|e| {
            error!("Generation task aborted: {}", e);
            crate::request::GenerationResult::from_failure(
              &crate::error::Error::Transport(e.to_string()),
              &base_url
            )
          });
          let _ = events.send(SessionEvent::GenerationFinished
          {   result
            , reply
          });
        });
    }

    fn finish_generation(
      &mut self
    , result: crate::request::GenerationResult
    , reply: crate::GenerateReplySender
    )
    {   debug!("Generation finished");
        self.view.result = Some(result.clone());
        self.view.loading = false;
        self.publish();
        let _ = reply.send(Ok(result));
    }

    fn start_probe(
      &self
    , reply: crate::CheckLivenessReplySender
    , events: &mpsc::UnboundedSender<SessionEvent>
    )
    {   let client = self.client.clone();
        let events = events.clone();
        tokio::spawn(async move {
          let liveness = client.check_liveness().await;
          let _ = events.send(SessionEvent::ProbeFinished
          {   liveness
            , reply
          });
        });
    }

    fn finish_probe(
      &mut self
    , liveness: crate::request::LivenessState
    , reply: crate::CheckLivenessReplySender
    , notification: &mut NotificationTimer
    )
    {   debug!("Probe finished: {:?}", liveness);
        self.view.liveness = liveness;
        self.view.notification_visible = true;
        notification.arm();
        self.publish();
        let _ = reply.send(liveness);
    }
}

/// Public API for a copilot session - owns the task
pub struct CopilotSession
{   hand: crate::SessionHand
  , snapshot_rx: watch::Receiver<SessionSnapshot>
  , _task_handle: tokio::task::JoinHandle<()>
}

impl CopilotSession
{   /// Create and spawn a new session
    /// Returns immediately - spawns background task
    pub fn new(config: crate::config::CopilotConfig)
      -> Result<Self, crate::error::Error>
    {   debug!("Creating CopilotSession with task ownership");
        let window = config.notification_window();
        let client = crate::service::ServiceClient::new(config)?;

        let (generate_tx, generate_rx)
          = mpsc::unbounded_channel();
        let (select_mode_tx, select_mode_rx)
          = mpsc::unbounded_channel();
        let (set_input_tx, set_input_rx)
          = mpsc::unbounded_channel();
        let (check_liveness_tx, check_liveness_rx)
          = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx)
          = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx)
          = watch::channel(SessionSnapshot::default());

        let hand = crate::SessionHand
        {   generate_tx
          , select_mode_tx
          , set_input_tx
          , check_liveness_tx
          , shutdown_tx
        };

        let foot = crate::SessionFoot
        {   generate_rx
          , select_mode_rx
          , set_input_rx
          , check_liveness_rx
          , shutdown_rx
        };

        let state = SessionState::new(client, snapshot_tx);
        let _task_handle = tokio::spawn(async move {
          run_session_loop(foot, state, NotificationTimer::new(window)).await
        });

        Ok(CopilotSession
        {   hand
          , snapshot_rx
          , _task_handle
        })
    }

    /// Current view of the session
    pub fn snapshot(&self) -> SessionSnapshot
    {   self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot>
    {   self.snapshot_rx.clone()
    }

    /// Start a generation for the current mode and input - returns
    /// immediately. The reply arrives once the call completes, or at once
    /// with `EmptyInput` / `GenerationPending` if it was not started.
    pub async fn generate(&self)
      -> Result<
        mpsc::UnboundedReceiver<crate::GenerateReply>,
        crate::error::Error
      >
    {   debug!("generate queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.generate_tx
          .send(crate::GenerateArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Session channel closed");
            crate::error::Error::SessionClosed
          })?;

        Ok(reply_rx)
    }

    /// Switch mode - returns almost immediately
    pub async fn select_mode(
      &self
    , mode: crate::modes::Mode
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SelectModeReply>,
        crate::error::Error
      >
    {   debug!("select_mode queuing {}", mode);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.select_mode_tx
          .send(crate::SelectModeArgs { mode, reply: reply_tx })
          .map_err(|_| {
            error!("Session channel closed");
            crate::error::Error::SessionClosed
          })?;

        Ok(reply_rx)
    }

    /// Replace the input text - returns almost immediately
    pub async fn set_input(
      &self
    , text: String
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetInputReply>,
        crate::error::Error
      >
    {   debug!("set_input queuing {} bytes", text.len());
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.set_input_tx
          .send(crate::SetInputArgs { text, reply: reply_tx })
          .map_err(|_| {
            error!("Session channel closed");
            crate::error::Error::SessionClosed
          })?;

        Ok(reply_rx)
    }

    /// Replace the input text with a file's contents
    pub async fn load_input_file(
      &self
    , path: &Path
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetInputReply>,
        crate::error::Error
      >
    {   let text = read_input_file(path).await?;
        self.set_input(text).await
    }

    /// Run the liveness probe - returns immediately
    pub async fn check_liveness(&self)
      -> Result<
        mpsc::UnboundedReceiver<crate::CheckLivenessReply>,
        crate::error::Error
      >
    {   debug!("check_liveness queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.hand.check_liveness_tx
          .send(crate::CheckLivenessArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Session channel closed");
            crate::error::Error::SessionClosed
          })?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the session
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down CopilotSession");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.hand.shutdown_tx
          .send(crate::ShutdownArgs { reply: reply_tx })
          .map_err(|_| {
            error!("Session channel already closed");
            crate::error::Error::SessionClosed
          })?;

        if let Some(result) = reply_rx.recv().await
        {   debug!("Session shutdown confirmed");
            result
        } else
        {   error!("Session ended without confirming shutdown");
            Err(crate::error::Error::SessionClosed)
        }
    }
}

/// Read a `.yaml` / `.yml` / `.txt` file as input text
pub async fn read_input_file(path: &Path)
  -> Result<String, crate::error::Error>
{   let accepted = path.extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| {
        INPUT_FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
      })
      .unwrap_or(false);
    if !accepted
    {   return Err(crate::error::Error::UnsupportedFile(
          path.display().to_string()
        ));
    }
    debug!("Reading input from {}", path.display());
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Main session event loop
///
/// Network calls are spawned; their completions come back through
/// `events` so this loop never waits on the service.
async fn run_session_loop(
  foot: SessionFoot
, mut state: SessionState
, mut notification: NotificationTimer
)
{   debug!("Starting session event loop");
    let SessionFoot
    {   mut generate_rx
      , mut select_mode_rx
      , mut set_input_rx
      , mut check_liveness_rx
      , mut shutdown_rx
    } = foot;
    let (events_tx, mut events_rx)
      = mpsc::unbounded_channel::<SessionEvent>();

    loop
    { tokio::select!
      { Some(cmd) = generate_rx.recv() => {
          debug!("Received Generate");
          state.start_generation(cmd.reply, &events_tx);
        }
      , Some(cmd) = select_mode_rx.recv() => {
          debug!("Received SelectMode: {}", cmd.mode);
          state.view.mode = cmd.mode;
          state.publish();
          let _ = cmd.reply.send(Ok(()));
        }
      , Some(cmd) = set_input_rx.recv() => {
          debug!("Received SetInput");
          state.view.input = cmd.text;
          state.publish();
          let _ = cmd.reply.send(Ok(()));
        }
      , Some(cmd) = check_liveness_rx.recv() => {
          debug!("Received CheckLiveness");
          state.start_probe(cmd.reply, &events_tx);
        }
      , Some(event) = events_rx.recv() => {
          match event
          {   SessionEvent::GenerationFinished { result, reply } => {
                state.finish_generation(result, reply);
              }
            , SessionEvent::ProbeFinished { liveness, reply } => {
                state.finish_probe(liveness, reply, &mut notification);
              }
          }
        }
      , _ = notification.expired() => {
          debug!("Hiding liveness notification");
          state.view.notification_visible = false;
          state.publish();
        }
      , cmd = shutdown_rx.recv() => {
          match cmd
          {   Some(cmd) => {
                let _ = cmd.reply.send(Ok(()));
                info!("Session shutting down");
              }
            , None => {
                debug!("Session handle dropped");
              }
          }
          break;
        }
      }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test(start_paused = true)]
    async fn unarmed_timer_never_fires()
    {   let mut timer = NotificationTimer::new(Duration::from_secs(3));
        tokio::time::advance(Duration::from_secs(10)).await;
        let mut fut = task::spawn(timer.expired());
        assert_pending!(fut.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_after_window()
    {   let mut timer = NotificationTimer::new(Duration::from_secs(3));
        timer.arm();
        tokio::time::advance(Duration::from_millis(2999)).await;
        {   let mut fut = task::spawn(timer.expired());
            assert_pending!(fut.poll());
        }
        tokio::time::advance(Duration::from_millis(2)).await;
        {   let mut fut = task::spawn(timer.expired());
            assert_ready!(fut.poll());
        }
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_restarts_the_window()
    {   let mut timer = NotificationTimer::new(Duration::from_secs(3));
        timer.arm();
        tokio::time::advance(Duration::from_secs(2)).await;
        timer.arm();
        tokio::time::advance(Duration::from_secs(2)).await;
        {   let mut fut = task::spawn(timer.expired());
            assert_pending!(fut.poll());
        }
        tokio::time::advance(Duration::from_millis(1001)).await;
        let mut fut = task::spawn(timer.expired());
        assert_ready!(fut.poll());
    }

    #[test]
    fn can_generate_needs_text_and_idle()
    {   let mut view = SessionSnapshot::default();
        assert!(!view.can_generate());
        view.input = "   ".to_string();
        assert!(!view.can_generate());
        view.input = "login flow".to_string();
        assert!(view.can_generate());
        view.loading = true;
        assert!(!view.can_generate());
    }

    #[tokio::test]
    async fn rejects_other_file_extensions()
    {   let outcome = read_input_file(Path::new("requirements.json")).await;
        assert_eq!(
          outcome,
          Err(crate::error::Error::UnsupportedFile("requirements.json".to_string()))
        );
    }

    #[tokio::test]
    async fn reads_accepted_file()
    {   let path = std::env::temp_dir().join(format!(
          "testops_copilot_input_{}.YML",
          std::process::id()
        ));
        tokio::fs::write(&path, "openapi: 3.0.0\n").await.unwrap();
        let text = read_input_file(&path).await.unwrap();
        assert_eq!(text, "openapi: 3.0.0\n");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
