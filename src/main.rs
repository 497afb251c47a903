//! testops-copilot
//!
//! Command-line front-end: parses flags, builds the config and drives a
//! `CopilotSession`. Rendering lives here; orchestration lives in the
//! library.

mod cli;

use clap::Parser;
use log::{debug, error};
use std::path::Path;
use tokio::io::AsyncBufReadExt;
use testops_copilot::{
  CopilotConfig, CopilotSession, GenerationResult, Mode, SessionSnapshot,
};
use testops_copilot::error::Error;

type MainResult = Result<(), Box<dyn std::error::Error>>;

const SHELL_HELP: &str = "\
:modes            list modes
:mode <id>        select a mode
:load <file>      replace the requirement with a file's contents
:check            probe the generation service
:generate         generate for the current mode and requirement
:show             show the current session state and result
:copy [file]      copy the generated code to a file (stdout if omitted)
:quit             leave
any other line    replace the requirement text";

#[tokio::main]
async fn main() -> MainResult
{   let cli = cli::Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or(default_filter)
    ).init();

    let config = build_config(&cli)?;
    debug!("Using config: {:?}", config);

    match cli.command
    {   cli::Command::Modes => {
          print_modes();
          Ok(())
        }
      , cli::Command::Check => run_check(config).await
      , cli::Command::Generate { mode, prompt, file, output } => {
          run_generate(
            config,
            &mode,
            prompt,
            file.as_deref(),
            output.as_deref()
          ).await
        }
      , cli::Command::Shell => run_shell(config).await
    }
}

fn build_config(cli: &cli::Cli) -> Result<CopilotConfig, Error>
{   let config = match &cli.config
    {   Some(path) => CopilotConfig::from_json_file(path)?
      , None => CopilotConfig::default()
    };
    let mut config = config.with_env_overrides()?;
    if let Some(url) = &cli.base_url
    {   config.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_modes()
{   for mode in Mode::ALL
    {   println!(
          "{:<12} {:<32} {}",
          mode.id(), mode.label(), mode.endpoint()
        );
    }
}

async fn run_check(config: CopilotConfig) -> MainResult
{   let session = CopilotSession::new(config)?;
    let mut rx = session.check_liveness().await?;
    let liveness = rx.recv().await.ok_or(Error::SessionClosed)?;
    println!("{}", liveness.notification_text());
    session.shutdown().await?;
    Ok(())
}

async fn run_generate(
  config: CopilotConfig
, mode: &str
, prompt: Option<String>
, file: Option<&Path>
, output: Option<&Path>
) -> MainResult
{   let session = CopilotSession::new(config)?;
    let mode = Mode::from_id(mode);

    session.select_mode(mode).await?.recv().await;
    let mut input_rx = match file
    {   Some(path) => session.load_input_file(path).await?
      , None => session.set_input(prompt.unwrap_or_default()).await?
    };
    input_rx.recv().await.ok_or(Error::SessionClosed)??;

    let mut rx = session.generate().await?;
    match rx.recv().await.ok_or(Error::SessionClosed)?
    {   Ok(result) => {
          print!("{}", render_result(&result));
          if let Some(path) = output
          {   copy_code(&result, Some(path)).await?;
          }
        }
      , Err(Error::EmptyInput) => {
          eprintln!("Nothing to generate: the requirement is empty");
        }
      , Err(e) => return Err(e.into())
    }

    session.shutdown().await?;
    Ok(())
}

fn render_result(result: &GenerationResult) -> String
{   let mut out = String::new();
    out.push_str("Generated code:\n");
    out.push_str(&result.display_code());
    out.push('\n');
    if !result.errors().is_empty()
    {   out.push_str("\nValidation errors:\n");
        for err in result.errors()
        {   out.push_str(&format!("  - {}\n", err));
        }
    }
    if !result.warnings().is_empty()
    {   out.push_str("\nWarnings:\n");
        for warning in result.warnings()
        {   out.push_str(&format!("  - {}\n", warning));
        }
    }
    out
}

fn render_status(view: &SessionSnapshot) -> String
{   let state = if view.loading { "generating..." } else { "idle" };
    format!(
      "mode: {} ({})\nstate: {}\nliveness: {:?}\nrequirement: {} chars\n",
      view.mode.id(),
      view.mode.label(),
      state,
      view.liveness,
      view.input.chars().count()
    )
}

/// Clipboard stand-in: writes the code verbatim
async fn copy_code(
  result: &GenerationResult
, path: Option<&Path>
) -> Result<(), Error>
{   let code = result.display_code();
    match path
    {   Some(path) => {
          tokio::fs::write(path, code).await?;
          println!("Code written to {}", path.display());
        }
      , None => println!("{}", code)
    }
    Ok(())
}

async fn run_shell(config: CopilotConfig) -> MainResult
{   let session = CopilotSession::new(config)?;
    spawn_notification_printer(session.subscribe());

    println!("testops-copilot shell, :help for commands");
    let mut lines
      = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await?
    {   let line = line.trim_end();
        let (command, arg) = match line.strip_prefix(':')
        {   Some(rest) => {
              let mut parts = rest.splitn(2, char::is_whitespace);
              let command = parts.next().unwrap_or("");
              let arg = parts.next()
                .map(str::trim)
                .filter(|a| !a.is_empty());
              (Some(command), arg)
            }
          , None => (None, None)
        };

        match command
        {   None => {
              session.set_input(line.to_string()).await?.recv().await;
            }
          , Some("help") => println!("{}", SHELL_HELP)
          , Some("modes") => print_modes()
          , Some("mode") => match arg
            {   Some(id) => {
                  let mode = Mode::from_id(id);
                  session.select_mode(mode).await?.recv().await;
                  println!("Mode: {}", mode.label());
                }
              , None => println!("usage: :mode <id>")
            }
          , Some("load") => match arg
            {   Some(path) => {
                  match session.load_input_file(Path::new(path)).await
                  {   Ok(mut rx) => {
                        rx.recv().await;
                        println!("Requirement loaded from {}", path);
                      }
                    , Err(e) => println!("{}", e)
                  }
                }
              , None => println!("usage: :load <file>")
            }
          , Some("check") => {
              session.check_liveness().await?;
            }
          , Some("generate") => {
              let rx = session.generate().await?;
              tokio::spawn(print_generation(rx));
            }
          , Some("show") => {
              let view = session.snapshot();
              print!("{}", render_status(&view));
              if let Some(result) = &view.result
              {   print!("{}", render_result(result));
              }
            }
          , Some("copy") => match session.snapshot().result
            {   Some(result) => {
                  if let Err(e) = copy_code(&result, arg.map(Path::new)).await
                  {   println!("{}", e);
                  }
                }
              , None => println!("No generated code yet")
            }
          , Some("quit") | Some("q") => break
          , Some(other) => println!("Unknown command :{} (:help)", other)
        }
    }

    session.shutdown().await?;
    Ok(())
}

async fn print_generation(
  mut rx: tokio::sync::mpsc::UnboundedReceiver<testops_copilot::GenerateReply>
)
{   match rx.recv().await
    {   Some(Ok(result)) => print!("{}", render_result(&result))
      , Some(Err(Error::EmptyInput)) => {
          println!("Type a requirement first")
        }
      , Some(Err(Error::GenerationPending)) => {
          println!("A generation is already running")
        }
      , Some(Err(e)) => println!("{}", e)
      , None => error!("Session closed before generation finished")
    }
}

/// Prints the liveness notification when it appears and disappears
fn spawn_notification_printer(
  mut rx: tokio::sync::watch::Receiver<SessionSnapshot>
)
{   tokio::spawn(async move {
      let mut visible = false;
      let mut loading = false;
      while rx.changed().await.is_ok()
      {   let view = rx.borrow_and_update().clone();
          if view.notification_visible != visible
          {   visible = view.notification_visible;
              if visible
              {   println!("[{}]", view.liveness.notification_text());
              } else
              {   debug!("notification hidden");
              }
          }
          if view.loading != loading
          {   loading = view.loading;
              if loading
              {   println!("Generating ({})...", view.mode.id());
              }
          }
      }
    });
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn renders_errors_and_warnings()
    {   let result = GenerationResult::from_value(json!({
          "code": "import pytest",
          "validation": { "errors": ["no asserts"], "warnings": ["slow"] }
        }));
        let text = render_result(&result);
        assert!(text.starts_with("Generated code:\nimport pytest\n"));
        assert!(text.contains("Validation errors:\n  - no asserts\n"));
        assert!(text.contains("Warnings:\n  - slow\n"));
    }

    #[test]
    fn clean_result_has_no_diagnostic_sections()
    {   let result
          = GenerationResult::from_value(json!({ "code": "x = 1" }));
        assert_eq!(render_result(&result), "Generated code:\nx = 1\n");
    }
}
