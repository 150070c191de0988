//! Command execution over SSH
//!
//! Provides the `CommandOutput` struct and `exec_command`, which runs exactly
//! one command on a fresh session channel and collects its output.

use russh::client;
use russh::{Channel, ChannelMsg};
use tracing::{debug, warn};

use super::connection::SshConnection;
use crate::error::{Result, SshLambdaError};

/// Output from a command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,

    /// Standard error from the command
    pub stderr: String,

    /// stdout and stderr interleaved in the order they arrived
    pub combined: String,

    /// Exit status of the command (if reported)
    pub exit_code: Option<u32>,

    /// Signal that terminated the command (if any)
    pub exit_signal: Option<String>,
}

impl CommandOutput {
    /// Create a new empty CommandOutput
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the command succeeded (reported exit status 0)
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Why the command is considered failed, `None` on success
    pub fn failure_reason(&self) -> Option<String> {
        match (self.exit_code, &self.exit_signal) {
            (Some(0), _) => None,
            (_, Some(signal)) => Some(format!("Process exited with signal {}", signal)),
            (Some(code), None) => Some(format!("Process exited with status {}", code)),
            (None, None) => {
                Some("remote command exited without exit status or exit signal".to_string())
            }
        }
    }
}

/// The parts of a channel message the output collector cares about
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChannelEvent<'a> {
    Stdout(&'a [u8]),
    Stderr(&'a [u8]),
    ExitStatus(u32),
    ExitSignal(String),
    Rejected,
    Closed,
    Ignored,
}

impl<'a> From<&'a ChannelMsg> for ChannelEvent<'a> {
    fn from(msg: &'a ChannelMsg) -> Self {
        match msg {
            ChannelMsg::Data { data } => ChannelEvent::Stdout(&data[..]),
            // ext == 1 is SSH_EXTENDED_DATA_STDERR
            ChannelMsg::ExtendedData { data, ext } if *ext == 1 => {
                ChannelEvent::Stderr(&data[..])
            }
            ChannelMsg::ExtendedData { data, .. } => ChannelEvent::Stdout(&data[..]),
            ChannelMsg::ExitStatus { exit_status } => ChannelEvent::ExitStatus(*exit_status),
            ChannelMsg::ExitSignal { signal_name, .. } => {
                ChannelEvent::ExitSignal(format!("{:?}", signal_name))
            }
            ChannelMsg::Failure => ChannelEvent::Rejected,
            ChannelMsg::Close => ChannelEvent::Closed,
            // Eof, Success, WindowAdjusted: exit status may still follow
            _ => ChannelEvent::Ignored,
        }
    }
}

/// What the receive loop does after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
    Rejected,
}

/// Accumulates raw output bytes; text is decoded once in [`OutputCollector::finish`]
///
/// Packets may split a multibyte UTF-8 character, so nothing is decoded
/// per packet.
#[derive(Debug, Default)]
struct OutputCollector {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    combined: Vec<u8>,
    exit_code: Option<u32>,
    exit_signal: Option<String>,
}

impl OutputCollector {
    fn apply(&mut self, event: ChannelEvent<'_>) -> Step {
        match event {
            ChannelEvent::Stdout(data) => {
                self.stdout.extend_from_slice(data);
                self.combined.extend_from_slice(data);
            }
            ChannelEvent::Stderr(data) => {
                self.stderr.extend_from_slice(data);
                self.combined.extend_from_slice(data);
            }
            ChannelEvent::ExitStatus(code) => self.exit_code = Some(code),
            ChannelEvent::ExitSignal(signal) => self.exit_signal = Some(signal),
            ChannelEvent::Rejected => return Step::Rejected,
            ChannelEvent::Closed => return Step::Done,
            ChannelEvent::Ignored => {}
        }
        Step::Continue
    }

    fn finish(self) -> CommandOutput {
        CommandOutput {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            combined: String::from_utf8_lossy(&self.combined).into_owned(),
            exit_code: self.exit_code,
            exit_signal: self.exit_signal,
        }
    }
}

impl SshConnection {
    /// Execute one command over SSH
    ///
    /// Opens a session channel, runs `command`, and collects output until the
    /// channel closes. The channel is closed before returning on every path.
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - Command exited with status 0
    /// * `Err(SshLambdaError::Session)` - The session channel could not be opened
    /// * `Err(SshLambdaError::Command)` - The command failed; carries captured output
    pub async fn exec_command(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self.open_session().await?;
        debug!("Session channel opened, executing command");

        let result = run_on_channel(&mut channel, command).await;

        if let Err(e) = channel.close().await {
            debug!("Closing session channel failed: {}", e);
        }

        check_exit(result?)
    }
}

/// Turn a finished command into success or a command error carrying its output
fn check_exit(output: CommandOutput) -> Result<CommandOutput> {
    match output.failure_reason() {
        None => Ok(output),
        Some(reason) => {
            warn!("Remote command failed: {}", reason);
            Err(SshLambdaError::command(output.combined, reason))
        }
    }
}

/// Send the exec request and collect output from the channel until it closes
async fn run_on_channel(
    channel: &mut Channel<client::Msg>,
    command: &str,
) -> Result<CommandOutput> {
    channel
        .exec(true, command)
        .await
        .map_err(|e| SshLambdaError::command("", e.to_string()))?;

    let mut collector = OutputCollector::default();

    while let Some(msg) = channel.wait().await {
        match collector.apply(ChannelEvent::from(&msg)) {
            Step::Continue => {}
            Step::Done => break,
            Step::Rejected => {
                return Err(SshLambdaError::command(
                    collector.finish().combined,
                    "exec request rejected by server",
                ));
            }
        }
    }

    let output = collector.finish();
    debug!(
        "Command completed: exit_code={:?}, signal={:?}, stdout_len={}, stderr_len={}",
        output.exit_code,
        output.exit_signal,
        output.stdout.len(),
        output.stderr.len()
    );

    Ok(output)
}
