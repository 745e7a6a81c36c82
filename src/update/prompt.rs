//! User confirmation before an update is installed.
//!
//! The flow only knows the [`UpdatePrompt`] trait. Hosts plug in whatever
//! surface they have: a GUI dialog, the [`TerminalPrompt`] used by the CLI,
//! or a [`StaticPrompt`] for unattended runs.

use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::warn;

/// What the user is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub current_version: String,
    pub latest_version: String,
}

/// The user's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptResponse {
    /// `true` to install now.
    pub accepted: bool,
    /// "Remember my selection" was ticked.
    pub remember: bool,
}

impl PromptResponse {
    #[must_use]
    pub const fn accept() -> Self {
        Self {
            accepted: true,
            remember: false,
        }
    }

    #[must_use]
    pub const fn decline() -> Self {
        Self {
            accepted: false,
            remember: false,
        }
    }

    #[must_use]
    pub const fn remembered(mut self) -> Self {
        self.remember = true;
        self
    }
}

/// A yes/no confirmation with a "remember my selection" toggle.
///
/// `confirm` blocks the calling thread until the user answers; the flow runs
/// it on a blocking worker so the async runtime keeps going.
pub trait UpdatePrompt: Send + Sync {
    fn confirm(&self, request: &PromptRequest) -> Result<PromptResponse>;
}

/// Always returns the same answer. Used for `--yes` and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt {
    response: PromptResponse,
}

impl StaticPrompt {
    pub const fn new(response: PromptResponse) -> Self {
        Self {
            response,
        }
    }

    pub const fn accept() -> Self {
        Self::new(PromptResponse::accept())
    }

    pub const fn decline() -> Self {
        Self::new(PromptResponse::decline())
    }
}

impl UpdatePrompt for StaticPrompt {
    fn confirm(&self, _request: &PromptRequest) -> Result<PromptResponse> {
        Ok(self.response)
    }
}

/// Interactive prompt on stdin/stderr.
///
/// When stdin is not a terminal nobody can answer, so every update is
/// declined without reading input. Use `--yes` for unattended installs.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    interactive: bool,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    /// Override terminal detection.
    #[must_use]
    pub const fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdatePrompt for TerminalPrompt {
    fn confirm(&self, request: &PromptRequest) -> Result<PromptResponse> {
        if !self.interactive {
            warn!(
                "Update {} available but stdin is not a terminal; skipping (pass --yes to install unattended)",
                request.latest_version
            );
            return Ok(PromptResponse::decline());
        }

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stderr();
        Ok(ask(&mut input, &mut output, request)?)
    }
}

/// Ask both questions on the given streams.
///
/// "Install now" defaults to yes, "remember" defaults to no. End of input
/// declines without remembering.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    request: &PromptRequest,
) -> io::Result<PromptResponse> {
    writeln!(output, "{}", "Update Available".cyan().bold())?;
    write!(
        output,
        "A new update is available ({} -> {}). Would you like to install it now? [Y/n] ",
        request.current_version.yellow(),
        request.latest_version.green().bold()
    )?;
    output.flush()?;

    let Some(accepted) = read_answer(input, true)? else {
        return Ok(PromptResponse::decline());
    };

    write!(output, "Remember my selection? [y/N] ")?;
    output.flush()?;
    let remember = read_answer(input, false)?.unwrap_or(false);

    Ok(PromptResponse {
        accepted,
        remember,
    })
}

/// Read one yes/no line. `None` on end of input; unrecognised answers count
/// as "no".
fn read_answer<R: BufRead>(input: &mut R, default: bool) -> io::Result<Option<bool>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let answer = match line.trim().to_ascii_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    };
    Ok(Some(answer))
}
