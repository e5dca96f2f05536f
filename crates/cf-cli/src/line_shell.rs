use cf_core::{FlowResult, Settings};
use cf_runtime::SessionHandle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::map_cli_stdin;
use crate::shell_state::{PromptKind, SharedShell, ShellState};
use crate::terminal_host::Transcript;

pub(crate) const HELP_TEXT: &str =
    "commands: :help :quit | numbers pick options, comma lists pick checkboxes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineAction {
    Quit,
    Help,
    Ignore,
    Notice(String),
    Send { text: String, echo: Option<String> },
}

fn is_selection(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == ',' || ch.is_whitespace())
        && raw.chars().any(|ch| ch.is_ascii_digit())
}

fn parse_indices(raw: &str, len: usize) -> Result<Vec<usize>, String> {
    let mut picked = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let index = part
            .parse::<usize>()
            .ok()
            .filter(|index| (1..=len).contains(index))
            .ok_or_else(|| format!("choose numbers between 1 and {}", len))?;
        if !picked.contains(&index) {
            picked.push(index);
        }
    }
    Ok(picked)
}

fn echo_if(send_output: bool, text: &str) -> Option<String> {
    send_output.then(|| format!("you> {}", text))
}

fn select(
    raw: &str,
    state: &mut ShellState,
    current_path: Option<&str>,
    settings: &Settings,
) -> Option<LineAction> {
    let prompt = state.live_prompt(current_path)?;
    let items = prompt.kind.items().to_vec();
    let action = match &prompt.kind {
        PromptKind::Options(options) => {
            let picked = match parse_indices(raw, items.len()) {
                Ok(picked) if picked.len() == 1 => picked,
                Ok(_) => {
                    return Some(LineAction::Notice("choose exactly one option".to_string()))
                }
                Err(notice) => return Some(LineAction::Notice(notice)),
            };
            let text = items[picked[0] - 1].clone();
            let send_output = options.send_output.unwrap_or(settings.send_option_output);
            LineAction::Send {
                echo: echo_if(send_output, &text),
                text,
            }
        }
        PromptKind::Checkboxes(checkboxes) => {
            let picked = match parse_indices(raw, items.len()) {
                Ok(picked) => picked,
                Err(notice) => return Some(LineAction::Notice(notice)),
            };
            if picked.len() < checkboxes.min || picked.len() > checkboxes.max {
                return Some(LineAction::Notice(format!(
                    "choose between {} and {} items",
                    checkboxes.min, checkboxes.max
                )));
            }
            let text = picked
                .iter()
                .map(|index| items[index - 1].as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let send_output = checkboxes
                .send_output
                .unwrap_or(settings.send_checkbox_output);
            LineAction::Send {
                echo: echo_if(send_output, &text),
                text,
            }
        }
    };
    prompt.used = true;
    Some(action)
}

/// Decides what one entered line means against the current shell state.
pub(crate) fn interpret_line(
    raw: &str,
    state: &mut ShellState,
    current_path: Option<&str>,
    settings: &Settings,
) -> LineAction {
    let trimmed = raw.trim();
    match trimmed {
        ":quit" => return LineAction::Quit,
        ":help" => return LineAction::Help,
        _ => {}
    }

    if state.cancel_timer() {
        debug!("typing interrupted the pending transition");
    }

    if is_selection(trimmed) {
        if let Some(action) = select(trimmed, state, current_path, settings) {
            return action;
        }
    }

    if state.disabled {
        return LineAction::Notice("chat is disabled".to_string());
    }

    let text = if trimmed.is_empty() {
        match state.draft.take() {
            Some(draft) => draft,
            None => return LineAction::Ignore,
        }
    } else {
        state.draft = None;
        raw.to_string()
    };
    let shown = if state.sensitive {
        "*".repeat(text.chars().count())
    } else {
        text.clone()
    };
    LineAction::Send {
        echo: Some(format!("you> {}", shown)),
        text,
    }
}

/// Reads lines until EOF or `:quit`, waiting for the session to go idle before each read.
pub(crate) async fn run_line_shell<R>(
    reader: R,
    handle: &SessionHandle,
    shell: &SharedShell,
    transcript: &Transcript,
    settings: &Settings,
) -> FlowResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        handle.flush().await?;
        shell.lock().stamp_prompt(handle.current_path().as_deref());

        let Some(raw) = lines.next_line().await.map_err(map_cli_stdin)? else {
            return Ok(());
        };

        handle.flush().await?;
        let current_path = handle.current_path();
        let action = {
            let mut state = shell.lock();
            state.stamp_prompt(current_path.as_deref());
            interpret_line(&raw, &mut state, current_path.as_deref(), settings)
        };

        match action {
            LineAction::Quit => {
                transcript.line("bye")?;
                return Ok(());
            }
            LineAction::Help => transcript.line(HELP_TEXT)?,
            LineAction::Ignore => {}
            LineAction::Notice(notice) => transcript.line(&format!("({})", notice))?,
            LineAction::Send { text, echo } => {
                if let Some(echo) = echo {
                    transcript.line(&echo)?;
                }
                handle.send_input(text)?;
            }
        }
    }
}
