use dati_core::{HistoryView, Msg};

pub(crate) const HELP: &str = "\
Commands:
  start              start the helper service
  stop               stop the helper service
  shot               take a screenshot
  recognize          recognize the current screenshot
  clear              clear all history (asks first)
  history <n|id>     show a history record
  delete <n|id>      delete a history record
  close              close the history detail
  refresh            fetch status now
  help               show this help
  quit               exit";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Dispatch(Msg),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum CommandError {
    #[error("unknown command `{0}` (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs a row number or record id")]
    MissingTarget(&'static str),
    #[error("no history row {0}")]
    NoSuchRow(usize),
}

/// Parses one input line. Blank lines yield `None`.
pub(crate) fn parse_command(
    line: &str,
    history: &HistoryView,
) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let target = words.next();

    let command = match head.to_ascii_lowercase().as_str() {
        "start" => Command::Dispatch(Msg::StartClicked),
        "stop" => Command::Dispatch(Msg::StopClicked),
        "shot" | "screenshot" => Command::Dispatch(Msg::ScreenshotClicked),
        "recognize" | "rec" => Command::Dispatch(Msg::RecognizeClicked),
        "clear" => Command::Dispatch(Msg::ClearHistoryClicked),
        "history" | "show" => Command::Dispatch(Msg::HistorySelected {
            id: resolve_record(target, history, "history")?,
        }),
        "delete" | "del" => Command::Dispatch(Msg::DeleteHistoryClicked {
            id: resolve_record(target, history, "delete")?,
        }),
        "close" => Command::Dispatch(Msg::DialogClosed),
        "refresh" => Command::Dispatch(Msg::StatusRefreshRequested),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return Err(CommandError::Unknown(head.to_string())),
    };
    Ok(Some(command))
}

/// A plain number picks the 1-based row of the rendered list; anything
/// else is taken as a record id.
fn resolve_record(
    target: Option<&str>,
    history: &HistoryView,
    command: &'static str,
) -> Result<String, CommandError> {
    let target = target.ok_or(CommandError::MissingTarget(command))?;
    let Ok(row) = target.parse::<usize>() else {
        return Ok(target.to_string());
    };
    let rows = match history {
        HistoryView::Rows(rows) => rows.as_slice(),
        HistoryView::Empty => &[],
    };
    row.checked_sub(1)
        .and_then(|index| rows.get(index))
        .map(|row| row.id.clone())
        .ok_or(CommandError::NoSuchRow(row))
}

/// Only an explicit yes confirms.
pub(crate) fn is_affirmative(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )
}
