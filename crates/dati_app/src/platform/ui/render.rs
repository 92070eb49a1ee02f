use dati_core::{
    AppViewModel, ControlsView, Dirty, HistoryView, ImageState, ResultView, ScreenshotView,
    EMPTY_HISTORY_TEXT, NO_SCREENSHOT_TEXT, UNPARSED_ANSWER_TEXT,
};

/// Status lines shown per refresh; older ones scroll away.
pub(crate) const MESSAGE_TAIL: usize = 8;

/// Lines for the surfaces flagged in `dirty`. A clock-only change renders
/// nothing; the clock rides along in the header of any other update.
pub(crate) fn render(view: &AppViewModel, dirty: &Dirty, styled: bool) -> Vec<String> {
    let surfaces = Dirty {
        clock: false,
        ..*dirty
    };
    if !surfaces.any() {
        return Vec::new();
    }

    let mut lines = vec![header(view)];

    if dirty.loading {
        lines.push(match &view.loading {
            Some(text) => format!("[busy] {text}"),
            None => "[ready]".to_string(),
        });
    }
    if dirty.service || dirty.screenshot || dirty.loading {
        lines.push(controls_line(&view.controls));
    }
    if dirty.screenshot {
        lines.push(screenshot_line(&view.screenshot));
    }
    if dirty.result {
        lines.extend(result_lines("Result", &view.result, styled));
    }
    if dirty.messages {
        lines.push("Status:".to_string());
        let skip = view.messages.len().saturating_sub(MESSAGE_TAIL);
        lines.extend(
            view.messages
                .iter()
                .skip(skip)
                .map(|message| format!("  [{}] {}", message.time, message.message)),
        );
    }
    if dirty.history {
        lines.extend(history_lines(&view.history));
    }
    if dirty.dialog {
        match &view.dialog {
            Some(dialog) => {
                lines.push(format!("=== {} ===", dialog.title));
                lines.push(format!("Image: {}", dialog.image_path));
                lines.extend(result_lines("Answer", &dialog.body, styled));
                lines.push(format!(
                    "(`delete {}` removes it, `close` dismisses)",
                    dialog.record_id
                ));
            }
            None => lines.push("(history detail closed)".to_string()),
        }
    }
    lines
}

fn header(view: &AppViewModel) -> String {
    let mut header = format!("-- {}", view.service.label);
    if let Some(server_time) = &view.service.server_time {
        header.push_str(&format!(" | server {server_time}"));
    }
    if let Some(clock) = &view.clock {
        header.push_str(&format!(" | {clock}"));
    }
    header.push_str(" --");
    header
}

fn controls_line(controls: &ControlsView) -> String {
    let enabled: Vec<&str> = [
        (controls.start, "start"),
        (controls.stop, "stop"),
        (controls.screenshot, "shot"),
        (controls.recognize, "recognize"),
        (controls.clear_history, "clear"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    if enabled.is_empty() {
        "Actions: (none)".to_string()
    } else {
        format!("Actions: {}", enabled.join(" "))
    }
}

fn screenshot_line(screenshot: &ScreenshotView) -> String {
    match screenshot {
        ScreenshotView::Placeholder => format!("Screenshot: {NO_SCREENSHOT_TEXT}"),
        ScreenshotView::Image { path, image } => match image {
            ImageState::Loading => format!("Screenshot: {path} (loading)"),
            ImageState::Loaded(info) => format!(
                "Screenshot: {path} ({} bytes, {})",
                info.byte_len,
                info.content_type.as_deref().unwrap_or("unknown type")
            ),
            ImageState::Failed(error) => format!("Screenshot: {path} (failed: {error})"),
        },
    }
}

fn result_lines(label: &str, result: &ResultView, styled: bool) -> Vec<String> {
    match result {
        ResultView::Empty => vec![format!("{label}: -")],
        ResultView::Error(error) => vec![format!("{label}: Error: {error}")],
        ResultView::Unparsed => vec![format!("{label}: {UNPARSED_ANSWER_TEXT}")],
        ResultView::Answer(answer) => {
            let mut lines = vec![format!("{label}:")];
            lines.extend(
                answer
                    .to_terminal(styled)
                    .split('\n')
                    .map(|line| format!("  {line}")),
            );
            lines
        }
    }
}

fn history_lines(history: &HistoryView) -> Vec<String> {
    let mut lines = vec!["History:".to_string()];
    match history {
        HistoryView::Empty => lines.push(format!("  {EMPTY_HISTORY_TEXT}")),
        HistoryView::Rows(rows) => lines.extend(
            rows.iter()
                .enumerate()
                .map(|(index, row)| format!("  {:>2}. {}  {}", index + 1, row.timestamp, row.preview)),
        ),
    }
    lines
}
