use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use dati_core::{update, AppState, Dirty, Effect, Msg};
use dati_engine::ReqwestBackend;
use dati_logging::{dati_info, dati_warn};

use super::config;
use super::effects::{EffectRunner, EffectSink};
use super::ui::commands::{is_affirmative, parse_command, Command, HELP};
use super::ui::render::render;

const CONFIRM_CLEAR_PROMPT: &str = "Clear all history? [y/N] ";

/// Everything the main loop reacts to, in arrival order.
#[derive(Debug)]
pub(crate) enum AppEvent {
    Line(String),
    Msg(Msg),
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub fn run_app() -> anyhow::Result<()> {
    let (config, config_error) = config::load();
    dati_logging::initialize(config.log.into(), config.level_filter());
    if let Some(err) = &config_error {
        dati_warn!("{}; using defaults", err);
        eprintln!("warning: {err}; using defaults");
    }
    dati_info!("dati starting against {}", config.base_url);

    let backend = ReqwestBackend::new(config.client_settings())
        .with_context(|| format!("cannot use backend url {:?}", config.base_url))?;

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let runner = EffectRunner::new(Arc::new(backend), event_tx.clone());
    spawn_input_thread(event_tx);

    let mut app = App::new(
        AppState::with_settings(config.core_settings()),
        runner,
        io::stdout(),
        config.styled,
    );
    app.start()?;

    while let Ok(event) = event_rx.recv() {
        let flow = match event {
            AppEvent::Msg(msg) => {
                app.dispatch(msg)?;
                Flow::Continue
            }
            AppEvent::Line(line) => app.handle_line(&line)?,
            AppEvent::InputClosed => Flow::Quit,
        };
        if flow == Flow::Quit {
            break;
        }
    }

    app.dispatch(Msg::RefreshStopRequested)?;
    dati_info!("dati exiting");
    Ok(())
}

fn spawn_input_thread(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if event_tx.send(AppEvent::Line(line)).is_err() {
                return;
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

struct App<S, W> {
    state: AppState,
    effects: S,
    out: W,
    styled: bool,
    /// The next input line answers the clear-history prompt.
    confirming_clear: bool,
}

impl<S: EffectSink, W: Write> App<S, W> {
    fn new(state: AppState, effects: S, out: W, styled: bool) -> Self {
        Self {
            state,
            effects,
            out,
            styled,
            confirming_clear: false,
        }
    }

    fn start(&mut self) -> io::Result<()> {
        let prompt = self.apply(Msg::Init);
        self.state.take_dirty();
        self.render(&Dirty::all())?;
        writeln!(self.out, "Type `help` for commands.")?;
        self.finish(prompt)
    }

    fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        let prompt = self.apply(msg);
        let dirty = self.state.take_dirty();
        self.render(&dirty)?;
        self.finish(prompt)
    }

    fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        if std::mem::take(&mut self.confirming_clear) {
            self.dispatch(Msg::ClearHistoryConfirmed(is_affirmative(line)))?;
            return Ok(Flow::Continue);
        }
        match parse_command(line, &self.state.view().history) {
            Ok(None) => {}
            Ok(Some(Command::Dispatch(msg))) => self.dispatch(msg)?,
            Ok(Some(Command::Help)) => writeln!(self.out, "{HELP}")?,
            Ok(Some(Command::Quit)) => return Ok(Flow::Quit),
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(Flow::Continue)
    }

    /// Runs the update and hands effects to the sink. Returns whether the
    /// clear-history confirmation was requested.
    fn apply(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        let mut prompt = false;
        for effect in effects {
            match effect {
                Effect::ConfirmClearHistory => prompt = true,
                other => self.effects.run(other),
            }
        }
        prompt
    }

    fn render(&mut self, dirty: &Dirty) -> io::Result<()> {
        let view = self.state.view();
        for line in render(&view, dirty, self.styled) {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn finish(&mut self, prompt: bool) -> io::Result<()> {
        if prompt {
            self.confirming_clear = true;
            write!(self.out, "{CONFIRM_CLEAR_PROMPT}")?;
        }
        self.out.flush()
    }
}
