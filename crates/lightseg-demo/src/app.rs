#![forbid(unsafe_code)]

//! Interactive terminal driver.
//!
//! Reads keys in raw mode, applies them to a [`Session`], and sends the
//! resulting requests through a [`Dispatcher`] to the pixel driver and the
//! saver. The status line is redrawn in place after every key.
//!
//! `g` opens a position prompt: type a light number (a leading `-` is
//! allowed), then Enter to jump there or Esc to cancel.

use std::io::{self, Write};
use std::sync::OnceLock;

use lightseg::{
    Action, Dispatcher, FileSaver, FrameSink, KeyCode, KeyEvent, KeyEventKind, LocalSink,
    LogSaver, PixelController, PixelDriver, Point, RequestThrottle, Saver, Session, read_seed,
};
use lightseg::runtime::DEFAULT_PERIOD;

use crate::cli::Opts;

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Frame sink that only traces frame statistics.
#[derive(Debug, Default)]
pub struct TraceSink {
    frames: u64,
}

impl FrameSink for TraceSink {
    fn present(&mut self, frame: &[u8]) {
        self.frames += 1;
        tracing::trace!(frame = self.frames, bytes = frame.len(), "frame");
    }
}

/// Digits typed after `g`, before Enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct JumpPrompt {
    text: String,
}

enum PromptStep {
    Pending,
    Cancel,
    Jump(Option<Point>),
}

impl JumpPrompt {
    fn key(&mut self, code: KeyCode) -> PromptStep {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() => self.text.push(c),
            KeyCode::Char('-') if self.text.is_empty() => self.text.push('-'),
            KeyCode::Backspace => {
                self.text.pop();
            }
            KeyCode::Enter => return PromptStep::Jump(self.text.parse().ok()),
            KeyCode::Escape => return PromptStep::Cancel,
            _ => {}
        }
        PromptStep::Pending
    }
}

/// Session plus request routing.
pub struct App {
    session: Session,
    dispatcher: Dispatcher,
    prompt: Option<JumpPrompt>,
}

impl App {
    /// Build the app from parsed options: load the seed, open the saver, and
    /// start the pixel driver on `sink`.
    pub fn new(opts: &Opts, sink: Box<dyn FrameSink>) -> lightseg::Result<Self> {
        let config = opts
            .session_config()
            .map_err(|e| lightseg::Error::Config(e.to_string()))?;

        let seed = match &opts.seed_path {
            Some(path) => Some(read_seed(path)?),
            None => None,
        };
        let session = Session::new(config, seed)?;

        let saver: Box<dyn Saver> = match &opts.save_path {
            Some(path) => Box::new(FileSaver::create(path)?),
            None => Box::new(LogSaver),
        };
        tracing::info!(saver = saver.name(), "saver ready");

        let mut controller = PixelController::new(config, opts.palette)?;
        controller.apply(&session.update_request());
        let driver = PixelDriver::spawn(controller, sink, DEFAULT_PERIOD)?;

        let local = LocalSink::new(Some(driver), saver);
        let dispatcher = Dispatcher::new(RequestThrottle::default(), Box::new(local));
        Ok(Self {
            session,
            dispatcher,
            prompt: None,
        })
    }

    /// Apply one key. Delivery failures are logged, not fatal.
    pub fn handle_key(&mut self, key: &KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        if let Some(prompt) = self.prompt.as_mut() {
            match prompt.key(key.code) {
                PromptStep::Pending => {}
                PromptStep::Cancel => self.prompt = None,
                PromptStep::Jump(target) => {
                    self.prompt = None;
                    match target {
                        Some(point) => self.apply(Action::JumpTo(point)),
                        None => tracing::debug!("empty or invalid jump target"),
                    }
                }
            }
            return Flow::Continue;
        }
        if key.code == KeyCode::Char('g') && key.modifiers.is_empty() {
            self.prompt = Some(JumpPrompt::default());
            return Flow::Continue;
        }

        let Some(action) = Action::from_key(key) else {
            return Flow::Continue;
        };
        if action == Action::Quit {
            return Flow::Quit;
        }
        self.apply(action);
        Flow::Continue
    }

    fn apply(&mut self, action: Action) {
        if let Some(out) = self.session.apply(action)
            && let Err(e) = self.dispatcher.dispatch(out)
        {
            tracing::error!(error = %e, "request failed");
        }
    }

    /// Session status, or the jump prompt while one is open.
    #[must_use]
    pub fn status_line(&self) -> String {
        match &self.prompt {
            Some(prompt) => format!("go to: {}", prompt.text),
            None => self.session.status_line(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the key loop until quit.
    pub fn run(&mut self) -> lightseg::Result<()> {
        let _terminal = RawTerminal::enter()?;
        let mut stdout = io::stdout();
        draw_status(&mut stdout, &self.status_line())?;

        loop {
            let event = crossterm::event::read()?;
            let Some(key) = KeyEvent::from_crossterm(event) else {
                continue;
            };
            if self.handle_key(&key) == Flow::Quit {
                break;
            }
            draw_status(&mut stdout, &self.status_line())?;
        }

        writeln!(stdout, "\r")?;
        stdout.flush()?;
        Ok(())
    }
}

fn draw_status(out: &mut impl Write, status: &str) -> io::Result<()> {
    crossterm::execute!(
        out,
        crossterm::cursor::MoveToColumn(0),
        crossterm::terminal::Clear(crossterm::terminal::ClearType::CurrentLine),
        crossterm::style::Print(status)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Raw mode for the lifetime of the guard. Also restored on panic.
struct RawTerminal;

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        install_panic_hook();
        crossterm::terminal::enable_raw_mode()?;
        tracing::debug!("terminal raw mode enabled");
        let _ = crossterm::execute!(io::stdout(), crossterm::cursor::Hide);
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        best_effort_cleanup();
        tracing::debug!("terminal raw mode disabled");
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    // Exit raw mode last
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}
