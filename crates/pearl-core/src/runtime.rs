use crate::command::{Command, Effect};
use crate::model::Model;
use crate::subscription::SubscriptionManager;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::{cursor, execute};
use futures::future::BoxFuture;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Most messages applied back to back before the loop yields for a frame.
const MAX_BURST: usize = 64;

/// Where the UI is drawn.
///
/// Use [`Stderr`](OutputTarget::Stderr) when stdout is piped, so the form
/// still reaches the terminal while the chosen values flow through the pipe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Stderr,
}

impl OutputTarget {
    fn writer(self) -> Box<dyn Write + Send> {
        match self {
            OutputTarget::Stdout => Box::new(io::stdout()),
            OutputTarget::Stderr => Box::new(io::stderr()),
        }
    }
}

/// Errors from setting up, drawing to, or tearing down the terminal.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration for a [`Program`]. Every field has a usable default.
///
/// ```rust,ignore
/// let opts = ProgramOptions {
///     title: Some("Booking".into()),
///     log_file: Some("pearl.log".into()),
///     ..ProgramOptions::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Redraw rate cap (default 60, clamped to 1..=120).
    pub fps: u32,
    /// Draw in the alternate screen (default true).
    pub alt_screen: bool,
    /// Capture mouse events (default false).
    pub mouse_capture: bool,
    /// Bracketed paste (default true). Pasted text reaches inputs as one
    /// [`TerminalEvent::Paste`](crate::TerminalEvent::Paste).
    pub bracketed_paste: bool,
    pub title: Option<String>,
    /// Restore the terminal if a panic unwinds (default true).
    pub catch_panics: bool,
    /// Quit on a SIGINT that bypasses raw mode (default true).
    pub handle_signals: bool,
    /// Append `tracing` output to this file. Stdout belongs to the UI, so
    /// nothing is logged unless this is set or the application installs its
    /// own subscriber.
    pub log_file: Option<PathBuf>,
    pub output: OutputTarget,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            mouse_capture: false,
            bracketed_paste: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            log_file: None,
            output: OutputTarget::Stdout,
        }
    }
}

/// Cloneable handle for feeding a running [`Program`] from other tasks,
/// for example a push notification that should update a controlled value.
#[derive(Clone)]
pub struct ProgramHandle<Msg: Send + 'static> {
    inbox: mpsc::UnboundedSender<Msg>,
    stop: Arc<AtomicBool>,
}

impl<Msg: Send + 'static> ProgramHandle<Msg> {
    /// Enqueue a message. Dropped if the program has already exited.
    pub fn send(&self, msg: Msg) {
        if self.inbox.send(msg).is_err() {
            tracing::debug!("program gone, message dropped");
        }
    }

    /// Stop the program before its next message.
    pub fn kill(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// The terminal in UI mode. Dropping it restores the terminal.
struct Screen {
    terminal: Terminal<CrosstermBackend<Box<dyn Write + Send>>>,
    alt_screen: bool,
    output: OutputTarget,
}

impl Screen {
    fn open(options: &ProgramOptions) -> Result<Self, ProgramError> {
        if options.catch_panics {
            install_panic_hook(options.alt_screen, options.output);
        }

        enable_raw_mode()?;
        let mut out = options.output.writer();
        if options.alt_screen {
            execute!(out, EnterAlternateScreen)?;
        }
        if options.bracketed_paste {
            execute!(out, EnableBracketedPaste)?;
        }
        if options.mouse_capture {
            execute!(out, EnableMouseCapture)?;
        }
        if let Some(title) = &options.title {
            execute!(out, SetTitle(title))?;
        }
        execute!(out, cursor::Hide)?;

        Ok(Screen {
            terminal: Terminal::new(CrosstermBackend::new(out))?,
            alt_screen: options.alt_screen,
            output: options.output,
        })
    }

    fn draw<M: Model>(&mut self, model: &M) -> Result<(), ProgramError> {
        self.terminal.draw(|frame| model.view(frame))?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Err(err) = restore_terminal(self.alt_screen, self.output) {
            tracing::warn!(%err, "terminal restore failed");
        }
    }
}

fn install_panic_hook(alt_screen: bool, output: OutputTarget) {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore_terminal(alt_screen, output);
            previous(info);
        }));
    });
}

/// Undo everything [`Screen::open`] may have enabled. Every step runs even
/// if an earlier one fails; the raw-mode result is reported.
fn restore_terminal(alt_screen: bool, output: OutputTarget) -> io::Result<()> {
    let raw = disable_raw_mode();
    let mut out = output.writer();
    let _ = execute!(out, DisableBracketedPaste, DisableMouseCapture, cursor::Show);
    if alt_screen {
        let _ = execute!(out, LeaveAlternateScreen);
    }
    raw
}

/// Drives a [`Model`] against a real terminal.
///
/// Key presses, timer wake-ups and fetch results all arrive on one channel
/// and are applied by [`Model::update`] one at a time, so a component never
/// sees two updates interleave. Async commands run as tokio tasks whose only
/// effect is sending their message back.
///
/// ```rust,ignore
/// #[tokio::main]
/// async fn main() -> Result<(), ProgramError> {
///     let form = Program::<BookingForm>::new(())?.run().await?;
///     println!("{}", form.summary());
///     Ok(())
/// }
/// ```
pub struct Program<M: Model> {
    model: M,
    screen: Screen,
    inbox_tx: mpsc::UnboundedSender<M::Message>,
    inbox: mpsc::UnboundedReceiver<M::Message>,
    subscriptions: SubscriptionManager<M::Message>,
    options: ProgramOptions,
    dirty: bool,
    quit_requested: bool,
    stop: Arc<AtomicBool>,
}

impl<M: Model> Program<M> {
    pub fn new(flags: M::Flags) -> Result<Self, ProgramError> {
        Self::with_options(flags, ProgramOptions::default())
    }

    /// Set up logging and the terminal, then run [`Model::init`].
    pub fn with_options(flags: M::Flags, options: ProgramOptions) -> Result<Self, ProgramError> {
        if let Some(path) = &options.log_file {
            init_file_logging(path)?;
        }

        let screen = Screen::open(&options)?;
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (model, init) = M::init(flags);

        let mut program = Program {
            model,
            screen,
            subscriptions: SubscriptionManager::new(inbox_tx.clone()),
            inbox_tx,
            inbox,
            options,
            dirty: true,
            quit_requested: false,
            stop: Arc::new(AtomicBool::new(false)),
        };
        tracing::debug!(fps = program.options.fps, "program started");
        program.dispatch(init);
        program.refresh_subscriptions();
        Ok(program)
    }

    pub fn handle(&self) -> ProgramHandle<M::Message> {
        ProgramHandle {
            inbox: self.inbox_tx.clone(),
            stop: self.stop.clone(),
        }
    }

    /// Run until the model quits, then restore the terminal and hand back
    /// the final model.
    pub async fn run(mut self) -> Result<M, ProgramError> {
        let outcome = self.event_loop().await;
        tracing::debug!("program stopping");
        self.subscriptions.shutdown();
        let Program { model, screen, .. } = self;
        drop(screen);
        outcome.map(|()| model)
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        let fps = self.options.fps.clamp(1, 120);
        let mut frames = tokio::time::interval(Duration::from_secs(1) / fps);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let handle_signals = self.options.handle_signals;

        while !self.stop.load(Ordering::SeqCst) {
            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    tracing::debug!("interrupted");
                    break;
                }

                Some(msg) = self.inbox.recv() => {
                    self.apply(msg);
                    // A paste or key repeat arrives as a burst; draw once for it.
                    for _ in 0..MAX_BURST {
                        match self.inbox.try_recv() {
                            Ok(msg) => self.apply(msg),
                            Err(_) => break,
                        }
                    }
                    if self.quit_requested {
                        break;
                    }
                }

                _ = frames.tick() => {
                    if std::mem::take(&mut self.dirty) {
                        self.screen.draw(&self.model)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, msg: M::Message) {
        let cmd = self.model.update(msg);
        self.dispatch(cmd);
        self.refresh_subscriptions();
        self.dirty = true;
    }

    fn refresh_subscriptions(&mut self) {
        let wanted = self.model.subscriptions();
        self.subscriptions.reconcile(wanted);
    }

    fn dispatch(&mut self, cmd: Command<M::Message>) {
        match cmd.effect {
            Effect::Nothing => {}
            Effect::Emit(msg) => self.post(msg),
            Effect::Quit => self.quit_requested = true,
            Effect::Await(fut) => {
                let tx = self.inbox_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(fut.await);
                });
            }
            Effect::Batch(cmds) => cmds.into_iter().for_each(|cmd| self.dispatch(cmd)),
            Effect::Sequence(cmds) => {
                let tx = self.inbox_tx.clone();
                let stop = self.stop.clone();
                tokio::spawn(async move {
                    for cmd in cmds {
                        run_in_order(cmd, &tx, &stop).await;
                    }
                });
            }
        }
    }

    fn post(&self, msg: M::Message) {
        if self.inbox_tx.send(msg).is_err() {
            tracing::debug!("inbox closed, message dropped");
        }
    }
}

/// Run one step of a [`Command::sequence`] to completion.
fn run_in_order<'a, Msg: Send + 'static>(
    cmd: Command<Msg>,
    tx: &'a mpsc::UnboundedSender<Msg>,
    stop: &'a AtomicBool,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        match cmd.effect {
            Effect::Nothing => {}
            Effect::Emit(msg) => {
                let _ = tx.send(msg);
            }
            Effect::Quit => stop.store(true, Ordering::SeqCst),
            Effect::Await(fut) => {
                let _ = tx.send(fut.await);
            }
            Effect::Batch(cmds) => {
                futures::future::join_all(cmds.into_iter().map(|c| run_in_order(c, tx, stop)))
                    .await;
            }
            Effect::Sequence(cmds) => {
                for cmd in cmds {
                    run_in_order(cmd, tx, stop).await;
                }
            }
        }
    })
}

/// Install a global `tracing` subscriber that appends to `path`.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Does nothing if
/// a global subscriber is already installed.
pub fn init_file_logging(path: impl AsRef<Path>) -> Result<(), ProgramError> {
    let path = path.as_ref();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| ProgramError::LogFile {
            path: path.to_path_buf(),
            source,
        })?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
