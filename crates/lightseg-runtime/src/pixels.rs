#![forbid(unsafe_code)]

//! Pixel frames for the physical strip.
//!
//! The [`PixelController`] turns the latest [`UpdateRequest`] into an RGB
//! frame (three bytes per light) and animates the cursor:
//!
//! - lights below `min_point` are dark,
//! - lit positions use [`Palette::on`], everything else [`Palette::off`],
//! - the cursor blinks in [`Palette::blink`],
//! - in [`ActionMode::Find`] a pair of chase lights sweeps in toward the
//!   cursor so it can be spotted on a long strip.
//!
//! [`PixelDriver`] runs a controller on a background thread, applying
//! requests as they arrive and pushing a frame to a [`FrameSink`] every
//! period. How frames reach the hardware is up to the sink.

use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use lightseg_core::interval::{Interval, Point};

use crate::mode::ActionMode;
use crate::payload::UpdateRequest;
use crate::session::SessionConfig;

/// Default animation and output period.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(100);

/// Longest strip a [`PixelController`] will allocate frames for.
pub const MAX_LIGHTS: usize = 1 << 20;

/// Controller construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelError {
    /// `max_point + 1` lights exceed [`MAX_LIGHTS`].
    TooLarge {
        /// Configured upper bound.
        max_point: Point,
    },
}

impl fmt::Display for PixelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelError::TooLarge { max_point } => write!(
                f,
                "strip too long: max {max_point} needs more than {MAX_LIGHTS} lights"
            ),
        }
    }
}

impl std::error::Error for PixelError {}

/// Number of lights needed for positions `0..=max_point`.
fn strip_len(max_point: Point) -> Result<usize, PixelError> {
    let too_large = PixelError::TooLarge { max_point };
    let Some(count) = max_point.checked_add(1) else {
        return Err(too_large);
    };
    if count <= 0 {
        return Ok(0);
    }
    match usize::try_from(count) {
        Ok(len) if len <= MAX_LIGHTS => Ok(len),
        _ => Err(too_large),
    }
}

/// Colours as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub on: u32,
    pub off: u32,
    pub blink: u32,
    pub chase: u32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            on: 0x00ff00,
            off: 0xff0000,
            blink: 0x0000ff,
            chase: 0x00ff00,
        }
    }
}

/// Set `states[i]` for every member `i` of `ranges`; clears everything else.
///
/// Members outside `0..states.len()` are ignored.
pub fn fill_states(ranges: &[Interval], states: &mut [bool]) {
    states.fill(false);
    let Some(last) = states.len().checked_sub(1) else {
        return;
    };
    for r in ranges {
        if r.to < 0 || r.from > r.to {
            continue;
        }
        let from = usize::try_from(r.from.max(0)).unwrap_or(usize::MAX);
        let to = usize::try_from(r.to).unwrap_or(usize::MAX).min(last);
        if from <= to {
            states[from..=to].fill(true);
        }
    }
}

fn put(frame: &mut [u8], index: Point, color: u32) {
    let Some(start) = usize::try_from(index).ok().and_then(|i| i.checked_mul(3)) else {
        return;
    };
    if let Some(px) = frame.get_mut(start..start.saturating_add(3)) {
        px.copy_from_slice(&color.to_be_bytes()[1..]);
    }
}

/// Render one frame.
///
/// `frame` holds three bytes per entry of `states`; writes that fall outside
/// it are dropped.
pub fn render_frame(
    frame: &mut [u8],
    min_point: Point,
    states: &[bool],
    cursor: Point,
    blink_on: bool,
    chase_offset: Point,
    palette: &Palette,
) {
    for (i, &on) in states.iter().enumerate() {
        let index = i as Point;
        let color = if index < min_point {
            0
        } else if on {
            palette.on
        } else {
            palette.off
        };
        put(frame, index, color);
    }
    if blink_on {
        put(frame, cursor, palette.blink);
    }
    if chase_offset != 0 {
        put(frame, cursor.saturating_sub(chase_offset), palette.chase);
        put(frame, cursor.saturating_add(chase_offset), palette.chase);
    }
}

/// Chase lights converging on the cursor in find mode.
#[derive(Debug, Clone)]
pub struct Chaser {
    size: Point,
    offset: Point,
    mode: Option<ActionMode>,
}

impl Chaser {
    #[must_use]
    pub fn new(size: Point) -> Self {
        Self {
            size: size.max(0),
            offset: 0,
            mode: None,
        }
    }

    /// Advance one animation step.
    pub fn inc(&mut self) {
        self.offset -= 1;
        if self.offset < 0 {
            self.offset = self.size * 2;
        }
    }

    pub fn set_mode(&mut self, mode: Option<ActionMode>) {
        self.mode = mode;
    }

    /// Distance of the chase lights from the cursor; zero hides them.
    #[must_use]
    pub fn cur_offset(&self) -> Point {
        if self.mode == Some(ActionMode::Find) {
            self.offset / 2
        } else {
            0
        }
    }
}

impl Default for Chaser {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Four-phase blink: lit for two steps, dark for two.
#[derive(Debug, Clone, Default)]
pub struct Blinker {
    state: u8,
}

impl Blinker {
    pub fn inc(&mut self) {
        self.state = (self.state + 1) % 4;
    }

    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.state < 2
    }
}

/// Frame state for the whole strip.
#[derive(Debug, Clone)]
pub struct PixelController {
    min_point: Point,
    cursor: Point,
    states: Vec<bool>,
    frame: Vec<u8>,
    chaser: Chaser,
    blinker: Blinker,
    palette: Palette,
}

impl PixelController {
    /// Create a controller for positions `0..=config.max_point`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::TooLarge`] if the strip would exceed
    /// [`MAX_LIGHTS`].
    pub fn new(config: SessionConfig, palette: Palette) -> Result<Self, PixelError> {
        let len = strip_len(config.max_point)?;
        let mut controller = Self {
            min_point: config.min_point,
            cursor: config.min_point,
            states: vec![false; len],
            frame: vec![0; len * 3],
            chaser: Chaser::default(),
            blinker: Blinker::default(),
            palette,
        };
        controller.render();
        Ok(controller)
    }

    /// Take cursor, mode, and lit ranges from a request.
    pub fn apply(&mut self, request: &UpdateRequest) {
        self.cursor = request.cursor();
        self.chaser.set_mode(request.mode());
        fill_states(&request.on_ranges, &mut self.states);
        self.render();
    }

    /// Advance the animation one step.
    pub fn tick(&mut self) {
        self.chaser.inc();
        self.blinker.inc();
        self.render();
    }

    fn render(&mut self) {
        render_frame(
            &mut self.frame,
            self.min_point,
            &self.states,
            self.cursor,
            self.blinker.is_lit(),
            self.chaser.cur_offset(),
            &self.palette,
        );
    }

    /// Current RGB frame.
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    #[must_use]
    pub fn states(&self) -> &[bool] {
        &self.states
    }

    /// Colour of light `index` in the current frame.
    #[must_use]
    pub fn color_at(&self, index: usize) -> Option<u32> {
        let start = index.checked_mul(3)?;
        let px = self.frame.get(start..start.saturating_add(3))?;
        Some(u32::from_be_bytes([0, px[0], px[1], px[2]]))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Frame Output
// ─────────────────────────────────────────────────────────────────────────────

/// Receiver of rendered frames.
pub trait FrameSink: Send {
    /// Push one frame to the output.
    fn present(&mut self, frame: &[u8]);
}

#[derive(Debug, Default)]
struct MemorySinkInner {
    last: Vec<u8>,
    frames: u64,
}

/// Sink that keeps the latest frame; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemorySinkInner>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented frame.
    #[must_use]
    pub fn last_frame(&self) -> Vec<u8> {
        self.inner
            .lock()
            .map(|g| g.last.clone())
            .unwrap_or_default()
    }

    /// Number of frames presented.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.inner.lock().map(|g| g.frames).unwrap_or(0)
    }
}

impl FrameSink for MemorySink {
    fn present(&mut self, frame: &[u8]) {
        if let Ok(mut g) = self.inner.lock() {
            g.last.clear();
            g.last.extend_from_slice(frame);
            g.frames += 1;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Background Driver
// ─────────────────────────────────────────────────────────────────────────────

enum DriverCommand {
    Update(Box<UpdateRequest>),
    Shutdown,
}

/// Handle to a controller running on its own thread.
///
/// Dropping the handle signals the thread to stop without joining it; call
/// [`stop`](Self::stop) to wait for it.
pub struct PixelDriver {
    sender: mpsc::Sender<DriverCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl PixelDriver {
    /// Start driving `controller`, presenting to `sink` every `period`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver thread cannot be spawned.
    pub fn spawn(
        mut controller: PixelController,
        mut sink: Box<dyn FrameSink>,
        period: Duration,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<DriverCommand>();
        let thread = thread::Builder::new()
            .name("lightseg-pixels".into())
            .spawn(move || {
                tracing::info!(lights = controller.states().len(), "pixel controller starting");
                let mut next_tick = Instant::now() + period;
                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match receiver.recv_timeout(wait) {
                        Ok(DriverCommand::Update(request)) => controller.apply(&request),
                        Ok(DriverCommand::Shutdown)
                        | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            controller.tick();
                            sink.present(controller.frame());
                            next_tick += period;
                        }
                    }
                }
                tracing::info!("pixel controller exiting");
            })?;
        Ok(Self {
            sender,
            thread: Some(thread),
        })
    }

    /// Queue a request for the controller.
    ///
    /// Returns `false` if the driver thread has exited.
    pub fn send(&self, request: UpdateRequest) -> bool {
        self.sender
            .send(DriverCommand::Update(Box::new(request)))
            .is_ok()
    }

    /// Stop the driver and join its thread.
    pub fn stop(mut self) {
        let _ = self.sender.send(DriverCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PixelDriver {
    fn drop(&mut self) {
        let _ = self.sender.send(DriverCommand::Shutdown);
        // Don't join in drop to avoid blocking
    }
}
