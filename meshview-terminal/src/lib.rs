/// Terminal front end for the mesh viewer
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use meshview_core::{Camera, GraphicsContext, GraphicsError, Notice, Uniform, ViewerState};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub mod config;
pub mod device;
pub mod framebuffer;
pub mod input;
pub mod logging;

pub use config::ViewerConfig;
pub use device::SoftwareDevice;
pub use input::{HoldDetection, InputTracker};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// Character cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;

/// The interactive viewer: input, update and render on one thread.
pub struct TerminalApp {
    state: ViewerState,
    device: SoftwareDevice,
    camera: Camera,
    input: InputTracker,
    config: ViewerConfig,
    notice: Option<String>,
    help_until: Option<Instant>,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(state: ViewerState, mut device: SoftwareDevice, config: ViewerConfig) -> Self {
        let (width, height) = {
            let fb = device.framebuffer();
            (fb.width() as u32, fb.height() as u32)
        };

        device.set_uniform(Uniform::LightPosition(config.light.position()));
        device.set_uniform(Uniform::LightColor(config.light.color()));

        Self {
            state,
            device,
            camera: config.camera.camera(width, height * CELL_ASPECT),
            input: InputTracker::new(HoldDetection::Window(config.input.hold_window())),
            config,
            notice: None,
            help_until: None,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    /// Run until quit, then restore the terminal and release every object.
    pub fn run(mut self) -> Result<(), AppError> {
        terminal::enable_raw_mode()?;

        let enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if enhanced {
            self.input = InputTracker::new(HoldDetection::ReleaseEvents);
        }
        debug!("Hold detection: {:?}", self.input.detection());

        let result = in_alternate_screen(&mut stdout(), enhanced, || self.main_loop());
        let raw_restored = terminal::disable_raw_mode();

        let Self {
            state, mut device, ..
        } = self;
        let count = state.objects().len();
        state.destroy(&mut device);
        info!("Released {} objects", count);

        result.and(raw_restored.map_err(AppError::from))
    }

    fn main_loop(&mut self) -> Result<(), AppError> {
        let frame_time = self.config.render.frame_time();
        let mut previous = Instant::now();
        self.show(Notice::Help, previous);

        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                self.handle_event(event::read()?, frame_start);
            }

            let dt = frame_start.duration_since(previous).as_secs_f32();
            previous = frame_start;

            let commands = self.input.take_commands();
            let held = self.input.held(frame_start);
            for notice in self.state.update(&commands, &held, dt) {
                self.show(notice, frame_start);
            }
            if self.state.quit_requested() {
                return Ok(());
            }

            self.render(frame_start)?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < frame_time {
                std::thread::sleep(frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => self.input.handle_key(key, now),
            Event::Resize(width, height) => self.resize(width, height),
            Event::FocusLost => self.input.release_all(),
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        debug!("Terminal resized to {}x{}", width, height);
        self.device.resize(width as usize, height as usize);
        self.camera
            .resize(width.max(1) as u32, height.max(1) as u32 * CELL_ASPECT);
    }

    fn show(&mut self, notice: Notice, now: Instant) {
        match notice {
            Notice::Help => self.help_until = Some(now + self.config.render.help_duration()),
            Notice::Quit => {}
            other => self.notice = Some(other.to_string()),
        }
    }

    fn status_line(&self) -> String {
        let selected = match self.state.selected() {
            Some(object) => format!(
                "{}/{} {}",
                self.state.selected_index() + 1,
                self.state.objects().len(),
                object.name()
            ),
            None => "no objects".to_string(),
        };
        format!(
            "meshview | FPS: {:.1} | {} | Mode: {} | Wireframe: {} | H=Help Esc=Quit",
            self.fps,
            selected,
            self.state.mode(),
            if self.state.wireframe() { "ON" } else { "OFF" }
        )
    }

    fn render(&mut self, now: Instant) -> Result<(), AppError> {
        self.device.clear();
        self.state.draw(&mut self.device, &self.camera)?;

        let mut out = stdout();
        queue!(out, cursor::MoveTo(0, 0))?;
        self.device
            .framebuffer()
            .draw(&mut out, self.config.render.color)?;

        // Overlays
        let width = self.device.framebuffer().width();
        let height = self.device.framebuffer().height() as u16;
        queue!(
            out,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(clip(&self.status_line(), width)),
            ResetColor
        )?;

        if let Some(notice) = &self.notice {
            queue!(
                out,
                cursor::MoveTo(0, height.saturating_sub(1)),
                SetForegroundColor(Color::Green),
                Print(clip(notice, width)),
                ResetColor
            )?;
        }

        if self.help_until.is_some_and(|until| now < until) {
            let help = Notice::Help.to_string();
            for (row, line) in help.lines().enumerate() {
                let row = row as u16 + 2;
                if row + 1 >= height {
                    break;
                }
                queue!(
                    out,
                    cursor::MoveTo(2, row),
                    SetForegroundColor(Color::White),
                    Print(clip(line, width.saturating_sub(2))),
                    ResetColor
                )?;
            }
        }

        out.flush()?;
        Ok(())
    }
}

/// Run `body` inside the alternate screen. The screen is left again
/// even when entering it failed part way.
fn in_alternate_screen<W, F>(out: &mut W, enhanced: bool, body: F) -> Result<(), AppError>
where
    W: Write,
    F: FnOnce() -> Result<(), AppError>,
{
    let result = match enter_screen(out, enhanced) {
        Ok(()) => body(),
        Err(err) => Err(err.into()),
    };
    let left = leave_screen(out, enhanced);
    result.and(left.map_err(AppError::from))
}

fn enter_screen<W: Write>(out: &mut W, enhanced: bool) -> io::Result<()> {
    execute!(out, terminal::EnterAlternateScreen, cursor::Hide, EnableFocusChange)?;
    if enhanced {
        execute!(
            out,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    Ok(())
}

fn leave_screen<W: Write>(out: &mut W, enhanced: bool) -> io::Result<()> {
    if enhanced {
        execute!(out, PopKeyboardEnhancementFlags)?;
    }
    execute!(
        out,
        DisableFocusChange,
        terminal::LeaveAlternateScreen,
        cursor::Show
    )
}

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
