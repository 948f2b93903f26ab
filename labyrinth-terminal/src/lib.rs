/// Terminal viewer for labyrinth meshes
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use labyrinth_core::{
    CameraPose, FlatVertexBuffer, LabyrinthResult, Model, ObjectPose, PointLight,
    TransformPipeline, ViewerConfig,
};
use nalgebra::Vector3;
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub mod clock;
pub mod renderer;

pub use clock::{FrameClock, Rates, Tick};
pub use renderer::{AsciiRenderer, MeshHandle, RenderError, UploadError};

/// Terminal cells are about twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

const TERMINAL_FPS_CAP: u32 = 30;

/// Longest the loop blocks waiting for input
const MAX_IDLE: Duration = Duration::from_millis(50);

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    config: ViewerConfig,
    pipeline: TransformPipeline,
    renderer: AsciiRenderer,
    model: Model<MeshHandle>,
    camera: CameraPose,
    camera_delta: Vector3<f32>,
    model_spin: f32,
    light: PointLight,
    clock: FrameClock,
    rates: Rates,
    running: bool,
}

impl TerminalApp {
    /// Upload `mesh` and place it in front of the camera
    pub fn new(mesh: &FlatVertexBuffer, config: ViewerConfig) -> LabyrinthResult<Self> {
        let (width, height) = terminal::size()?;
        let mut renderer =
            AsciiRenderer::new(width as usize, height as usize, config.convention);
        let model = Model::upload(&mut renderer, mesh)?.with_pose(ObjectPose::at(0.0, 0.0, -5.0));

        let max_fps = config.max_fps.unwrap_or(TERMINAL_FPS_CAP);
        info!(
            width,
            height,
            convention = ?config.convention,
            max_ups = config.max_ups,
            max_fps,
            "terminal viewer ready"
        );

        Ok(Self {
            pipeline: config.pipeline(),
            light: config.point_light(),
            clock: FrameClock::new(config.max_ups, Some(max_fps), Instant::now()),
            config,
            renderer,
            model,
            camera: CameraPose::default(),
            camera_delta: Vector3::zeros(),
            model_spin: 0.0,
            rates: Rates::default(),
            running: true,
        })
    }

    pub fn run(mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        self.model.destroy(&mut self.renderer);
        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        while self.running {
            let wait = self.clock.until_next().min(MAX_IDLE);
            if event::poll(wait)? {
                self.handle_input()?;
            }

            let now = Instant::now();
            let tick = self.clock.poll(now);
            if tick.update {
                self.update();
            }
            if tick.render {
                self.render()?;
            }
            if let Some(rates) = self.clock.rates(now) {
                debug!(fps = rates.fps, ups = rates.ups, "loop rates");
                self.rates = rates;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                let step = self.config.model_rotation_step;
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        self.running = false;
                    }
                    KeyCode::Char('w') => self.camera_delta.z = -1.0,
                    KeyCode::Char('s') => self.camera_delta.z = 1.0,
                    KeyCode::Char('a') => self.camera_delta.x = -1.0,
                    KeyCode::Char('d') => self.camera_delta.x = 1.0,
                    KeyCode::Char(' ') => self.camera_delta.y = 1.0,
                    KeyCode::Char('c') => self.camera_delta.y = -1.0,
                    KeyCode::Left => self.model_spin = -step,
                    KeyCode::Right => self.model_spin = step,
                    KeyCode::Up => self.camera.rotate(-step, 0.0, 0.0),
                    KeyCode::Down => self.camera.rotate(step, 0.0, 0.0),
                    _ => {}
                }
            }
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.renderer.resize(width as usize, height as usize);
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply input gathered since the last update
    fn update(&mut self) {
        let offset = self.camera_delta * self.config.camera_speed;
        self.camera.advance(offset.x, offset.y, offset.z);
        self.camera_delta = Vector3::zeros();

        self.model.pose.rotate(0.0, self.model_spin, 0.0);
        self.model_spin = 0.0;
    }

    fn render(&mut self) -> io::Result<()> {
        self.renderer.clear();

        let (width, height) = self.renderer.size();
        let viewport = self
            .config
            .viewport(width as f32, height as f32 * CELL_ASPECT);
        match self.pipeline.frame(&viewport, &self.camera) {
            Ok(frame) => {
                frame.apply(&mut self.renderer);

                // the ascii stage lights in eye space
                let eye_light = PointLight::new(
                    frame.view.transform_point(&self.light.position.into()).coords,
                    self.light.colour,
                );
                eye_light.apply(&mut self.renderer);

                self.pipeline
                    .object(&frame, &self.model.pose)
                    .apply(&mut self.renderer);
                self.model.material.apply(&mut self.renderer);

                if let Err(e) = self.renderer.draw_mesh(self.model.handle()) {
                    warn!(error = %e, "model not drawn");
                }
            }
            Err(e) => warn!(error = %e, "skipping frame"),
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "{} | FPS: {} UPS: {} | WASD/Space/C=Move Arrows=Turn Q=Quit",
                self.config.title, self.rates.fps, self.rates.ups
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
