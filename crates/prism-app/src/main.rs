// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use prism_core::init_tracing;
use prism_platform::PlatformWindow;
use prism_render::{DirShaderStore, Renderer, ShaderStore};
use prism_render_vk::{embedded_shaders, VkRenderer};
use tracing::{error, info, warn};

use prism_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

mod config;

use config::{load_cfg, AppCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; missing means defaults
    #[arg(long, default_value = "prism.toml")]
    config: PathBuf,

    /// Load SPIR-V from this directory instead of the embedded shaders
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Exit cleanly after this many presented frames
    #[arg(long)]
    max_frames: Option<u64>,
}

struct App {
    cfg: AppCfg,
    shaders: Box<dyn ShaderStore>,
    max_frames: Option<u64>,

    // Field order matters: the renderer drops before the window it presents to.
    renderer: Option<VkRenderer>,
    window: Option<PlatformWindow>,

    fatal: Option<anyhow::Error>,
    frames: u64,
    fps_frames: u32,
    last_fps_instant: Instant,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = PlatformWindow::open(event_loop, &self.cfg.window_config())?;
        let renderer = VkRenderer::new(&window, &self.cfg.to_settings(), self.shaders.as_ref())
            .context("renderer init")?;
        window.request_redraw();
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn done(&self) -> bool {
        let closing = self.window.as_ref().is_some_and(|w| w.should_close());
        let budget_spent = self.max_frames.is_some_and(|max| self.frames >= max);
        closing || budget_spent
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.done() || self.fatal.is_some() {
            return;
        }
        let Some(renderer) = &mut self.renderer else {
            return;
        };

        match renderer.render() {
            Ok(()) => {
                self.frames += 1;
                self.fps_frames = self.fps_frames.saturating_add(1);
                if self.max_frames == Some(self.frames) {
                    info!("frame budget reached ({})", self.frames);
                }
            }
            Err(e) => {
                if e.needs_recreation() {
                    warn!("surface changed; the presentation chain is not rebuilt");
                }
                self.fail(event_loop, anyhow::Error::new(e).context("frame"));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.fatal.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = &mut self.window else {
            return;
        };
        if window_id != window.id() || window.handle_event(&event) {
            return;
        }

        if let WindowEvent::RedrawRequested = event {
            self.redraw(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.fatal.is_some() {
            return;
        }
        if self.done() {
            event_loop.exit();
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }

        let now = Instant::now();
        if now.duration_since(self.last_fps_instant).as_secs_f32() >= 1.0 {
            info!("fps ~ {}", self.fps_frames);
            self.fps_frames = 0;
            self.last_fps_instant = now;
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(r) = &self.renderer {
            if let Err(e) = r.wait_idle() {
                warn!("wait_idle on exit: {e}");
            }
        }
        self.renderer = None;
        self.window = None;
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = load_cfg(&args.config);

    let shaders: Box<dyn ShaderStore> =
        match args.shader_dir.or_else(|| cfg.render.shader_dir.clone()) {
            Some(dir) => {
                info!("shaders from {}", dir.display());
                Box::new(DirShaderStore::new(dir))
            }
            None => Box::new(embedded_shaders()),
        };

    let event_loop: EventLoop<()> = EventLoop::new().context("event loop")?;

    let mut app = App {
        cfg,
        shaders,
        max_frames: args.max_frames,
        renderer: None,
        window: None,
        fatal: None,
        frames: 0,
        fps_frames: 0,
        last_fps_instant: Instant::now(),
    };

    event_loop.run_app(&mut app).context("event loop")?;

    if let Some(e) = app.fatal.take() {
        return Err(e);
    }
    info!("clean exit after {} frames", app.frames);
    Ok(())
}
