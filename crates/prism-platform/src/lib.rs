// SPDX-License-Identifier: CEPL-1.0
//! winit window that doubles as the renderer's presentation target.
use anyhow::{Context, Result};
use prism_render::{RenderSize, SurfaceTarget};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use tracing::info;
use winit::{
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowId},
};

pub use winit;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "prism".to_owned(),
            width: 800,
            height: 600,
        }
    }
}

pub struct PlatformWindow {
    window: Window,
    close_requested: bool,
}

impl PlatformWindow {
    /// Fixed-size window; the presentation chain is never rebuilt.
    pub fn open(event_loop: &ActiveEventLoop, cfg: &WindowConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(PhysicalSize::new(cfg.width.max(1), cfg.height.max(1)))
            .with_resizable(false);
        let window = event_loop.create_window(attrs).context("create_window")?;
        let size = window.inner_size();
        info!("window open ({}x{})", size.width, size.height);
        Ok(Self {
            window,
            close_requested: false,
        })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    /// Latches close requests. Returns true when the event was consumed.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                if !self.close_requested {
                    info!("close requested");
                }
                self.close_requested = true;
                true
            }
            _ => false,
        }
    }

    pub fn should_close(&self) -> bool {
        self.close_requested
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl HasWindowHandle for PlatformWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for PlatformWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl SurfaceTarget for PlatformWindow {
    fn framebuffer_size(&self) -> RenderSize {
        let size = self.window.inner_size();
        RenderSize {
            width: size.width,
            height: size.height,
        }
    }
}
