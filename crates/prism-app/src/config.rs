// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prism_platform::WindowConfig;
use prism_render::{vk, RenderSettings};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct AppCfg {
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub render: RenderCfg,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowCfg {
    fn default() -> Self {
        WindowCfg {
            title: "prism".to_owned(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RenderCfg {
    #[serde(default = "default_clear")]
    pub clear_color: [f32; 4],
    #[serde(default)]
    pub present_mode: PresentModeCfg,
    #[serde(default = "default_srgb")]
    pub srgb: bool,
    #[serde(default)]
    pub shader_dir: Option<PathBuf>,
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            clear_color: default_clear(),
            present_mode: PresentModeCfg::Mailbox,
            srgb: true,
            shader_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeCfg {
    Fifo,
    #[default]
    Mailbox,
    Immediate,
}

fn default_clear() -> [f32; 4] {
    [0.02, 0.02, 0.04, 1.0]
}
fn default_srgb() -> bool {
    true
}

/// Missing file means defaults. A file we cannot read or parse is reported
/// and also falls back to defaults.
pub fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => match toml::from_str::<AppCfg>(&s) {
            Ok(cfg) => {
                info!("config loaded from {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("{}: {}; using defaults", path.display(), e);
                AppCfg::default()
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => AppCfg::default(),
        Err(e) => {
            warn!("{}: {}; using defaults", path.display(), e);
            AppCfg::default()
        }
    }
}

impl AppCfg {
    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            title: self.window.title.clone(),
            width: self.window.width,
            height: self.window.height,
        }
    }

    pub fn to_settings(&self) -> RenderSettings {
        let format = if self.render.srgb {
            vk::Format::B8G8R8A8_SRGB
        } else {
            vk::Format::B8G8R8A8_UNORM
        };
        let present_mode = match self.render.present_mode {
            PresentModeCfg::Fifo => vk::PresentModeKHR::FIFO,
            PresentModeCfg::Mailbox => vk::PresentModeKHR::MAILBOX,
            PresentModeCfg::Immediate => vk::PresentModeKHR::IMMEDIATE,
        };
        RenderSettings {
            app_name: self.window.title.clone(),
            clear_color: self.render.clear_color,
            preferred_format: vk::SurfaceFormatKHR {
                format,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            preferred_present_mode: present_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: AppCfg = toml::from_str("").unwrap();
        assert_eq!(cfg, AppCfg::default());
        assert_eq!(cfg.window.width, 800);
        assert_eq!(cfg.window.height, 600);
        assert_eq!(cfg.render.present_mode, PresentModeCfg::Mailbox);
        assert!(cfg.render.srgb);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppCfg = toml::from_str(
            r#"
            [window]
            title = "tri"

            [render]
            present_mode = "fifo"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.window.title, "tri");
        assert_eq!(cfg.window.width, 800);
        assert_eq!(cfg.render.present_mode, PresentModeCfg::Fifo);
        assert_eq!(cfg.render.clear_color, default_clear());
        assert_eq!(cfg.render.shader_dir, None);
    }

    #[test]
    fn unknown_present_mode_is_rejected() {
        let res = toml::from_str::<AppCfg>("[render]\npresent_mode = \"vsync\"\n");
        assert!(res.is_err());
    }

    #[test]
    fn settings_follow_config() {
        let mut cfg = AppCfg::default();
        cfg.render.srgb = false;
        cfg.render.present_mode = PresentModeCfg::Immediate;
        cfg.render.clear_color = [1.0, 0.0, 0.0, 1.0];
        cfg.window.title = "demo".into();

        let s = cfg.to_settings();
        assert_eq!(s.preferred_format.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(
            s.preferred_format.color_space,
            vk::ColorSpaceKHR::SRGB_NONLINEAR
        );
        assert_eq!(s.preferred_present_mode, vk::PresentModeKHR::IMMEDIATE);
        assert_eq!(s.clear_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(s.app_name, "demo");
    }

    #[test]
    fn default_settings_match_renderer_defaults() {
        let s = AppCfg::default().to_settings();
        let d = RenderSettings::default();
        assert_eq!(s.preferred_format, d.preferred_format);
        assert_eq!(s.preferred_present_mode, d.preferred_present_mode);
        assert_eq!(s.clear_color, d.clear_color);
    }

    #[test]
    fn missing_file_falls_back() {
        let path = std::env::temp_dir().join("prism-missing-config-does-not-exist.toml");
        assert_eq!(load_cfg(&path), AppCfg::default());
    }

    #[test]
    fn broken_file_falls_back() {
        let path = std::env::temp_dir().join(format!("prism-broken-{}.toml", std::process::id()));
        fs::write(&path, "[render\nclear_color = 3").unwrap();
        assert_eq!(load_cfg(&path), AppCfg::default());
        fs::remove_file(&path).ok();
    }
}
