//! # Bootstrap Configuration
//!
//! Every parameter of the bootstrap (window size and title, GPU API, vsync,
//! clear behavior, debug overlay) lives in [`BootstrapConfig`]. The shipped
//! binaries pick one of the compile-time presets; the [`Config`] trait keeps
//! the presets serializable to TOML and RON for tooling and tests.

use serde::{Deserialize, Serialize};

use crate::gfx::RendererType;

/// Default clear color, packed as `0xRRGGBBAA`
pub const DEFAULT_CLEAR_COLOR: u32 = 0x1f26_30ff;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that cannot drive a bootstrap
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Initial window parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial client width in screen coordinates
    pub width: u32,
    /// Initial client height in screen coordinates
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "SegMesh".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Graphics backend parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// GPU API to initialize
    pub renderer: RendererType,
    /// Present with vertical sync
    pub vsync: bool,
    /// Request Vulkan validation layers (`None` = debug builds only)
    pub enable_validation: Option<bool>,
    /// Application name reported to the driver
    pub application_name: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            renderer: RendererType::Vulkan,
            vsync: true,
            enable_validation: None,
            application_name: "SegMesh".to_string(),
        }
    }
}

impl RendererConfig {
    /// Whether validation layers should be requested for this build
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation.unwrap_or(cfg!(debug_assertions))
    }
}

/// How view 0 is cleared every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearMode {
    /// Fixed packed `0xRRGGBBAA` color
    Static {
        /// Packed clear color
        color: u32,
    },
    /// Color cycles with elapsed time
    Animated,
}

impl Default for ClearMode {
    fn default() -> Self {
        Self::Static { color: DEFAULT_CLEAR_COLOR }
    }
}

/// Complete bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Window parameters
    pub window: WindowConfig,
    /// Graphics backend parameters
    pub renderer: RendererConfig,
    /// Clear behavior for view 0
    pub clear: ClearMode,
    /// Print the renderer name as a debug text overlay
    pub debug_text: bool,
}

impl Config for BootstrapConfig {}

impl BootstrapConfig {
    /// Preset with a time-animated clear color
    pub fn animated() -> Self {
        Self::default()
            .with_title("SegMesh - Animated Clear")
            .with_clear(ClearMode::Animated)
    }

    /// Preset with an animated clear color and the renderer overlay
    pub fn animated_with_debug_text() -> Self {
        Self::animated()
            .with_title("SegMesh - Debug Text")
            .with_debug_text(true)
    }

    /// Set the window title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Set the initial window size
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    /// Set the clear mode
    #[must_use]
    pub const fn with_clear(mut self, clear: ClearMode) -> Self {
        self.clear = clear;
        self
    }

    /// Enable or disable the debug text overlay
    #[must_use]
    pub const fn with_debug_text(mut self, enabled: bool) -> Self {
        self.debug_text = enabled;
        self
    }

    /// Check the values a window and swapchain can actually be built from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.window.title.trim().is_empty() {
            return Err(ConfigError::Invalid("window title is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_fixed_bootstrap_parameters() {
        let config = BootstrapConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.window.title, "SegMesh");
        assert_eq!(config.renderer.renderer, RendererType::Vulkan);
        assert!(config.renderer.vsync);
        assert_eq!(config.clear, ClearMode::Static { color: 0x1f26_30ff });
        assert!(!config.debug_text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_differ_only_in_variant_options() {
        let animated = BootstrapConfig::animated();
        assert_eq!(animated.clear, ClearMode::Animated);
        assert!(!animated.debug_text);

        let debug = BootstrapConfig::animated_with_debug_text();
        assert_eq!(debug.clear, ClearMode::Animated);
        assert!(debug.debug_text);
        assert_eq!(debug.window.width, animated.window.width);
        assert_eq!(debug.renderer, animated.renderer);
    }

    #[test]
    fn test_validate_rejects_zero_size_and_blank_title() {
        assert!(matches!(
            BootstrapConfig::default().with_size(0, 720).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BootstrapConfig::default().with_title("   ").validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validation_defaults_to_build_type() {
        let mut renderer = RendererConfig::default();
        assert_eq!(renderer.validation_enabled(), cfg!(debug_assertions));
        renderer.enable_validation = Some(false);
        assert!(!renderer.validation_enabled());
    }

    #[test]
    fn test_parses_hand_written_toml() {
        let text = r#"
            debug_text = true
            clear = "Animated"

            [window]
            title = "Viewer"
            width = 640
            height = 480

            [renderer]
            renderer = "Vulkan"
            vsync = true
            application_name = "Viewer"
        "#;
        let config: BootstrapConfig = toml::from_str(text).unwrap();
        assert_eq!(config.window.title, "Viewer");
        assert_eq!(config.clear, ClearMode::Animated);
        assert_eq!(config.renderer.enable_validation, None);
        assert!(config.debug_text);
    }

    #[test]
    fn test_save_and_load_ron_file() {
        let path = std::env::temp_dir().join(format!("segmesh_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = BootstrapConfig::animated_with_debug_text().with_size(800, 600);
        config.save_to_file(&path).unwrap();
        let loaded = BootstrapConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(matches!(
            BootstrapConfig::load_from_file("settings.ini"),
            Err(ConfigError::Io(_) | ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            BootstrapConfig::default().save_to_file("settings.ini"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
