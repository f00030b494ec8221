//! Target platforms and API selections.
//!
//! Platform ids are the lowercase strings accepted on the command line
//! (`windows`, `osx`, `ps4`, ...). Ids outside the built-in set are kept as
//! [`Platform::Custom`] so contributed backends can serve them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A build target platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    WindowsApp,
    Ios,
    Osx,
    Android,
    Linux,
    Html5,
    Tizen,
    Pi,
    TvOs,
    Ps4,
    XboxOne,
    Switch,
    /// A platform with no built-in knowledge (served by contributed backends).
    Custom(String),
}

impl Platform {
    /// All built-in platforms.
    pub const BUILTIN: [Platform; 13] = [
        Platform::Windows,
        Platform::WindowsApp,
        Platform::Ios,
        Platform::Osx,
        Platform::Android,
        Platform::Linux,
        Platform::Html5,
        Platform::Tizen,
        Platform::Pi,
        Platform::TvOs,
        Platform::Ps4,
        Platform::XboxOne,
        Platform::Switch,
    ];

    /// Parse a platform id. Unknown ids become [`Platform::Custom`].
    pub fn from_id(id: &str) -> Self {
        match id.to_lowercase().as_str() {
            "windows" => Platform::Windows,
            "windowsapp" => Platform::WindowsApp,
            "ios" => Platform::Ios,
            "osx" => Platform::Osx,
            "android" => Platform::Android,
            "linux" => Platform::Linux,
            "html5" => Platform::Html5,
            "tizen" => Platform::Tizen,
            "pi" => Platform::Pi,
            "tvos" => Platform::TvOs,
            "ps4" => Platform::Ps4,
            "xboxone" => Platform::XboxOne,
            "switch" => Platform::Switch,
            other => Platform::Custom(other.to_string()),
        }
    }

    /// The command-line id of this platform.
    pub fn id(&self) -> &str {
        match self {
            Platform::Windows => "windows",
            Platform::WindowsApp => "windowsapp",
            Platform::Ios => "ios",
            Platform::Osx => "osx",
            Platform::Android => "android",
            Platform::Linux => "linux",
            Platform::Html5 => "html5",
            Platform::Tizen => "tizen",
            Platform::Pi => "pi",
            Platform::TvOs => "tvos",
            Platform::Ps4 => "ps4",
            Platform::XboxOne => "xboxone",
            Platform::Switch => "switch",
            Platform::Custom(id) => id,
        }
    }

    /// Human readable name, used in log output and backend directory names.
    pub fn display_name(&self) -> &str {
        match self {
            Platform::Windows => "Windows",
            Platform::WindowsApp => "Windows App",
            Platform::Ios => "iOS",
            Platform::Osx => "macOS",
            Platform::Android => "Android",
            Platform::Linux => "Linux",
            Platform::Html5 => "HTML5",
            Platform::Tizen => "Tizen",
            Platform::Pi => "Pi",
            Platform::TvOs => "tvOS",
            Platform::Ps4 => "PlayStation4",
            Platform::XboxOne => "Xbox One",
            Platform::Switch => "Switch",
            Platform::Custom(id) => id,
        }
    }

    /// The platform this binary runs on, used as the default target.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Whether this platform is one of Apple's.
    pub fn is_apple(&self) -> bool {
        matches!(self, Platform::Ios | Platform::Osx | Platform::TvOs)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Platform::from_id(s))
    }
}

/// Graphics API requested for the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    #[default]
    Default,
    #[value(name = "opengl")]
    OpenGl,
    #[value(name = "direct3d9")]
    Direct3D9,
    #[value(name = "direct3d11")]
    Direct3D11,
    #[value(name = "direct3d12")]
    Direct3D12,
    Vulkan,
    Metal,
}

impl GraphicsApi {
    pub fn name(&self) -> &'static str {
        match self {
            GraphicsApi::Default => "default",
            GraphicsApi::OpenGl => "opengl",
            GraphicsApi::Direct3D9 => "direct3d9",
            GraphicsApi::Direct3D11 => "direct3d11",
            GraphicsApi::Direct3D12 => "direct3d12",
            GraphicsApi::Vulkan => "vulkan",
            GraphicsApi::Metal => "metal",
        }
    }
}

impl fmt::Display for GraphicsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// VR API passed through to backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VrApi {
    #[default]
    None,
    #[value(name = "gearvr")]
    GearVr,
    Cardboard,
    Rift,
    #[value(name = "hololens")]
    HoloLens,
    #[value(name = "steamvr")]
    SteamVr,
}

impl VrApi {
    pub fn name(&self) -> &'static str {
        match self {
            VrApi::None => "none",
            VrApi::GearVr => "gearvr",
            VrApi::Cardboard => "cardboard",
            VrApi::Rift => "rift",
            VrApi::HoloLens => "hololens",
            VrApi::SteamVr => "steamvr",
        }
    }
}

impl fmt::Display for VrApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
