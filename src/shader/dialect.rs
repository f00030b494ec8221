//! Shader language selection per platform and graphics API.

use std::fmt;

use crate::error::{Result, TrellisError};
use crate::platform::{GraphicsApi, Platform};

/// Target language handed to the shader compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    Glsl,
    Essl,
    D3d9,
    D3d11,
    Spirv,
    Metal,
    /// Console and custom platforms; named after the platform id.
    Platform(String),
}

impl Dialect {
    /// The name passed as the compiler's first argument.
    pub fn name(&self) -> &str {
        match self {
            Dialect::Glsl => "glsl",
            Dialect::Essl => "essl",
            Dialect::D3d9 => "d3d9",
            Dialect::D3d11 => "d3d11",
            Dialect::Spirv => "spirv",
            Dialect::Metal => "metal",
            Dialect::Platform(id) => id,
        }
    }

    /// Whether compiled output uses named entry points and a redirect marker.
    pub fn uses_entry_points(&self) -> bool {
        matches!(self, Dialect::Metal)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq<&str> for Dialect {
    fn eq(&self, other: &&str) -> bool {
        self.name() == *other
    }
}

/// Pick the shader dialect for `platform` rendering through `api`.
///
/// Combinations the platform cannot render with are rejected.
pub fn dialect(platform: &Platform, api: GraphicsApi) -> Result<Dialect> {
    use GraphicsApi as Api;

    let selected = match platform {
        Platform::Windows => match api {
            Api::OpenGl => Some(Dialect::Glsl),
            Api::Direct3D9 => Some(Dialect::D3d9),
            Api::Default | Api::Direct3D11 | Api::Direct3D12 => Some(Dialect::D3d11),
            Api::Vulkan => Some(Dialect::Spirv),
            Api::Metal => None,
        },
        Platform::WindowsApp => Some(Dialect::D3d11),
        Platform::Ios | Platform::TvOs => match api {
            Api::Default | Api::Metal => Some(Dialect::Metal),
            Api::OpenGl => Some(Dialect::Essl),
            _ => None,
        },
        Platform::Osx => match api {
            Api::Default | Api::Metal => Some(Dialect::Metal),
            Api::OpenGl => Some(Dialect::Glsl),
            _ => None,
        },
        Platform::Android => match api {
            Api::Vulkan => Some(Dialect::Spirv),
            Api::Default | Api::OpenGl => Some(Dialect::Essl),
            _ => None,
        },
        Platform::Linux => match api {
            Api::Vulkan => Some(Dialect::Spirv),
            Api::Default | Api::OpenGl => Some(Dialect::Glsl),
            _ => None,
        },
        Platform::Html5 | Platform::Tizen | Platform::Pi => Some(Dialect::Essl),
        Platform::Ps4 | Platform::XboxOne | Platform::Switch | Platform::Custom(_) => {
            Some(Dialect::Platform(platform.id().to_string()))
        }
    };

    selected.ok_or_else(|| TrellisError::UnsupportedShaderLanguage {
        platform: platform.id().to_string(),
        api: api.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulkan_is_spirv() {
        assert_eq!(dialect(&Platform::Linux, GraphicsApi::Vulkan).unwrap(), "spirv");
        assert_eq!(dialect(&Platform::Android, GraphicsApi::Vulkan).unwrap(), "spirv");
        assert_eq!(dialect(&Platform::Windows, GraphicsApi::Vulkan).unwrap(), "spirv");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(dialect(&Platform::Windows, GraphicsApi::Default).unwrap(), Dialect::D3d11);
        assert_eq!(dialect(&Platform::Osx, GraphicsApi::Default).unwrap(), Dialect::Metal);
        assert_eq!(dialect(&Platform::Linux, GraphicsApi::Default).unwrap(), Dialect::Glsl);
        assert_eq!(dialect(&Platform::Html5, GraphicsApi::Default).unwrap(), Dialect::Essl);
    }

    #[test]
    fn test_unsupported_combination_is_rejected() {
        let err = dialect(&Platform::Linux, GraphicsApi::Direct3D11).unwrap_err();
        match err {
            TrellisError::UnsupportedShaderLanguage { platform, api } => {
                assert_eq!(platform, "linux");
                assert_eq!(api, "direct3d11");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(dialect(&Platform::Windows, GraphicsApi::Metal).is_err());
        assert!(dialect(&Platform::Osx, GraphicsApi::Vulkan).is_err());
    }

    #[test]
    fn test_console_uses_platform_id() {
        assert_eq!(dialect(&Platform::Ps4, GraphicsApi::Default).unwrap(), "ps4");
        assert_eq!(
            dialect(&Platform::from_id("dreamcast"), GraphicsApi::Vulkan).unwrap(),
            "dreamcast"
        );
    }

    #[test]
    fn test_only_metal_uses_entry_points() {
        assert!(Dialect::Metal.uses_entry_points());
        assert!(!Dialect::Spirv.uses_entry_points());
    }
}
