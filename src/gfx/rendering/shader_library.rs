//! WGSL source lookup
//!
//! Each demo reads its shaders from `<exe-dir>/shaders/<app-name>/`. A file
//! found there wins, so shaders can be edited without rebuilding; otherwise
//! the copy compiled into the binary is used.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::error::{GlintError, Result};

type Embedded = &'static [(&'static str, &'static str)];

macro_rules! embed {
    ($app:literal: $($name:literal),+ $(,)?) => {
        &[$(($name, include_str!(concat!("../../../shaders/", $app, "/", $name, ".wgsl")))),+]
    };
}

/// Shaders compiled into the binary, by demo name.
fn builtin_shaders(app_name: &str) -> Embedded {
    match app_name {
        "triangle" => embed!("triangle": "triangle"),
        "triangle-2vbos" => embed!("triangle-2vbos": "triangle"),
        "forward-renderer" => embed!("forward-renderer": "forward"),
        "deferred-renderer" => embed!(
            "deferred-renderer":
            "geometry_pass",
            "shading_pass",
            "directional_shadow_map",
            "display_depth",
            "gamma_correct",
            "blit",
        ),
        "gltf-viewer" => embed!("gltf-viewer": "forward"),
        _ => &[],
    }
}

#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    dir: PathBuf,
    embedded: Embedded,
}

impl ShaderLibrary {
    /// `dir` is searched first, then the built-in shaders of `app_name`.
    pub fn new(dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            dir: dir.into(),
            embedded: builtin_shaders(app_name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self, name: &str) -> Result<Cow<'static, str>> {
        let path = self.dir.join(format!("{name}.wgsl"));
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                log::debug!("Loaded shader {}", path.display());
                return Ok(Cow::Owned(source));
            }
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => {
                return Err(GlintError::Io { path, source: err });
            }
            Err(_) => {}
        }

        self.embedded
            .iter()
            .find(|(embedded, _)| *embedded == name)
            .map(|(_, source)| Cow::Borrowed(*source))
            .ok_or_else(|| GlintError::ShaderNotFound {
                name: name.to_owned(),
                dir: self.dir.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_copy_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("triangle.wgsl"), "// edited").unwrap();

        let library = ShaderLibrary::new(dir.path(), "triangle");
        assert_eq!(library.source("triangle").unwrap(), "// edited");
    }

    #[test]
    fn falls_back_to_builtin_source() {
        let dir = tempfile::tempdir().unwrap();
        let library = ShaderLibrary::new(dir.path(), "deferred-renderer");
        let source = library.source("gamma_correct").unwrap();
        assert!(source.contains("@compute"));
    }

    #[test]
    fn unknown_shader_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = ShaderLibrary::new(dir.path(), "renamed-binary");
        let err = library.source("forward").unwrap_err();
        assert!(matches!(err, GlintError::ShaderNotFound { ref name, .. } if name == "forward"));
    }

    #[test]
    fn every_demo_has_builtin_shaders() {
        for app in ["triangle", "triangle-2vbos", "forward-renderer", "deferred-renderer", "gltf-viewer"] {
            assert!(!builtin_shaders(app).is_empty(), "{app}");
        }
    }
}
