//! Startup configuration derived from the command line
//!
//! The demos have no configuration files. Everything they need to locate
//! shaders and assets is derived from `argv[0]`.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::error::{GlintError, Result};

/// Filesystem locations derived from the executable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub app_path: PathBuf,
    /// File stem of the executable, e.g. `deferred-renderer`.
    pub app_name: String,
    pub app_dir: PathBuf,
    pub assets_root: PathBuf,
    pub shaders_root: PathBuf,
}

impl AppPaths {
    pub fn from_exe_path(app_path: impl Into<PathBuf>) -> Self {
        let app_path = app_path.into();
        let app_name = app_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let app_dir = app_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            assets_root: app_dir.join("assets"),
            shaders_root: app_dir.join("shaders"),
            app_path,
            app_name,
            app_dir,
        }
    }

    /// Directory holding this application's WGSL files.
    pub fn app_shaders_dir(&self) -> PathBuf {
        self.shaders_root.join(&self.app_name)
    }

    /// Directory holding this application's textures.
    pub fn app_textures_dir(&self) -> PathBuf {
        self.assets_root.join(&self.app_name).join("textures")
    }

    /// Location of the shared OBJ scene used by the forward and deferred demos.
    pub fn sponza_path(&self) -> PathBuf {
        self.assets_root
            .join("glmlv")
            .join("models")
            .join("crytek-sponza")
            .join("sponza.obj")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Prefer an sRGB surface format so the hardware encodes output colors.
    pub srgb: bool,
}

impl WindowConfig {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            width: 1280,
            height: 720,
            resizable: false,
            srgb: false,
        }
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Settings handed to the GUI layer at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiConfig {
    /// Layout file written in the working directory at exit. `None` disables it.
    pub ini_filename: Option<PathBuf>,
    pub font_size: f32,
}

impl GuiConfig {
    pub fn for_app(app_name: &str) -> Self {
        Self {
            ini_filename: Some(PathBuf::from(format!("{app_name}.imgui.ini"))),
            font_size: 16.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: AppPaths,
    pub window: WindowConfig,
    pub gui: GuiConfig,
    /// glTF file shown by the viewer.
    pub model_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(paths: AppPaths, title: &str) -> Self {
        let gui = GuiConfig::for_app(&paths.app_name);
        Self {
            paths,
            window: WindowConfig::new(title),
            gui,
            model_path: None,
        }
    }

    /// Builds the configuration for the running executable.
    pub fn from_env(title: &str) -> Self {
        let exe = std::env::args_os()
            .next()
            .map(PathBuf::from)
            .unwrap_or_default();
        // a bare argv[0] was resolved through PATH
        let exe = std::env::current_exe()
            .ok()
            .filter(|_| exe.components().count() <= 1)
            .unwrap_or(exe);
        Self::new(AppPaths::from_exe_path(exe), title)
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }
}

/// Command line of the glTF viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerArgs {
    pub model_path: PathBuf,
}

impl ViewerArgs {
    /// Parses `argv`. The model path is the first argument after the program
    /// and is kept as given, whether or not it is valid UTF-8.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args
            .next()
            .map(|program| program.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gltf-viewer".to_owned());
        match args.next() {
            Some(path) if !path.is_empty() => Ok(Self {
                model_path: PathBuf::from(path),
            }),
            _ => Err(GlintError::MissingModelPath { program }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_the_executable() {
        let paths = AppPaths::from_exe_path("/opt/demos/bin/deferred-renderer");

        assert_eq!(paths.app_name, "deferred-renderer");
        assert_eq!(paths.assets_root, PathBuf::from("/opt/demos/bin/assets"));
        assert_eq!(
            paths.app_shaders_dir(),
            PathBuf::from("/opt/demos/bin/shaders/deferred-renderer")
        );
        assert_eq!(
            paths.app_textures_dir(),
            PathBuf::from("/opt/demos/bin/assets/deferred-renderer/textures")
        );
        assert!(paths
            .sponza_path()
            .ends_with("glmlv/models/crytek-sponza/sponza.obj"));
    }

    #[test]
    fn windows_extension_is_not_part_of_the_name() {
        let paths = AppPaths::from_exe_path("C:/demos/forward-renderer.exe");
        assert_eq!(paths.app_name, "forward-renderer");
    }

    #[test]
    fn ini_file_is_named_after_the_app() {
        let config = AppConfig::new(AppPaths::from_exe_path("/x/triangle"), "Triangle");
        assert_eq!(
            config.gui.ini_filename,
            Some(PathBuf::from("triangle.imgui.ini"))
        );
        assert_eq!((config.window.width, config.window.height), (1280, 720));
        assert!(!config.window.resizable);
    }

    #[test]
    fn viewer_requires_a_model_path() {
        let err = ViewerArgs::parse(["gltf-viewer"]).unwrap_err();
        assert!(matches!(err, GlintError::MissingModelPath { ref program } if program == "gltf-viewer"));
        assert_eq!(
            err.to_string(),
            "usage: gltf-viewer <path/to/model.gltf>"
        );

        let args = ViewerArgs::parse(["gltf-viewer", "models/box.gltf"]).unwrap();
        assert_eq!(args.model_path, PathBuf::from("models/box.gltf"));
    }

    #[cfg(unix)]
    #[test]
    fn viewer_keeps_non_utf8_model_paths() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let path = OsStr::from_bytes(b"models/b\xffx.gltf");
        let args = ViewerArgs::parse([OsStr::new("gltf-viewer"), path]).unwrap();
        assert_eq!(args.model_path.as_os_str(), path);

        let err = ViewerArgs::parse([OsStr::from_bytes(b"gltf-\xffviewer")]).unwrap_err();
        assert!(matches!(err, GlintError::MissingModelPath { ref program } if program == "gltf-\u{fffd}viewer"));
    }
}
