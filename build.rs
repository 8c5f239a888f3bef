//! Build-time hints for locating FFmpeg.
//!
//! `ffmpeg-sys-next` finds FFmpeg through pkg-config on Unix. Windows builds
//! usually need `FFMPEG_DIR`, so this script points at a vcpkg install when
//! one is present.

use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARIABLES: &[&str] = &["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let targets_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !targets_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_install_dir() {
        Some(dir) if dir.exists() => suggest_ffmpeg_dir(&dir),
        Some(dir) => warn(&format!(
            "VCPKG_ROOT is set but {} does not exist; install ffmpeg with vcpkg or set FFMPEG_DIR",
            dir.display()
        )),
        None => warn("FFMPEG_DIR is not set; point it at an FFmpeg install (for example via vcpkg)"),
    }
}

fn vcpkg_install_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn suggest_ffmpeg_dir(dir: &Path) {
    warn(&format!(
        "found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly",
        dir.display()
    ));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("set VCPKGRS_DYNAMIC=1 when linking against a dynamic vcpkg FFmpeg");
    }
}

fn warn(message: &str) {
    println!("cargo:warning={message}");
}
