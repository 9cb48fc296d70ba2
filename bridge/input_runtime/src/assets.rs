use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::BridgeSettings;
use crate::error::{BridgeError, Result};

/// Written into the cache directory once fonts have been copied.
pub const INIT_MARKER: &str = ".mobileinput_inited";

const FONT_EXTENSION: &str = "ttf";

/// Copies bundled `.ttf` fonts where the native peer can load them.
///
/// Runs once per cache directory; later calls see the marker and return
/// `Ok(0)`. Returns the number of fonts copied.
pub fn prepare_fonts(settings: &BridgeSettings) -> Result<usize> {
    let (Some(font_dir), Some(cache_dir)) = (&settings.font_dir, &settings.font_cache_dir) else {
        debug!("no font directories configured; skipping font preparation");
        return Ok(0);
    };

    let marker = cache_dir.join(INIT_MARKER);
    if marker.exists() {
        debug!("fonts already prepared in {}", cache_dir.display());
        return Ok(0);
    }

    fs::create_dir_all(cache_dir).map_err(asset_error(cache_dir))?;

    let mut copied = 0;
    for path in font_files(font_dir)? {
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let target = cache_dir.join(file_name);
        fs::copy(&path, &target).map_err(asset_error(&path))?;
        copied += 1;
    }

    fs::write(&marker, b"").map_err(asset_error(&marker))?;
    info!("prepared {copied} font(s) in {}", cache_dir.display());
    Ok(copied)
}

fn font_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        debug!("font directory {} does not exist; no fonts to copy", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(asset_error(dir))?;

    let mut fonts = Vec::new();
    for entry in entries {
        let path = entry.map_err(asset_error(dir))?.path();
        let is_font = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FONT_EXTENSION));
        if is_font && path.is_file() {
            fonts.push(path);
        }
    }

    fonts.sort();
    Ok(fonts)
}

fn asset_error(path: &Path) -> impl FnOnce(io::Error) -> BridgeError + '_ {
    move |source| BridgeError::AssetPreparation {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "native_input_{label}_{}_{nanos}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn settings(font_dir: &Path, cache_dir: &Path) -> BridgeSettings {
        BridgeSettings {
            font_dir: Some(font_dir.to_path_buf()),
            font_cache_dir: Some(cache_dir.to_path_buf()),
            ..BridgeSettings::default()
        }
    }

    #[test]
    fn copies_fonts_once() {
        let root = scratch_dir("copy");
        let fonts = root.join("fonts");
        let cache = root.join("cache");
        fs::create_dir_all(&fonts).expect("create font dir");
        fs::write(fonts.join("Saira.ttf"), b"font").expect("write font");
        fs::write(fonts.join("Other.TTF"), b"font").expect("write font");
        fs::write(fonts.join("notes.txt"), b"skip").expect("write note");

        let settings = settings(&fonts, &cache);
        assert_eq!(prepare_fonts(&settings).expect("first preparation"), 2);
        assert!(cache.join("Saira.ttf").is_file());
        assert!(!cache.join("notes.txt").exists());
        assert!(cache.join(INIT_MARKER).is_file());

        assert_eq!(prepare_fonts(&settings).expect("second preparation"), 0);

        fs::remove_dir_all(&root).expect("clean scratch dir");
    }

    #[test]
    fn missing_font_dir_copies_nothing_and_marks_cache() {
        let root = scratch_dir("missing");
        let cache = root.join("cache");
        let settings = settings(&root.join("absent"), &cache);

        assert_eq!(prepare_fonts(&settings).expect("nothing to copy"), 0);
        assert!(cache.join(INIT_MARKER).is_file());

        fs::remove_dir_all(&root).expect("clean scratch dir");
    }

    #[test]
    fn unusable_cache_dir_is_an_asset_error() {
        let root = scratch_dir("blocked");
        let fonts = root.join("fonts");
        let cache = root.join("cache");
        fs::create_dir_all(&fonts).expect("create font dir");
        fs::write(fonts.join("Saira.ttf"), b"font").expect("write font");
        fs::write(&cache, b"not a directory").expect("write blocking file");

        let err = prepare_fonts(&settings(&fonts, &cache)).expect_err("cache is a file");

        match err {
            BridgeError::AssetPreparation { path, .. } => assert_eq!(path, cache),
            other => panic!("expected asset error, got {other:?}"),
        }
        fs::remove_dir_all(&root).expect("clean scratch dir");
    }

    #[test]
    fn unconfigured_directories_skip_preparation() {
        assert_eq!(
            prepare_fonts(&BridgeSettings::default()).expect("nothing to do"),
            0
        );
    }
}
