//! Runtime font discovery. No font ships with the crate; text is skipped
//! when none can be found.

use ab_glyph::FontArc;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Environment variable naming a TTF/OTF file to use for all text.
pub const FONT_ENV: &str = "MOT_FONT";

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Tries `explicit`, then `$MOT_FONT`, then a list of common system fonts.
pub fn find_font(explicit: Option<&Path>) -> Option<FontArc> {
    let from_env = std::env::var_os(FONT_ENV).map(PathBuf::from);
    let candidates = explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(from_env)
        .chain(CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match load_font(&path) {
            Ok(font) => {
                debug!("using font {}", path.display());
                return Some(font);
            }
            Err(e) => warn!("{e:#}"),
        }
    }
    warn!("no usable font found; set {FONT_ENV} to a .ttf file to show text");
    None
}
