use std::fs;
use std::path::{Path, PathBuf};
use ab_glyph::FontVec;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const USER_FONTS: &[&str] = &["DejaVuSans.ttf", "LiberationSans-Regular.ttf", "Arial.ttf"];

pub fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = fs::read(path)?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

fn candidates() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = SYSTEM_FONTS.iter().map(PathBuf::from).collect();
    if let Some(dir) = dirs::font_dir() {
        paths.extend(USER_FONTS.iter().map(|name| dir.join(name)));
    }
    paths
}

/// The requested font, else the first loadable system font.
pub fn find_font(requested: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = requested {
        match load_font(path) {
            Ok(font) => return Some(font),
            Err(err) => log::warn!("Cannot use font {err}, searching system fonts"),
        }
    }
    candidates()
        .into_iter()
        .filter(|p| p.is_file())
        .find_map(|p| match load_font(&p) {
            Ok(font) => {
                log::debug!("Using font {}", p.display());
                Some(font)
            }
            Err(_) => None,
        })
}
