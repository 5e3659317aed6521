//! Composing the atlas image from one PNG per icon (host only).
//!
//! Icons are read from `<dir>/<name>.png` for every name in
//! [`ICON_NAMES`] and pasted at their slot. An icon of the wrong size is
//! scaled to fit. A missing icon gets a plain stand-in so the atlas is
//! always complete: white shapes for the tinted backgrounds, coloured
//! discs for everything else.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::atlas::{slot_origin_px, ATLAS_PX, ICON_NAMES, ICON_PX};

#[derive(Debug, Error)]
pub enum AtlasImageError {
    #[error("cannot read icon {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot write atlas {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

const STAND_IN_COLOURS: [[u8; 4]; 6] = [
    [230, 80, 70, 255],
    [240, 180, 50, 255],
    [90, 190, 90, 255],
    [70, 160, 230, 255],
    [150, 100, 220, 255],
    [230, 110, 180, 255],
];

/// A fresh atlas with each `(slot, icon)` pasted at the slot's origin.
/// Slots not listed stay transparent.
pub fn compose<'a>(icons: impl IntoIterator<Item = (u16, &'a RgbaImage)>) -> RgbaImage {
    let mut atlas = RgbaImage::from_pixel(ATLAS_PX, ATLAS_PX, CLEAR);
    for (ix, icon) in icons {
        let (x, y) = slot_origin_px(ix);
        imageops::replace(&mut atlas, icon, i64::from(x), i64::from(y));
    }
    atlas
}

/// Load every named icon from `dir` and compose the atlas.
pub fn compose_from_dir(dir: &Path) -> Result<RgbaImage, AtlasImageError> {
    let mut icons = Vec::with_capacity(ICON_NAMES.len());
    for (ix, name) in ICON_NAMES.iter().enumerate() {
        let ix = ix as u16;
        let path = dir.join(format!("{name}.png"));
        let icon = if path.is_file() {
            load_icon(&path)?
        } else {
            log::warn!("{} not found, using a stand-in", path.display());
            stand_in(ix)
        };
        icons.push((ix, icon));
    }
    Ok(compose(icons.iter().map(|(ix, icon)| (*ix, icon))))
}

pub fn save(atlas: &RgbaImage, path: &Path) -> Result<(), AtlasImageError> {
    atlas.save(path).map_err(|source| AtlasImageError::Write {
        path: path.to_owned(),
        source,
    })
}

fn load_icon(path: &Path) -> Result<RgbaImage, AtlasImageError> {
    let icon = image::open(path)
        .map_err(|source| AtlasImageError::Read {
            path: path.to_owned(),
            source,
        })?
        .to_rgba8();

    if icon.dimensions() == (ICON_PX, ICON_PX) {
        return Ok(icon);
    }
    log::info!(
        "{}: {}x{} scaled to {ICON_PX}x{ICON_PX}",
        path.display(),
        icon.width(),
        icon.height()
    );
    Ok(imageops::resize(&icon, ICON_PX, ICON_PX, FilterType::Triangle))
}

/// Placeholder artwork for slot `ix`.
pub fn stand_in(ix: u16) -> RgbaImage {
    let name = ICON_NAMES.get(usize::from(ix)).copied().unwrap_or_default();
    let colour = match name {
        "flat_circle" | "round_circle" | "flat_square" | "round_square" => [255; 4],
        _ => STAND_IN_COLOURS[usize::from(ix) % STAND_IN_COLOURS.len()],
    };

    let centre = (ICON_PX as f32 - 1.0) / 2.0;
    let reach = ICON_PX as f32 * 0.45;
    RgbaImage::from_fn(ICON_PX, ICON_PX, |x, y| {
        let dx = x as f32 - centre;
        let dy = y as f32 - centre;
        let inside = match name {
            "transparent" => false,
            "flat_square" | "round_square" => dx.abs().max(dy.abs()) <= reach,
            _ => dx.hypot(dy) <= reach,
        };
        if inside {
            Rgba(colour)
        } else {
            CLEAR
        }
    })
}
