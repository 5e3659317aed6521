//! Icon atlas addressing.
//!
//! The atlas is a single 2048x2048 texture holding an 8x8 grid of 256x256
//! icons. Vertices never carry texture coordinates for icons: they carry a
//! linear icon index and the fragment shader turns that into a UV origin.
//! The functions here do the same arithmetic on the host so the packing can
//! be checked without a GPU.

/// "No icon here." Used for absent decorators.
pub const NO_ICON: u16 = u16::MAX;

/// Icons per atlas row (and rows per atlas).
pub const ICONS_PER_ROW: u32 = 8;

/// Pixel size of one icon.
pub const ICON_PX: u32 = 256;

/// Pixel size of the whole atlas.
pub const ATLAS_PX: u32 = ICON_PX * ICONS_PER_ROW;

/// Offset into the centre of a texel, so sampling at an icon's edge does not
/// bleed into its neighbour.
pub const HALF_PIXEL: f32 = 0.5 / ATLAS_PX as f32;

/// UV extent of one icon, inset by half a pixel on each side.
pub const ICON_UV_SIZE: f32 = 1.0 / ICONS_PER_ROW as f32 - 2.0 * HALF_PIXEL;

/// Atlas slot order. Must match the order the atlas image was composed in.
pub const ICON_NAMES: [&str; 16] = [
    "dalek",
    "hal-9000",
    "mr_squiggle",
    "tardis",
    "australia",
    "china",
    "russia",
    "ukraine",
    "check",
    "true",
    "false",
    "flat_circle",
    "flat_square",
    "round_circle",
    "round_square",
    "transparent",
];

/// Foreground icons cycled over the generated nodes.
pub const FG_ICONS: [&str; 4] = ["dalek", "hal-9000", "mr_squiggle", "tardis"];

/// Background icons cycled over the generated nodes.
pub const BG_ICONS: [&str; 5] = [
    "round_circle",
    "flat_square",
    "flat_circle",
    "round_square",
    "transparent",
];

/// Atlas index of a named icon.
pub fn texture_index(name: &str) -> Option<u16> {
    ICON_NAMES
        .iter()
        .position(|n| *n == name)
        .map(|ix| ix as u16)
}

/// Like [`texture_index`], for names from the built-in tables.
pub(crate) fn known_index(name: &str) -> u16 {
    texture_index(name).unwrap_or(NO_ICON)
}

/// Top-left UV of an icon, inset by half a pixel.
pub fn icon_origin(ix: u16) -> [f32; 2] {
    let ix = u32::from(ix);
    let n = ICONS_PER_ROW as f32;
    [
        (ix % ICONS_PER_ROW) as f32 / n + HALF_PIXEL,
        (ix / ICONS_PER_ROW) as f32 / n + HALF_PIXEL,
    ]
}

/// Atlas UV for a point `uv` (0..1 in both axes) inside icon `ix`.
pub fn icon_uv(ix: u16, uv: [f32; 2]) -> [f32; 2] {
    let [x, y] = icon_origin(ix);
    [x + ICON_UV_SIZE * uv[0], y + ICON_UV_SIZE * uv[1]]
}

/// Pixel position of a slot in the atlas image.
pub fn slot_origin_px(ix: u16) -> (u32, u32) {
    let offset = u32::from(ix) * ICON_PX;
    (offset % ATLAS_PX, offset / ATLAS_PX * ICON_PX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_name_table() {
        assert_eq!(texture_index("dalek"), Some(0));
        assert_eq!(texture_index("tardis"), Some(3));
        assert_eq!(texture_index("true"), Some(9));
        assert_eq!(texture_index("transparent"), Some(15));
        assert_eq!(texture_index("k9"), None);
    }

    #[test]
    fn every_named_icon_fits() {
        assert!(ICON_NAMES.len() as u32 <= ICONS_PER_ROW * ICONS_PER_ROW);
        for name in FG_ICONS.iter().chain(BG_ICONS.iter()) {
            assert!(texture_index(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn origin_wraps_rows() {
        let [x, y] = icon_origin(0);
        assert_eq!((x, y), (HALF_PIXEL, HALF_PIXEL));

        let [x, y] = icon_origin(9);
        assert!((x - (0.125 + HALF_PIXEL)).abs() < 1e-6);
        assert!((y - (0.125 + HALF_PIXEL)).abs() < 1e-6);
    }

    #[test]
    fn icon_uv_stays_inside_its_cell() {
        for ix in 0..(ICONS_PER_ROW * ICONS_PER_ROW) as u16 {
            let lo = icon_uv(ix, [0.0, 0.0]);
            let hi = icon_uv(ix, [1.0, 1.0]);
            let col = (ix % 8) as f32 / 8.0;
            let row = (ix / 8) as f32 / 8.0;
            assert!(lo[0] > col && hi[0] < col + 0.125);
            assert!(lo[1] > row && hi[1] < row + 0.125);
        }
    }

    #[test]
    fn slots_in_pixels() {
        assert_eq!(slot_origin_px(0), (0, 0));
        assert_eq!(slot_origin_px(7), (1792, 0));
        assert_eq!(slot_origin_px(8), (0, 256));
        assert_eq!(slot_origin_px(13), (1280, 256));
    }
}
