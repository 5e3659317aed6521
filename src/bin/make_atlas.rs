//! Compose the icon atlas: `cargo run --bin make_atlas -- [ICON_DIR] [OUT]`.
//!
//! `ICON_DIR` holds one `<name>.png` per icon (default `static/icons/src`);
//! the atlas is written to `OUT` (default `static/icons/_atlas.png`).

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use graph_viz_wasm::atlas_image::{compose_from_dir, save};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("static/icons/src"));
    let out = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("static/icons/_atlas.png"));

    match compose_from_dir(&dir).and_then(|atlas| save(&atlas, &out)) {
        Ok(()) => {
            log::info!("wrote {}", out.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
