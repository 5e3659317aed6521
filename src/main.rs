//! Host-side helper: `cargo run` builds the wasm bundle into `static/pkg`,
//! composes the icon atlas if there is none yet, and serves `static/` over
//! HTTP.

use std::process::{Command, ExitCode, Stdio};
use std::{env, thread, time::Duration};

const DEFAULT_PORT: &str = "8000";
const ICON_DIR: &str = "static/icons/src";
const ATLAS_PATH: &str = "static/icons/_atlas.png";

#[cfg(not(target_arch = "wasm32"))]
fn ensure_atlas() -> bool {
    use graph_viz_wasm::atlas_image::{compose_from_dir, save};
    use std::path::Path;

    let out = Path::new(ATLAS_PATH);
    if out.exists() {
        return true;
    }
    println!("Composing icon atlas from {ICON_DIR} …");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .ok();
    match compose_from_dir(Path::new(ICON_DIR)).and_then(|atlas| save(&atlas, out)) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("{err}");
            false
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn ensure_atlas() -> bool {
    true
}

fn main() -> ExitCode {
    // Only meaningful on non-wasm targets.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return ExitCode::SUCCESS;
    }

    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args([
            "build",
            "--release",
            "--target",
            "web",
            "--out-dir",
            "static/pkg",
        ])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/).");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Skipping wasm build; the site may serve stale artifacts.");
        }
    }

    if !ensure_atlas() {
        return ExitCode::FAILURE;
    }

    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_owned());
    println!("Launching local server at http://127.0.0.1:{port} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn();

    let mut server = match server {
        Ok(child) => child,
        Err(err) => {
            eprintln!("failed to start http server: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Keep process alive while the server runs.
    loop {
        match server.try_wait() {
            Ok(Some(status)) => {
                eprintln!("http server exited: {status}");
                return ExitCode::FAILURE;
            }
            Ok(None) => thread::sleep(Duration::from_secs(1)),
            Err(err) => {
                eprintln!("lost track of http server: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
}
