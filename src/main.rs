//! padmap - Main Application
//!
//! Maps gamepad input to keyboard and mouse events. On Windows it uses
//! REAL keyboard/mouse backends that send input to your system; pass
//! `--mock` to only log what would be sent.
//!
//! Usage: `padmap [--mock] [config.toml]`

use anyhow::{bail, Context, Result};
use log::{info, warn};
use padmap_rs::backend::{mock_system_target, system_target};
use padmap_rs::controller::SampleSource;
use padmap_rs::mapping::config::Config;
use padmap_rs::mapping::FocusTracker;
use padmap_rs::panel::{choose_pad, PadView};
use padmap_rs::store::{persist, ProfileSource, ProfileStore};
use padmap_rs::{DesktopFocus, Dispatcher, Engine};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

struct Args {
    config: Option<PathBuf>,
    mock: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { config: None, mock: false };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--mock" => args.mock = true,
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            path if args.config.is_none() => args.config = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{}'", extra),
        }
    }
    Ok(args)
}

#[cfg(feature = "gilrs")]
fn open_source() -> Result<padmap_rs::controller::GilrsSource> {
    Ok(padmap_rs::controller::GilrsSource::new()?)
}

#[cfg(not(feature = "gilrs"))]
fn open_source() -> Result<padmap_rs::controller::ScriptedSource> {
    bail!("built without gamepad support, rebuild with `--features gilrs`")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;

    println!("=== padmap ===");
    println!();
    if args.mock || cfg!(not(windows)) {
        println!("Mock backends: input is logged, not sent.");
    } else {
        println!("⚠️  WARNING: This uses REAL keyboard/mouse input!");
        println!("⚠️  Your controller inputs will control your system!");
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
    .context("failed to load configuration")?;
    let settings = &config.settings;

    let store = match &settings.profile_file {
        Some(file) => {
            let path = persist::resolve_path(file);
            ProfileStore::load(&path, &settings.namespace, config.seed_profiles())
                .with_context(|| format!("failed to load profiles from {}", path.display()))?
        }
        None => ProfileStore::with_profiles(&settings.namespace, config.seed_profiles()),
    };
    match store.path() {
        Some(path) => info!("Profiles '{}' from {}", store.namespace(), path.display()),
        None => info!("Profiles '{}' held in memory only", store.namespace()),
    }
    if store.profiles().is_empty() {
        warn!("Namespace '{}' has no profiles, nothing will be mapped", settings.namespace);
    }

    let last_used_file = store.path().map(|path| persist::last_used_path(&path));
    let mut last_used = match &last_used_file {
        Some(file) => persist::read_last_used(file).unwrap_or_else(|e| {
            warn!("Ignoring last used controller: {}", e);
            None
        }),
        None => None,
    };

    let target = if args.mock {
        mock_system_target()
    } else {
        match system_target() {
            Ok(target) => target,
            Err(e) => {
                warn!("{}, falling back to mock backends", e);
                mock_system_target()
            }
        }
    };

    let dispatcher = Dispatcher::new(DesktopFocus::new(target), &settings.context);
    let mut engine = Engine::new(open_source()?, dispatcher, store);
    engine.start()?;

    let mut panel = settings.panel.then(PadView::new);

    let mut ticker = tokio::time::interval(Duration::from_millis(settings.frame_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Waiting for controllers...");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.step();
                if let Some(view) = panel.as_mut() {
                    refresh_panel(view, &engine, &mut last_used, last_used_file.as_deref());
                }
            }
            result = &mut shutdown => {
                result.context("failed to listen for Ctrl+C")?;
                info!("Ctrl+C received");
                break;
            }
        }
    }

    engine.stop();
    Ok(())
}

/// Keep the panel bound to a connected controller and log what moved.
fn refresh_panel<S, F, P>(
    view: &mut PadView,
    engine: &Engine<S, F, P>,
    last_used: &mut Option<String>,
    last_used_file: Option<&Path>,
) where
    S: SampleSource,
    F: FocusTracker,
    P: ProfileSource,
{
    let pads = engine.active_pads();
    let bound_alive = view.bound_pad().is_some_and(|pad| pads.contains(pad));
    let idle_and_unbound = view.bound_pad().is_none() && pads.is_empty();

    if !bound_alive && !idle_and_unbound {
        let chosen = choose_pad(&pads, last_used.as_deref()).cloned();
        if let Some(pad) = chosen.as_ref().filter(|pad| last_used.as_deref() != Some(pad.id.as_str())) {
            *last_used = Some(pad.id.clone());
            if let Some(file) = last_used_file {
                if let Err(e) = persist::write_last_used(file, &pad.id) {
                    warn!("Failed to remember controller '{}': {}", pad.id, e);
                }
            }
        }
        let profile = chosen
            .as_ref()
            .and_then(|pad| engine.profiles().resolve(&pad.id).cloned());
        view.bind_pad(chosen, profile);

        for (control, label) in view.hints() {
            info!("[PANEL] {} -> {}", control, label);
        }
    }

    for change in view.update(engine.source()) {
        info!("[PANEL] {:?} = {:.3}", change.element, change.value);
    }
}
