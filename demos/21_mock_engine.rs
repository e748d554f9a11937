//! Demo 21: Drive the engine with a scripted controller and mock backends
//!
//! A scripted "Xbox" pad presses A, pushes the left stick, swaps profiles
//! mid-hold and finally disconnects. The mock backends print every key and
//! mouse action instead of sending it to your system, so you can see the
//! down/press/up sequence and that nothing stays held.

use padmap_rs::backend::{MockKeyboardBackend, MockMouseBackend};
use padmap_rs::controller::{ButtonSample, Controller, ScriptedSource};
use padmap_rs::mapping::config::Config;
use padmap_rs::store::ProfileStore;
use padmap_rs::{ControlKey, DesktopFocus, Dispatcher, Engine, MappingEntry, SystemTarget};
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== padmap engine test with mock backends ===");
    println!();

    let config = match Config::load_default() {
        Ok(cfg) => {
            println!("✓ Loaded configuration from configs/default.toml");
            cfg
        }
        Err(e) => {
            eprintln!("✗ Failed to load configs/default.toml: {}", e);
            eprintln!("  Using the built-in profile (A -> Space)");
            Config::default()
        }
    };

    let keyboard = MockKeyboardBackend::new();
    let mouse = MockMouseBackend::new();
    let target = Arc::new(SystemTarget::new(keyboard.clone(), mouse.clone()));

    let store = ProfileStore::with_profiles("demo", config.seed_profiles());
    let source = ScriptedSource::new();
    let dispatcher = Dispatcher::new(DesktopFocus::new(target), "padmap-demo");
    let mut engine = Engine::new(source.clone(), dispatcher, store.clone());
    engine.start()?;

    let frame = Duration::from_millis(config.settings.frame_interval_ms);
    let run_frames = |engine: &mut Engine<_, _, _>, count: usize| {
        for _ in 0..count {
            engine.step();
            thread::sleep(frame);
        }
    };

    println!("1. Controller connects");
    source.connect(Controller::new("Xbox", 0, 17, 4));
    run_frames(&mut engine, 1);

    println!("2. Hold A for a few frames");
    source.set_button(0, 0, ButtonSample::pressed());
    run_frames(&mut engine, 3);
    source.set_button(0, 0, ButtonSample::released());
    run_frames(&mut engine, 1);

    println!("3. Push the left stick right, past the threshold");
    source.set_axis(0, 0, 0.9);
    run_frames(&mut engine, 2);

    println!("4. Rebind A to the X key while the stick is held");
    store.commit_edit("any", ControlKey::Button(0), Some(MappingEntry::key("KeyX")))?;
    run_frames(&mut engine, 2);

    println!("5. Controller disconnects with the stick still pushed");
    source.disconnect(0);
    run_frames(&mut engine, 1);

    println!();
    println!("Engine state: {:?}", engine.state());
    println!("Keyboard actions recorded: {}", keyboard.actions().len());
    println!("Mouse actions recorded: {}", mouse.actions().len());
    println!("Keys still held: {:?}", keyboard.pressed_keys());

    engine.stop();
    Ok(())
}
