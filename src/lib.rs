use std::sync::Arc;

use tauri::Manager;

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod window;

use app::native::{LoadSettings, TauriBackend};
use app::Shell;
use error::{ResultExt, ShellResult};
use window::crash::CrashPolicy;
use window::{ManagerOptions, PlatformCapabilities, QuitFlag, WindowCatalog, WindowId, WindowManager};

/// Load config and assemble the window manager for this app.
fn build_shell(handle: &tauri::AppHandle) -> ShellResult<Shell> {
    let config_dir = handle
        .path()
        .app_config_dir()
        .context("Failed to resolve config directory")?;
    let config = config::app::init(&config_dir);

    let backend = TauriBackend::new(
        handle.clone(),
        LoadSettings {
            timeout: config.load_timeout(),
            probe: config.probe_before_load,
        },
    )?;

    // Geometry writes run on the Tauri runtime; setup is outside its context.
    let runtime = tauri::async_runtime::handle();
    let _runtime = runtime.inner().enter();

    WindowManager::new(
        backend,
        WindowCatalog::default(),
        ManagerOptions {
            content_base_url: config.content_base_url.clone(),
            crash_policy: CrashPolicy::new(config.crash_loop_threshold()),
            capabilities: PlatformCapabilities::current(),
            geometry_dir: config_dir.join("windows"),
            quit_flag: QuitFlag::default(),
        },
    )
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let mut builder = tauri::Builder::default();

    #[cfg(desktop)]
    {
        // A second launch focuses the running shell instead.
        builder = builder.plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            app::events::spawn_show(app, WindowId::Chat);
        }));
    }

    let app = builder
        .on_window_event(app::events::handle_window_event)
        .invoke_handler(tauri::generate_handler![
            // Window lifecycle commands
            commands::window::open_window,
            commands::window::show_window,
            commands::window::hide_window,
            commands::window::toggle_window,
            commands::window::close_window,
            commands::window::center_window,
            commands::window::retry_connection,
            commands::window::window_phase,
            commands::window::set_window_zoom,
            // Broadcast commands
            commands::window::broadcast,
            commands::window::current_window_id,
            // Config commands
            config::app::get_app_config,
            // Logging commands
            commands::logging::write_log,
            commands::logging::write_logs,
            commands::logging::get_log_dir,
        ])
        .setup(|app| {
            let handle = app.handle().clone();

            match handle.path().app_log_dir() {
                Ok(log_dir) => {
                    if let Err(e) = commands::logging::init_logging(&log_dir) {
                        eprintln!("Failed to initialize logging: {}", e);
                    }
                },
                Err(e) => eprintln!("Failed to resolve log directory: {}", e),
            }

            let shell = Arc::new(build_shell(&handle)?);
            app.manage(shell.clone());

            #[cfg(desktop)]
            app::tray::init(app)?;

            tauri::async_runtime::spawn(async move {
                if let Err(e) = shell.get(WindowId::Chat).await {
                    log::error!("[startup] Failed to open chat window: {}", e);
                }
            });

            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| app::events::handle_run_event(handle, &event));
}
