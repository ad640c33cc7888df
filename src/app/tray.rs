//! System tray setup and event handling.

use tauri::{
    image::Image,
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::TrayIconBuilder,
    App,
};

use super::events;
use crate::window::WindowId;

/// Set up the system tray with menu and event handlers.
pub fn init(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    let show = MenuItem::with_id(app, "show_chat", "Show Chat", true, None::<&str>)?;
    let settings = MenuItem::with_id(app, "settings", "Settings...", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
    let separator = PredefinedMenuItem::separator(app)?;

    let menu = Menu::with_items(app, &[&show, &settings, &separator, &quit])?;

    // Load custom tray icon (32x32 is standard for system tray)
    let tray_icon = Image::from_bytes(include_bytes!("../../icons/32x32.png"))?;

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("Chat")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(move |app, event| match event.id.as_ref() {
            "show_chat" => events::spawn_show(app, WindowId::Chat),
            "settings" => events::spawn_show(app, WindowId::Settings),
            "quit" => events::quit(app),
            _ => {},
        })
        .on_tray_icon_event(|tray, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                events::spawn_toggle(tray.app_handle(), WindowId::Chat);
            }
        })
        .build(app)?;

    Ok(())
}
