#![allow(dead_code)]

use taxi_core::contract::{OverlayConfig, PresetLocation, PushEvent};
use taxi_core::view::ViewUpdate;
use taxi_overlay::controller::OverlayController;
use taxi_overlay::settings::OverlaySettings;
use taxi_overlay::shell::RecordingView;

use super::host::ScriptedHost;

pub type TestController = OverlayController<ScriptedHost, RecordingView>;

pub fn config(names: &[&str], sound_effects: bool) -> OverlayConfig {
    OverlayConfig {
        preset_locations: Some(
            names
                .iter()
                .map(|name| PresetLocation {
                    name: name.to_string(),
                })
                .collect(),
        ),
        sound_effects: Some(sound_effects),
    }
}

pub fn controller(host: &ScriptedHost) -> TestController {
    controller_with(host, OverlaySettings::default())
}

pub fn controller_with(host: &ScriptedHost, settings: OverlaySettings) -> TestController {
    OverlayController::new(host.clone(), RecordingView::default(), settings)
}

/// Controller with the overlay already open on `names`. The view starts empty.
pub fn opened(host: &ScriptedHost, names: &[&str]) -> TestController {
    let mut controller = controller(host);
    controller.handle_push(PushEvent::OpenUi {
        config: Some(config(names, true)),
    });
    controller.view_mut().take();
    controller
}

pub fn last_proposal(updates: &[ViewUpdate]) -> Option<(String, String)> {
    updates.iter().rev().find_map(|update| match update {
        ViewUpdate::Proposal { fare, eta } => Some((fare.clone(), eta.clone())),
        _ => None,
    })
}

pub fn last_request_enabled(updates: &[ViewUpdate]) -> Option<bool> {
    updates.iter().rev().find_map(|update| match update {
        ViewUpdate::RequestEnabled { enabled } => Some(*enabled),
        _ => None,
    })
}
