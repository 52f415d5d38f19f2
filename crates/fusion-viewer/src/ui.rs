//! On-screen overlay drawn with egui on top of the scene.

use crate::data::types::TrackingState;

const HUD_GREEN: egui::Color32 = egui::Color32::from_rgb(51, 255, 51);
const HUD_RED: egui::Color32 = egui::Color32::from_rgb(255, 51, 51);

/// Figures shown in the HUD for one frame.
#[derive(Debug, Clone, Copy)]
pub struct HudStats {
    pub tracking: TrackingState,
    pub following: bool,
    pub chunks: usize,
    pub points: u64,
}

/// Text colour of the tracking state line.
pub fn tracking_color(state: TrackingState) -> egui::Color32 {
    if state == TrackingState::Ok {
        HUD_GREEN
    } else {
        HUD_RED
    }
}

/// Draws the follow-mode hint, tracking state and map size in the top-left corner.
pub fn draw_hud(ctx: &egui::Context, stats: &HudStats) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .interactable(false)
        .show(ctx, |ui| {
            let hint = if stats.following {
                "Press 'F' to un/follow the camera (following)"
            } else {
                "Press 'F' to un/follow the camera"
            };
            ui.label(egui::RichText::new(hint).color(egui::Color32::WHITE));

            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("POSITIONAL TRACKING :").color(egui::Color32::WHITE));
                ui.label(
                    egui::RichText::new(stats.tracking.to_string())
                        .color(tracking_color(stats.tracking))
                        .strong(),
                );
            });

            ui.label(
                egui::RichText::new(format!("{} chunks | {} points", stats.chunks, stats.points))
                    .color(egui::Color32::LIGHT_GRAY)
                    .small(),
            );
        });
}
