//! Main egui application with the avatar viewport.

#![cfg(feature = "native-ui")]

use std::sync::Arc;

use eframe::egui;

use crate::scene::skinning;
use crate::skeleton::TOTAL_JOINTS;
use crate::AppState;

use super::renderer::PuppetRenderer;
use super::viewport::PuppetViewportCallback;

/// The native viewer window.
pub struct ViewerApp {
    state: Arc<AppState>,
    /// GPU renderer (created from the wgpu render state)
    renderer: Option<Arc<PuppetRenderer>>,
    /// Error message if the renderer could not be created
    init_error: Option<String>,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: Arc<AppState>) -> Self {
        let mut app = Self {
            state,
            renderer: None,
            init_error: None,
        };

        app.init_renderer(cc);
        app
    }

    fn init_renderer(&mut self, cc: &eframe::CreationContext<'_>) {
        let render_state = match cc.wgpu_render_state.as_ref() {
            Some(rs) => rs,
            None => {
                self.init_error = Some("wgpu render state not available".to_string());
                return;
            }
        };

        let scene = self.state.avatar.scene();
        let window = &self.state.config.window;

        let renderer = Arc::new(PuppetRenderer::new(
            &render_state.device,
            &render_state.queue,
            render_state.target_format,
            scene,
            &self.state.config.camera,
            window.width,
            window.height,
        ));

        // Upload the rest pose so the first frame shows something
        self.state.avatar.update();
        let world = scene.world_transforms();
        let skinned: Vec<_> = (0..scene.meshes.len())
            .map(|mesh_idx| skinning::skin_vertices(scene, mesh_idx, &world))
            .collect();
        renderer.update_vertices(&render_state.queue, scene, &skinned);

        self.renderer = Some(renderer);
    }

    /// Launch the viewer window. Blocks until the window is closed.
    pub fn run(state: Arc<AppState>) -> eframe::Result {
        let window = &state.config.window;
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title("oscpuppet")
                .with_inner_size([window.width as f32, window.height as f32]),
            ..Default::default()
        };

        eframe::run_native(
            "oscpuppet",
            options,
            Box::new(move |cc| Ok(Box::new(Self::new(cc, state)))),
        )
    }

    /// Advance the scene and upload the skinned pose for this frame.
    fn update_pose(&self, render_state: &eframe::egui_wgpu::RenderState) {
        let renderer = match &self.renderer {
            Some(r) => r,
            None => return,
        };

        let avatar = &self.state.avatar;
        avatar.update();

        let scene = avatar.scene();
        let world = scene.world_transforms();
        let skinned: Vec<_> = (0..scene.meshes.len())
            .map(|mesh_idx| skinning::skin_vertices(scene, mesh_idx, &world))
            .collect();

        renderer.update_vertices(&render_state.queue, scene, &skinned);
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if let Some(render_state) = frame.wgpu_render_state() {
            self.update_pose(render_state);
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.label("oscpuppet");
                ui.separator();
                ui.label("motion capture viewer");
            });
        });

        egui::SidePanel::left("status").show(ctx, |ui| {
            ui.heading("Status");
            ui.separator();

            let config = &self.state.config;
            ui.label(format!("Model: {}", config.model.path.display()));
            ui.label(format!("Stream port: {}", config.osc.port));

            let report = self.state.avatar.bind_report();
            ui.label(format!("Joints bound: {}/{}", report.bound, TOTAL_JOINTS));
            if !report.missing.is_empty() {
                ui.collapsing(format!("Missing ({})", report.missing.len()), |ui| {
                    for name in &report.missing {
                        ui.label(*name);
                    }
                });
            }

            if let Some(ref err) = self.init_error {
                ui.separator();
                ui.colored_label(egui::Color32::RED, err);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(renderer) = &self.renderer {
                let available_size = ui.available_size();
                let (rect, _response) =
                    ui.allocate_exact_size(available_size, egui::Sense::hover());

                let ppp = ctx.pixels_per_point();
                let vp_width = (available_size.x * ppp) as u32;
                let vp_height = (available_size.y * ppp) as u32;

                ui.painter()
                    .add(eframe::egui_wgpu::Callback::new_paint_callback(
                        rect,
                        PuppetViewportCallback {
                            renderer: renderer.clone(),
                            viewport_width: vp_width.max(1),
                            viewport_height: vp_height.max(1),
                        },
                    ));
            } else {
                ui.heading("Avatar");
                if let Some(ref err) = self.init_error {
                    ui.colored_label(egui::Color32::RED, err);
                }
            }
        });

        // Repaint continuously so incoming motion shows up immediately
        ctx.request_repaint();
    }
}
