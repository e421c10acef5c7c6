use super::profiling::draw_profiling_widget;
use crate::scene::abdomen;
use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use horay::math::{Pose, Quat, Vec2 as PlaneVec, Vec3};
use horay::scene::{OrganScene, Shape};
use horay::{
    ColorBitmap, DisplaySink, FrameTimingEvent, HorayEvent, OrganId, Palette, PipelineDesc,
    ProbeConfig, UltrasoundPipeline,
};
use std::collections::{HashSet, VecDeque};

const TIMING_HISTORY: usize = 240;
const FRAME_BUDGET_US: u64 = 16_667;
const PALETTES: [Palette; 3] = [Palette::WhiteOnBlack, Palette::BlackOnWhite, Palette::Tissue];

/// Uploads finished rasters into an egui texture.
struct TextureSink {
    ctx: egui::Context,
    texture: Option<egui::TextureHandle>,
}

impl DisplaySink for TextureSink {
    fn present(&mut self, bitmap: &ColorBitmap) {
        let image = egui::ColorImage::from_rgb(
            [bitmap.width(), bitmap.height()],
            &bitmap.to_rgb8_bytes(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(self.ctx.load_texture("ultrasound", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

/// Post-processing toggles mirrored into the pipeline descriptor.
#[derive(Clone, PartialEq)]
struct EffectSettings {
    palette: Palette,
    blur: bool,
    blur_taps: usize,
    grayscale_blur: bool,
    invert: bool,
}

pub struct HorayDemo {
    scene: OrganScene,
    pipeline: UltrasoundPipeline,
    sink: TextureSink,
    timing_history: VecDeque<FrameTimingEvent>,
    in_view: HashSet<OrganId>,
    effects: EffectSettings,
    config_error: Option<String>,

    // Scene view
    view_center: Vec3,
    view_half_extent: f32,
    dragging_probe: bool,
}

impl HorayDemo {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .try_init();

        let scene = abdomen()?;
        let probe = ProbeConfig::default()
            .with_arc_degrees(70.0)
            .with_distances(0.5, 10.0)
            .with_noise_level(0.05);
        let pipeline = UltrasoundPipeline::new(PipelineDesc::default(), &scene, probe)?;
        log::info!("GUI: Pipeline ready with {} organ(s)", scene.len());

        Ok(Self {
            scene,
            pipeline,
            sink: TextureSink {
                ctx: cc.egui_ctx.clone(),
                texture: None,
            },
            timing_history: VecDeque::with_capacity(TIMING_HISTORY),
            in_view: HashSet::new(),
            effects: EffectSettings {
                palette: Palette::WhiteOnBlack,
                blur: false,
                blur_taps: 2,
                grayscale_blur: false,
                invert: false,
            },
            config_error: None,
            view_center: Vec3::new(0.0, 0.0, 5.0),
            view_half_extent: 7.0,
            dragging_probe: false,
        })
    }

    fn scale(&self, rect: Rect) -> f32 {
        rect.width().min(rect.height()) / (self.view_half_extent * 2.0)
    }

    fn world_to_screen(&self, world_pos: Vec3, rect: Rect) -> Pos2 {
        // World: X right, Z forward (up on screen)
        let center = rect.center();
        let scale = self.scale(rect);
        let offset = world_pos - self.view_center;
        Pos2::new(center.x + offset.x * scale, center.y - offset.z * scale)
    }

    fn screen_to_world(&self, screen_pos: Pos2, rect: Rect) -> Vec3 {
        let center = rect.center();
        let scale = self.scale(rect);
        self.view_center
            + Vec3::new(
                (screen_pos.x - center.x) / scale,
                0.0,
                -(screen_pos.y - center.y) / scale,
            )
    }

    fn apply_effects(&mut self, settings: EffectSettings) {
        let mut desc = self.pipeline.desc().clone().with_invert(settings.invert);
        desc.decoder.palette = settings.palette;
        desc.blur_taps = settings.blur.then_some(settings.blur_taps);
        desc.grayscale_blur = settings.blur && settings.grayscale_blur;

        match self.pipeline.set_desc(desc) {
            Ok(()) => {
                log::info!("GUI: Effects now {:?}", self.pipeline.effect_names());
                self.effects = settings;
                self.config_error = None;
            }
            Err(e) => {
                log::warn!("GUI: Rejected effect settings: {}", e);
                self.config_error = Some(e.to_string());
            }
        }
    }

    fn handle_events(&mut self) {
        for event in self.pipeline.poll_events() {
            match event {
                HorayEvent::OrganEntered { organ } => {
                    log::info!("GUI: {} entered the view", self.organ_name(organ));
                    self.in_view.insert(organ);
                }
                HorayEvent::OrganExpired { organ, .. } => {
                    log::info!("GUI: {} left the view", self.organ_name(organ));
                    self.in_view.remove(&organ);
                }
                HorayEvent::PostProcessTimeout {
                    effect, unfinished, ..
                } => {
                    log::warn!(
                        "GUI: {} timed out with {} unfinished partition(s)",
                        effect,
                        unfinished
                    );
                }
            }
        }

        for timing in self.pipeline.poll_timing_events() {
            if self.timing_history.len() == TIMING_HISTORY {
                self.timing_history.pop_front();
            }
            self.timing_history.push_back(timing);
        }
    }

    fn organ_name(&self, organ: OrganId) -> String {
        self.scene
            .get(organ)
            .map(|o| o.name.clone())
            .unwrap_or_else(|| organ.to_string())
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect) {
        let min = self.screen_to_world(rect.left_bottom(), rect);
        let max = self.screen_to_world(rect.right_top(), rect);

        for x in (min.x.ceil() as i32)..=(max.x.floor() as i32) {
            let top = self.world_to_screen(Vec3::new(x as f32, 0.0, max.z), rect);
            let bottom = self.world_to_screen(Vec3::new(x as f32, 0.0, min.z), rect);
            painter.line_segment([top, bottom], Stroke::new(1.0, Color32::from_gray(50)));
        }
        for z in (min.z.ceil() as i32)..=(max.z.floor() as i32) {
            let left = self.world_to_screen(Vec3::new(min.x, 0.0, z as f32), rect);
            let right = self.world_to_screen(Vec3::new(max.x, 0.0, z as f32), rect);
            painter.line_segment([left, right], Stroke::new(1.0, Color32::from_gray(50)));
        }
    }

    fn draw_organs(&self, painter: &egui::Painter, rect: Rect) {
        for (id, organ) in self.scene.iter() {
            let [r, g, b] = organ.material.color.to_rgb8();
            let fill = if organ.tagged {
                Color32::from_rgba_unmultiplied(r, g, b, 110)
            } else {
                Color32::from_gray(40)
            };
            let stroke = if self.in_view.contains(&id) {
                Stroke::new(2.0, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_gray(140))
            };

            match organ.shape {
                Shape::Sphere { center, radius } => {
                    let pos = self.world_to_screen(center, rect);
                    let radius = radius * self.scale(rect);
                    painter.circle(pos, radius, fill, stroke);
                }
                Shape::Cuboid {
                    center,
                    half_extents,
                    rotation,
                } => {
                    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                        .iter()
                        .map(|&(sx, sz)| {
                            let local = Vec3::new(half_extents.x * sx, 0.0, half_extents.z * sz);
                            self.world_to_screen(center + rotation * local, rect)
                        })
                        .collect();
                    painter.add(egui::Shape::convex_polygon(corners, fill, stroke));
                }
            }

            painter.text(
                self.world_to_screen(organ.shape.center(), rect),
                egui::Align2::CENTER_CENTER,
                &organ.name,
                egui::FontId::proportional(12.0),
                Color32::WHITE,
            );
        }
    }

    fn draw_probe(&self, painter: &egui::Painter, rect: Rect) {
        let config = self.pipeline.probe_config();
        let pose = config.pose();
        let half_arc = config.arc_degrees().to_radians() / 2.0;
        let fan_color = Color32::from_rgb(80, 220, 120);

        let arc_points = |distance: f32| -> Vec<Pos2> {
            (0..=24)
                .map(|i| {
                    let angle = -half_arc + 2.0 * half_arc * i as f32 / 24.0;
                    let projected = PlaneVec::new(angle.sin(), angle.cos()) * distance;
                    self.world_to_screen(pose.plane_to_world(projected), rect)
                })
                .collect()
        };
        let near = arc_points(config.min_distance());
        let far = arc_points(config.max_distance());

        for window in far.windows(2).chain(near.windows(2)) {
            painter.line_segment([window[0], window[1]], Stroke::new(1.5, fan_color));
        }
        for (start, end) in [(near[0], far[0]), (near[near.len() - 1], far[far.len() - 1])] {
            painter.line_segment([start, end], Stroke::new(1.5, fan_color));
        }

        let origin = self.world_to_screen(pose.position, rect);
        painter.circle_filled(origin, 8.0, Color32::from_rgb(255, 50, 50));
        painter.circle_stroke(origin, 8.0, Stroke::new(2.0, Color32::WHITE));
        painter.text(
            origin + Vec2::new(0.0, 15.0),
            egui::Align2::CENTER_TOP,
            "Probe",
            egui::FontId::proportional(14.0),
            Color32::WHITE,
        );
    }

    fn handle_mouse_interaction(&mut self, response: &egui::Response, rect: Rect) {
        if response.drag_stopped() && self.dragging_probe {
            log::debug!("GUI: Stopped dragging probe");
            self.dragging_probe = false;
        }

        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let world = self.screen_to_world(pointer, rect);
        let pose = self.pipeline.probe_config().pose();

        if response.drag_started_by(egui::PointerButton::Primary) {
            let origin = self.world_to_screen(pose.position, rect);
            self.dragging_probe = origin.distance(pointer) < 15.0;
            if self.dragging_probe {
                log::debug!("GUI: Started dragging probe");
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) && self.dragging_probe {
            let position = Vec3::new(world.x, pose.position.y, world.z);
            self.pipeline.probe_config_mut().set_position(position);
        } else if response.dragged_by(egui::PointerButton::Secondary) {
            // Aim the probe at the pointer
            let aim = world - pose.position;
            if aim.x != 0.0 || aim.z != 0.0 {
                let yaw = aim.x.atan2(aim.z);
                self.pipeline
                    .probe_config_mut()
                    .set_rotation(Quat::from_rotation_y(yaw));
            }
        }
    }

    fn draw_probe_controls(&mut self, ui: &mut egui::Ui) {
        let config = self.pipeline.probe_config_mut();

        let mut yaw = yaw_of(config.pose());
        if ui
            .add(egui::Slider::new(&mut yaw, -180.0..=180.0).text("Yaw (°)"))
            .changed()
        {
            config.set_rotation(Quat::from_rotation_y(yaw.to_radians()));
        }

        let mut arc = config.arc_degrees();
        if ui
            .add(egui::Slider::new(&mut arc, 1.0..=180.0).text("Arc (°)"))
            .changed()
        {
            config.set_arc_degrees(arc);
        }

        let mut near = config.min_distance();
        if ui
            .add(egui::Slider::new(&mut near, 0.0..=10.0).text("Near"))
            .changed()
        {
            config.set_min_distance(near);
        }

        let mut far = config.max_distance();
        if ui
            .add(egui::Slider::new(&mut far, 0.1..=20.0).text("Far"))
            .changed()
        {
            config.set_max_distance(far);
        }

        let mut scanlines = config.scanlines();
        if ui
            .add(egui::Slider::new(&mut scanlines, 1..=512).text("Scanlines"))
            .changed()
        {
            config.set_scanlines(scanlines);
        }

        let mut points = config.points_per_scanline();
        if ui
            .add(egui::Slider::new(&mut points, 1..=1024).text("Points / line"))
            .changed()
        {
            config.set_points_per_scanline(points);
        }

        let mut gain = config.gain();
        if ui
            .add(egui::Slider::new(&mut gain, 0.0..=4.0).text("Gain"))
            .changed()
        {
            config.set_gain(gain);
        }

        let mut noise = config.noise_level();
        if ui
            .add(egui::Slider::new(&mut noise, 0.0..=1.0).text("Noise"))
            .changed()
        {
            config.set_noise_level(noise);
        }

        if ui.button("Reset pose").clicked() {
            config.set_pose(Pose::identity());
        }
    }

    fn draw_effect_controls(&mut self, ui: &mut egui::Ui) {
        let mut settings = self.effects.clone();

        egui::ComboBox::from_label("Palette")
            .selected_text(settings.palette.name())
            .show_ui(ui, |ui| {
                for palette in PALETTES {
                    ui.selectable_value(&mut settings.palette, palette, palette.name());
                }
            });
        ui.checkbox(&mut settings.blur, "Gaussian blur");
        ui.add_enabled_ui(settings.blur, |ui| {
            ui.add(egui::Slider::new(&mut settings.blur_taps, 1..=8).text("Taps"));
            ui.checkbox(&mut settings.grayscale_blur, "Grayscale blur");
        });
        ui.checkbox(&mut settings.invert, "Invert colors");

        if settings != self.effects {
            self.apply_effects(settings);
        }
        if let Some(error) = &self.config_error {
            ui.colored_label(Color32::RED, error);
        }
    }

    fn draw_organ_list(&self, ui: &mut egui::Ui) {
        ui.label(format!(
            "Organs: {} ({} in view)",
            self.scene.len(),
            self.in_view.len()
        ));
        ui.add_space(5.0);

        for (id, organ) in self.scene.iter() {
            ui.group(|ui| {
                let status = if !organ.tagged {
                    "not imaged"
                } else if self.in_view.contains(&id) {
                    "in view"
                } else {
                    "out of view"
                };
                ui.label(format!("{}: {}", id, organ.name));
                ui.label(format!(
                    "  Echo {:.2}, attenuation {:.3} ({})",
                    organ.material.echogenicity, organ.material.attenuation, status
                ));
            });
        }
    }
}

fn yaw_of(pose: Pose) -> f32 {
    let forward = pose.forward();
    forward.x.atan2(forward.z).to_degrees()
}

impl eframe::App for HorayDemo {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pipeline.present_to(&self.scene, &mut self.sink);
        self.handle_events();

        egui::SidePanel::right("control_panel")
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Probe");
                    ui.separator();
                    self.draw_probe_controls(ui);

                    ui.add_space(10.0);
                    ui.heading("Image");
                    ui.separator();
                    self.draw_effect_controls(ui);

                    ui.add_space(10.0);
                    ui.heading("Scene");
                    ui.separator();
                    self.draw_organ_list(ui);

                    ui.add_space(10.0);
                    draw_profiling_widget(ui, &self.timing_history, FRAME_BUDGET_US);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("HORAY Ultrasound Demo");
            ui.label("Drag the probe to move it, right-drag to aim it");
            ui.separator();

            ui.columns(2, |columns| {
                let ui = &mut columns[0];
                let size = ui.available_width().min(ui.available_height());
                let (response, painter) =
                    ui.allocate_painter(Vec2::splat(size), egui::Sense::click_and_drag());
                let rect = response.rect;
                painter.rect_filled(rect, 0.0, Color32::from_gray(20));
                self.draw_grid(&painter, rect);
                self.draw_organs(&painter, rect);
                self.draw_probe(&painter, rect);
                self.handle_mouse_interaction(&response, rect);

                let ui = &mut columns[1];
                match &self.sink.texture {
                    Some(texture) => {
                        let aspect = texture.aspect_ratio();
                        let width = ui.available_width().min(ui.available_height() * aspect);
                        ui.image((texture.id(), Vec2::new(width, width / aspect)));
                    }
                    None => {
                        ui.label("Waiting for the first frame...");
                    }
                }
            });
        });

        ctx.request_repaint();
    }
}
