use crate::scene::abdomen;
use anyhow::Result;
use horay::math::{Pose, Quat, Vec3};
use horay::scene::OrganScene;
use horay::{
    ColorBitmap, CullerDesc, DecoderDesc, HorayEvent, PipelineDesc, ProbeConfig,
    UltrasoundPipeline,
};
use std::time::Duration;

const SWEEP_FRAMES: u64 = 120;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Half-angle of the sweep, in radians.
const SWEEP_YAW: f32 = 0.6;

const PREVIEW_COLUMNS: usize = 72;
const PREVIEW_ROWS: usize = 24;
const PREVIEW_RAMP: &[u8] = b" .:-=+*#%@";

pub fn run_cli_sweep() -> Result<()> {
    let scene = abdomen()?;
    log::info!("=== Sweeping probe over {} organs ===", scene.len());
    sweep(&scene)?;

    log::info!("\n=== Looking away from the scene ===");
    look_away(&scene)?;
    Ok(())
}

fn sweep(scene: &OrganScene) -> Result<()> {
    let desc = PipelineDesc::default()
        .with_decoder(DecoderDesc::default().with_size(320, 240))
        .with_culler(CullerDesc::default().with_scanlines_per_frame(8))
        .with_blur(2);
    let probe = ProbeConfig::default()
        .with_arc_degrees(70.0)
        .with_distances(0.5, 10.0)
        .with_noise_level(0.05);
    let mut pipeline = UltrasoundPipeline::new(desc, scene, probe)?;
    log::info!("Effects: {:?}", pipeline.effect_names());

    for frame in 0..SWEEP_FRAMES {
        let phase = frame as f32 / SWEEP_FRAMES as f32 * std::f32::consts::TAU;
        let yaw = SWEEP_YAW * phase.sin();
        pipeline
            .probe_config_mut()
            .set_pose(Pose::new(Vec3::ZERO, Quat::from_rotation_y(yaw)));

        let now = FRAME_INTERVAL * frame as u32;
        pipeline.render_frame_at(scene, now);
        log_events(scene, &pipeline);

        for timing in pipeline.poll_timing_events() {
            if timing.frame_index % 20 == 0 {
                log::info!(
                    "Frame {:>3}: yaw {:+.2} rad, {} candidate(s), {} echo(es), scan {} µs, decode {} µs, post {} µs, total {} µs",
                    timing.frame_index,
                    yaw,
                    timing.candidates,
                    timing.echoes,
                    timing.scan_time_us(),
                    timing.decode_time_us,
                    timing.post_time_us,
                    timing.total_time_us
                );
            }
        }
    }

    log::info!(
        "Rendered {} frames, {} effect(s)",
        pipeline.frames_rendered(),
        pipeline.effect_names().len()
    );
    log::info!("Preview:\n{}", ascii_preview(pipeline.last_image()));
    Ok(())
}

fn look_away(scene: &OrganScene) -> Result<()> {
    let desc = PipelineDesc::default()
        .with_decoder(DecoderDesc::default().with_size(160, 120))
        .with_culler(CullerDesc::default().with_expiration(Duration::from_millis(500)));
    let mut pipeline = UltrasoundPipeline::new(desc, scene, ProbeConfig::default())?;

    pipeline.render_frame_at(scene, Duration::ZERO);
    for frame in 1..8 {
        pipeline.render_frame_at(scene, FRAME_INTERVAL * frame);
    }
    log_events(scene, &pipeline);

    log::info!("Turning the probe around...");
    pipeline.probe_config_mut().set_rotation(Quat::from_rotation_y(std::f32::consts::PI));
    for step in 1..=4 {
        pipeline.render_frame_at(scene, Duration::from_millis(300 * step));
        log_events(scene, &pipeline);
    }

    let silent = pipeline
        .poll_timing_events()
        .last()
        .is_some_and(|timing| timing.echoes == 0);
    log::info!("Frame after turning away is silent: {}", silent);
    Ok(())
}

fn log_events(scene: &OrganScene, pipeline: &UltrasoundPipeline) {
    for event in pipeline.poll_events() {
        let name = event
            .organ()
            .and_then(|organ| scene.get(organ))
            .map(|organ| organ.name.as_str())
            .unwrap_or("?");
        match event {
            HorayEvent::OrganEntered { organ } => {
                log::info!("CLI: {} ({}) entered the view", name, organ);
            }
            HorayEvent::OrganExpired { organ, last_seen } => {
                log::info!(
                    "CLI: {} ({}) expired, last seen at {:.2}s",
                    name,
                    organ,
                    last_seen.as_secs_f32()
                );
            }
            HorayEvent::PostProcessTimeout {
                effect,
                unfinished,
                waited,
            } => {
                log::warn!(
                    "CLI: {} left {} partition(s) unfinished after {:?}",
                    effect,
                    unfinished,
                    waited
                );
            }
        }
    }
}

/// Coarse text rendering of a raster by luminance.
fn ascii_preview(image: &ColorBitmap) -> String {
    let cell_w = (image.width() / PREVIEW_COLUMNS).max(1);
    let cell_h = (image.height() / PREVIEW_ROWS).max(1);
    let mut text = String::with_capacity((PREVIEW_COLUMNS + 1) * PREVIEW_ROWS);

    for row in (0..image.height()).step_by(cell_h) {
        for col in (0..image.width()).step_by(cell_w) {
            let mut sum = 0.0;
            let mut count = 0;
            for y in row..(row + cell_h).min(image.height()) {
                for x in col..(col + cell_w).min(image.width()) {
                    if let Some(pixel) = image.get(y, x) {
                        sum += pixel.luminance();
                        count += 1;
                    }
                }
            }
            let value = if count > 0 { sum / count as f32 } else { 0.0 };
            let index = (value.clamp(0.0, 1.0) * (PREVIEW_RAMP.len() - 1) as f32).round() as usize;
            text.push(PREVIEW_RAMP[index] as char);
        }
        text.push('\n');
    }
    text
}
