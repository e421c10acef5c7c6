//! Frame driver: probe output -> decoder -> post-processing -> display sink.

use crate::config::{PipelineDesc, ProbeConfig};
use crate::error::Result;
use crate::events::{FrameTimingEvent, HorayEvent};
use crate::image::{
    ColorBitmap, ColorInvert, GaussianBlur, GrayscaleGaussianBlur, ImageDecoder, Palette,
    PostProcessor, ProcessOutcome,
};
use crate::scan::{HorayProbeOutput, ProbeOutput};
use crate::scene::SceneQuery;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use std::time::{Duration, Instant};

/// Timing events kept when nobody polls them.
const TIMING_QUEUE_CAPACITY: usize = 256;

/// Consumer of finished rasters (a texture upload, a file writer, a test probe).
pub trait DisplaySink {
    fn present(&mut self, bitmap: &ColorBitmap);
}

/// Owns everything needed to turn a scene into ultrasound images, one frame per call.
///
/// # Example
///
/// ```
/// use horay::math::Vec3;
/// use horay::scene::{OrganScene, Shape, TissueMaterial};
/// use horay::{PipelineDesc, ProbeConfig, UltrasoundPipeline};
///
/// let mut scene = OrganScene::new();
/// scene.add_organ("liver", Shape::sphere(Vec3::new(0.0, 0.0, 6.0), 2.5), TissueMaterial::LIVER)?;
///
/// let mut pipeline = UltrasoundPipeline::new(PipelineDesc::default(), &scene, ProbeConfig::default())?;
/// let image = pipeline.render_frame(&scene);
/// assert_eq!((image.width(), image.height()), (640, 480));
///
/// for event in pipeline.poll_events() {
///     println!("{event:?}");
/// }
/// # Ok::<(), horay::HorayError>(())
/// ```
pub struct UltrasoundPipeline {
    desc: PipelineDesc,
    output: Box<dyn ProbeOutput>,
    decoder: ImageDecoder,
    effects: Vec<Box<dyn PostProcessor>>,
    bitmap: ColorBitmap,
    event_sender: Sender<HorayEvent>,
    event_receiver: Receiver<HorayEvent>,
    timing_sender: Sender<FrameTimingEvent>,
    timing_receiver: Receiver<FrameTimingEvent>,
    frame_index: u64,
    clock_origin: Instant,
}

impl UltrasoundPipeline {
    /// Builds a pipeline around the HORAY scan engine.
    pub fn new(desc: PipelineDesc, scene: &dyn SceneQuery, probe: ProbeConfig) -> Result<Self> {
        desc.validate()?;
        let output = HorayProbeOutput::new(probe, scene, desc.culler.clone())?;
        Self::with_output(desc, Box::new(output))
    }

    /// Builds a pipeline around any probe output.
    pub fn with_output(desc: PipelineDesc, mut output: Box<dyn ProbeOutput>) -> Result<Self> {
        desc.validate()?;
        let decoder = ImageDecoder::new(desc.decoder.clone())?;
        let effects = Self::build_effects(&desc)?;

        let (event_sender, event_receiver) = unbounded();
        let (timing_sender, timing_receiver) = bounded(TIMING_QUEUE_CAPACITY);
        output.set_event_sender(event_sender.clone());

        log::info!(
            "Ultrasound pipeline: {}x{} {}, {} effect(s), post timeout {:?}",
            desc.decoder.width,
            desc.decoder.height,
            desc.decoder.palette.name(),
            effects.len(),
            desc.post_timeout
        );

        let bitmap = ColorBitmap::new(
            desc.decoder.width,
            desc.decoder.height,
            decoder.background(),
        );
        Ok(Self {
            desc,
            output,
            decoder,
            effects,
            bitmap,
            event_sender,
            event_receiver,
            timing_sender,
            timing_receiver,
            frame_index: 0,
            clock_origin: Instant::now(),
        })
    }

    fn build_effects(desc: &PipelineDesc) -> Result<Vec<Box<dyn PostProcessor>>> {
        let mut effects: Vec<Box<dyn PostProcessor>> = Vec::new();
        if let Some(taps) = desc.blur_taps {
            if desc.grayscale_blur {
                effects.push(Box::new(
                    GrayscaleGaussianBlur::new(taps)?
                        .with_bands(desc.worker_bands)
                        .with_timeout(desc.post_timeout),
                ));
            } else {
                effects.push(Box::new(
                    GaussianBlur::new(taps)?.with_timeout(desc.post_timeout),
                ));
            }
        }
        if desc.invert {
            effects.push(Box::new(ColorInvert::new().with_timeout(desc.post_timeout)));
        }
        Ok(effects)
    }

    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }

    /// Applies new decoder and post-processing settings.
    ///
    /// Culler settings are fixed when the probe output is created and are not changed here.
    pub fn set_desc(&mut self, desc: PipelineDesc) -> Result<()> {
        desc.validate()?;
        self.decoder = ImageDecoder::new(desc.decoder.clone())?;
        self.effects = Self::build_effects(&desc)?;
        self.desc = desc;
        log::debug!(
            "Pipeline reconfigured: {} effect(s), palette {}",
            self.effects.len(),
            self.desc.decoder.palette.name()
        );
        Ok(())
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.decoder.set_palette(palette);
        self.desc.decoder.palette = palette;
    }

    /// Appends a custom effect after the configured ones.
    pub fn add_effect(&mut self, effect: Box<dyn PostProcessor>) {
        self.effects.push(effect);
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|effect| effect.name()).collect()
    }

    pub fn probe_config(&self) -> &ProbeConfig {
        self.output.probe_config()
    }

    pub fn probe_config_mut(&mut self) -> &mut ProbeConfig {
        self.output.probe_config_mut()
    }

    pub fn output(&self) -> &dyn ProbeOutput {
        self.output.as_ref()
    }

    /// Sender for injecting events from outside (custom outputs or effects).
    pub fn event_sender(&self) -> Sender<HorayEvent> {
        self.event_sender.clone()
    }

    /// Renders a frame timestamped with the time elapsed since the pipeline was created.
    pub fn render_frame(&mut self, scene: &dyn SceneQuery) -> &ColorBitmap {
        let now = self.clock_origin.elapsed();
        self.render_frame_at(scene, now)
    }

    /// Renders a frame at an explicit clock reading (used for deterministic playback).
    pub fn render_frame_at(&mut self, scene: &dyn SceneQuery, now: Duration) -> &ColorBitmap {
        let frame_started = Instant::now();

        let frame = self.output.scan(scene, now);
        let stats = self.output.last_stats();

        let started = Instant::now();
        self.decoder.decode_into(&frame, &mut self.bitmap);
        let decode_time_us = started.elapsed().as_micros() as u64;

        let started = Instant::now();
        for effect in &mut self.effects {
            if let ProcessOutcome::TimedOut { unfinished, waited } =
                effect.process(&mut self.bitmap)
            {
                let _ = self.event_sender.send(HorayEvent::PostProcessTimeout {
                    effect: effect.name(),
                    unfinished,
                    waited,
                });
            }
        }
        let post_time_us = started.elapsed().as_micros() as u64;

        let timing = FrameTimingEvent {
            frame_index: self.frame_index,
            plane_time_us: stats.plane_time_us,
            cull_time_us: stats.cull_time_us,
            shade_time_us: stats.shade_time_us,
            decode_time_us,
            post_time_us,
            total_time_us: frame_started.elapsed().as_micros() as u64,
            candidates: stats.candidates,
            echoes: stats.echoes,
        };
        if let Err(TrySendError::Full(_)) = self.timing_sender.try_send(timing) {
            log::trace!("Timing queue full, dropping frame {}", self.frame_index);
        }

        // Scan data does not outlive its raster.
        drop(frame);
        self.frame_index += 1;
        &self.bitmap
    }

    /// Renders a frame and hands it to `sink`.
    pub fn present_to(&mut self, scene: &dyn SceneQuery, sink: &mut dyn DisplaySink) {
        self.render_frame(scene);
        sink.present(&self.bitmap);
    }

    /// The most recently rendered image.
    pub fn last_image(&self) -> &ColorBitmap {
        &self.bitmap
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Drains pending diagnostics events.
    pub fn poll_events(&self) -> Vec<HorayEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Drains pending per-frame timing events.
    pub fn poll_timing_events(&self) -> Vec<FrameTimingEvent> {
        self.timing_receiver.try_iter().collect()
    }
}
