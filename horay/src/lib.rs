//! # HORAY
//!
//! Synthetic B-mode ultrasound imaging by HOmogeneous RAYcasting.
//!
//! A virtual probe sweeps a fan of scanlines through a scene of organ volumes. Each sample
//! that falls inside an organ echoes part of a per-scanline pulse back as brightness, with the
//! pulse weakening as it crosses tissue. The samples are projected into a raster, optionally
//! blurred and inverted, and handed to a display.
//!
//! ## Quick Start
//!
//! ```
//! use horay::math::{Pose, Quat, Vec3};
//! use horay::scene::{OrganScene, Shape, TissueMaterial};
//! use horay::*;
//!
//! // Describe the anatomy
//! let mut scene = OrganScene::new();
//! scene.add_organ("liver", Shape::sphere(Vec3::new(0.0, 0.0, 6.0), 2.5), TissueMaterial::LIVER)?;
//! scene.add_organ("rib", Shape::axis_aligned_box(Vec3::new(1.5, 0.0, 2.5), Vec3::new(0.4, 2.0, 0.3)), TissueMaterial::BONE)?;
//!
//! // Configure the probe (out-of-range values are clamped)
//! let probe = ProbeConfig::default()
//!     .with_arc_degrees(70.0)
//!     .with_distances(0.5, 10.0)
//!     .with_pose(Pose::new(Vec3::ZERO, Quat::IDENTITY));
//!
//! // Build the pipeline and render
//! let desc = PipelineDesc::default().with_blur(2);
//! let mut pipeline = UltrasoundPipeline::new(desc, &scene, probe)?;
//! let image = pipeline.render_frame(&scene);
//! let rgb8 = image.to_rgb8_bytes();
//! assert_eq!(rgb8.len(), 640 * 480 * 3);
//!
//! // Move the probe for the next frame
//! pipeline.probe_config_mut().set_position(Vec3::new(0.5, 0.0, 0.0));
//!
//! // Poll for events
//! for event in pipeline.poll_events() {
//!     if let HorayEvent::OrganEntered { organ } = event {
//!         println!("{organ} is now in view");
//!     }
//! }
//! # Ok::<(), HorayError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`UltrasoundPipeline`]**: drives one frame from probe output to finished raster
//! - **[`ProbeConfig`]**: clamp-on-write scan parameters (pose, depth, arc, density, gain)
//! - **[`SceneQuery`](scene::SceneQuery)**: the geometry interface; [`OrganScene`](scene::OrganScene) is a ready-made implementation
//! - **[`OrganCuller`](culler::OrganCuller)**: time-windowed cache of organs worth testing
//! - **[`ImageDecoder`]**: scan-plane to pixel mapping and palettes
//! - **[`PostProcessor`]**: blur and inversion effects run on worker threads with a bounded wait
//! - **[`HorayEvent`]** / **[`FrameTimingEvent`]**: diagnostics drained with `poll_events()` / `poll_timing_events()`
//!
//! ## Architecture
//!
//! A frame flows through five stages:
//!
//! 1. **Plane**: lay out the scanline fan for the current configuration (cached until the geometry changes)
//! 2. **Cull**: raycast a few scanlines and refresh the organ presence cache
//! 3. **Shade**: test every point against the candidate organs and attenuate the pulse
//! 4. **Decode**: project points into the raster with the selected palette
//! 5. **Post-process**: fan effects out per channel or per row band and join within a deadline
//!
//! Everything but post-processing runs on the calling thread.
pub mod config;
pub mod culler;
pub mod error;
pub mod events;
pub mod image;
pub mod math;
pub mod pipeline;
pub mod scan;
pub mod scene;

pub use config::{CullerDesc, DecoderDesc, PipelineDesc, ProbeConfig};
pub use culler::OrganCuller;
pub use error::{HorayError, Result};
pub use events::{FrameTimingEvent, HorayEvent};
pub use image::{
    ColorBitmap, ColorInvert, GaussianBlur, GrayscaleGaussianBlur, ImageDecoder, MonochromeBitmap,
    Palette, PostProcessor, ProcessOutcome, Rgb, RgbBitmap,
};
pub use pipeline::{DisplaySink, UltrasoundPipeline};
pub use scan::{
    HorayProbeOutput, ProbeOutput, ScanEngine, ScanFrame, ScanPoint, Scanline, TestProbeOutput,
};
pub use scene::{OrganId, OrganScene, SceneQuery, TissueMaterial};
