mod app;
pub mod profiling;

pub use app::HorayDemo;

/// Run the GUI demo
pub fn run() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("HORAY Ultrasound Demo"),
        ..Default::default()
    };

    eframe::run_native(
        "HORAY Ultrasound Demo",
        options,
        Box::new(|cc| {
            let app = HorayDemo::new(cc)?;
            Ok(Box::new(app))
        }),
    )
}
