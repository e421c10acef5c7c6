mod cli;
mod gui;
mod scene;

fn main() -> Result<(), eframe::Error> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--cli" {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
        if let Err(e) = cli::run_cli_sweep() {
            log::error!("CLI sweep failed: {:#}", e);
        }
        Ok(())
    } else {
        gui::run()
    }
}
