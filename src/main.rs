use galaxy_gpu::{Simulation, SimulationConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };

    if let Err(e) = Simulation::new().with_config(config).run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
