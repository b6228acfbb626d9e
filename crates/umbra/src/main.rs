use umbra::config::Config;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            umbra::logging::init_logging(None);
            log::error!("{e}");
            std::process::exit(-1);
        }
    };
    umbra::logging::init_logging(config.log_filter.as_deref());

    if let Err(e) = umbra::run(config) {
        log::error!("{e}");
        std::process::exit(-1);
    }
}
