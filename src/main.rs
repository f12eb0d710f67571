use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use bounce::RunConfig;

fn init_logging() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .expect("console logging config");
    log4rs::init_config(config).expect("logging init");
}

fn main() {
    init_logging();
    let config = RunConfig {
        ndim: 2,
        num_balls: 40,
        ball_radius: 0.4,
        domain_size: vec![16., 8.],
        simulation_time: 60.,
        ..RunConfig::default()
    };
    info!(
        "{} balls of radius {} in a {:?} box",
        config.num_balls, config.ball_radius, config.domain_size
    );
    if let Err(err) = bounce::run(&config) {
        error!("simulation aborted: {}", err);
        std::process::exit(1);
    }
}
