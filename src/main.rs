#![allow(non_snake_case)]
use RustedTrajectory::Examples::trajectory_examples::trajectory_examples;
use RustedTrajectory::Utils::logger::{LoggerConfig, init_logger};
use log::LevelFilter;

fn main() {
    let example = 1;
    let config = LoggerConfig {
        level: LevelFilter::Info,
        log_to_console: true,
        log_file: None,
    };
    match init_logger(config) {
        Ok(true) => {}
        Ok(false) => eprintln!("logger was not installed"),
        Err(e) => eprintln!("logger error: {}", e),
    }
    match example {
        0..=2 => {
            if let Err(e) = trajectory_examples(example) {
                eprintln!("example {} failed: {}", example, e);
            }
        }
        _ => {
            for i in 0..3 {
                if let Err(e) = trajectory_examples(i) {
                    eprintln!("example {} failed: {}", i, e);
                }
            }
        }
    }
}
