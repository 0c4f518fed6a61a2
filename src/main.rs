//! fdcalllog main entrypoint.

use fdcalllog::run;
use fdcalllog::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
