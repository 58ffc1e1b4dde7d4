use std::process;

fn main() {
    if let Err(err) = evrelay::app::run() {
        eprintln!("fatal: {err:#}");
        process::exit(1);
    }
}
