use std::process;

fn main() {
    if let Err(err) = eventgate::app::run() {
        eprintln!("fatal: {err}");
        process::exit(1);
    }
}
