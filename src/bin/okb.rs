//! okb CLI - interactive ordered Knuth-Bendix completion.
//!
//! Set `OKB_LOG=okb=debug` (with the `tracing` feature) to watch the engine.

use std::io::{stdin, stdout, BufReader};

use okb::repl::Repl;
use okb::trace::init_subscriber;

fn main() {
    init_subscriber();

    let mut repl = Repl::new();
    let mut input = BufReader::new(stdin().lock());
    let mut output = stdout().lock();

    if let Err(e) = repl.run(&mut input, &mut output) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
