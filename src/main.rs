use std::{env, process};

use flint_lang::Flint;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut flint = Flint::new();

    match args.len() {
        n if n > 2 => {
            eprintln!("Usage golox [script]");
            process::exit(64);
        }
        2 => flint.run_file(&args[1]),
        _ => flint.run_prompt(),
    }
}
