use clap::Parser;
use hlogo::Program;
use std::{path::PathBuf, process::exit};

#[derive(Parser)]
struct Args {
    input: PathBuf,
}

fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let prefix = &src[..offset.min(src.len())];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let col = prefix.chars().rev().take_while(|&c| c != '\n').count() + 1;
    (line, col)
}

pub fn main() {
    pretty_env_logger::init();
    let args = Args::parse();
    let input = match std::fs::read_to_string(&args.input) {
        Ok(x) => x,
        Err(e) => {
            println!(
                "Failed to open input file {}: {}",
                args.input.display(),
                e
            );
            exit(1);
        }
    };

    let program = match Program::parse(&input) {
        Ok(p) => p,
        Err(e) => {
            println!("{e}");
            exit(1);
        }
    };
    log::debug!("parsed {}", args.input.display());

    let cmds = match program.trace() {
        Ok(cmds) => cmds,
        Err(e) => {
            let (line, col) = line_col(&input, e.span().start);
            println!("Evaluation error at {line}:{col}: {e}");
            exit(1);
        }
    };

    // One primitive per line; a rendering device can consume this feed.
    log::debug!("emitting {} turtle commands", cmds.len());
    for cmd in cmds {
        println!("{cmd}");
    }
}
