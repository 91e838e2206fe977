use mini_shell::config::Options;
use mini_shell::env::Environment;
use mini_shell::{Interpreter, ProcessTerminator, repl};
use std::io;

fn main() -> anyhow::Result<()> {
    let options: Options = argh::from_env();

    tracing_subscriber::fmt()
        .with_max_level(options.log_level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let mut interpreter = Interpreter::new(
        Environment::new(),
        options.limits(),
        Box::new(ProcessTerminator),
    );

    if let Some(command) = &options.command {
        let Some(line) = repl::accept_line(command) else {
            return Ok(());
        };
        if let Err(err) = interpreter.run_line(line, &mut io::stdout()) {
            repl::report(&err);
            std::process::exit(1);
        }
        return Ok(());
    }

    if !options.no_banner {
        print!("{}", repl::banner(interpreter.env()));
    }
    repl::run(&mut interpreter)
}
