mod error;
mod session;

use error::{report_to_stderr, Error};
use rustyline::{error::ReadlineError, DefaultEditor};
use session::Session;
use std::{fs, io::{self, IsTerminal, Read}};

/// Runs a line of input in the session, printing the output or the error.
fn run_line(line: &str, session: &mut Session) {
    match session.run(line) {
        Ok(output) => {
            for warning in &output.warnings {
                report_to_stderr(warning, line);
            }
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
        },
        Err(err) => err.report_to_stderr(line),
    }
}

/// Runs every line of the given source in a fresh session.
fn execute(source: &str) {
    let mut session = Session::new();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        run_line(line, &mut session);
    }
}

fn read_source() -> Result<Option<String>, Error> {
    let mut args = std::env::args();
    args.next();

    if let Some(filename) = args.next() {
        // run source file
        Ok(Some(fs::read_to_string(filename)?))
    } else if !io::stdin().is_terminal() {
        // read source from stdin
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(Some(input))
    } else {
        Ok(None)
    }
}

fn main() {
    env_logger::init();

    match read_source() {
        Ok(Some(source)) => execute(&source),
        Ok(None) => {
            // run the repl / interactive mode
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(err) => {
                    eprintln!("error: {}", err);
                    std::process::exit(1);
                },
            };
            let mut session = Session::new();

            fn process_line(rl: &mut DefaultEditor, session: &mut Session) -> Result<(), ReadlineError> {
                let input = rl.readline("> ")?;
                if input.trim().is_empty() {
                    return Ok(());
                }

                rl.add_history_entry(&input)?;

                run_line(&input, session);
                Ok(())
            }

            loop {
                if let Err(err) = process_line(&mut rl, &mut session) {
                    match err {
                        ReadlineError::Eof | ReadlineError::Interrupted => (),
                        _ => eprintln!("{}", err),
                    }
                    break;
                }
            }
        },
        Err(err) => {
            err.report_to_stderr("");
            std::process::exit(1);
        },
    }
}
