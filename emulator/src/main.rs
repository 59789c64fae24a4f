mod session;

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let script = parse_args().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: shutter-emulator [--script <path>]");
        process::exit(2);
    });

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new();

    if let Some(path) = script {
        let contents = fs::read_to_string(&path)?;
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            writeln!(writer, "> {trimmed}")?;
            for response in session.handle_command(trimmed) {
                writeln!(writer, "{response}")?;
            }
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Camera Shutter Emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_args() -> Result<Option<String>, String> {
    let mut args = env::args().skip(1);
    match args.next() {
        None => Ok(None),
        Some(arg) => {
            if let Some(path) = arg.strip_prefix("--script=") {
                Ok(Some(path.to_string()))
            } else if arg == "--script" {
                args.next()
                    .map(Some)
                    .ok_or_else(|| "Expected path after --script".to_string())
            } else {
                Err(format!("Unknown argument `{arg}`"))
            }
        }
    }
}
