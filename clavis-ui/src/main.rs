mod commands;
mod text_keyboard;

use std::fs::File;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clavis_core::listener::OscListener;
use clavis_core::midi::{self, MidiInputBridge};
use clavis_core::transport::{NullTransport, OscTransport, Transport};
use clavis_core::{dispatch_action, Action, AppState, Config, DispatchError};
use clavis_types::{Key, ScaleType};

use commands::{parse_command, Command, HELP};
use text_keyboard::TextKeyboard;

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clavis")
        .join("clavis.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/clavis.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("clavis: logging disabled, cannot create log file: {}", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, simplelog::Config::default(), log_file) {
        eprintln!("clavis: logging disabled: {}", e);
        return;
    }

    log::info!("clavis starting (log level: {:?})", log_level);
}

#[derive(Debug, Default, PartialEq)]
struct Args {
    verbose: bool,
    config: Option<PathBuf>,
    size: Option<u16>,
    key: Option<String>,
    scale: Option<String>,
    midi: Option<String>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "--verbose" | "-v" => parsed.verbose = true,
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--size" => {
                let v = value("--size")?;
                parsed.size = Some(v.parse().map_err(|_| format!("bad keyboard size '{}'", v))?);
            }
            "--key" => parsed.key = Some(value("--key")?),
            "--scale" => parsed.scale = Some(value("--scale")?),
            "--midi" => parsed.midi = Some(value("--midi")?),
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(parsed)
}

fn print_result(result: Result<clavis_core::DispatchResult, DispatchError>) {
    match result {
        Ok(result) => {
            for line in result.status {
                println!("{}", line);
            }
        }
        Err(e) => {
            log::warn!("{}", e);
            println!("error: {}", e);
        }
    }
}

fn run_command(command: Command, state: &mut AppState, keyboard: &TextKeyboard) {
    match command {
        Command::Dispatch(action) => {
            let redraw = matches!(
                action,
                Action::SelectKey(_)
                    | Action::SelectScale(_)
                    | Action::SetKeyboardSize(_)
                    | Action::KeyOn(_)
                    | Action::KeyOff(_)
            );
            print_result(dispatch_action(&action, state));
            if redraw {
                println!("{}", keyboard.render());
            }
        }
        Command::Show => {
            println!("{} {}", state.key, state.scale_name);
            println!("{}", keyboard.render());
        }
        Command::ListKeys => {
            let circle: Vec<&str> = Key::CIRCLE_OF_FIFTHS.iter().map(|k| k.name()).collect();
            println!("circle of fifths: {}", circle.join(" "));
            let all: Vec<&str> = Key::ALL.iter().map(|k| k.name()).collect();
            println!("all keys: {}", all.join(" "));
        }
        Command::ListScales => {
            for scale in ScaleType::ALL {
                println!("{}", scale.name());
            }
        }
        Command::ListPorts => {
            let ports = midi::list_ports();
            if ports.is_empty() {
                println!("no MIDI input ports");
            }
            for port in ports {
                println!("{}: {}", port.index, port.name);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn command_loop(state: &mut AppState, keyboard: &TextKeyboard) {
    let stdin = std::io::stdin();
    let prompt = || {
        print!("> ");
        let _ = std::io::stdout().flush();
    };
    prompt();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => run_command(command, state, keyboard),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
        prompt();
    }
}

fn run(args: Args) -> Result<(), DispatchError> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    let transport: Arc<dyn Transport> = match OscTransport::connect(config.target_addr()) {
        Ok(t) => Arc::new(t),
        Err(e) => {
            log::warn!(target: "osc", "no outbound transport: {}", e);
            eprintln!("warning: not sending OSC ({})", e);
            Arc::new(NullTransport)
        }
    };

    let keyboard = TextKeyboard::new();
    let mut state = AppState::new(&config, Box::new(keyboard.clone()), transport)?;

    if let Some(size) = args.size {
        dispatch_action(&Action::SetKeyboardSize(size), &mut state)?;
    }
    if let Some(key) = &args.key {
        dispatch_action(&Action::SelectKey(key.clone()), &mut state)?;
    }
    if let Some(scale) = &args.scale {
        dispatch_action(&Action::SelectScale(scale.clone()), &mut state)?;
    }

    let _display = match OscListener::bind(config.listen_addr(), state.highlight.clone()) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::warn!(target: "osc", "cannot listen on {}: {}", config.listen_addr(), e);
            eprintln!("warning: keyboard display not listening ({})", e);
            None
        }
    };

    let _midi = args
        .midi
        .as_deref()
        .or(config.midi_input_port())
        .and_then(|pattern| match MidiInputBridge::connect(pattern, state.highlight.clone()) {
            Ok(bridge) => Some(bridge),
            Err(e) => {
                log::warn!(target: "midi", "{}", e);
                eprintln!("warning: {}", e);
                None
            }
        });

    println!("{} {}", state.key, state.scale_name);
    println!("{}", keyboard.render());
    command_loop(&mut state, &keyboard);

    state.stop_chord_listener();
    log::info!("clavis exiting");
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("clavis: {}", e);
            eprintln!("usage: clavis [-v] [--config PATH] [--size N] [--key K] [--scale S] [--midi PORT]");
            return ExitCode::FAILURE;
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("clavis: {}", e);
            ExitCode::FAILURE
        }
    }
}
