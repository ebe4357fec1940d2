use clavis_core::Action;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  key <name>           select key (C G D A E B F# Gb Db Ab Eb Bb F C#)
  scale <name>         select scale, e.g. MajorScale, DorianScale
  size <61|76|88>      change keyboard size
  on <midi> / off <midi>
  flush                complete the pending chord now
  next / prev          step through played chords
  stop                 release the last played chord
  send on|off          send whole chords as /chordOn
  morph on|off         send /morphNotes between chords
  dedupe on|off        skip chords already played
  listen on|off        start or stop the chord listener
  show | keys | scales | ports | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Action),
    Show,
    ListKeys,
    ListScales,
    ListPorts,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("expected on or off, got '{0}'")]
    NotASwitch(String),
}

fn switch(arg: Option<&str>, command: &'static str) -> Result<bool, ParseError> {
    match arg {
        Some("on") | Some("1") | Some("true") => Ok(true),
        Some("off") | Some("0") | Some("false") => Ok(false),
        Some(other) => Err(ParseError::NotASwitch(other.to_string())),
        None => Err(ParseError::MissingArgument(command)),
    }
}

fn number<T: std::str::FromStr>(arg: Option<&str>, command: &'static str) -> Result<T, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(command))?;
    arg.parse().map_err(|_| ParseError::NotANumber(arg.to_string()))
}

fn word(arg: Option<&str>, command: &'static str) -> Result<String, ParseError> {
    arg.map(str::to_string)
        .ok_or(ParseError::MissingArgument(command))
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    let command = match head {
        "key" => Command::Dispatch(Action::SelectKey(word(arg, "key")?)),
        "scale" => Command::Dispatch(Action::SelectScale(word(arg, "scale")?)),
        "size" => Command::Dispatch(Action::SetKeyboardSize(number(arg, "size")?)),
        "on" => Command::Dispatch(Action::KeyOn(number(arg, "on")?)),
        "off" => Command::Dispatch(Action::KeyOff(number(arg, "off")?)),
        "flush" => Command::Dispatch(Action::FlushChord),
        "next" => Command::Dispatch(Action::ScrubForward),
        "prev" => Command::Dispatch(Action::ScrubBackward),
        "stop" => Command::Dispatch(Action::StopChord),
        "send" => Command::Dispatch(Action::SetSendChord(switch(arg, "send")?)),
        "morph" => Command::Dispatch(Action::SetMorph(switch(arg, "morph")?)),
        "dedupe" => Command::Dispatch(Action::SetFilterDuplicates(switch(arg, "dedupe")?)),
        "listen" => Command::Dispatch(if switch(arg, "listen")? {
            Action::StartChordListener
        } else {
            Action::StopChordListener
        }),
        "show" => Command::Show,
        "keys" => Command::ListKeys,
        "scales" => Command::ListScales,
        "ports" => Command::ListPorts,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        parse_command(line).unwrap().unwrap()
    }

    #[test]
    fn selection_commands() {
        assert_eq!(parse("key F#"), Command::Dispatch(Action::SelectKey("F#".into())));
        assert_eq!(
            parse("  scale   DorianScale "),
            Command::Dispatch(Action::SelectScale("DorianScale".into()))
        );
        assert_eq!(parse("size 88"), Command::Dispatch(Action::SetKeyboardSize(88)));
    }

    #[test]
    fn note_and_chord_commands() {
        assert_eq!(parse("on 60"), Command::Dispatch(Action::KeyOn(60)));
        assert_eq!(parse("off 60"), Command::Dispatch(Action::KeyOff(60)));
        assert_eq!(parse("flush"), Command::Dispatch(Action::FlushChord));
        assert_eq!(parse("prev"), Command::Dispatch(Action::ScrubBackward));
    }

    #[test]
    fn switches() {
        assert_eq!(parse("morph on"), Command::Dispatch(Action::SetMorph(true)));
        assert_eq!(parse("send off"), Command::Dispatch(Action::SetSendChord(false)));
        assert_eq!(parse("listen on"), Command::Dispatch(Action::StartChordListener));
        assert_eq!(parse("listen off"), Command::Dispatch(Action::StopChordListener));
        assert_eq!(
            parse_command("morph maybe"),
            Err(ParseError::NotASwitch("maybe".into()))
        );
    }

    #[test]
    fn errors() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("key"), Err(ParseError::MissingArgument("key")));
        assert_eq!(parse_command("on C4"), Err(ParseError::NotANumber("C4".into())));
        assert_eq!(parse_command("play"), Err(ParseError::Unknown("play".into())));
    }

    #[test]
    fn local_commands() {
        assert_eq!(parse("show"), Command::Show);
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse("scales"), Command::ListScales);
    }
}
