//! Text commands read from stdin by the bundled binary

use crate::protocol::Command;

/// Degrees or power units moved by one arrow-style command
pub const NUDGE_STEP: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: aim <angle> <power>")]
    AimUsage,
}

/// Parse one input line into a driver command
pub fn parse_command(line: &str) -> Result<Command, CommandParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(CommandParseError::Empty);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => Command::StartGame,
        "options" => Command::OpenOptions,
        "back" => Command::Back,
        "music" => Command::ToggleMusic,
        "aim" => {
            let angle = parse_number(words.next())?;
            let power = parse_number(words.next())?;
            if words.next().is_some() {
                return Err(CommandParseError::AimUsage);
            }
            Command::SetAim { angle, power }
        }
        "left" => nudge(-NUDGE_STEP, 0.0),
        "right" => nudge(NUDGE_STEP, 0.0),
        "up" => nudge(0.0, NUDGE_STEP),
        "down" => nudge(0.0, -NUDGE_STEP),
        "fire" | "space" => Command::Fire,
        "new" => Command::NewMatch,
        "quit" | "exit" => Command::Shutdown,
        other => return Err(CommandParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn nudge(angle: f64, power: f64) -> Command {
    Command::NudgeAim { angle, power }
}

fn parse_number(word: Option<&str>) -> Result<f64, CommandParseError> {
    word.and_then(|w| w.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or(CommandParseError::AimUsage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_commands() {
        assert_eq!(parse_command("start"), Ok(Command::StartGame));
        assert_eq!(parse_command("  OPTIONS "), Ok(Command::OpenOptions));
        assert_eq!(parse_command("back"), Ok(Command::Back));
        assert_eq!(parse_command("music"), Ok(Command::ToggleMusic));
        assert_eq!(parse_command("quit"), Ok(Command::Shutdown));
    }

    #[test]
    fn aim_takes_two_numbers() {
        assert_eq!(
            parse_command("aim 30 62.5"),
            Ok(Command::SetAim {
                angle: 30.0,
                power: 62.5
            })
        );
        assert_eq!(parse_command("aim 30"), Err(CommandParseError::AimUsage));
        assert_eq!(parse_command("aim x 4"), Err(CommandParseError::AimUsage));
        assert_eq!(parse_command("aim 1 2 3"), Err(CommandParseError::AimUsage));
        assert_eq!(parse_command("aim inf 2"), Err(CommandParseError::AimUsage));
    }

    #[test]
    fn arrows_nudge_by_five() {
        assert_eq!(
            parse_command("left"),
            Ok(Command::NudgeAim {
                angle: -5.0,
                power: 0.0
            })
        );
        assert_eq!(
            parse_command("up"),
            Ok(Command::NudgeAim {
                angle: 0.0,
                power: 5.0
            })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_command("   "), Err(CommandParseError::Empty));
        assert_eq!(
            parse_command("jump"),
            Err(CommandParseError::Unknown("jump".into()))
        );
    }
}
