//! Configuration loading helpers for the `scrivener` caller.
//!
//! Configuration flags precede the method name. They are split off and handed
//! to `ortho_config`; everything from the method onwards is parsed by clap.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use scrivener_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--log-filter", "--log-format"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the program name plus leading config flags.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((name, _)) => (name, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and clap.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

/// Splits leading configuration flags from the command arguments. The
/// program name is kept at the front of both lists.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter().peekable();
    while let Some(argument) = remaining.peek() {
        match classify_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push((*argument).clone());
                remaining.next();
                if needs_value && let Some(value) = remaining.next() {
                    config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => break,
        }
    }

    let mut cli_arguments = vec![program.clone()];
    cli_arguments.extend(remaining.cloned());
    ConfigArgumentSplit {
        config_arguments,
        cli_arguments,
    }
}
