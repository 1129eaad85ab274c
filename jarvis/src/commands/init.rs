use eyre::{Result, eyre};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{AnswerKind, Config, ConfigError, EnvironmentConfig, resolve_answer};
use crate::prompt::Prompt;

/// Ask until the answer is valid; an invalid answer is reported and asked again
fn ask(prompt: &mut dyn Prompt, out: &mut dyn Write, title: &str, default: &str, kind: AnswerKind) -> Result<String> {
    let question = format!("{} [default: {}]: ", title, default);
    loop {
        let answer = prompt.ask(&question)?.ok_or_else(|| eyre!("Aborted"))?;
        match resolve_answer(title, &answer, default, kind) {
            Ok(value) => return Ok(value),
            Err(e @ ConfigError::InvalidAnswer { .. }) => writeln!(out, "{}", e)?,
            Err(e) => return Err(e.into()),
        }
    }
}

/// `jarvis init`
///
/// Asks for every setting of `environment`, offering the current values (or
/// the built-in defaults) as defaults, then writes the config file. Other
/// environments in the file are kept as they are.
pub fn init(prompt: &mut dyn Prompt, out: &mut dyn Write, config_path: &Path, environment: &str) -> Result<()> {
    debug!(path = %config_path.display(), %environment, "init: called");
    let mut config = Config::load_or_default(config_path)?;
    let current = config.environments.get(environment).cloned().unwrap_or_default();

    let host = ask(prompt, out, "API host", &current.host, AnswerKind::Text)?;
    let port = ask(prompt, out, "API port", &current.port.to_string(), AnswerKind::Port)?;
    let author = ask(prompt, out, "Author", &current.author, AnswerKind::Text)?;
    let data_directory = ask(
        prompt,
        out,
        "Data directory",
        &current.data_directory.to_string_lossy(),
        AnswerKind::Directory,
    )?;
    let snapshots_directory = ask(
        prompt,
        out,
        "Snapshots directory",
        &current.snapshots_directory.to_string_lossy(),
        AnswerKind::Directory,
    )?;

    let env = EnvironmentConfig {
        host,
        port: port.parse()?,
        author,
        data_directory: data_directory.into(),
        snapshots_directory: snapshots_directory.into(),
    };
    config.environments.insert(environment.to_string(), env);
    config.save(config_path)?;

    info!(%environment, path = %config_path.display(), "init: config written");
    writeln!(out, "Wrote environment {} to {}", environment, config_path.display())?;
    Ok(())
}
