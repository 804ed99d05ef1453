//! `~/.proteus.json` loading and credential resolution.
use crate::error::{ProteusError, Result};
use crate::mapping::V4V6Mapping;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".proteus.json";

/// Parsed configuration file. Built once at startup and passed by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ProteusConfig {
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_cmd: Option<PasswordCommand>,
    pub url: String,
    /// Literal domain substitutions, kept in file order.
    #[serde(default, deserialize_with = "ordered_pairs")]
    pub replace: Vec<(String, String)>,
    #[serde(default)]
    pub v4_v6_map: Vec<V4V6Mapping>,
}

/// `password_cmd` as written in the file. A plain string goes through the shell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PasswordCommand {
    Shell(String),
    Argv(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Direct(String),
    FromCommand(PasswordCommand),
}

impl ProteusConfig {
    /// `$HOME/.proteus.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| ProteusError::config("cannot determine home directory"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ProteusError::config(format!("reading {}: {e}", path.display())))?;
        let config = Self::from_json(&raw).map_err(|e| match e {
            ProteusError::Config(msg) => ProteusError::config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ProteusConfig =
            serde_json::from_str(raw).map_err(|e| ProteusError::config(e.to_string()))?;
        if config.url.trim().is_empty() {
            return Err(ProteusError::config("url must not be empty"));
        }
        Ok(config)
    }

    /// A direct `password` wins over `password_cmd`.
    pub fn credential(&self) -> Result<Credential> {
        match (&self.password, &self.password_cmd) {
            (Some(password), _) => Ok(Credential::Direct(password.clone())),
            (None, Some(cmd)) => Ok(Credential::FromCommand(cmd.clone())),
            (None, None) => Err(ProteusError::config(
                "either password or password_cmd must be set",
            )),
        }
    }

    pub fn replacements(&self) -> &[(String, String)] {
        &self.replace
    }
}

impl Credential {
    /// Turn the credential into the plain secret sent at login.
    pub async fn resolve(self) -> Result<String> {
        let cmd = match self {
            Credential::Direct(password) => return Ok(password),
            Credential::FromCommand(cmd) => cmd,
        };

        let mut command = match &cmd {
            PasswordCommand::Shell(line) => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
            PasswordCommand::Argv(argv) => {
                let (program, args) = argv
                    .split_first()
                    .ok_or_else(|| ProteusError::config("password_cmd must not be empty"))?;
                let mut c = Command::new(program);
                c.args(args);
                c
            }
        };

        let output = command
            .output()
            .await
            .map_err(|e| ProteusError::config(format!("running password_cmd: {e}")))?;
        if !output.status.success() {
            return Err(ProteusError::config(format!(
                "password_cmd exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| ProteusError::config("password_cmd printed invalid UTF-8"))?;
        Ok(stdout.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn ordered_pairs<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of string replacements")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((src, dst)) = map.next_entry::<String, String>()? {
                pairs.push((src, dst));
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}
