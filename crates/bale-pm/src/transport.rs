//! Remote store access
//!
//! The resolver and the create workflow only talk to the remote store
//! through the [`Transport`] trait. [`SshTransport`] implements it with the
//! system `ssh` and `scp` binaries.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while talking to the remote store
#[derive(Debug, Error)]
pub enum TransportError {
    /// No host configured
    #[error("SSH host is required")]
    MissingHost,

    /// The external program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external program exited unsuccessfully
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Local IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Access to a remote package store
pub trait Transport {
    /// Run a shell command on the remote host and return its standard output
    fn run(&self, command: &str) -> Result<String, TransportError>;

    /// Upload a local file into `remote_dir` (created if missing); returns the remote path
    fn upload(&self, local_path: &Path, remote_dir: &str) -> Result<String, TransportError>;

    /// Download a remote file into `local_dir`; returns the local path
    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, TransportError>;
}

/// Connection settings for [`SshTransport`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshConfig {
    pub host: String,
    /// Port; `0` leaves the ssh default
    pub port: u16,
    pub user: Option<String>,
    /// Private key passed with `-i`
    pub identity: Option<PathBuf>,
}

impl SshConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// First existing key among the usual `~/.ssh` names
    pub fn default_identity() -> Option<PathBuf> {
        let ssh_dir = dirs::home_dir()?.join(".ssh");
        ["id_ed25519", "id_rsa", "id_ecdsa", "id_dsa"]
            .iter()
            .map(|name| ssh_dir.join(name))
            .find(|path| path.is_file())
    }

    fn target(&self) -> String {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => format!("{}@{}", user, self.host),
            _ => self.host.clone(),
        }
    }

    fn common_args(&self, port_flag: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.port != 0 {
            args.push(port_flag.to_string());
            args.push(self.port.to_string());
        }
        if let Some(identity) = &self.identity {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }
        args
    }
}

/// Transport backed by the `ssh` and `scp` command line tools
#[derive(Debug, Clone)]
pub struct SshTransport {
    config: SshConfig,
}

impl SshTransport {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn ensure_host(&self) -> Result<(), TransportError> {
        if self.config.host.is_empty() {
            return Err(TransportError::MissingHost);
        }
        Ok(())
    }

    fn scp(&self, from: &str, to: &str) -> Result<(), TransportError> {
        let mut args = self.config.common_args("-P");
        args.push(from.to_string());
        args.push(to.to_string());
        execute("scp", &args)?;
        Ok(())
    }
}

impl Transport for SshTransport {
    fn run(&self, command: &str) -> Result<String, TransportError> {
        self.ensure_host()?;
        let mut args = self.config.common_args("-p");
        args.push(self.config.target());
        args.push(command.to_string());
        let output = execute("ssh", &args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn upload(&self, local_path: &Path, remote_dir: &str) -> Result<String, TransportError> {
        self.ensure_host()?;
        if !remote_dir.is_empty() {
            self.run(&format!("mkdir -p {}", shell_escape(remote_dir)))?;
        }

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let remote_path = join_remote(remote_dir, &file_name);

        self.scp(
            &local_path.to_string_lossy(),
            &format!("{}:{}", self.config.target(), remote_path),
        )?;
        Ok(remote_path)
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, TransportError> {
        self.ensure_host()?;
        let local_dir = if local_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            local_dir
        };
        std::fs::create_dir_all(local_dir)?;

        let file_name = remote_path.rsplit('/').next().unwrap_or(remote_path);
        let local_path = local_dir.join(file_name);
        self.scp(
            &format!("{}:{}", self.config.target(), remote_path),
            &local_path.to_string_lossy(),
        )?;
        Ok(local_path)
    }
}

fn execute(program: &str, args: &[String]) -> Result<Output, TransportError> {
    debug!(program, ?args, "running");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| TransportError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(TransportError::CommandFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// Join a remote directory and a file name with `/`
pub fn join_remote(dir: &str, file_name: &str) -> String {
    if dir.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), file_name)
    }
}

/// Quote a path for a POSIX shell when it contains whitespace or quotes
pub fn shell_escape(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    if !path
        .chars()
        .any(|c| c.is_whitespace() || c == '\'' || c == '"')
    {
        return path.to_string();
    }
    format!("'{}'", path.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape_plain() {
        assert_eq!(shell_escape(""), "");
        assert_eq!(shell_escape("/srv/packages"), "/srv/packages");
    }

    #[test]
    fn test_shell_escape_quotes() {
        assert_eq!(shell_escape("my dir"), "'my dir'");
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
        assert_eq!(shell_escape("a\"b"), "'a\"b'");
        assert_eq!(shell_escape("tab\there"), "'tab\there'");
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("", "a.tar.gz"), "a.tar.gz");
        assert_eq!(join_remote("/srv/", "a.tar.gz"), "/srv/a.tar.gz");
        assert_eq!(join_remote("pkgs", "a.tar.gz"), "pkgs/a.tar.gz");
    }

    #[test]
    fn test_target_and_args() {
        let config = SshConfig {
            host: "store.example".to_string(),
            port: 2222,
            user: Some("deploy".to_string()),
            identity: Some(PathBuf::from("/keys/id")),
        };
        assert_eq!(config.target(), "deploy@store.example");
        assert_eq!(config.common_args("-p"), vec!["-p", "2222", "-i", "/keys/id"]);
        assert_eq!(SshConfig::new("h").common_args("-P"), Vec::<String>::new());
    }

    #[test]
    fn test_missing_host() {
        let transport = SshTransport::new(SshConfig::default());
        assert!(matches!(
            transport.run("ls"),
            Err(TransportError::MissingHost)
        ));
        assert!(matches!(
            transport.download("a.tar.gz", Path::new(".")),
            Err(TransportError::MissingHost)
        ));
    }
}
