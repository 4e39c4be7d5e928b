//! CLI command implementations

pub mod create;
pub mod update;

use bale_pm::{SshConfig, SshTransport};
use clap::Args;
use std::path::PathBuf;

/// Remote store flags shared by `create` and `update`
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// SSH host
    #[arg(long, env = "PM_SSH_HOST")]
    pub ssh_host: Option<String>,

    /// SSH port
    #[arg(long, env = "PM_SSH_PORT", default_value_t = 22)]
    pub ssh_port: u16,

    /// SSH user
    #[arg(long, env = "PM_SSH_USER")]
    pub ssh_user: Option<String>,

    /// Private key (default: first of ~/.ssh/id_ed25519, id_rsa, id_ecdsa, id_dsa)
    #[arg(long, env = "PM_SSH_KEY")]
    pub ssh_key: Option<PathBuf>,

    /// Remote directory holding the archives
    #[arg(long, env = "PM_REMOTE_DIR")]
    pub remote_dir: Option<String>,
}

impl RemoteArgs {
    pub fn remote_dir(&self) -> String {
        self.remote_dir.clone().unwrap_or_default()
    }

    /// SSH transport for the configured host, or `None` when no host is set
    pub fn transport(&self) -> Option<SshTransport> {
        let host = self.ssh_host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        let identity = self
            .ssh_key
            .clone()
            .filter(|key| !key.as_os_str().is_empty())
            .or_else(SshConfig::default_identity);

        Some(SshTransport::new(SshConfig {
            host: host.to_string(),
            port: self.ssh_port,
            user: self.ssh_user.clone().filter(|u| !u.is_empty()),
            identity,
        }))
    }
}
