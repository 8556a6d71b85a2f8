use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cmd::SystemRunner;
use crate::config::Config;
use crate::error::DeployResult;
use crate::prompt::{AssumeYes, Confirmer, LineConfirmer};
use crate::workflow::backup::Backup;
use crate::workflow::deploy::Deploy;
use crate::workflow::ssl::{CertificateMode, SslSetup};
use crate::workflow::{self, RunStatus, Session, Workflow};

#[derive(Debug, Parser)]
#[command(name = "nodeploy")]
#[command(about = "Back up, deploy and put a Node.js app behind Nginx with TLS")]
#[command(version)]
pub struct Cli {
    /// Directory holding the app checkout, config and logs
    #[arg(long, global = true, default_value = "..")]
    pub base_dir: PathBuf,

    /// Configuration file [default: <base>/app.conf for backup,
    /// <base>/conf/app.conf otherwise]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run Log directory [default: <base>/logs]
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Diagnostic log level (overrides NODEPLOY_LOG)
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Archive the application folder
    Backup {
        /// Archive destination [default: <base>/backup]
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },

    /// Stop, back up, clone, build and start the application
    Deploy {
        /// Environment file copied into the checkout
        /// [default: <base>/.env.local]
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Create the Nginx site and obtain its TLS certificate
    Ssl {
        /// Print certbot commands instead of running them
        #[arg(long)]
        manual: bool,

        /// Site template [default: SSL_TEMPLATE_PATH or
        /// <base>/nginx-ssl.conf]
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Print the loaded configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Cli {
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| match self.command {
            Command::Backup { .. } => self.base_dir.join("app.conf"),
            _ => self.base_dir.join("conf").join("app.conf"),
        })
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.logs_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("logs"))
    }

    /// Build the workflow selected on the command line, or `None`
    /// for commands that run no steps.
    #[must_use]
    pub fn workflow(&self) -> Option<Box<dyn Workflow>> {
        let base = self.base_dir.as_path();
        match &self.command {
            Command::Backup { backup_dir } => {
                let backup = Backup::new(base);
                Some(Box::new(match backup_dir {
                    Some(dir) => backup.backup_dir(dir),
                    None => backup,
                }))
            }
            Command::Deploy { env_file } => {
                let env_file = env_file
                    .clone()
                    .unwrap_or_else(|| base.join(".env.local"));
                Some(Box::new(Deploy::new(&env_file)))
            }
            Command::Ssl { manual, template } => {
                let mode = if *manual {
                    CertificateMode::Manual
                } else {
                    CertificateMode::Certbot
                };
                let setup = SslSetup::new(base).mode(mode);
                Some(Box::new(match template {
                    Some(path) => setup.template(path),
                    None => setup,
                }))
            }
            Command::Config { .. } => None,
        }
    }
}

/// Load the configuration and dispatch the selected command.
///
/// A malformed or unreadable configuration stops here, before any
/// Run Log exists.
#[must_use]
pub fn run(cli: &Cli) -> RunStatus {
    let path = cli.config_path();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            tracing::error!(path = %path.display(), error = %e, "configuration not loaded");
            return RunStatus::Failed;
        }
    };

    let Some(workflow) = cli.workflow() else {
        let json = matches!(cli.command, Command::Config { json: true });
        return print_config(&config, json);
    };

    let runner = SystemRunner;
    let mut confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(LineConfirmer::stdio())
    };
    let logs_dir = cli.logs_dir();
    let mut session = Session::new(confirmer.as_mut(), &runner, &logs_dir);

    workflow::run(workflow.as_ref(), config, &mut session)
}

fn print_config(config: &Config, json: bool) -> RunStatus {
    match render_config(config, json) {
        Ok(out) => {
            println!("{out}");
            RunStatus::Completed
        }
        Err(e) => {
            eprintln!("{e}");
            RunStatus::Failed
        }
    }
}

fn render_config(config: &Config, json: bool) -> DeployResult<String> {
    if json {
        Ok(serde_json::to_string_pretty(config)?)
    } else {
        Ok(config.display_lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nodeploy").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn backup_defaults() {
        let cli = parse(&["backup"]);

        assert_eq!(cli.config_path(), Path::new("../app.conf"));
        assert_eq!(cli.logs_dir(), Path::new("../logs"));
        assert!(!cli.yes);
        assert_eq!(cli.workflow().unwrap().name(), "backup");
    }

    #[test]
    fn deploy_uses_conf_dir() {
        let cli = parse(&["deploy", "--base-dir", "/srv"]);

        assert_eq!(cli.config_path(), Path::new("/srv/conf/app.conf"));
        assert_eq!(cli.workflow().unwrap().log_prefix(), "next-deploy");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&[
            "ssl",
            "--manual",
            "--yes",
            "--config",
            "/etc/app.conf",
            "--logs-dir",
            "/var/log/app",
            "--log-level",
            "debug",
        ]);

        assert!(cli.yes);
        assert_eq!(cli.config_path(), Path::new("/etc/app.conf"));
        assert_eq!(cli.logs_dir(), Path::new("/var/log/app"));
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        let workflow = cli.workflow().unwrap();
        assert!(!workflow.required_keys().contains(&"CERTBOT_EMAIL"));
    }

    #[test]
    fn config_command_has_no_workflow() {
        let cli = parse(&["config", "--json"]);

        assert!(cli.workflow().is_none());
        assert_eq!(cli.config_path(), Path::new("../conf/app.conf"));
    }

    #[test]
    fn renders_config_as_json_or_lines() {
        let config = Config::parse("PORT=3000\nAPP_NAME_PM2=web").unwrap();

        assert_eq!(
            render_config(&config, true).unwrap(),
            "{\n  \"PORT\": \"3000\",\n  \"APP_NAME_PM2\": \"web\"\n}"
        );
        assert_eq!(
            render_config(&config, false).unwrap(),
            "PORT        : 3000\nAPP_NAME_PM2: web"
        );
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["nodeploy"]).is_err());
    }
}
