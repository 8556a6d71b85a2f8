use std::fs;
use std::path::{Path, PathBuf};

use crate::cmd::CommandSpec;
use crate::config::Config;
use crate::error::DeployError;
use crate::step::{Halt, SkipPolicy, Step, StepExecutor};
use crate::workflow::Workflow;

/// Archive the application checkout at `<base>/<APP_NAME_GITHUB>`
/// into `BK-<app>-<stamp>.tar.gz`, dropping `node_modules` first.
#[derive(Debug, Clone)]
pub struct Backup {
    base_dir: PathBuf,
    backup_dir: PathBuf,
}

impl Backup {
    /// Back up applications living in `base_dir` into
    /// `<base_dir>/backup`.
    #[must_use]
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            backup_dir: base_dir.join("backup"),
        }
    }

    #[must_use]
    pub fn backup_dir(mut self, dir: &Path) -> Self {
        self.backup_dir = dir.to_path_buf();
        self
    }

    /// Archive path for an application at a given run stamp.
    #[must_use]
    pub fn archive_path(&self, app: &str, stamp: &str) -> PathBuf {
        self.backup_dir.join(format!("BK-{app}-{stamp}.tar.gz"))
    }
}

impl Workflow for Backup {
    fn name(&self) -> &'static str {
        "backup"
    }

    fn log_prefix(&self) -> &'static str {
        "backup-log"
    }

    fn log_title(&self) -> &'static str {
        "Backup log"
    }

    fn required_keys(&self) -> Vec<&'static str> {
        vec!["APP_NAME_GITHUB"]
    }

    fn steps(&self, config: &Config, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
        let app = config.require("APP_NAME_GITHUB")?;
        let stamp = config.require("TIMESTAMP")?;
        let app_dir = self.base_dir.join(app);
        let archive = self.archive_path(app, stamp);

        exec.note(&format!(
            "Backup started: backing up '{}' to '{}'",
            app_dir.display(),
            archive.display()
        ))?;

        exec.execute(Step::auto("verify application folder").action(|_| {
            if app_dir.is_dir() {
                Ok(format!("Application folder '{}' found.", app_dir.display()))
            } else {
                Err(DeployError::Precondition(format!(
                    "the application folder '{}' does not exist",
                    app_dir.display()
                )))
            }
        }))?;

        let node_modules = app_dir.join("node_modules");
        if node_modules.is_dir() {
            exec.execute(
                Step::ask(
                    "remove node_modules",
                    &format!(
                        "Remove '{}' to reduce backup size?",
                        node_modules.display()
                    ),
                )
                .on_decline(SkipPolicy::Continue)
                .command(
                    CommandSpec::new("rm").arg("-rf").path(&node_modules),
                    &format!("Removed '{}'.", node_modules.display()),
                ),
            )?;
        }

        exec.execute(
            Step::ask(
                "create archive",
                &format!("Create backup '{}'?", archive.display()),
            )
            .action(|ctx| {
                fs::create_dir_all(&self.backup_dir)?;
                ctx.run(
                    &CommandSpec::new("tar")
                        .arg("-czf")
                        .path(&archive)
                        .arg("-C")
                        .path(&self.base_dir)
                        .arg(app),
                )?;
                Ok(format!(
                    "Backup created successfully at '{}'.",
                    archive.display()
                ))
            }),
        )?;

        exec.execute(Step::auto("list backups").command(
            CommandSpec::new("ls").arg("-ltr").path(&self.backup_dir),
            &format!("Current backups listed from '{}'.", self.backup_dir.display()),
        ))?;

        exec.note("Backup operation completed successfully.")?;
        Ok(())
    }
}
