use std::fs;
use std::path::{Path, PathBuf};

use crate::cmd::CommandSpec;
use crate::config::Config;
use crate::error::{DeployError, DeployResult};
use crate::step::{Halt, SkipPolicy, Step, StepContext, StepExecutor};
use crate::workflow::{self, Workflow};

const STAGING_DIR: &str = "backup_staging";

/// Replace a PM2-managed Next.js deployment: stop the old process,
/// back up the old checkout, clone, install, build and start.
#[derive(Debug, Clone)]
pub struct Deploy {
    env_file: PathBuf,
}

impl Deploy {
    /// Deploy using the environment file at `env_file`, copied into
    /// the checkout as `.env.local`.
    #[must_use]
    pub fn new(env_file: &Path) -> Self {
        Self {
            env_file: env_file.to_path_buf(),
        }
    }
}

impl Workflow for Deploy {
    fn name(&self) -> &'static str {
        "deployment"
    }

    fn log_prefix(&self) -> &'static str {
        "next-deploy"
    }

    fn log_title(&self) -> &'static str {
        "Deployment log"
    }

    fn required_keys(&self) -> Vec<&'static str> {
        vec![
            "APP_NAME_PM2",
            "APP_NAME_GITHUB",
            "DEPLOYMENT_ROOT",
            "REPO_URL",
            "PORT",
            "BACKUP_DIR",
        ]
    }

    fn derive(&self, config: Config) -> DeployResult<Config> {
        let app_root = Path::new(config.require("DEPLOYMENT_ROOT")?)
            .join(config.require("APP_NAME_PM2")?)
            .join(config.require("APP_NAME_GITHUB")?);
        let app_root = app_root.to_string_lossy().into_owned();
        Ok(config.with("APP_ROOT", app_root))
    }

    fn steps(&self, config: &Config, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
        let pm2_name = config.require("APP_NAME_PM2")?;
        let repo_url = config.require("REPO_URL")?;
        let port = config.require("PORT")?;
        let app_root = Path::new(config.require("APP_ROOT")?);

        exec.execute(Step::ask(
            "environment file ready",
            "Do you have your .env.local ready?",
        ))?;

        workflow::show_configuration(config, exec)?;
        exec.execute(Step::ask(
            "verify configuration",
            "Is this configuration correct?",
        ))?;

        exec.execute(
            Step::ask(
                "stop previous instance",
                "A previous instance of the app may be running. Proceed with shutdown and removal?",
            )
            .on_decline(SkipPolicy::Continue)
            .action(|ctx| stop_previous(ctx, pm2_name)),
        )?;

        exec.execute(
            Step::ask(
                "back up previous deployment",
                "Proceed with creating a backup of the existing deployment?",
            )
            .on_decline(SkipPolicy::Continue)
            .action(|ctx| backup_previous(ctx, config, app_root)),
        )?;

        exec.execute(Step::ask(
            "clone repository",
            "Ready to clone the repository?",
        ))?;

        if app_root.exists() {
            exec.execute(
                Step::ask(
                    "remove existing checkout",
                    &format!(
                        "Directory {} already exists. Delete and re-clone?",
                        app_root.display()
                    ),
                )
                .command(
                    CommandSpec::new("rm").arg("-rf").path(app_root),
                    &format!("Removed existing directory at {}.", app_root.display()),
                ),
            )?;
        }

        exec.execute(Step::auto("git clone").command(
            CommandSpec::new("git")
                .arg("clone")
                .arg(repo_url)
                .path(app_root),
            &format!(
                "Repository {repo_url} cloned successfully into {}.",
                app_root.display()
            ),
        ))?;

        exec.execute(
            Step::ask("npm install", "Proceed with npm install?").command(
                CommandSpec::new("npm").arg("install").current_dir(app_root),
                "npm install completed successfully.",
            ),
        )?;

        exec.execute(
            Step::ask(
                "copy environment file",
                "Proceed with copying .env.local to app root?",
            )
            .on_decline(SkipPolicy::Continue)
            .action(|ctx| {
                if !self.env_file.exists() {
                    return Err(DeployError::Precondition(format!(
                        ".env.local file not found at {}",
                        self.env_file.display()
                    )));
                }
                ctx.run(
                    &CommandSpec::new("cp")
                        .path(&self.env_file)
                        .path(&app_root.join(".env.local")),
                )?;
                Ok(".env.local copied to app root.".to_string())
            }),
        )?;

        exec.execute(
            Step::ask("npm build", "Proceed with npm run build?").command(
                CommandSpec::new("npm")
                    .args(["run", "build"])
                    .current_dir(app_root),
                "npm build completed successfully.",
            ),
        )?;

        exec.execute(
            Step::ask("pm2 start", "Proceed with PM2 deployment (start only)?").command(
                CommandSpec::new("pm2")
                    .args(["start", "npm", "--name", pm2_name])
                    .args(["--", "start", "--", "-p", port])
                    .current_dir(app_root),
                "PM2 start executed successfully.",
            ),
        )?;

        exec.note("Deployment process completed.")?;
        Ok(())
    }
}

/// Stop and delete the PM2 process if `pm2 list` mentions it. A
/// failing stop/delete is only a warning: the process may already
/// be gone.
fn stop_previous(ctx: &StepContext<'_>, name: &str) -> DeployResult<String> {
    let listing = ctx.run(&CommandSpec::new("pm2").arg("list").capture())?;
    if !listing.stdout.contains(name) {
        println!("PM2 process '{name}' not found in the PM2 list; skipping stop and removal.");
        return Ok(format!("PM2 process '{name}' not found; no action taken."));
    }

    println!("PM2 process '{name}' is currently running. Stopping and removing it.");
    for verb in ["stop", "delete"] {
        let out = ctx.probe(&CommandSpec::new("pm2").args([verb, name]).capture())?;
        if out.success() {
            println!("pm2 {verb} '{name}' succeeded.");
        } else {
            println!("Warning: pm2 {verb} '{name}' failed; the process may already be gone.");
            tracing::warn!(process = name, verb, stderr = %out.stderr, "pm2 command failed");
        }
    }

    Ok(format!(
        "PM2 process '{name}' stopped and removed successfully if running."
    ))
}

/// Copy the current checkout (without `node_modules`) to a staging
/// directory, archive it into `BACKUP_DIR`, then drop the staging
/// copy. A failure leaves the staging directory in place.
fn backup_previous(
    ctx: &StepContext<'_>,
    config: &Config,
    app_root: &Path,
) -> DeployResult<String> {
    if !app_root.exists() {
        return Ok("No application folder found for backup; skipping backup.".to_string());
    }

    let deployment_root = Path::new(config.require("DEPLOYMENT_ROOT")?);
    let backup_dir = Path::new(config.require("BACKUP_DIR")?);
    let archive = backup_dir.join(format!(
        "BK-{}-{}.tar.gz",
        config.require("APP_NAME_GITHUB")?,
        config.require("TIMESTAMP")?
    ));
    let staging = deployment_root.join(STAGING_DIR);

    fs::create_dir_all(&staging)?;
    fs::create_dir_all(backup_dir)?;

    println!("Copying application to staging directory without node_modules...");
    ctx.run(
        &CommandSpec::new("rsync")
            .args(["-a", "--exclude=node_modules"])
            .arg(format!("{}/", app_root.display()))
            .path(&staging),
    )?;

    println!("Creating backup file...");
    ctx.run(
        &CommandSpec::new("tar")
            .arg("-czf")
            .path(&archive)
            .arg("-C")
            .path(deployment_root)
            .arg(STAGING_DIR),
    )?;

    ctx.run(&CommandSpec::new("rm").arg("-rf").path(&staging))?;

    println!("Current backup files in the backup directory:");
    ctx.probe(&CommandSpec::new("ls").arg("-ltr").path(backup_dir))?;

    Ok(format!("Backup created successfully: {}", archive.display()))
}
