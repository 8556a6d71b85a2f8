use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::cmd::CommandSpec;
use crate::config::Config;
use crate::error::{DeployError, DeployResult};
use crate::nginx;
use crate::step::{Halt, SkipPolicy, Step, StepContext, StepExecutor};
use crate::workflow::{self, Workflow};

/// How the TLS certificate is obtained once the site is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificateMode {
    /// Request it with certbot, enable renewal, restart Nginx and
    /// check the URL.
    #[default]
    Certbot,
    /// Print the commands for the operator to run by hand.
    Manual,
}

/// Create and enable an Nginx site for `SUBDOMAIN.DOMAIN` from a
/// template, then obtain its certificate.
#[derive(Debug, Clone)]
pub struct SslSetup {
    base_dir: PathBuf,
    template: Option<PathBuf>,
    mode: CertificateMode,
}

impl SslSetup {
    #[must_use]
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            template: None,
            mode: CertificateMode::default(),
        }
    }

    /// Use this template instead of `SSL_TEMPLATE_PATH` or
    /// `<base>/nginx-ssl.conf`.
    #[must_use]
    pub fn template(mut self, path: &Path) -> Self {
        self.template = Some(path.to_path_buf());
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: CertificateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolve the template: explicit override, then
    /// `SSL_TEMPLATE_PATH`, then `<base>/nginx-ssl.conf`.
    #[must_use]
    pub fn template_path(&self, config: &Config) -> PathBuf {
        self.template.clone().unwrap_or_else(|| {
            config.get("SSL_TEMPLATE_PATH").map_or_else(
                || self.base_dir.join("nginx-ssl.conf"),
                PathBuf::from,
            )
        })
    }
}

impl Workflow for SslSetup {
    fn name(&self) -> &'static str {
        "SSL setup"
    }

    fn log_prefix(&self) -> &'static str {
        "nginx-ssl"
    }

    fn log_title(&self) -> &'static str {
        "Nginx SSL Setup Log"
    }

    fn required_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![
            "DOMAIN",
            "SUBDOMAIN",
            "PORT",
            "NGINX_AVAILABLE_DIR",
            "NGINX_ENABLED_DIR",
        ];
        if self.mode == CertificateMode::Certbot {
            keys.push("CERTBOT_EMAIL");
        }
        keys
    }

    fn derive(&self, config: Config) -> DeployResult<Config> {
        let full = format!(
            "{}.{}",
            config.require("SUBDOMAIN")?,
            config.require("DOMAIN")?
        );
        Ok(config.with("DOMAIN_FULL", full))
    }

    fn steps(&self, config: &Config, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
        let domain = config.require("DOMAIN_FULL")?;
        let port = config.require("PORT")?;
        let template = self.template_path(config);
        let available = Path::new(config.require("NGINX_AVAILABLE_DIR")?).join(domain);
        let enabled = Path::new(config.require("NGINX_ENABLED_DIR")?).join(domain);

        exec.execute(Step::ask(
            "DNS record",
            &format!("Have you created the subdomain A record for {domain}?"),
        ))?;

        workflow::show_configuration(config, exec)?;
        exec.execute(Step::ask(
            "verify configuration",
            "Is this configuration correct?",
        ))?;

        let mut site_config = String::new();
        exec.execute(
            Step::ask(
                "render template",
                "Replace placeholders in SSL template and create Nginx config file?",
            )
            .action(|_| {
                let content = read_template(&template)?;
                site_config = nginx::render(&content, domain, port);
                Ok(format!(
                    "Placeholders replaced successfully using {}.",
                    template.display()
                ))
            }),
        )?;

        if available.exists() {
            exec.execute(Step::ask(
                "overwrite site configuration",
                &format!(
                    "Configuration file {} already exists. Overwrite?",
                    available.display()
                ),
            ))?;
        }

        exec.execute(
            Step::ask(
                "write site configuration",
                &format!("Write Nginx configuration to {}?", available.display()),
            )
            .action(|_| {
                fs::write(&available, &site_config)?;
                Ok(format!("Configuration written to {}.", available.display()))
            }),
        )?;

        // symlink_metadata so a dangling link still counts as present
        if fs::symlink_metadata(&enabled).is_ok() {
            exec.execute(
                Step::ask(
                    "remove existing symlink",
                    &format!(
                        "Symlink {} already exists. Remove and recreate?",
                        enabled.display()
                    ),
                )
                .command(
                    CommandSpec::new("rm").path(&enabled),
                    &format!("Existing symlink {} removed.", enabled.display()),
                ),
            )?;
        }

        exec.execute(
            Step::ask(
                "create symlink",
                "Create symlink for Nginx config in sites-enabled?",
            )
            .command(
                CommandSpec::new("ln").arg("-s").path(&available).path(&enabled),
                &format!("Symlink created at {}.", enabled.display()),
            ),
        )?;

        match self.mode {
            CertificateMode::Certbot => certbot_steps(config, domain, exec),
            CertificateMode::Manual => manual_steps(domain, exec),
        }
    }
}

fn certbot_steps(config: &Config, domain: &str, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
    let email = config.require("CERTBOT_EMAIL")?;

    exec.execute(
        Step::ask(
            "obtain certificate",
            "Proceed with Certbot to obtain SSL certificate?",
        )
        .command(
            CommandSpec::new("certbot")
                .args(["certonly", "--nginx", "-d", domain])
                .args(["--agree-tos", "--email", email, "--non-interactive"]),
            "Certbot completed successfully.",
        ),
    )?;

    exec.execute(
        Step::ask(
            "enable renewal timer",
            "Enable and start the Certbot renewal timer?",
        )
        .action(|ctx| {
            ctx.run(&CommandSpec::new("systemctl").args(["enable", "certbot.timer"]))?;
            ctx.run(&CommandSpec::new("systemctl").args(["start", "certbot.timer"]))?;
            Ok("Certbot renewal timer enabled and started.".to_string())
        }),
    )?;

    exec.execute(
        Step::ask(
            "restart nginx",
            "Proceed with restarting Nginx to apply SSL?",
        )
        .command(
            CommandSpec::new("systemctl").args(["restart", "nginx"]),
            "Nginx restarted successfully with new configuration.",
        ),
    )?;

    let url = format!("https://{domain}");
    exec.execute(
        Step::ask("verify URL", &format!("Verify if the URL {url} is live?"))
            .on_decline(SkipPolicy::Continue)
            .action(|ctx| verify_url(ctx, &url)),
    )?;

    exec.note("Nginx SSL Setup completed successfully.")?;
    exec.note(&format!("Your URL is live at: {url}"))?;
    Ok(())
}

fn manual_steps(domain: &str, exec: &mut StepExecutor<'_>) -> Result<(), Halt> {
    exec.execute(
        Step::ask(
            "manual certificate instructions",
            "Proceed with manual SSL setup instructions for Certbot and Nginx restart?",
        )
        .action(|_| {
            Ok(format!(
                "Manual steps required to complete SSL setup. Run these commands:\n{}",
                nginx::manual_certbot_commands(domain)
            ))
        }),
    )?;

    exec.note(
        "SSL setup steps up to this point have been completed. \
         Manual steps are required to finalize.",
    )?;
    Ok(())
}

/// Check the site answers 200 over HTTPS. An unreachable or
/// non-200 site is reported, never fatal.
fn verify_url(ctx: &StepContext<'_>, url: &str) -> DeployResult<String> {
    let probe = ctx.probe(
        &CommandSpec::new("curl")
            .args(["-s", "-o", "/dev/null", "-w", "%{http_code}", url])
            .capture(),
    );
    let out = match probe {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(url, error = %e, "URL verification failed");
            return Ok(format!("URL verification failed: {e}"));
        }
    };

    if !out.success() {
        tracing::warn!(url, status = ?out.code, "URL verification failed");
        let status = out
            .code
            .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
        return Ok(format!("URL verification failed: curl exited with {status}."));
    }

    match out.stdout.trim() {
        "200" => Ok("Success! The site is live and SSL is active.".to_string()),
        code => Ok(format!(
            "Warning: The URL returned status code {code}. Manual check recommended."
        )),
    }
}

fn read_template(path: &Path) -> DeployResult<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            DeployError::Precondition(format!(
                "SSL template file not found at {}",
                path.display()
            ))
        } else {
            DeployError::Io(e)
        }
    })
}
