/// Placeholder replaced by the full `<subdomain>.<domain>` name.
pub const DOMAIN_PLACEHOLDER: &str = "SUBDOMAIN.DOMAIN";

/// Placeholder replaced by the upstream application port.
pub const PORT_PLACEHOLDER: &str = "PORT";

/// Render a site configuration from a template.
///
/// The domain placeholder is substituted first so a literal `PORT`
/// inside a domain name cannot be touched by the second pass.
#[must_use]
pub fn render(template: &str, domain: &str, port: &str) -> String {
    template
        .replace(DOMAIN_PLACEHOLDER, domain)
        .replace(PORT_PLACEHOLDER, port)
}

/// Commands the operator runs by hand to finish TLS setup when the
/// certificate is not requested automatically.
#[must_use]
pub fn manual_certbot_commands(domain: &str) -> String {
    format!(
        "\
# Test Nginx configuration to ensure it is valid
nginx -t

# Run Certbot to obtain and configure the SSL certificate for the domain
sudo certbot --nginx -d {domain}

# Reload Nginx to apply the changes once Certbot has completed successfully
sudo systemctl reload nginx

# Optional: check the Certbot renewal timer
sudo systemctl status certbot.timer

# Optional: dry-run the renewal process
sudo certbot renew --dry-run
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
server {
    server_name SUBDOMAIN.DOMAIN;
    location / {
        proxy_pass http://localhost:PORT;
    }
}
";

    #[test]
    fn replaces_placeholders() {
        let result = render(TEMPLATE, "app.example.com", "3000");

        assert!(result.contains("server_name app.example.com;"));
        assert!(result.contains("proxy_pass http://localhost:3000;"));
        assert!(!result.contains("SUBDOMAIN"));
        assert!(!result.contains("PORT"));
    }

    #[test]
    fn replaces_every_occurrence() {
        let result = render("SUBDOMAIN.DOMAIN SUBDOMAIN.DOMAIN PORT PORT", "a.b", "1");

        assert_eq!(result, "a.b a.b 1 1");
    }

    #[test]
    fn template_without_placeholders() {
        assert_eq!(render("listen 80;", "a.b", "1"), "listen 80;");
    }

    #[test]
    fn manual_commands_mention_domain() {
        let commands = manual_certbot_commands("app.example.com");

        assert!(commands.contains("nginx -t"));
        assert!(commands.contains("certbot --nginx -d app.example.com"));
        assert!(commands.contains("systemctl reload nginx"));
    }
}
