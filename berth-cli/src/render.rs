//! Text artifacts written into a new project directory.
//!
//! Only the port- and credential-bearing parts are rendered here; service
//! images and their internal settings are kept to the minimum the ports and
//! keys need to line up.

use std::fmt::Write as _;

use berth_core::Service;
use berth_synth::Synthesis;

/// Render the project's `.env` file.
#[must_use]
pub fn env_file(project: &str, synthesis: &Synthesis) -> String {
    let ports = &synthesis.ports;
    let creds = &synthesis.credentials;
    let port = |service: Service| ports.get(service).map_or_else(String::new, |p| p.to_string());

    let mut port_lines = String::new();
    for (service, value) in ports.iter() {
        let _ = writeln!(port_lines, "{}={value}", service.env_key());
    }

    let api = port(Service::GatewayHttp);
    let studio = port(Service::Studio);

    format!(
        "############
# Secrets
# Rotate with `berth keys --env-file .env` before exposing this deployment.
############
POSTGRES_PASSWORD={postgres_password}
JWT_SECRET={jwt_secret}
ANON_KEY={anon_key}
SERVICE_ROLE_KEY={service_role_key}
DASHBOARD_USERNAME=supabase
DASHBOARD_PASSWORD={project}
SECRET_KEY_BASE={secret_key_base}
VAULT_ENC_KEY={vault_enc_key}

############
# Host ports
############
{port_lines}
############
# Database
############
POSTGRES_HOST=db
POSTGRES_DB=postgres
POOLER_DEFAULT_POOL_SIZE=20
POOLER_MAX_CLIENT_CONN=100
POOLER_TENANT_ID={project}

############
# API
############
PGRST_DB_SCHEMAS=public,storage,graphql_public
SITE_URL=http://localhost:{studio}
API_EXTERNAL_URL=http://localhost:{api}
SUPABASE_PUBLIC_URL=http://localhost:{api}
ADDITIONAL_REDIRECT_URLS=

############
# Auth
############
JWT_EXPIRY=3600
DISABLE_SIGNUP=false
ENABLE_EMAIL_SIGNUP=true
ENABLE_EMAIL_AUTOCONFIRM=true
ENABLE_ANONYMOUS_USERS=false
ENABLE_PHONE_SIGNUP=true
ENABLE_PHONE_AUTOCONFIRM=true

############
# Studio
############
STUDIO_DEFAULT_ORGANIZATION=\"{project}\"
STUDIO_DEFAULT_PROJECT=\"{project}\"

############
# Functions
############
FUNCTIONS_VERIFY_JWT=false

############
# Logs
############
LOGFLARE_API_KEY={logflare}
LOGFLARE_LOGGER_BACKEND_API_KEY={logflare}
",
        postgres_password = creds.postgres_password.expose(),
        jwt_secret = synthesis.jwt_secret.expose(),
        anon_key = synthesis.anon_key,
        service_role_key = synthesis.service_role_key,
        secret_key_base = creds.secret_key_base.expose(),
        vault_enc_key = creds.vault_enc_key.expose(),
        logflare = creds.logflare_api_key.expose(),
    )
}

/// Render `docker-compose.yml`. Host ports are read from `.env` by compose
/// interpolation, so patching `.env` is enough to move a service.
#[must_use]
pub fn compose_file(project: &str) -> String {
    format!(
        r#"name: {project}

services:
  kong:
    container_name: {project}-kong
    image: kong:2.8.1
    restart: unless-stopped
    ports:
      - "${{KONG_HTTP_PORT}}:8000/tcp"
      - "${{KONG_HTTPS_PORT}}:8443/tcp"
    environment:
      KONG_DATABASE: "off"
      SUPABASE_ANON_KEY: ${{ANON_KEY}}
      SUPABASE_SERVICE_KEY: ${{SERVICE_ROLE_KEY}}
      DASHBOARD_USERNAME: ${{DASHBOARD_USERNAME}}
      DASHBOARD_PASSWORD: ${{DASHBOARD_PASSWORD}}

  studio:
    container_name: {project}-studio
    image: supabase/studio:20250317-6955350
    restart: unless-stopped
    ports:
      - "${{STUDIO_PORT}}:3000"
    environment:
      SUPABASE_ANON_KEY: ${{ANON_KEY}}
      SUPABASE_SERVICE_KEY: ${{SERVICE_ROLE_KEY}}
      AUTH_JWT_SECRET: ${{JWT_SECRET}}
      LOGFLARE_API_KEY: ${{LOGFLARE_API_KEY}}

  db:
    container_name: {project}-db
    image: supabase/postgres:15.8.1.060
    restart: unless-stopped
    volumes:
      - ./volumes/db/data:/var/lib/postgresql/data:Z
    environment:
      POSTGRES_PASSWORD: ${{POSTGRES_PASSWORD}}
      JWT_SECRET: ${{JWT_SECRET}}
      JWT_EXP: ${{JWT_EXPIRY}}

  supavisor:
    container_name: {project}-pooler
    image: supabase/supavisor:2.4.14
    restart: unless-stopped
    ports:
      - "${{POSTGRES_PORT}}:5432"
      - "${{POOLER_PROXY_PORT_TRANSACTION}}:6543"
    environment:
      POSTGRES_PASSWORD: ${{POSTGRES_PASSWORD}}
      SECRET_KEY_BASE: ${{SECRET_KEY_BASE}}
      VAULT_ENC_KEY: ${{VAULT_ENC_KEY}}
      API_JWT_SECRET: ${{JWT_SECRET}}
      POOLER_TENANT_ID: ${{POOLER_TENANT_ID}}

  analytics:
    container_name: {project}-analytics
    image: supabase/logflare:1.12.0
    restart: unless-stopped
    ports:
      - "${{ANALYTICS_PORT}}:4000"
    environment:
      DB_PASSWORD: ${{POSTGRES_PASSWORD}}
      LOGFLARE_API_KEY: ${{LOGFLARE_API_KEY}}
"#
    )
}

/// Render the project README with its port table.
#[must_use]
pub fn readme(project: &str, synthesis: &Synthesis) -> String {
    let mut text = format!(
        "# {project}\n\nSelf-hosted deployment generated by berth (base port {}).\n\n## Ports\n\n",
        synthesis.base_port
    );
    for (service, port) in synthesis.ports.iter() {
        let _ = writeln!(text, "- {}: {port}", service.label());
    }
    text.push_str(
        "\n## Usage\n\n\
         - `berth start <dir>` brings the stack up\n\
         - `berth keys --env-file <dir>/.env` rotates the signing secret and API keys\n\
         - `berth harden <dir>` applies the security defaults\n",
    );
    text
}

/// Render `reset.sh`, which wipes the database volume.
#[must_use]
pub fn reset_script() -> String {
    "#!/bin/sh
set -e
docker compose down -v --remove-orphans
rm -rf ./volumes/db/data
mkdir -p ./volumes/db/data
echo \"Reset complete. Start again with: docker compose up -d\"
"
    .to_owned()
}

/// Render the post-hardening checklist.
#[must_use]
pub fn security_checklist(project: &str) -> String {
    format!(
        "# Security checklist for {project}

## Applied by berth harden

- [x] Dashboard credentials customized
- [x] Email autoconfirm enabled for development
- [x] Phone signup and autoconfirm disabled

## Still to do before production

- [ ] Rotate the signing secret and API keys (`berth keys --env-file .env`)
- [ ] Change the database password
- [ ] Configure a real SMTP server
- [ ] Restrict network access with firewall rules
- [ ] Terminate TLS in front of the API gateway
- [ ] Review row-level security policies
- [ ] Configure database backups
"
    )
}
