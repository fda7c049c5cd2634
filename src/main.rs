use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use consultancy_portal::adapters::auth::{JwtSessionValidator, JwtValidatorConfig};
use consultancy_portal::adapters::email::{ResendConfig, ResendMailer, SmtpConfig, SmtpMailer};
use consultancy_portal::adapters::http::{app_router, serve, BillingAppState};
use consultancy_portal::adapters::mpesa::{MpesaGateway, MpesaGatewayConfig};
use consultancy_portal::adapters::pdf::{
    HttpLogoSource, IssuerDetails, PdfInvoiceRenderer, StaticLogoSource,
};
use consultancy_portal::adapters::postgres::{
    PostgresDonationRepository, PostgresInvoiceRepository, PostgresProfileReader,
    PostgresSubscriptionRepository,
};
use consultancy_portal::application::handlers::BillingRunSettings;
use consultancy_portal::config::{AppConfig, EmailConfig, EmailTransport};
use consultancy_portal::ports::{LogoSource, Mailer};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!("Server exited with error: {:#}", error);
        eprintln!("consultancy-portal: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.server.log_level, config.server.json_logs());
    config.validate().context("validating configuration")?;
    tracing::info!(environment = ?config.server.environment, "Configuration loaded");

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("connecting to PostgreSQL")?;
    tracing::info!("Postgres connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        tracing::info!("Migrations applied");
    }

    if !config.mpesa.is_configured() {
        tracing::warn!("M-Pesa credentials are incomplete; payment pushes will fail");
    }
    let gateway = MpesaGateway::new(MpesaGatewayConfig {
        base_url: config.mpesa.base_url(),
        consumer_key: SecretString::new(config.mpesa.consumer_key.clone()),
        consumer_secret: SecretString::new(config.mpesa.consumer_secret.clone()),
        shortcode: config.mpesa.shortcode.clone(),
        passkey: SecretString::new(config.mpesa.passkey.clone()),
        till_number: config.mpesa.till_number.clone(),
        callback_base_url: config.mpesa.callback_base_url.clone(),
        timeout: config.mpesa.request_timeout(),
        token_refresh_margin: config.mpesa.token_refresh_margin(),
    })?;

    let mailer = build_mailer(&config.email)?;

    let logo: Arc<dyn LogoSource> = match &config.billing.logo_url {
        Some(url) => Arc::new(HttpLogoSource::new(url.clone(), config.billing.logo_timeout())?),
        None => Arc::new(StaticLogoSource::none()),
    };

    let shortcode = Some(config.mpesa.shortcode.clone()).filter(|s| !s.is_empty());
    let renderer = PdfInvoiceRenderer::new(IssuerDetails {
        company_name: config.billing.company_name.clone(),
        company_email: config.billing.company_email.clone(),
        company_address: config.billing.company_address.clone(),
        paybill_shortcode: shortcode,
    });

    let validator = JwtSessionValidator::new(JwtValidatorConfig {
        secret: config.auth.secret(),
        audience: config.auth.jwt_audience.clone(),
        issuer: config.auth.jwt_issuer.clone(),
    });

    let state = BillingAppState {
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        invoices: Arc::new(PostgresInvoiceRepository::new(pool.clone())),
        donations: Arc::new(PostgresDonationRepository::new(pool.clone())),
        profiles: Arc::new(PostgresProfileReader::new(pool)),
        renderer: Arc::new(renderer),
        logo,
        mailer,
        gateway: Arc::new(gateway),
        settings: BillingRunSettings {
            company_name: config.billing.company_name.clone(),
            invoice_number_attempts: config.billing.invoice_number_attempts,
        },
        cron_secret: Arc::new(config.billing.cron_secret()),
    };

    let app = app_router(
        state,
        Arc::new(validator),
        &config.server.cors_origins_list(),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "Server listening");

    serve(listener, app).await?;
    tracing::info!("Server stopped");
    Ok(())
}

fn build_mailer(email: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match email.transport {
        EmailTransport::Resend => Arc::new(ResendMailer::new(ResendConfig {
            api_key: SecretString::new(email.resend_api_key.clone()),
            api_base_url: email.api_base_url.clone(),
            billing_from: email.billing_from_header(),
            accounts_from: email.accounts_from_header(),
            timeout: email.request_timeout(),
        })?),
        EmailTransport::Smtp => Arc::new(SmtpMailer::new(SmtpConfig {
            host: email.smtp_host.clone(),
            port: email.smtp_port,
            credentials: email
                .smtp_credentials()
                .map(|(user, pass)| (user.to_string(), SecretString::new(pass.to_string()))),
            implicit_tls: email.smtp_implicit_tls,
            billing_from: email.billing_from_header(),
            accounts_from: email.accounts_from_header(),
            timeout: email.request_timeout(),
        })?),
    };
    tracing::info!(transport = ?email.transport, "Mailer configured");
    Ok(mailer)
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
