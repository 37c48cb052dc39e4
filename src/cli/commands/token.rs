use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{issue_token, Claims};
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, help = "Subject uid the token is issued for")]
    pub uid: String,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, help = "Display name claim")]
    pub name: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
    pub hours: Option<u64>,
}

/// Build the claims a token for `args` carries under `config`.
pub fn claims_for(args: &TokenArgs, config: &AppConfig) -> Claims {
    let mut claims = Claims::new(args.uid.clone(), args.hours.unwrap_or(config.security.jwt_expiry_hours))
        .with_issuer(config.security.jwt_issuer.clone());
    if let Some(email) = &args.email {
        claims = claims.with_email(email.clone());
    }
    if let Some(name) = &args.name {
        claims = claims.with_name(name.clone());
    }
    claims
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET is empty; cannot sign a token");
    }

    let claims = claims_for(&args, config);
    let token = issue_token(&config.security.jwt_secret, &claims).context("signing token")?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "uid": claims.sub, "exp": claims.exp })),
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CredentialVerifier, JwtVerifier};

    #[tokio::test]
    async fn issued_claims_verify_under_same_config() {
        let mut config = AppConfig::development();
        config.security.jwt_issuer = Some("storefront".into());
        let args = TokenArgs {
            uid: "u1".into(),
            email: Some("admin@example.com".into()),
            name: None,
            hours: Some(2),
        };

        let token = issue_token(&config.security.jwt_secret, &claims_for(&args, &config)).unwrap();
        let verifier = JwtVerifier::new(&config.security.jwt_secret, Some("storefront"));
        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.uid, "u1");
        assert_eq!(identity.email.as_deref(), Some("admin@example.com"));
    }
}
