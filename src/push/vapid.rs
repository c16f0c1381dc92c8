use base64::{URL_SAFE_NO_PAD, encode_config};
use jwt_simple::prelude::ES256KeyPair;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::config::AppConfig;

pub(crate) const DEFAULT_SUBJECT: &str = "mailto:admin@fluxo7.dev";

/// The one signing identity for every outgoing push message. Both keys are
/// a startup precondition; the public key is handed verbatim to any client
/// that asks for it.
#[derive(Debug, Clone)]
pub struct VapidKeys {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}

impl VapidKeys {
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let public_key = require_key(
            config.vapid_public_key.as_deref(),
            "--vapid-public-key (FLUXO_PUSH_VAPID_PUBLIC_KEY)",
        )?;
        let private_key = require_key(
            config.vapid_private_key.as_deref(),
            "--vapid-private-key (FLUXO_PUSH_VAPID_PRIVATE_KEY)",
        )?;
        Ok(Self {
            public_key,
            private_key,
            subject: normalize_subject(config.vapid_subject.as_deref()),
        })
    }
}

fn require_key(value: Option<&str>, knob: &str) -> Result<String, String> {
    match value.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(format!("missing VAPID key: {knob}")),
    }
}

fn normalize_subject(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_SUBJECT.to_string(),
        Some(subject) if looks_like_bare_email(subject) => format!("mailto:{subject}"),
        Some(subject) => subject.to_string(),
    }
}

/// `local@domain.tld` with no URI scheme; such subjects get the `mailto:`
/// prefix the relay expects.
fn looks_like_bare_email(subject: &str) -> bool {
    if subject.contains(':') || subject.contains(char::is_whitespace) {
        return false;
    }
    match subject.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct VapidCredentials {
    pub private_key: String,
    pub public_key: String,
}

pub fn generate_vapid_credentials() -> Result<VapidCredentials, web_push::WebPushError> {
    let mut rng = OsRng;
    generate_vapid_credentials_with_rng(&mut rng)
}

pub(crate) fn generate_vapid_credentials_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<VapidCredentials, web_push::WebPushError> {
    let key_pair = generate_es256_keypair_with_rng(rng);
    let private_key = encode_config(key_pair.to_bytes(), URL_SAFE_NO_PAD);
    let public_key =
        web_push::VapidSignatureBuilder::from_base64_no_sub(&private_key, URL_SAFE_NO_PAD)?
            .get_public_key();
    let public_key = encode_config(public_key, URL_SAFE_NO_PAD);

    Ok(VapidCredentials {
        private_key,
        public_key,
    })
}

fn generate_es256_keypair_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> ES256KeyPair {
    let mut key_bytes = [0u8; 32];
    loop {
        rng.fill_bytes(&mut key_bytes);
        if let Ok(key_pair) = ES256KeyPair::from_bytes(&key_bytes) {
            return key_pair;
        }
    }
}
