// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP-boundary trust checks: the shared basic-auth login and per-form
// anti-forgery tokens.
//
// Both use HMAC-SHA256 under a key generated at startup, so comparisons go
// through `ring::hmac::verify` (constant time) and nothing secret needs to be
// persisted.  Restarting the process invalidates outstanding form tokens.

use printdesk_core::error::PrintdeskError;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::debug;

/// Random bytes per anti-forgery token.
const NONCE_LEN: usize = 16;

fn security_err(what: &str) -> PrintdeskError {
    PrintdeskError::Security(format!("{what} failed"))
}

/// The single login accepted by the HTTP boundary.
pub struct Credentials {
    username: String,
    key: hmac::Key,
    password_tag: hmac::Tag,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Result<Self, PrintdeskError> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
            .map_err(|_| security_err("credential key generation"))?;
        let password_tag = hmac::sign(&key, password.as_bytes());
        Ok(Self {
            username: username.to_string(),
            key,
            password_tag,
        })
    }

    /// Check a username/password pair from an `Authorization: Basic` header.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let password_ok =
            hmac::verify(&self.key, password.as_bytes(), self.password_tag.as_ref()).is_ok();
        let username_ok = username == self.username;
        password_ok && username_ok
    }
}

/// Issues and checks anti-forgery tokens embedded in rendered forms.
///
/// A token is `hex(nonce) "." hex(HMAC(key, nonce || subject))`, where the
/// subject is the authenticated username the form was rendered for.
pub struct CsrfGuard {
    key: hmac::Key,
    rng: SystemRandom,
}

impl CsrfGuard {
    pub fn new() -> Result<Self, PrintdeskError> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
            .map_err(|_| security_err("anti-forgery key generation"))?;
        Ok(Self { key, rng })
    }

    /// Issue a fresh token bound to `subject`.
    pub fn issue(&self, subject: &str) -> Result<String, PrintdeskError> {
        let mut nonce = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| security_err("anti-forgery nonce generation"))?;
        let tag = hmac::sign(&self.key, &signed_message(&nonce, subject));
        Ok(format!("{}.{}", hex::encode(nonce), hex::encode(tag.as_ref())))
    }

    /// Whether `token` was issued by this guard for `subject`.
    pub fn verify(&self, token: &str, subject: &str) -> bool {
        let Some((nonce_hex, tag_hex)) = token.split_once('.') else {
            debug!("anti-forgery token malformed");
            return false;
        };
        let (Ok(nonce), Ok(tag)) = (hex::decode(nonce_hex), hex::decode(tag_hex)) else {
            debug!("anti-forgery token not hex");
            return false;
        };
        if nonce.len() != NONCE_LEN {
            return false;
        }
        hmac::verify(&self.key, &signed_message(&nonce, subject), &tag).is_ok()
    }
}

fn signed_message(nonce: &[u8], subject: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(nonce.len() + subject.len());
    message.extend_from_slice(nonce);
    message.extend_from_slice(subject.as_bytes());
    message
}
