//! Player identity resolution from the host bridge.
//!
//! The host bridge hands us an opaque bearer token, or nothing at all. From
//! that we derive an [`AuthState`], which is the only thing the rest of the
//! client needs to know about who the player is.
//!
//! # States
//!
//! - [`AuthState::Authenticated`]: the bridge delivered a token. The player id
//!   is read from the token's `sub` claim; if the claims cannot be decoded the
//!   id is dropped but the state stays ready.
//! - [`AuthState::Fallback`]: no bridge is present. A sentinel token and a
//!   random, clearly non-authoritative player id are synthesized so the client
//!   works standalone.
//! - [`AuthState::Pending`]: the bridge is present but has not delivered a
//!   token yet. Nothing downstream may run.
//!
//! Derivation is pure apart from the fallback id, which draws randomness.
//! [`IdentityResolver`] memoizes on its input so a fallback id is generated
//! once per transition into the unavailable state, not once per call.

use std::fmt;

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::{env::Environment, error::ClaimsError};

/// Token used when no host bridge is available.
pub const FALLBACK_TOKEN: &str = "dev_token";

/// Prefix marking a synthesized, non-authoritative player id.
pub const FALLBACK_PLAYER_PREFIX: &str = "dev_user_";

/// Number of random base-36 characters after [`FALLBACK_PLAYER_PREFIX`].
const FALLBACK_SUFFIX_LEN: usize = 6;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const PADDING_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Compact tokens normally use the URL-safe alphabet without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);

/// Some issuers emit the standard alphabet instead.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);

/// Stable player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for ids synthesized by the offline fallback.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(FALLBACK_PLAYER_PREFIX)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the host bridge currently reports, reduced to the three cases the
/// resolver distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeInput {
    /// The bridge delivered a bearer token.
    Authenticated(String),
    /// No bridge is present in this runtime.
    Unavailable,
    /// The bridge is present but no token has arrived yet.
    Pending,
}

impl BridgeInput {
    /// Classify raw bridge readings. An empty token counts as no token.
    pub fn from_bridge(token: Option<&str>, available: bool) -> Self {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => Self::Authenticated(token.to_owned()),
            None if !available => Self::Unavailable,
            None => Self::Pending,
        }
    }
}

/// Resolved player identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Token delivered by the bridge.
    Authenticated {
        /// Raw bearer token, always preserved.
        token: String,
        /// `sub` claim, absent if the payload could not be decoded.
        player_id: Option<PlayerId>,
    },
    /// Synthesized offline identity.
    Fallback {
        /// Always [`FALLBACK_TOKEN`].
        token: String,
        /// Random id prefixed with [`FALLBACK_PLAYER_PREFIX`].
        player_id: PlayerId,
    },
    /// Waiting for the bridge to deliver a token.
    Pending,
}

impl AuthState {
    /// Bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } | Self::Fallback { token, .. } => Some(token),
            Self::Pending => None,
        }
    }

    /// Player id, if known.
    ///
    /// Callers must tolerate `is_ready() && player_id().is_none()`: a real
    /// token with undecodable claims still authenticates requests.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Self::Authenticated { player_id, .. } => player_id.as_ref(),
            Self::Fallback { player_id, .. } => Some(player_id),
            Self::Pending => None,
        }
    }

    /// Whether downstream work (polling, joining) may proceed.
    pub fn is_ready(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether this is the synthesized offline identity.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Read the `sub` claim from a compact `header.payload.signature` token.
///
/// Only the payload segment is looked at; the signature is not verified.
pub fn player_id_from_token(token: &str) -> Result<PlayerId, ClaimsError> {
    let payload = token.split('.').nth(1).ok_or(ClaimsError::MissingPayload)?;

    let bytes = match URL_SAFE_LENIENT.decode(payload) {
        Ok(bytes) => bytes,
        Err(_) => STANDARD_LENIENT.decode(payload)?,
    };

    let claims: serde_json::Value = serde_json::from_slice(&bytes)?;
    match claims.get("sub").and_then(serde_json::Value::as_str) {
        Some(sub) if !sub.is_empty() => Ok(PlayerId::new(sub)),
        _ => Err(ClaimsError::MissingSubject),
    }
}

/// Derive a fresh [`AuthState`] from bridge input.
///
/// Not memoized: the fallback branch draws new randomness on every call. Use
/// [`IdentityResolver`] wherever the result is observed more than once.
pub fn derive_auth_state<E: Environment>(env: &E, input: &BridgeInput) -> AuthState {
    match input {
        BridgeInput::Authenticated(token) => {
            let player_id = match player_id_from_token(token) {
                Ok(id) => Some(id),
                Err(error) => {
                    tracing::debug!(%error, "token claims unreadable, continuing without player id");
                    None
                },
            };
            AuthState::Authenticated { token: token.clone(), player_id }
        },
        BridgeInput::Unavailable => {
            AuthState::Fallback { token: FALLBACK_TOKEN.to_owned(), player_id: fallback_player_id(env) }
        },
        BridgeInput::Pending => AuthState::Pending,
    }
}

fn fallback_player_id<E: Environment>(env: &E) -> PlayerId {
    let mut bytes = [0u8; FALLBACK_SUFFIX_LEN];
    env.random_bytes(&mut bytes);

    let mut id = String::with_capacity(FALLBACK_PLAYER_PREFIX.len() + FALLBACK_SUFFIX_LEN);
    id.push_str(FALLBACK_PLAYER_PREFIX);
    id.extend(bytes.iter().map(|b| char::from(BASE36_DIGITS[usize::from(*b) % BASE36_DIGITS.len()])));
    PlayerId(id)
}

/// Memoizing identity resolver.
///
/// Holds the last input and its derived state. Re-resolving an unchanged
/// input returns the cached state unchanged, which keeps the fallback id
/// stable across ticks and re-renders.
pub struct IdentityResolver<E: Environment> {
    env: E,
    last: Option<(BridgeInput, AuthState)>,
}

impl<E: Environment> IdentityResolver<E> {
    /// Create a resolver with nothing resolved yet.
    pub fn new(env: E) -> Self {
        Self { env, last: None }
    }

    /// Resolve `input`, reusing the cached state if the input is unchanged.
    pub fn resolve(&mut self, input: BridgeInput) -> &AuthState {
        if self.last.as_ref().is_some_and(|(previous, _)| *previous != input) {
            self.last = None;
        }

        let (_, state) = self.last.get_or_insert_with(|| {
            let state = derive_auth_state(&self.env, &input);
            tracing::debug!(
                ready = state.is_ready(),
                fallback = state.is_fallback(),
                player_id = state.player_id().map(PlayerId::as_str),
                "identity re-derived"
            );
            (input, state)
        });
        state
    }

    /// Most recently resolved state, if any.
    pub fn current(&self) -> Option<&AuthState> {
        self.last.as_ref().map(|(_, state)| state)
    }
}
