//! Fuzz target for token claim extraction
//!
//! # Strategy
//!
//! - Random bytes: arbitrary strings presented as tokens
//! - Structured: three segments with an arbitrary JSON payload, encoded in
//!   either base64 alphabet, with or without padding
//!
//! # Invariants
//!
//! - NEVER panic on malformed tokens
//! - A structured token whose payload carries a non-empty string `sub`
//!   always yields exactly that id

#![no_main]

use arbitrary::Arbitrary;
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use bingo_core::identity::player_id_from_token;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum TokenInput {
    Raw(String),
    Structured { sub: Option<String>, extra: Vec<(String, i64)>, alphabet: u8 },
}

fuzz_target!(|input: TokenInput| {
    match input {
        TokenInput::Raw(token) => {
            let _ = player_id_from_token(&token);
        },
        TokenInput::Structured { sub, extra, alphabet } => {
            let mut claims = serde_json::Map::new();
            for (key, value) in extra {
                claims.insert(key, value.into());
            }
            if let Some(sub) = &sub {
                claims.insert("sub".to_owned(), sub.clone().into());
            }
            let payload = serde_json::Value::Object(claims).to_string();

            let encoded = match alphabet % 4 {
                0 => URL_SAFE_NO_PAD.encode(&payload),
                1 => URL_SAFE.encode(&payload),
                2 => STANDARD_NO_PAD.encode(&payload),
                _ => STANDARD.encode(&payload),
            };
            let token = format!("header.{encoded}.signature");

            let result = player_id_from_token(&token);
            if let Some(sub) = sub.filter(|sub| !sub.is_empty()) {
                assert_eq!(result.expect("sub present").as_str(), sub);
            }
        },
    }
});
