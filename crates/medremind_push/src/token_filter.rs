//! Selects the registrations a dispatch is addressed to
//!
//! Only active registrations holding an Expo push token are eligible. Tokens
//! in any other format belong to a provider this pipeline does not drive and
//! are skipped without error.

use crate::models::DeviceRegistration;

const TOKEN_PREFIXES: [&str; 2] = ["ExponentPushToken[", "ExpoPushToken["];

/// Whether a token has the shape the Expo gateway accepts
///
/// Accepts `ExponentPushToken[..]`, `ExpoPushToken[..]` and the bare
/// hyphenated 8-4-4-4-12 alphanumeric form.
pub fn is_expo_push_token(token: &str) -> bool {
    let bracketed = TOKEN_PREFIXES.iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|inner| !inner.is_empty())
    });

    bracketed || is_bare_token(token)
}

fn is_bare_token(token: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let parts: Vec<&str> = token.split('-').collect();
    parts.len() == GROUPS.len()
        && parts
            .iter()
            .zip(GROUPS)
            .all(|(part, len)| part.len() == len && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// A user's registrations split by eligibility
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenSelection {
    /// Tokens to address, in registration order, without duplicates
    pub eligible: Vec<String>,
    /// Active registrations in a foreign token format
    pub foreign: usize,
    pub inactive: usize,
}

impl TokenSelection {
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }
}

/// Partitions registrations into eligible Expo tokens and everything else
pub fn select_tokens(registrations: &[DeviceRegistration]) -> TokenSelection {
    let mut selection = TokenSelection::default();

    for registration in registrations {
        if !registration.active {
            selection.inactive += 1;
        } else if !is_expo_push_token(&registration.push_token) {
            selection.foreign += 1;
        } else if !selection.eligible.contains(&registration.push_token) {
            selection.eligible.push(registration.push_token.clone());
        }
    }

    selection
}
