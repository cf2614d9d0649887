use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// Number of characters in a guest link identifier
pub const GUEST_LINK_ID_LENGTH: usize = 16;

/// Identifier alphabet. Leaves out characters that are easy to confuse
/// when read aloud or typed by hand (i, l, o, I, O, 0, 1).
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Opaque, URL-safe identifier of a guest link
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GuestLinkId(String);

impl GuestLinkId {
    /// Parse an identifier, rejecting anything that does not match the
    /// fixed length and alphabet.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.len() != GUEST_LINK_ID_LENGTH || !raw.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(ValidationError::InvalidGuestLinkId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Draw a fresh identifier from the given entropy source
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..GUEST_LINK_ID_LENGTH)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestLinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GuestLinkId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<GuestLinkId> for String {
    fn from(id: GuestLinkId) -> String {
        id.0
    }
}

/// Mints new guest link identifiers.
///
/// Uniqueness is not checked here; the store rejects duplicates on insert.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> GuestLinkId;
}

/// Generator backed by the thread-local RNG, so concurrent requests
/// never contend on shared state.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> GuestLinkId {
        GuestLinkId::generate_with(&mut rand::thread_rng())
    }
}
