use chrono::{DateTime, Utc};
use std::num::{NonZeroU32, NonZeroU64};
use std::time::Duration;

use crate::guest_link_id::GuestLinkId;

/// Longest label accepted, in characters
pub const MAX_LABEL_CHARS: usize = 200;

/// Smallest per-file byte quota a guest link may carry
pub const MIN_GUEST_FILE_BYTES: u64 = 1024;

/// Largest per-file byte quota; the column is a signed 64-bit integer
pub const MAX_GUEST_FILE_BYTES: u64 = i64::MAX as u64;

/// Largest upload count quota; the column is a signed 32-bit integer
pub const MAX_GUEST_FILE_UPLOADS: u32 = i32::MAX as u32;

/// Lifetime in days that the wire format uses to mean "never expire"
pub const INFINITE_LIFETIME_DAYS: u32 = 36_500;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Optional human-readable note on a guest link. Empty means no label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuestLinkLabel(String);

impl GuestLinkLabel {
    /// Returns `None` when the text is longer than [`MAX_LABEL_CHARS`]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.chars().count() > MAX_LABEL_CHARS {
            return None;
        }
        Some(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Why a duration cannot be used as a file lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifetimeRejection {
    ShorterThanOneDay,
    LongerThanInfinite,
}

/// How long files uploaded through a guest link are retained
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileLifetime {
    Infinite,
    Days(NonZeroU32),
}

impl FileLifetime {
    /// A finite lifetime of `days` whole days. Zero and the infinite
    /// sentinel length are not finite lifetimes.
    pub fn in_days(days: u32) -> Option<Self> {
        if days >= INFINITE_LIFETIME_DAYS {
            return None;
        }
        NonZeroU32::new(days).map(Self::Days)
    }

    /// Normalize an arbitrary duration to whole days, truncating any
    /// remainder. 100 years (up to the next whole day) maps to
    /// [`FileLifetime::Infinite`].
    pub fn from_duration(duration: Duration) -> Result<Self, LifetimeRejection> {
        let days = duration.as_secs() / SECONDS_PER_DAY;
        match u32::try_from(days) {
            Ok(INFINITE_LIFETIME_DAYS) => Ok(Self::Infinite),
            Ok(0) => Err(LifetimeRejection::ShorterThanOneDay),
            Ok(days) if days < INFINITE_LIFETIME_DAYS => {
                Self::in_days(days).ok_or(LifetimeRejection::ShorterThanOneDay)
            }
            _ => Err(LifetimeRejection::LongerThanInfinite),
        }
    }

    /// Day count for a finite lifetime, `None` for infinite
    pub fn as_days(&self) -> Option<u32> {
        match self {
            Self::Infinite => None,
            Self::Days(days) => Some(days.get()),
        }
    }

    /// Wire encoding, e.g. `"24h0m0s"` or `"876000h0m0s"` for infinite
    pub fn to_wire(&self) -> String {
        let days = self.as_days().unwrap_or(INFINITE_LIFETIME_DAYS);
        format!("{}h0m0s", u64::from(days) * 24)
    }
}

/// Per-file size quota
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxFileBytes {
    #[default]
    Unlimited,
    Bounded(NonZeroU64),
}

impl MaxFileBytes {
    /// Returns `None` outside [`MIN_GUEST_FILE_BYTES`]..=[`MAX_GUEST_FILE_BYTES`]
    pub fn bounded(bytes: u64) -> Option<Self> {
        if !(MIN_GUEST_FILE_BYTES..=MAX_GUEST_FILE_BYTES).contains(&bytes) {
            return None;
        }
        NonZeroU64::new(bytes).map(Self::Bounded)
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(bytes) => Some(bytes.get()),
        }
    }
}

/// Quota on the number of files uploaded through a link
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxFileUploads {
    #[default]
    Unlimited,
    Bounded(NonZeroU32),
}

impl MaxFileUploads {
    /// Returns `None` for zero or above [`MAX_GUEST_FILE_UPLOADS`]
    pub fn bounded(count: u32) -> Option<Self> {
        if count > MAX_GUEST_FILE_UPLOADS {
            return None;
        }
        NonZeroU32::new(count).map(Self::Bounded)
    }

    pub fn limit(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(count) => Some(count.get()),
        }
    }
}

/// Derived lifecycle state of a stored guest link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuestLinkStatus {
    Active,
    Expired,
}

/// A validated creation request: everything but the identifier and
/// creation time, which the service assigns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGuestLink {
    pub label: GuestLinkLabel,
    pub url_expires: DateTime<Utc>,
    pub file_lifetime: FileLifetime,
    pub max_file_bytes: MaxFileBytes,
    pub max_file_uploads: MaxFileUploads,
}

impl NewGuestLink {
    pub fn into_guest_link(self, id: GuestLinkId, created: DateTime<Utc>) -> GuestLink {
        GuestLink {
            id,
            label: self.label,
            created,
            url_expires: self.url_expires,
            file_lifetime: self.file_lifetime,
            max_file_bytes: self.max_file_bytes,
            max_file_uploads: self.max_file_uploads,
        }
    }
}

/// A guest link as stored. Never modified after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestLink {
    pub id: GuestLinkId,
    pub label: GuestLinkLabel,
    pub created: DateTime<Utc>,
    pub url_expires: DateTime<Utc>,
    pub file_lifetime: FileLifetime,
    pub max_file_bytes: MaxFileBytes,
    pub max_file_uploads: MaxFileUploads,
}

impl GuestLink {
    /// Check if the link can no longer start uploads at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.url_expires
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> GuestLinkStatus {
        if self.is_expired_at(now) {
            GuestLinkStatus::Expired
        } else {
            GuestLinkStatus::Active
        }
    }
}
