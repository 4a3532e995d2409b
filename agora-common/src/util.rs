use std::num::IntErrorKind;
use thiserror::Error;
use time::Duration;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    pub fn from_seconds(seconds: u64) -> Result<Self, NonPositiveDurationError> {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        Duration::seconds(seconds).try_into()
    }

    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }

    /// Whole seconds, rounded up so a sub-second duration never becomes zero.
    #[must_use]
    pub fn whole_seconds_ceil(&self) -> u64 {
        let seconds = self.0.whole_seconds().cast_unsigned();
        if self.0.subsec_nanoseconds() > 0 {
            seconds + 1
        } else {
            seconds
        }
    }

    #[must_use]
    pub fn to_std(&self) -> std::time::Duration {
        self.0.unsigned_abs()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The duration is not positive: {0}")]
pub struct NonPositiveDurationError(Duration);

impl TryFrom<Duration> for PositiveDuration {
    type Error = NonPositiveDurationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveDurationError(value))
    }
}

/// One page of a listing. Both fields are at least one.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Page {
    page: u64,
    size: u64,
}

impl Page {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_SIZE: u64 = 10;

    #[must_use]
    pub fn new(page: u64, size: u64) -> Option<Self> {
        (page >= 1 && size >= 1).then_some(Self { page, size })
    }

    /// Builds a page from raw query values. Anything missing, unparseable or
    /// below one falls back to the default for that field. Integers too large
    /// for `u64` saturate.
    #[must_use]
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
        fn parse_or(value: Option<&str>, default: u64) -> u64 {
            let parsed = value.map(|value| match value.trim().parse::<u64>() {
                Ok(value) => Some(value),
                Err(err) if *err.kind() == IntErrorKind::PosOverflow => Some(u64::MAX),
                Err(_) => None,
            });

            parsed
                .flatten()
                .filter(|value| *value >= 1)
                .unwrap_or(default)
        }

        Self {
            page: parse_or(page, Self::DEFAULT_PAGE),
            size: parse_or(size, Self::DEFAULT_SIZE),
        }
    }

    #[must_use]
    pub fn page(self) -> u64 {
        self.page
    }

    #[must_use]
    pub fn size(self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn offset(self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    #[must_use]
    pub fn limit(self) -> u64 {
        self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            size: Self::DEFAULT_SIZE,
        }
    }
}
