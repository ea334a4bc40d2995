/// A single counter value that the host may or may not be able to provide.
///
/// Kept distinct from a plain zero until the CSV boundary, so "could not read"
/// and "actually zero" stay distinguishable for callers of the library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reading {
    Available(u64),
    #[default]
    Unavailable,
}

impl Reading {
    pub fn from_option(value: Option<u64>) -> Self {
        match value {
            Some(v) => Reading::Available(v),
            None => Reading::Unavailable,
        }
    }

    pub fn value(self) -> Option<u64> {
        match self {
            Reading::Available(v) => Some(v),
            Reading::Unavailable => None,
        }
    }

    pub fn or_zero(self) -> u64 {
        self.value().unwrap_or(0)
    }

    pub fn is_available(self) -> bool {
        matches!(self, Reading::Available(_))
    }
}

impl From<Option<u64>> for Reading {
    fn from(value: Option<u64>) -> Self {
        Reading::from_option(value)
    }
}
