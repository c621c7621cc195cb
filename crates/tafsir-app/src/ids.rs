// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

/// Number of surahs in the corpus.
pub const SURAH_COUNT: u16 = 114;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurahId(u16);

impl SurahId {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(SURAH_COUNT);

    /// Returns `None` outside `1..=114`.
    pub const fn new(value: u16) -> Option<Self> {
        if value >= 1 && value <= SURAH_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub const fn prev(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=SURAH_COUNT).map(Self)
    }
}

impl fmt::Display for SurahId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{SURAH_COUNT, SurahId};

    #[test]
    fn surah_id_rejects_out_of_range_values() {
        assert!(SurahId::new(0).is_none());
        assert!(SurahId::new(SURAH_COUNT + 1).is_none());
        assert_eq!(SurahId::new(1), Some(SurahId::FIRST));
        assert_eq!(SurahId::new(114), Some(SurahId::LAST));
    }

    #[test]
    fn next_and_prev_stop_at_boundaries() {
        assert_eq!(SurahId::LAST.next(), None);
        assert_eq!(SurahId::FIRST.prev(), None);
        assert_eq!(SurahId::FIRST.next().map(SurahId::get), Some(2));
    }

    #[test]
    fn all_yields_every_surah_in_order() {
        let ids: Vec<u16> = SurahId::all().map(SurahId::get).collect();
        assert_eq!(ids.len(), 114);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&114));
    }
}
