// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Surah;

/// Surahs visible for `query`, in list order. An empty query keeps them all.
pub fn filter_surahs<'a>(surahs: &'a [Surah], query: &str) -> Vec<&'a Surah> {
    if query.is_empty() {
        return surahs.iter().collect();
    }

    let folded = query.to_lowercase();
    surahs
        .iter()
        .filter(|surah| surah_matches(surah, query, &folded))
        .collect()
}

fn surah_matches(surah: &Surah, query: &str, folded: &str) -> bool {
    surah.id.get().to_string().contains(query)
        || surah.transliteration.to_lowercase().contains(folded)
        || surah.translation.to_lowercase().contains(folded)
        // Arabic script has no case.
        || surah.name.contains(query)
}
