/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fuzzy matching of saved graph names.

use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher};

/// At most this many suggestions are offered for a mistyped name
pub(crate) const MAX_SUGGESTIONS: usize = 3;

/// Return `names` ranked by fuzzy match quality for `query`, best first.
pub(crate) fn suggest_names(names: &[String], query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
    let mut matcher = Matcher::new(Config::DEFAULT);

    pattern
        .match_list(names.iter().map(String::as_str), &mut matcher)
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(name, _score)| name.to_string())
        .collect()
}
