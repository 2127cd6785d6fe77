// [libs/domain/triage/src/keyword_lexicon.rs]
//! The word-boundary keyword lexicons behind department routing when no
//! LLM classifier is reachable. Counts are case-insensitive substring
//! matches anchored at a word boundary, not whole-word matches — `"robb"`
//! matches "robbery" and "robbed" alike, mirroring the stems used upstream.

pub const POLICE_KEYWORDS: &[&str] = &[
    "shoot", "shot", "gun", "armed", "sniper", "kidnap", "carjack", "robb", "loot",
    "hostage", "stab", "knife", "kniv", "weapon", "threaten", "murder", "assault",
    "violence", "stole", "stolen", "theft", "crime",
];

pub const CIVIL_DEFENSE_KEYWORDS: &[&str] = &[
    "fire", "flame", "burning", "smoke", "collaps", "rubble", "flood", "water rising",
    "earthquake", "gas leak", "hazmat", "sinkhole", "landslide", "explo", "power line",
    "live wire", "sparking", "fumes", "spill", "evacuat", "overturned", "rescue team",
    "unexploded", "ordnance", "uxo", "airstrike", "mortar", "debris", "bomb", "shell",
    "trapped",
];

/// Counts keyword hits with a word-boundary check on the left edge only —
/// `"re-shoot"` counts, `"gunsmith"`'s "gun" does too, matching the source
/// regex's `\b` + literal prefix semantics rather than a whole-word match.
pub fn keyword_score(message_lowercase: &str, keywords: &[&str]) -> usize {
    let bytes = message_lowercase.as_bytes();
    keywords
        .iter()
        .filter(|kw| {
            let mut search_from = 0;
            while let Some(offset) = message_lowercase[search_from..].find(*kw) {
                let absolute = search_from + offset;
                let left_is_boundary = absolute == 0 || !bytes[absolute - 1].is_ascii_alphanumeric();
                if left_is_boundary {
                    return true;
                }
                search_from = absolute + kw.len().max(1);
                if search_from >= message_lowercase.len() {
                    break;
                }
            }
            false
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_prefix_stem_at_word_boundary() {
        assert_eq!(keyword_score("the robbery happened fast", POLICE_KEYWORDS), 1);
    }

    #[test]
    fn does_not_match_mid_word_without_boundary() {
        assert_eq!(keyword_score("the engine misfire stalled the truck", CIVIL_DEFENSE_KEYWORDS), 0);
    }

    #[test]
    fn counts_multiple_distinct_keywords() {
        let score = keyword_score("armed man with a gun took hostage", POLICE_KEYWORDS);
        assert_eq!(score, 3);
    }
}
