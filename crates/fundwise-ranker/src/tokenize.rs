//! Field-name tokenisation for lexical overlap.

use std::collections::BTreeSet;

const STOP_WORDS: &[&str] = &[
    "and", "of", "the", "for", "in", "to", "with", "studies", "science", "sciences", "systems",
];

/// Folds spelling and stem variants onto one token.
const SYNONYMS: &[(&str, &str)] = &[
    ("centred", "centered"),
    ("center", "centered"),
    ("centres", "centered"),
    ("computing", "compute"),
    ("computational", "compute"),
    ("computer", "compute"),
    ("computers", "compute"),
    ("chemistry", "chem"),
    ("chemical", "chem"),
    ("chemicals", "chem"),
    ("intelligence", "ai"),
    ("artificial", "ai"),
];

fn canonical(token: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == token)
        .map_or(token, |&(_, to)| to)
}

/// Lowercase, strip punctuation, split hyphens, canonicalise, drop stop words.
pub fn tokenize(label: &str) -> BTreeSet<String> {
    let cleaned: String = label
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .map(canonical)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// `|a ∩ b| / |a ∪ b|`; 0 when either set is empty.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let overlap = a.intersection(b).count();
    let union = a.len() + b.len() - overlap;
    if union == 0 {
        0.0
    } else {
        overlap as f64 / union as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> BTreeSet<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_tokenize_normalises_and_drops_stop_words() {
        assert_eq!(
            tokenize("Artificial Intelligence and Image Processing"),
            set(&["ai", "image", "processing"])
        );
        assert_eq!(tokenize("Human-centred computing"), set(&["human", "centered", "compute"]));
        assert_eq!(tokenize("Theoretical & computational chemistry"), set(&["theoretical", "compute", "chem"]));
        assert!(tokenize("Studies of the Sciences").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_digits_and_drops_non_ascii() {
        assert_eq!(tokenize("Café 3D-printing"), set(&["caf", "3d", "printing"]));
    }

    #[test]
    fn test_jaccard() {
        let a = tokenize("Computer vision and multimedia computation");
        let b = tokenize("Computational imaging");
        // a = {compute, vision, multimedia, computation}, b = {compute, imaging}
        assert!((jaccard(&a, &b) - 0.2).abs() < 1e-12);
        assert_eq!(jaccard(&a, &BTreeSet::new()), 0.0);
        assert_eq!(jaccard(&a, &a), 1.0);
    }
}
