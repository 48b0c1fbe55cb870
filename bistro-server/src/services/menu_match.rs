//! Menu item lookup by spoken or typed name
//!
//! Matching order: exact (case-insensitive) → substring → common
//! misspellings → word similarity score.

use shared::models::MenuItem;

/// `(heard, menu word)` pairs, first hit wins
const SPELLING_CORRECTIONS: &[(&str, &str)] = &[
    ("kraft", "craft"),
    ("coke", "coca-cola"),
    ("pepsi", "coca-cola"),
    ("soda", "coca-cola"),
    ("pop", "coca-cola"),
    ("burger", "ribeye steak"),
    ("chicken", "buffalo wings"),
    ("wings", "buffalo wings"),
    ("lemonade", "lemonade"),
    ("tea", "iced tea"),
    ("coffee", "coffee"),
    ("water", "water"),
    ("beer", "beer"),
    ("wine", "wine"),
];

/// Minimum similarity score for a fuzzy hit
const MIN_SCORE: i32 = 3;

/// Best available item for `term`, or `None`
///
/// Unavailable items are never returned.
pub fn find_best_match<'a>(term: &str, items: &'a [MenuItem]) -> Option<&'a MenuItem> {
    let search = term.trim().to_lowercase();
    if search.is_empty() {
        return None;
    }
    let available: Vec<(&'a MenuItem, String)> = items
        .iter()
        .filter(|i| i.is_available)
        .map(|i| (i, i.name.to_lowercase()))
        .collect();

    if let Some((item, _)) = available.iter().find(|(_, name)| *name == search) {
        return Some(item);
    }
    if let Some((item, _)) = available.iter().find(|(_, name)| name.contains(&search)) {
        return Some(item);
    }

    let corrected = correct_spelling(&search);
    if corrected != search {
        if let Some((item, _)) = available.iter().find(|(_, name)| name.contains(&corrected)) {
            return Some(item);
        }
    }

    let mut best: Option<&'a MenuItem> = None;
    let mut best_score = 0;
    for (item, name) in &available {
        let score = similarity(&search, &corrected, name);
        if score > best_score && score >= MIN_SCORE {
            best_score = score;
            best = Some(item);
        }
    }
    best
}

fn correct_spelling(search: &str) -> String {
    SPELLING_CORRECTIONS
        .iter()
        .find(|(wrong, _)| search.contains(wrong))
        .map(|(wrong, right)| search.replace(wrong, right))
        .unwrap_or_else(|| search.to_string())
}

fn similarity(search: &str, corrected: &str, name: &str) -> i32 {
    let mut score = 0;
    for sw in search.split_whitespace() {
        for nw in name.split_whitespace() {
            if sw == nw {
                score += 10;
            } else if sw.contains(nw) || nw.contains(sw) {
                score += 5;
            } else if levenshtein(sw, nw) <= 2 {
                score += 3;
            }
        }
    }
    if name.contains(search) {
        score += 8;
    } else if name.contains(corrected) {
        score += 6;
    }
    if search.chars().count().abs_diff(name.chars().count()) > 5 {
        score -= 2;
    }
    score
}

/// Edit distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut cur = Vec::with_capacity(b.len() + 1);
        cur.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let value = (prev[j + 1] + 1).min(cur[j] + 1).min(prev[j] + cost);
            cur.push(value);
        }
        prev = cur;
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<MenuItem> {
        [
            ("Truffle Fries", true),
            ("Buffalo Wings", true),
            ("Craft Lemonade", true),
            ("Herbal Tea", true),
            ("Sous Vide Ribeye", true),
            ("Lemon Tart", false),
        ]
        .iter()
        .enumerate()
        .map(|(i, (name, available))| MenuItem {
            id: i as i64 + 1,
            name: (*name).into(),
            description: None,
            price: 5.0,
            category: "Starter".into(),
            is_available: *available,
        })
        .collect()
    }

    #[test]
    fn test_exact_and_substring() {
        let items = menu();
        assert_eq!(find_best_match("truffle fries", &items).unwrap().id, 1);
        assert_eq!(find_best_match("fries", &items).unwrap().id, 1);
        assert_eq!(find_best_match("  RIBEYE ", &items).unwrap().id, 5);
    }

    #[test]
    fn test_spelling_corrections() {
        let items = menu();
        assert_eq!(find_best_match("kraft lemonade", &items).unwrap().id, 3);
        assert_eq!(find_best_match("chicken", &items).unwrap().id, 2);
    }

    #[test]
    fn test_word_similarity() {
        let items = menu();
        // typo within edit distance 2 of "truffle"
        assert_eq!(find_best_match("trufle friez", &items).unwrap().id, 1);
    }

    #[test]
    fn test_unavailable_and_unknown() {
        let items = menu();
        assert!(find_best_match("lemon tart", &items).is_none_or(|m| m.id != 6));
        assert!(find_best_match("pizza", &items).is_none());
        assert!(find_best_match("", &items).is_none());
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
