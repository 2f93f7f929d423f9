//! Edit distance for "did you mean" option suggestions

/// Classic Levenshtein distance (single-character insert/delete/substitute),
/// case-sensitive, using a rolling row so auxiliary space is O(min(|a|,|b|)).
pub fn distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Keep the shorter string on the row axis
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (j, lc) in long.iter().enumerate() {
        let mut prev_diag = row[0];
        row[0] = j + 1;
        for (i, sc) in short.iter().enumerate() {
            let cost = if sc == lc { 0 } else { 1 };
            let next = (row[i + 1] + 1).min(row[i] + 1).min(prev_diag + cost);
            prev_diag = row[i + 1];
            row[i + 1] = next;
        }
    }

    row[short.len()]
}

/// Pick the closest candidate to `input`, if any is within distance 2.
pub fn suggest<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (distance(input, c), *c))
        .min_by_key(|(d, _)| *d)
        .filter(|(d, _)| *d <= 2)
        .map(|(_, c)| c)
}
