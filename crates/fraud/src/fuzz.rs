//! String similarity scores (0-100) and Soundex
//!
//! Scores are Indel-based: `ratio = 100 * (1 - indel / (len_a + len_b))`.

use rapidfuzz::distance::indel;

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * indel::normalized_similarity(a.iter().copied(), b.iter().copied())
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best ratio of `short` against the windows of `long`: growing prefixes,
/// full-length slides, then shrinking suffixes
fn best_window(short: &[char], long: &[char]) -> f64 {
    let n = short.len();
    let prefixes = (1..n).map(|i| &long[..i]);
    let suffixes = (long.len() - n + 1..long.len()).map(|i| &long[i..]);

    let mut best: f64 = 0.0;
    for window in prefixes.chain(long.windows(n)).chain(suffixes) {
        best = best.max(ratio_chars(short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Best alignment of the shorter string inside the longer one
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let best = best_window(short, long);
    if short.len() == long.len() && best < 100.0 {
        return best.max(best_window(long, short));
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Compares the shared tokens against each side's full token set
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let mut ta = sorted_tokens(a);
    let mut tb = sorted_tokens(b);
    ta.dedup();
    tb.dedup();

    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = ta.iter().filter(|t| tb.contains(t)).copied().collect();
    let diff_ab: Vec<&str> = ta.iter().filter(|t| !tb.contains(t)).copied().collect();
    let diff_ba: Vec<&str> = tb.iter().filter(|t| !ta.contains(t)).copied().collect();

    // one side's tokens are a subset of the other's
    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = sect.join(" ");
    let diff_ab = diff_ab.join(" ");
    let diff_ba = diff_ba.join(" ");

    if sect.is_empty() {
        return ratio(&diff_ab, &diff_ba);
    }

    let combined_ab = format!("{} {}", sect, diff_ab);
    let combined_ba = format!("{} {}", sect, diff_ba);

    ratio(&sect, &combined_ab)
        .max(ratio(&sect, &combined_ba))
        .max(ratio(&combined_ab, &combined_ba))
}

fn soundex_class(c: char) -> char {
    match c {
        'B' | 'F' | 'P' | 'V' => '1',
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => '2',
        'D' | 'T' => '3',
        'L' => '4',
        'M' | 'N' => '5',
        'R' => '6',
        _ => '0',
    }
}

/// English Soundex; empty for input without letters
pub fn soundex(word: &str) -> String {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let Some(&first) = letters.first() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut prev = soundex_class(first);
    for &c in &letters[1..] {
        let class = soundex_class(c);
        if class != '0' && class != prev {
            code.push(class);
        }
        prev = class;
    }

    while code.len() < 4 {
        code.push('0');
    }
    code.truncate(4);
    code
}
