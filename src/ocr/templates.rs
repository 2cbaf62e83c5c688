//! Per-digit templates for the crossings classifier and the scoring that
//! matches a profile against them.
//!
//! A digit is described by hard limits on its crossing counts, a canonical
//! count string per direction, and a canonical region signature per
//! direction. Count and signature strings are stretched to the observed
//! length and compared with a bounded edit distance, so moderately sloppy
//! handwriting still matches.

use super::crossings::Crossing;
use super::DigitDecision;

/// Edit errors tolerated before a template match is called off.
pub const MAX_ERRORS: usize = 4;

/// Crossing-count limits per digit: minimum profile lengths (h, v),
/// maximum run counts (h, v), minimum run counts (h, v) and the minimum
/// value the maximum run count must reach (h, v).
const LIMITS: [[usize; 8]; 10] = [
    [4, 4, 3, 3, 1, 1, 2, 2], // zero
    [4, 1, 2, 2, 1, 1, 1, 1], // one
    [4, 4, 3, 3, 1, 1, 1, 2], // two
    [4, 4, 2, 4, 1, 1, 1, 3], // three
    [4, 4, 3, 2, 1, 1, 2, 1], // four
    [4, 4, 2, 3, 1, 1, 1, 3], // five
    [4, 4, 2, 3, 1, 1, 2, 2], // six
    [4, 3, 2, 3, 1, 1, 1, 2], // seven
    [4, 4, 2, 4, 1, 1, 2, 3], // eight
    [4, 3, 2, 3, 1, 1, 2, 2], // nine
];

/// Canonical run-count strings per digit (horizontal, vertical).
const COUNT_TEMPLATES: [(&str, &str); 10] = [
    ("1222221", "1222221"),    // zero
    ("1111111", "1111"),       // one
    ("122111211", "1233221"),  // two
    ("121121121", "1223321"),  // three
    ("1222111", "1122121"),    // four
    ("1212121", "123331"),     // five
    ("1211123221", "1233321"), // six
    ("1121211", "12211"),      // seven
    ("1221221", "1233321"),    // eight
    ("1223211", "122331"),     // nine
];

/// Canonical region signatures per digit (horizontal, vertical).
const SIGNATURE_TEMPLATES: [(&str, &str); 10] = [
    ("/XXX/X_X/X_X/X_X/XXX/", "/XXX/X_X/X_X/X_X/XXX/"), // zero
    ("/_X_/_X_/_X_/_X_/_X_/", "/XXX/XX_/"),             // one
    ("/__X/_X_/_X_/X__/XXX/", "/__X/XXX/X__/"),         // two
    ("/XXX/__X/_X_/__X/XXX/", "/X_X/XXX/XXX/"),         // three
    ("/X__/X_X/XX_/XXX/__X/", "/X__/_X_/_X_/_XX/"),     // four
    ("/XXX/X__/XX_/__X/XX_/", "/XXX/XXX/X__/__X/"),     // five
    ("/X__/X__/XXX/X_X/XXX/", "/_X_/XXX/XXX/"),         // six
    ("/XXX/_X_/_XX/_X_/_X_/", "/X__/_XX/_X_/"),         // seven
    ("/XXX/X_X/_X_/X_X/XXX/", "/XXX/XXX/XXX/"),         // eight
    ("/XXX/X_X/XXX/__X/__X/", "/X__/X__/XX_/"),         // nine
];

/// Scores all ten digits against the trimmed profiles and picks the best.
pub fn score_digits(
    hcrossings: &[Vec<Crossing>],
    vcrossings: &[Vec<Crossing>],
    hsig: &str,
    vsig: &str,
) -> DigitDecision {
    let num_h: Vec<usize> = hcrossings.iter().map(|r| r.len()).collect();
    let num_v: Vec<usize> = vcrossings.iter().map(|r| r.len()).collect();
    let min_h = num_h.iter().copied().min().unwrap_or(0);
    let min_v = num_v.iter().copied().min().unwrap_or(0);
    let max_h = num_h.iter().copied().max().unwrap_or(0);
    let max_v = num_v.iter().copied().max().unwrap_or(0);
    let hstr: String = num_h.iter().map(|n| count_char(*n)).collect();
    let vstr: String = num_v.iter().map(|n| count_char(*n)).collect();

    let mut scores = [0.0f32; 10];
    for digit in 0..10 {
        let lim = LIMITS[digit];
        if num_h.len() < lim[0] || num_v.len() < lim[1] || min_h < lim[4] || min_v < lim[5] {
            continue;
        }
        let mhc = min_max_score(lim[6], lim[2], max_h);
        let mvc = min_max_score(lim[7], lim[3], max_v);
        let (count_h, count_v) = COUNT_TEMPLATES[digit];
        let hn = count_score(&hstr, count_h);
        let vn = count_score(&vstr, count_v);
        let (sig_h, sig_v) = SIGNATURE_TEMPLATES[digit];
        let hp = signature_score(hsig, sig_h);
        let vp = signature_score(vsig, sig_v);
        scores[digit] = hn * vn * hp * vp * mhc * mvc;
    }
    let (best, &score) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap();
    DigitDecision {
        digit: (score > 0.0).then_some(best as u8),
        scores,
    }
}

fn count_char(n: usize) -> char {
    char::from_digit(n.min(9) as u32, 10).unwrap()
}

/// Score of the run-count maximum against a digit's expected range.
fn min_max_score(min_expected: usize, max_expected: usize, actual: usize) -> f32 {
    let mut score = if actual + 1 == min_expected {
        0.5
    } else if actual + 1 < min_expected {
        0.1
    } else {
        1.0
    };
    if actual == max_expected + 1 {
        score *= 0.5;
    } else if actual > max_expected + 1 {
        score *= 0.1;
    }
    score
}

fn count_score(observed: &str, template: &str) -> f32 {
    let stretched = resample(template, observed.chars().count());
    match bounded_levenshtein(observed, &stretched, MAX_ERRORS) {
        Some(cost) => (1.0 - 0.25 * cost as f32).max(0.2),
        None => 0.2,
    }
}

fn signature_score(observed: &str, template: &str) -> f32 {
    let particles = observed.split('/').filter(|p| !p.is_empty()).count();
    let stretched = resample_signature(template, particles);
    match bounded_levenshtein(observed, &stretched, MAX_ERRORS) {
        Some(cost) => (1.0 - 0.2 * cost as f32).max(0.4),
        None => 0.4,
    }
}

/// Stretches (or shrinks) a string to `target` characters, preserving run
/// order.
fn resample(template: &str, target: usize) -> String {
    let chars: Vec<char> = template.chars().collect();
    if chars.is_empty() || target == 0 {
        return String::new();
    }
    if target == 1 {
        return chars[chars.len() / 2].to_string();
    }
    (0..target)
        .map(|i| {
            let idx = (i as f32 * (chars.len() - 1) as f32 / (target - 1) as f32).round() as usize;
            chars[idx]
        })
        .collect()
}

/// Stretches a signature at particle granularity.
fn resample_signature(template: &str, target_particles: usize) -> String {
    let particles: Vec<&str> = template.split('/').filter(|p| !p.is_empty()).collect();
    if particles.is_empty() || target_particles == 0 {
        return "/".to_string();
    }
    let mut out = String::from("/");
    for i in 0..target_particles {
        let idx = if target_particles == 1 {
            particles.len() / 2
        } else {
            (i as f32 * (particles.len() - 1) as f32 / (target_particles - 1) as f32).round()
                as usize
        };
        out.push_str(particles[idx]);
        out.push('/');
    }
    out
}

/// Levenshtein distance, `None` if it exceeds `max_errors`.
fn bounded_levenshtein(a: &str, b: &str, max_errors: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max_errors {
        return None;
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let sub = prev[j - 1] + usize::from(a[i - 1] != b[j - 1]);
            curr[j] = sub.min(prev[j] + 1).min(curr[j - 1] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let cost = prev[b.len()];
    (cost <= max_errors).then_some(cost)
}
