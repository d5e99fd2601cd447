//! Debian-style ordering of tag strings
//!
//! Tags are compared segment by segment, alternating between a run of
//! non-digit characters (compared bytewise) and a run of ASCII digits
//! (compared as `u64`, with unparsable runs counting as zero). When one side
//! runs out, the shorter residual sorts first.
//!
//! Examples:
//! - "1.2.10" > "1.2.9"
//! - "1" < "a" (an empty non-digit run sorts first)
//! - "1.2.9" < "1.2.9-rc1" (same prefix, shorter residual)

use std::cmp::Ordering;

/// Compare two tags using alternating alphabetic/numeric segments.
pub fn compare_versions(lhs: &str, rhs: &str) -> Ordering {
    let (mut lhs, mut rhs) = (lhs, rhs);

    while !lhs.is_empty() && !rhs.is_empty() {
        let (l_alpha, l_rest) = split_run(lhs, false);
        let (r_alpha, r_rest) = split_run(rhs, false);
        match l_alpha.cmp(r_alpha) {
            Ordering::Equal => {}
            other => return other,
        }

        let (l_digits, l_rest) = split_run(l_rest, true);
        let (r_digits, r_rest) = split_run(r_rest, true);
        match compare_numeric(l_digits, r_digits) {
            Ordering::Equal => {}
            other => return other,
        }

        lhs = l_rest;
        rhs = r_rest;
    }

    lhs.len().cmp(&rhs.len())
}

/// Sort tags newest first. The sort is stable, so tags that compare equal
/// keep their registry order.
pub fn sort_descending(tags: &mut [String]) {
    tags.sort_by(|a, b| compare_versions(b, a));
}

/// Split off the maximal leading run of digits (`digits == true`) or
/// non-digits (`digits == false`).
fn split_run(s: &str, digits: bool) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digits)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Compare two digit runs as `u64` values. A run that does not parse, either
/// empty or too large, counts as zero.
fn compare_numeric(lhs: &str, rhs: &str) -> Ordering {
    parse_run(lhs).cmp(&parse_run(rhs))
}

fn parse_run(run: &str) -> u64 {
    run.parse().unwrap_or(0)
}
