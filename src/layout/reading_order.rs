//! Row-banded reading order for positioned tokens.
//!
//! Tokens are read top-to-bottom, then left-to-right. Two tokens whose
//! baselines differ by less than the band share a row.

use crate::model::TextToken;
use std::cmp::Ordering;

/// Compute the reading order of `tokens` and return their indices.
///
/// Rows are formed by sweeping the tokens from the top: a token joins the
/// current row while its baseline lies within `band` of the row's first
/// (highest) token, otherwise it opens a new row. Within a row tokens are
/// ordered by ascending x; ties keep extraction order. The result is a total
/// order, so it is stable under repeated calls and never depends on the
/// sort algorithm.
///
/// # Examples
///
/// ```
/// use voter_slip::layout::reading_order::reading_order;
/// use voter_slip::model::TextToken;
///
/// let tokens = vec![
///     TextToken::at("b", 50.0, 100.0),
///     TextToken::at("c", 0.0, 80.0),
///     TextToken::at("a", 0.0, 104.0),
/// ];
/// assert_eq!(reading_order(&tokens, 10.0), vec![2, 0, 1]);
/// ```
pub fn reading_order(tokens: &[TextToken], band: f32) -> Vec<usize> {
    let mut by_height: Vec<usize> = (0..tokens.len()).collect();
    by_height.sort_by(|&a, &b| tokens[b].y.total_cmp(&tokens[a].y));

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut anchor_y = f32::NAN;
    for idx in by_height {
        let y = tokens[idx].y;
        match rows.last_mut() {
            Some(row) if (anchor_y - y).abs() < band => row.push(idx),
            _ => {
                anchor_y = y;
                rows.push(vec![idx]);
            },
        }
    }

    let mut order = Vec::with_capacity(tokens.len());
    for mut row in rows {
        row.sort_by(|&a, &b| match tokens[a].x.total_cmp(&tokens[b].x) {
            Ordering::Equal => a.cmp(&b),
            other => other,
        });
        order.extend(row);
    }
    order
}

/// Return clones of `tokens` in reading order.
pub fn sorted_tokens(tokens: &[TextToken], band: f32) -> Vec<TextToken> {
    reading_order(tokens, band)
        .into_iter()
        .map(|i| tokens[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[TextToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_empty() {
        assert!(reading_order(&[], 10.0).is_empty());
    }

    #[test]
    fn test_top_to_bottom() {
        let tokens = vec![
            TextToken::at("low", 0.0, 10.0),
            TextToken::at("high", 0.0, 500.0),
            TextToken::at("mid", 0.0, 200.0),
        ];
        assert_eq!(texts(&sorted_tokens(&tokens, 10.0)), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_band_groups_row_by_x() {
        let tokens = vec![
            TextToken::at("right", 100.0, 98.0),
            TextToken::at("left", 0.0, 100.0),
            TextToken::at("next", 0.0, 80.0),
        ];
        assert_eq!(texts(&sorted_tokens(&tokens, 10.0)), vec!["left", "right", "next"]);
    }

    #[test]
    fn test_band_boundary_is_exclusive() {
        let tokens = vec![
            TextToken::at("second", 0.0, 90.0),
            TextToken::at("first", 100.0, 100.0),
        ];
        // exactly one band apart: separate rows
        assert_eq!(texts(&sorted_tokens(&tokens, 10.0)), vec!["first", "second"]);
    }

    #[test]
    fn test_nan_coordinates_do_not_panic() {
        let tokens = vec![
            TextToken::at("a", f32::NAN, 10.0),
            TextToken::at("b", 0.0, f32::NAN),
            TextToken::at("c", 0.0, 0.0),
        ];
        let order = reading_order(&tokens, 10.0);
        assert_eq!(order.len(), 3);
    }
}
