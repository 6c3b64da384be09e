//! Proportional frame splitting.

use std::ops::Range;

/// Character weight of each text.
#[must_use]
pub fn text_weights<S: AsRef<str>>(texts: &[S]) -> Vec<usize> {
    texts.iter().map(|t| t.as_ref().chars().count()).collect()
}

/// Split `[0, total_frames)` into one range per weight, sized in proportion
/// to the weights.
///
/// Boundary `i` is `floor(total_frames * cumulative_weight_i / total_weight)`
/// and the last boundary is always `total_frames`, so the ranges are
/// contiguous, non-overlapping and cover the whole track. When every weight
/// is zero the split is even.
#[must_use]
pub fn proportional_ranges(total_frames: usize, weights: &[usize]) -> Vec<Range<usize>> {
    if weights.is_empty() {
        return Vec::new();
    }

    let total_weight: usize = weights.iter().sum();
    let (weights, total_weight): (Vec<u128>, u128) = if total_weight == 0 {
        (vec![1; weights.len()], weights.len() as u128)
    } else {
        (
            weights.iter().map(|&w| w as u128).collect(),
            total_weight as u128,
        )
    };

    let frames = total_frames as u128;
    let last = weights.len() - 1;
    let mut ranges = Vec::with_capacity(weights.len());
    let mut start = 0;
    let mut cumulative = 0u128;

    for (i, weight) in weights.into_iter().enumerate() {
        cumulative += weight;
        let end = if i == last {
            total_frames
        } else {
            usize::try_from(frames * cumulative / total_weight).unwrap_or(total_frames)
        };
        ranges.push(start..end);
        start = end;
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[Range<usize>], total: usize) {
        let mut expected_start = 0;
        for range in ranges {
            assert_eq!(range.start, expected_start);
            assert!(range.start <= range.end);
            expected_start = range.end;
        }
        assert_eq!(expected_start, total);
        assert_eq!(ranges.iter().map(ExactSizeIterator::len).sum::<usize>(), total);
    }

    #[test]
    fn test_splits_in_proportion_to_weights() {
        let ranges = proportional_ranges(1000, &[1, 3]);
        assert_eq!(ranges, vec![0..250, 250..1000]);
    }

    #[test]
    fn test_floors_interior_boundaries() {
        let ranges = proportional_ranges(10, &[1, 1, 1]);
        assert_eq!(ranges, vec![0..3, 3..6, 6..10]);
        assert_covers(&ranges, 10);
    }

    #[test]
    fn test_covers_track_for_awkward_inputs() {
        for total in [0, 1, 7, 24_000, 1_234_567] {
            for weights in [
                vec![5],
                vec![0, 9],
                vec![13, 0, 0, 2],
                vec![1, 1, 1, 1, 1, 1, 1],
                vec![100_000, 1, 3],
            ] {
                assert_covers(&proportional_ranges(total, &weights), total);
            }
        }
    }

    #[test]
    fn test_zero_weights_split_evenly() {
        let ranges = proportional_ranges(9, &[0, 0, 0]);
        assert_eq!(ranges, vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn test_zero_weight_gets_empty_range() {
        let ranges = proportional_ranges(100, &[0, 4, 0, 1]);
        assert_eq!(ranges, vec![0..0, 0..80, 80..80, 80..100]);
    }

    #[test]
    fn test_no_weights_no_ranges() {
        assert!(proportional_ranges(100, &[]).is_empty());
    }

    #[test]
    fn test_weights_count_characters() {
        assert_eq!(text_weights(&["héllo", "", "a b"]), vec![5, 0, 3]);
    }
}
