use std::collections::BTreeMap;

/// Count how many times each value appears.
/// Card pattern recognition is driven entirely by the per-rank histogram
/// so this is shared between the classifier and the play enumerator.
pub fn value_counts<I>(values: I) -> BTreeMap<i32, i32>
where
    I: IntoIterator<Item = i32>,
{
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Longest run of consecutive values in a strictly descending slice.
/// Ties go to the run that appears first (the higher-valued run), which is
/// what decides which triples anchor an airplane when several runs exist.
pub fn longest_consecutive_run(values: &[i32]) -> Vec<i32> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut best_start = 0;
    let mut best_len = 1;
    let mut start = 0;
    let mut len = 1;
    for i in 1..values.len() {
        if values[i] == values[i - 1] - 1 {
            len += 1;
        } else {
            if len > best_len {
                best_start = start;
                best_len = len;
            }
            start = i;
            len = 1;
        }
    }
    if len > best_len {
        best_start = start;
        best_len = len;
    }
    values[best_start..best_start + best_len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_counts() {
        let counts = value_counts(vec![3, 3, 3, 7, 7, 17]);
        assert_eq!(counts.get(&3), Some(&3));
        assert_eq!(counts.get(&7), Some(&2));
        assert_eq!(counts.get(&17), Some(&1));
        assert_eq!(counts.get(&4), None);
        assert_eq!(counts.len(), 3, "only the present values get entries");
    }

    #[test]
    fn test_longest_run_basic() {
        assert_eq!(longest_consecutive_run(&[9, 8, 7, 5, 4]), vec![9, 8, 7]);
        assert_eq!(longest_consecutive_run(&[12]), vec![12]);
        assert_eq!(longest_consecutive_run(&[]), Vec::<i32>::new());
    }

    #[test]
    fn test_longest_run_prefers_high_values_on_tie() {
        // Two runs of length 2: the higher one anchors the result
        assert_eq!(longest_consecutive_run(&[11, 10, 6, 5]), vec![11, 10]);
    }

    #[test]
    fn test_longest_run_no_consecutive_values() {
        assert_eq!(longest_consecutive_run(&[13, 10, 7]), vec![13]);
    }
}
