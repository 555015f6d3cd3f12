//! Task progress derivation.
//!
//! A task with subtasks always reports the average of its subtasks'
//! completion; the user-set value only applies when no subtasks exist.

/// Computes a task's progress (0-100).
///
/// With subtasks: `round(mean(completed as 0/100))`, rounded half-up.
/// Without: the manual value clamped to 0-100.
#[must_use]
pub fn task_progress(subtasks_completed: &[bool], manual: i32) -> i32 {
    if subtasks_completed.is_empty() {
        return manual.clamp(0, 100);
    }
    let done = subtasks_completed.iter().filter(|c| **c).count();
    let total = subtasks_completed.len();
    // round(done / total * 100) in integer arithmetic, half-up
    let scaled = done * 200 + total;
    i32::try_from(scaled / (total * 2)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[], 42, 42)]
    #[case(&[], 150, 100)]
    #[case(&[], -5, 0)]
    #[case(&[true], 0, 100)]
    #[case(&[false], 80, 0)]
    #[case(&[true, false], 0, 50)]
    #[case(&[true, true, false], 0, 67)]
    #[case(&[true, false, false], 0, 33)]
    #[case(&[true, true, true, false, false, false, false], 0, 43)]
    fn test_progress(#[case] subtasks: &[bool], #[case] manual: i32, #[case] expected: i32) {
        assert_eq!(task_progress(subtasks, manual), expected);
    }

    #[test]
    fn test_subtasks_override_manual() {
        // Manual value is ignored as soon as any subtask exists.
        assert_eq!(task_progress(&[false, false], 99), 0);
    }
}
