use std::fmt;

/// Outcome of asking one scanner about one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Malicious,
    Clean,
    /// The scanner could not produce a definitive answer.
    Unknown,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Malicious => "malicious",
            Verdict::Clean => "clean",
            Verdict::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Side effect applied to a message once all of its verdicts are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DeleteAndLog,
    MarkUnknown,
    MarkSafe,
}

/// Reduces a message's verdicts to a single action.
///
/// Any malicious verdict wins, then any unknown one; only an all-clean set is marked safe.
/// The result does not depend on the order of `verdicts`.
pub fn decide<'a, I>(verdicts: I) -> Action
where
    I: IntoIterator<Item = &'a Verdict>,
{
    let mut saw_unknown = false;
    for verdict in verdicts {
        match verdict {
            Verdict::Malicious => return Action::DeleteAndLog,
            Verdict::Unknown => saw_unknown = true,
            Verdict::Clean => {}
        }
    }
    if saw_unknown {
        Action::MarkUnknown
    } else {
        Action::MarkSafe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Verdict::{Clean, Malicious, Unknown};

    #[test]
    fn malicious_and_clean_deletes() {
        assert_eq!(decide(&[Malicious, Clean]), Action::DeleteAndLog);
    }

    #[test]
    fn unknown_and_clean_marks_unknown() {
        assert_eq!(decide(&[Unknown, Clean]), Action::MarkUnknown);
    }

    #[test]
    fn all_clean_marks_safe() {
        assert_eq!(decide(&[Clean, Clean]), Action::MarkSafe);
    }

    #[test]
    fn malicious_dominates_unknown() {
        assert_eq!(decide(&[Unknown, Malicious]), Action::DeleteAndLog);
        assert_eq!(decide(&[Malicious, Unknown, Clean]), Action::DeleteAndLog);
    }

    #[test]
    fn order_does_not_matter() {
        let sets: [&[Verdict]; 4] = [
            &[Clean, Unknown, Malicious],
            &[Clean, Unknown, Clean],
            &[Clean, Clean, Clean],
            &[Unknown, Unknown],
        ];
        for set in sets {
            let expected = decide(set);
            let mut reversed = set.to_vec();
            reversed.reverse();
            assert_eq!(decide(&reversed), expected);
            let mut rotated = set.to_vec();
            rotated.rotate_left(1);
            assert_eq!(decide(&rotated), expected);
            // Applying the rule again to the same set gives the same answer.
            assert_eq!(decide(set), expected);
        }
    }
}
