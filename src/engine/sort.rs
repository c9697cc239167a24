//! Two-key ranking: priority class strictly dominant, SIR second.
//! Produces an index permutation so candidate records never move; the
//! interaction engine's backward/forward scans and `associated_winner`
//! indices stay referentially stable.

use crate::catalog::PriorityClass;
use crate::measures::Candidate;

/// Sentinel key below every real record: no real candidate can sort past
/// the end of the list.
const BOTTOM: (PriorityClass, f64) = (PriorityClass::Bottom, f64::NEG_INFINITY);

/// Index permutation in decreasing (priority, SIR) order.
pub fn rank(candidates: &[Candidate]) -> Vec<usize> {
    if candidates.len() <= 1 {
        return (0..candidates.len()).collect();
    }

    let mut keys: Vec<(PriorityClass, f64, usize)> = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| (c.priority, c.sir, index))
        .collect();
    keys.push((BOTTOM.0, BOTTOM.1, usize::MAX));

    keys.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.total_cmp(&a.1)));

    let sentinel = keys.pop();
    debug_assert!(matches!(sentinel, Some((PriorityClass::Bottom, _, usize::MAX))));

    keys.into_iter().map(|(_, _, index)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EconCategory, MeasureKind};
    use crate::measures::CandidateState;

    fn candidate(priority: PriorityClass, sir: f64) -> Candidate {
        Candidate {
            kind: MeasureKind::StormWindows,
            category: EconCategory::Envelope,
            detail: String::new(),
            components: vec![],
            heat_savings_mmbtu: 0.0,
            cool_savings_mmbtu: 0.0,
            base_savings_mmbtu: 0.0,
            base_fuel: None,
            heat_dollars: 0.0,
            cool_dollars: 0.0,
            base_dollars: 0.0,
            annual_dollars: 0.0,
            cost: 100.0,
            life_years: 10.0,
            sir,
            npv: 0.0,
            priority,
            required: false,
            magnitude: 0.0,
            state: CandidateState::Scored,
            associated_winner: None,
        }
    }

    #[test]
    fn empty_and_singleton_lists_pass_through() {
        assert!(rank(&[]).is_empty());
        let one = vec![candidate(PriorityClass::SirRanked, 1.0)];
        assert_eq!(rank(&one), vec![0]);
    }

    #[test]
    fn priority_dominates_sir() {
        let candidates = vec![
            candidate(PriorityClass::SirRanked, 9.0),
            candidate(PriorityClass::DuctSeal, 0.1),
            candidate(PriorityClass::NpvOnly, 50.0),
            candidate(PriorityClass::SirRanked, 2.0),
        ];
        let order = rank(&candidates);
        assert_eq!(order, vec![1, 0, 3, 2]);
    }

    #[test]
    fn order_is_nonincreasing_in_both_keys() {
        let candidates = vec![
            candidate(PriorityClass::SirRanked, 1.4),
            candidate(PriorityClass::Required, 0.2),
            candidate(PriorityClass::SirRanked, 3.3),
            candidate(PriorityClass::Infiltration, 0.9),
            candidate(PriorityClass::NpvOnly, 2.0),
            candidate(PriorityClass::SirRanked, f64::NAN),
        ];
        let order = rank(&candidates);
        assert_eq!(order.len(), candidates.len());
        for pair in order.windows(2) {
            let a = &candidates[pair[0]];
            let b = &candidates[pair[1]];
            assert!(
                a.priority > b.priority
                    || (a.priority == b.priority && a.sir.total_cmp(&b.sir).is_ge()),
                "sort order violated between {:?} and {:?}",
                (a.priority, a.sir),
                (b.priority, b.sir)
            );
        }
    }
}
