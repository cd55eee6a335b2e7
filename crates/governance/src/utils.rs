use std::fmt::Display;

use quorum_core::chain::BlockHeight;
use quorum_core::time::DurationSecs;
use quorum_core::token;

use crate::storage::proposal::Proposal;

/// Alias to accumulate voting power
pub type VotePower = token::Amount;

const SECS_PER_HOUR: u64 = 60 * 60;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// The outcome of a proposal's tallies, recomputed on every read
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProposalResult {
    /// Share of the decisive votes in favour, in percent
    pub for_percentage: f64,
    /// Share of the decisive votes against, in percent
    pub against_percentage: f64,
    /// The decisive votes reached the quorum
    pub quorum_reached: bool,
    /// The proposal is passing: more `for` than `against` and quorum reached
    pub passed: bool,
}

impl ProposalResult {
    /// Compute the result of a proposal from its current tallies
    pub fn of(proposal: &Proposal) -> Self {
        compute_proposal_result(
            proposal.for_votes,
            proposal.against_votes,
            proposal.quorum,
        )
    }
}

impl Display for ProposalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.passed { "Passed" } else { "Rejected" };
        write!(
            f,
            "{} with {:.2}% for and {:.2}% against, quorum {}",
            verdict,
            self.for_percentage,
            self.against_percentage,
            if self.quorum_reached {
                "reached"
            } else {
                "not reached"
            }
        )
    }
}

/// Compute the result of a proposal.
///
/// Only `for` and `against` votes are decisive: abstentions count neither
/// towards the percentages nor towards the quorum. With no decisive votes
/// both percentages are zero. A tie does not pass.
pub fn compute_proposal_result(
    for_votes: VotePower,
    against_votes: VotePower,
    quorum: VotePower,
) -> ProposalResult {
    let total_decisive = for_votes.saturating_add(against_votes);
    let quorum_reached = total_decisive >= quorum;

    let (for_percentage, against_percentage) = if total_decisive.is_zero() {
        (0.0, 0.0)
    } else {
        let total = total_decisive.to_f64_lossy();
        (
            for_votes.to_f64_lossy() / total * 100.0,
            against_votes.to_f64_lossy() / total * 100.0,
        )
    };

    // Percentages that round to a tie do not pass, even when the exact
    // tallies differ.
    let passed = for_percentage > against_percentage && quorum_reached;

    ProposalResult {
        for_percentage,
        against_percentage,
        quorum_reached,
        passed,
    }
}

/// Estimated time left in a proposal's voting window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeRemaining {
    /// The voting window is over
    Ended,
    /// Less than a day left, in whole hours
    Hours(u64),
    /// At least a day left, in whole days
    Days(u64),
}

impl Display for TimeRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRemaining::Ended => write!(f, "ended"),
            TimeRemaining::Hours(1) => write!(f, "1 hour"),
            TimeRemaining::Hours(hours) => write!(f, "{hours} hours"),
            TimeRemaining::Days(1) => write!(f, "1 day"),
            TimeRemaining::Days(days) => write!(f, "{days} days"),
        }
    }
}

/// Estimate the time left until `end_block`, assuming a fixed block time.
/// The current block may be approximate.
pub fn time_remaining(
    end_block: BlockHeight,
    current_block: BlockHeight,
    block_time: DurationSecs,
) -> TimeRemaining {
    let seconds = current_block
        .blocks_until(end_block)
        .map(|blocks| blocks.saturating_mul(block_time.0))
        .unwrap_or_default();

    if seconds == 0 {
        TimeRemaining::Ended
    } else if seconds < SECS_PER_DAY {
        TimeRemaining::Hours(seconds / SECS_PER_HOUR)
    } else {
        TimeRemaining::Days(seconds / SECS_PER_DAY)
    }
}

/// Testing helpers and strategies for proposal results
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use proptest::prelude::*;
    use quorum_core::token::testing::arb_amount;

    use super::*;

    prop_compose! {
        /// Generate arbitrary `(for, against, abstain, quorum)` tallies
        pub fn arb_tallies()(
            for_votes in arb_amount(),
            against_votes in arb_amount(),
            abstain_votes in arb_amount(),
            quorum in arb_amount(),
        ) -> (VotePower, VotePower, VotePower, VotePower) {
            (for_votes, against_votes, abstain_votes, quorum)
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::storage::proposal::testing::proposal;
    use crate::storage::proposal::ProposalState;

    fn whole(amount: u64) -> VotePower {
        token::Amount::native_whole(amount)
    }

    #[test]
    fn test_proposal_result_tie_does_not_pass() {
        let result = compute_proposal_result(
            token::Amount::from_u64(100),
            token::Amount::from_u64(100),
            token::Amount::zero(),
        );
        assert!(result.quorum_reached);
        assert!(!result.passed);
        assert_eq!(result.for_percentage, 50.0);
        assert_eq!(result.against_percentage, 50.0);
    }

    #[test]
    fn test_proposal_result_rounded_tie_does_not_pass() {
        // one base unit apart at 1e24 scale, beyond `f64` precision
        let against_votes = whole(1_000_000);
        let for_votes =
            against_votes.checked_add(token::Amount::from_u64(1)).unwrap();
        assert!(for_votes > against_votes);

        let result =
            compute_proposal_result(for_votes, against_votes, whole(1));
        assert_eq!(result.for_percentage, result.against_percentage);
        assert!(result.quorum_reached);
        assert!(!result.passed);
        assert_eq!(
            result.to_string(),
            "Rejected with 50.00% for and 50.00% against, quorum reached"
        );
    }

    #[test]
    fn test_proposal_result_no_votes_should_fail() {
        let result = compute_proposal_result(
            token::Amount::zero(),
            token::Amount::zero(),
            token::Amount::from_u64(1000),
        );
        assert_eq!(
            result,
            ProposalResult {
                for_percentage: 0.0,
                against_percentage: 0.0,
                quorum_reached: false,
                passed: false,
            }
        );
    }

    #[test]
    fn test_proposal_result_no_votes_zero_quorum() {
        let result = compute_proposal_result(
            token::Amount::zero(),
            token::Amount::zero(),
            token::Amount::zero(),
        );
        assert!(result.quorum_reached);
        assert!(!result.passed);
    }

    #[test]
    fn test_proposal_result_with_abstentions() {
        let mut proposal = proposal(1, ProposalState::Active);
        proposal.for_votes = whole(1000);
        proposal.against_votes = whole(500);
        proposal.abstain_votes = whole(100);
        proposal.quorum = whole(800);

        let result = ProposalResult::of(&proposal);
        assert!((result.for_percentage - 66.67).abs() < 0.01);
        assert!((result.against_percentage - 33.33).abs() < 0.01);
        assert!(result.quorum_reached);
        assert!(result.passed);
        assert_eq!(
            result.to_string(),
            "Passed with 66.67% for and 33.33% against, quorum reached"
        );
    }

    #[test]
    fn test_proposal_result_majority_without_quorum() {
        let result =
            compute_proposal_result(whole(700), whole(50), whole(800));
        assert!(!result.quorum_reached);
        assert!(!result.passed);
    }

    #[test]
    fn test_time_remaining() {
        let block_time = DurationSecs(15);
        let current = BlockHeight(1_000);

        assert_eq!(
            time_remaining(BlockHeight(1_000), current, block_time),
            TimeRemaining::Ended
        );
        assert_eq!(
            time_remaining(BlockHeight(900), current, block_time),
            TimeRemaining::Ended
        );
        // 240 blocks * 15s = 1h
        assert_eq!(
            time_remaining(BlockHeight(1_240), current, block_time),
            TimeRemaining::Hours(1)
        );
        // 10 blocks * 15s = 150s, less than an hour
        assert_eq!(
            time_remaining(BlockHeight(1_010), current, block_time),
            TimeRemaining::Hours(0)
        );
        // 5760 blocks * 15s = exactly one day
        assert_eq!(
            time_remaining(BlockHeight(6_760), current, block_time),
            TimeRemaining::Days(1)
        );
        // 5759 blocks is just under a day
        assert_eq!(
            time_remaining(BlockHeight(6_759), current, block_time),
            TimeRemaining::Hours(23)
        );
        assert_eq!(TimeRemaining::Days(3).to_string(), "3 days");
        assert_eq!(TimeRemaining::Hours(1).to_string(), "1 hour");
    }

    proptest! {
        #[test]
        fn test_quorum_ignores_abstentions(
            (for_votes, against_votes, abstain_votes, quorum)
                in testing::arb_tallies(),
        ) {
            let mut proposal = proposal(1, ProposalState::Active);
            proposal.for_votes = for_votes;
            proposal.against_votes = against_votes;
            proposal.quorum = quorum;
            let without = ProposalResult::of(&proposal);
            proposal.abstain_votes = abstain_votes;
            let with = ProposalResult::of(&proposal);

            let decisive = for_votes.checked_add(against_votes).unwrap();
            prop_assert_eq!(with.quorum_reached, decisive >= quorum);
            prop_assert_eq!(with, without);
        }

        #[test]
        fn test_percentages_are_complementary(
            (for_votes, against_votes, _abstain, quorum)
                in testing::arb_tallies(),
        ) {
            let result =
                compute_proposal_result(for_votes, against_votes, quorum);
            let sum = result.for_percentage + result.against_percentage;
            if for_votes.is_zero() && against_votes.is_zero() {
                prop_assert_eq!(sum, 0.0);
            } else {
                prop_assert!((sum - 100.0).abs() < 1e-9);
            }
            prop_assert_eq!(
                result.passed,
                result.quorum_reached
                    && result.for_percentage > result.against_percentage
            );
            if result.passed {
                prop_assert!(for_votes > against_votes);
            }
        }
    }
}
