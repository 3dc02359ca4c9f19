//! Final payouts of an adversarially closed channel.

use crate::amount::{checked_add, checked_sub, fail_safe_add, fail_safe_sub};
use crate::error::MicropayError;

/// One side's accounting as seen by settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettlementInput {
    pub deposit: u64,
    pub withdrawn: u64,
    pub transferred: u64,
    pub locked: u64,
}

impl SettlementInput {
    /// The most this side can have sent its partner, counting every pending lock.
    pub fn max_transferred(&self) -> u64 {
        fail_safe_add(self.transferred, self.locked)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub p1_amount: u64,
    pub p2_amount: u64,
    /// Participant 1's pending locks that remain for unlock.
    pub p1_locked: u64,
    pub p2_locked: u64,
}

impl SettlementOutcome {
    pub fn total(&self) -> Result<u64, MicropayError> {
        let paid = checked_add(self.p1_amount, self.p2_amount, "settled amounts")?;
        let locked = checked_add(self.p1_locked, self.p2_locked, "locked amounts")?;
        checked_add(paid, locked, "settlement total")
    }
}

/// Whether two sides must be swapped so that participant 1 is the one with the smaller maximum transfer.
pub fn needs_swap(s1: &SettlementInput, s2: &SettlementInput) -> bool {
    s1.max_transferred() > s2.max_transferred()
}

/// Splits the available deposit between both sides and the pending locks.
///
/// `s1` must be the side with the smaller `transferred + locked`, see [`needs_swap`]. The results always add
/// up to the channel's available deposit, whatever the two balance proofs claim.
pub fn settle_amounts(s1: &SettlementInput, s2: &SettlementInput) -> Result<SettlementOutcome, MicropayError> {
    let p1_max_transferred = s1.max_transferred();
    let p2_max_transferred = s2.max_transferred();
    if p2_max_transferred < p1_max_transferred {
        return Err(MicropayError::math("participant 1 must have the smaller maximum transfer"));
    }
    let p1_net_received = p2_max_transferred - p1_max_transferred;
    let p1_max_amount = checked_sub(fail_safe_add(p1_net_received, s1.deposit), s1.withdrawn, "participant 1 amount")?;

    let deposits = checked_add(s1.deposit, s2.deposit, "total deposit")?;
    let withdrawn = checked_add(s1.withdrawn, s2.withdrawn, "total withdraw")?;
    let tad = checked_sub(deposits, withdrawn, "available deposit")?;

    let p1_amount = p1_max_amount.min(tad);
    let p2_amount = tad - p1_amount;
    let (p1_amount, p2_locked) = fail_safe_sub(p1_amount, s2.locked);
    let (p2_amount, p1_locked) = fail_safe_sub(p2_amount, s1.locked);
    if p1_amount > tad || p2_amount > tad {
        return Err(MicropayError::math("settled amount exceeds the available deposit"));
    }
    let outcome = SettlementOutcome { p1_amount, p2_amount, p1_locked, p2_locked };
    if outcome.total()? != tad {
        return Err(MicropayError::math(format!("settlement does not conserve the available deposit {tad}")));
    }
    Ok(outcome)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    fn side(deposit: u64, withdrawn: u64, transferred: u64, locked: u64) -> SettlementInput {
        SettlementInput { deposit, withdrawn, transferred, locked }
    }

    #[test]
    fn untouched_channel_refunds_deposits() {
        let out = settle_amounts(&side(100, 0, 0, 0), &side(40, 0, 0, 0)).unwrap();
        assert_eq!(out, SettlementOutcome { p1_amount: 100, p2_amount: 40, p1_locked: 0, p2_locked: 0 });
    }

    #[test]
    fn net_transfers() {
        // A deposited 100 and sent 40, B deposited 50 and sent 70
        let a = side(100, 0, 40, 0);
        let b = side(50, 0, 70, 0);
        assert!(!needs_swap(&a, &b));
        let out = settle_amounts(&a, &b).unwrap();
        assert_eq!((out.p1_amount, out.p2_amount), (130, 20));
    }

    #[test]
    fn over_reported_transfers_are_capped() {
        // B claims to have sent more than it ever deposited
        let out = settle_amounts(&side(100, 0, 0, 0), &side(0, 0, 70, 0)).unwrap();
        assert_eq!((out.p1_amount, out.p2_amount), (100, 0));
    }

    #[test]
    fn locks_are_held_back() {
        // A deposited 100 and has 30 locked towards B, so B is participant 1
        let a = side(100, 0, 0, 30);
        let b = side(0, 0, 0, 0);
        assert!(needs_swap(&a, &b));
        let out = settle_amounts(&b, &a).unwrap();
        assert_eq!(out, SettlementOutcome { p1_amount: 0, p2_amount: 70, p1_locked: 0, p2_locked: 30 });
    }

    #[test]
    fn withdrawals_reduce_payouts() {
        let out = settle_amounts(&side(100, 30, 10, 0), &side(50, 0, 20, 5)).unwrap();
        // TAD = 120, p1 max = 15 + 100 - 30 = 85, p2 = 35, then 5 is held back from p1
        assert_eq!(out, SettlementOutcome { p1_amount: 80, p2_amount: 35, p1_locked: 0, p2_locked: 5 });
    }

    #[test]
    fn always_conserves() {
        let cases = [
            (side(10, 0, 3, 9), side(10, 0, 8, 7)),
            (side(1, 0, 0, 0), side(u64::MAX - 1, 0, u64::MAX, 1)),
            (side(500, 100, 250, 0), side(200, 200, 300, 60)),
            (side(7, 7, 0, 0), side(0, 0, 5, 0)),
        ];
        for (a, b) in cases {
            let (s1, s2) = if needs_swap(&a, &b) { (b, a) } else { (a, b) };
            let out = settle_amounts(&s1, &s2).unwrap();
            let tad = s1.deposit + s2.deposit - s1.withdrawn - s2.withdrawn;
            assert_eq!(out.total().unwrap(), tad);
            assert!(out.p1_locked <= s1.locked && out.p2_locked <= s2.locked);
        }
    }

    #[test]
    fn wrong_order_is_rejected() {
        let err = settle_amounts(&side(10, 0, 5, 0), &side(10, 0, 1, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Math);
    }
}
