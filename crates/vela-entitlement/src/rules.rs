//! Transition rules
//!
//! A transaction is first classified on its own into a candidate decision.
//! The candidate is then weighed against the current decision by
//! [`supersedes`]. Both steps are pure; the cache runs the second one under
//! its writer lock.

use std::fmt;

use vela_core::{
    Entitlement, EntitlementState, Justification, ProductCatalog, Tier, Timestamp, TransactionEvent,
};

use crate::TransitionError;

/// Why a candidate did not replace the current decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kept {
    /// Lifetime is absorbing
    LifetimeHeld,
    /// Current subscription is still running and was purchased no earlier
    NotNewer,
    /// Free is only ever reached through a restore
    WouldDowngrade,
}

impl fmt::Display for Kept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kept::LifetimeHeld => "lifetime held",
            Kept::NotNewer => "not newer",
            Kept::WouldDowngrade => "would downgrade",
        })
    }
}

/// Precedence between the current decision and a candidate at `now`
///
/// Among running subscriptions the later purchase wins, with the transaction
/// id breaking ties, so the outcome does not depend on delivery order.
pub fn supersedes(current: &Entitlement, candidate: &Entitlement, now: Timestamp) -> Result<(), Kept> {
    match (current.state, candidate.state) {
        (_, EntitlementState::Free) => Err(Kept::WouldDowngrade),
        (EntitlementState::Lifetime, _) => Err(Kept::LifetimeHeld),
        (_, EntitlementState::Lifetime) => Ok(()),
        (EntitlementState::Free, EntitlementState::ActiveMonthly { .. }) => Ok(()),
        (EntitlementState::ActiveMonthly { expires_at }, EntitlementState::ActiveMonthly { .. }) => {
            if expires_at <= now {
                return Ok(());
            }
            let current_key = current.justification.map(|j| j.key());
            let candidate_key = candidate.justification.map(|j| j.key());
            if candidate_key > current_key {
                Ok(())
            } else {
                Err(Kept::NotNewer)
            }
        }
    }
}

/// Per-transaction classification against a product catalog
#[derive(Clone, Debug, Default)]
pub struct TransitionRules {
    catalog: ProductCatalog,
}

impl TransitionRules {
    pub fn new(catalog: ProductCatalog) -> Self {
        TransitionRules { catalog }
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    /// Candidate decision implied by one transaction at `now`
    pub fn classify(
        &self,
        event: &TransactionEvent,
        now: Timestamp,
    ) -> Result<Entitlement, TransitionError> {
        if !event.verified {
            return Err(TransitionError::Unverified(event.transaction_id));
        }
        if event.revoked {
            return Err(TransitionError::Revoked(event.transaction_id));
        }

        let by = Justification::from(event);
        match self.catalog.tier_of(&event.product_id) {
            None => Err(TransitionError::UnknownProduct {
                transaction_id: event.transaction_id,
                product: event.product_id.clone(),
            }),
            Some(Tier::Lifetime) => Ok(Entitlement::lifetime(by)),
            Some(Tier::Monthly) => match event.expiration_date {
                None => Err(TransitionError::MissingExpiration(event.transaction_id)),
                Some(expires_at) if expires_at <= now => Err(TransitionError::Expired {
                    transaction_id: event.transaction_id,
                    expires_at,
                }),
                Some(expires_at) => Ok(Entitlement::monthly(expires_at, by)),
            },
        }
    }

    /// Classification followed by precedence; `Ok(None)` means the current
    /// decision stands
    pub fn evaluate(
        &self,
        current: &Entitlement,
        event: &TransactionEvent,
        now: Timestamp,
    ) -> Result<Option<Entitlement>, TransitionError> {
        let candidate = self.classify(event, now)?;
        Ok(supersedes(current, &candidate, now).ok().map(|()| candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vela_core::{days, ProductId, TransactionId, LIFETIME_PRODUCT, MONTHLY_PRODUCT};

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000)
    }

    fn monthly(id: u64, purchased: Timestamp, expires: Timestamp) -> TransactionEvent {
        TransactionEvent::verified(
            TransactionId::new(id),
            ProductId::new(MONTHLY_PRODUCT),
            purchased,
            Some(expires),
        )
    }

    fn lifetime(id: u64, purchased: Timestamp) -> TransactionEvent {
        TransactionEvent::verified(
            TransactionId::new(id),
            ProductId::new(LIFETIME_PRODUCT),
            purchased,
            None,
        )
    }

    #[test]
    fn test_classify_lifetime() {
        let rules = TransitionRules::default();
        let ent = rules.classify(&lifetime(1, now()), now()).unwrap();
        assert_eq!(ent.state, EntitlementState::Lifetime);
        assert!(ent.is_justified_by(TransactionId::new(1)));
    }

    #[test]
    fn test_classify_monthly_requires_future_expiry() {
        let rules = TransitionRules::default();
        let t = now();

        let running = rules.classify(&monthly(1, t - days(1), t + days(29)), t).unwrap();
        assert_eq!(running.state, EntitlementState::ActiveMonthly { expires_at: t + days(29) });

        assert_eq!(
            rules.classify(&monthly(2, t - days(31), t), t),
            Err(TransitionError::Expired {
                transaction_id: TransactionId::new(2),
                expires_at: t
            })
        );

        let mut open_ended = monthly(3, t, t);
        open_ended.expiration_date = None;
        assert_eq!(
            rules.classify(&open_ended, t),
            Err(TransitionError::MissingExpiration(TransactionId::new(3)))
        );
    }

    #[test]
    fn test_unverified_checked_before_revoked() {
        let rules = TransitionRules::default();
        let event = lifetime(5, now()).unverified().revoked();
        assert_eq!(
            rules.classify(&event, now()),
            Err(TransitionError::Unverified(TransactionId::new(5)))
        );
        assert_eq!(
            rules.classify(&lifetime(6, now()).revoked(), now()),
            Err(TransitionError::Revoked(TransactionId::new(6)))
        );
    }

    #[test]
    fn test_unknown_product_discarded() {
        let rules = TransitionRules::default();
        let mut event = lifetime(9, now());
        event.product_id = ProductId::new("com.textwidget.tip");
        assert!(matches!(
            rules.classify(&event, now()),
            Err(TransitionError::UnknownProduct { .. })
        ));
    }

    #[test]
    fn test_lifetime_is_absorbing() {
        let rules = TransitionRules::default();
        let t = now();
        let held = rules.classify(&lifetime(1, t - days(100)), t).unwrap();

        let later = monthly(2, t, t + days(30));
        assert_eq!(rules.evaluate(&held, &later, t), Ok(None));
        assert_eq!(supersedes(&held, &Entitlement::FREE, t), Err(Kept::WouldDowngrade));
        assert_eq!(
            supersedes(&held, &rules.classify(&lifetime(3, t), t).unwrap(), t),
            Err(Kept::LifetimeHeld)
        );
    }

    #[test]
    fn test_lifetime_beats_running_monthly() {
        let rules = TransitionRules::default();
        let t = now();
        let current = rules.classify(&monthly(1, t, t + days(30)), t).unwrap();
        let next = rules.evaluate(&current, &lifetime(2, t - days(400)), t).unwrap();
        assert_eq!(next.map(|e| e.state), Some(EntitlementState::Lifetime));
    }

    #[test]
    fn test_lapsed_monthly_replaced_by_older_purchase() {
        let rules = TransitionRules::default();
        let t = now();
        let lapsed = Entitlement::monthly(
            t - days(1),
            Justification {
                transaction_id: TransactionId::new(10),
                purchase_date: t - days(2),
            },
        );
        let older = monthly(4, t - days(20), t + days(10));
        assert!(rules.evaluate(&lapsed, &older, t).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_delivery_is_unchanged() {
        let rules = TransitionRules::default();
        let t = now();
        let event = monthly(1, t, t + days(30));
        let current = rules.classify(&event, t).unwrap();
        assert_eq!(rules.evaluate(&current, &event, t), Ok(None));
    }

    proptest! {
        #[test]
        fn prop_running_monthly_order_independent(
            purchases in prop::collection::vec((0i64..1_000, 1i64..1_000), 1..12),
            seed in any::<u64>(),
        ) {
            let rules = TransitionRules::default();
            let t = now();
            let events: Vec<_> = purchases
                .iter()
                .enumerate()
                .map(|(i, (p, e))| {
                    monthly(
                        i as u64,
                        t - std::time::Duration::from_secs(*p as u64),
                        t + std::time::Duration::from_secs(*e as u64),
                    )
                })
                .collect();

            let fold = |order: &[TransactionEvent]| {
                order.iter().fold(Entitlement::FREE, |cur, ev| {
                    rules.evaluate(&cur, ev, t).unwrap().unwrap_or(cur)
                })
            };

            let mut shuffled = events.clone();
            let n = shuffled.len();
            let mut s = seed;
            for i in (1..n).rev() {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                shuffled.swap(i, (s >> 33) as usize % (i + 1));
            }

            let best = events.iter().max_by_key(|e| e.replay_key()).unwrap();
            let forward = fold(&events);
            prop_assert_eq!(forward, fold(&shuffled));
            prop_assert!(forward.is_justified_by(best.transaction_id));
        }
    }
}
