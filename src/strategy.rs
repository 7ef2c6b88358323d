/// Strategy effects and the rate modifiers they produce.
///
/// Active strategies register effects here instead of hooking into a global
/// event bus. Applying or unapplying an effect is an explicit call; the space
/// center recomputes rates afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::FacilityCategory;

/// Read-only lookup of the strategy-driven rate multiplier for a category
pub trait RateModifiers {
    fn rate_multiplier(&self, category: FacilityCategory) -> f64;
}

/// No strategies: every multiplier is 1
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModifiers;

impl RateModifiers for NoModifiers {
    fn rate_multiplier(&self, _category: FacilityCategory) -> f64 {
        1.0
    }
}

/// Currencies an effect can scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    Funds,
    Science,
    Reputation,
    Confidence,
    /// Build and integration rate
    Rate,
}

/// Why a transaction or rate query happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionReason {
    RateIntegrationPad,
    RateIntegrationHangar,
    SalaryEngineers,
    StructureConstruction,
}

impl TransactionReason {
    /// Reason used for a category's integration rate query
    pub fn rate_for(category: FacilityCategory) -> Self {
        match category {
            FacilityCategory::Pad => TransactionReason::RateIntegrationPad,
            FacilityCategory::Hangar => TransactionReason::RateIntegrationHangar,
        }
    }
}

/// A query whose per-currency amounts effects can scale
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyQuery {
    pub reason: TransactionReason,
    inputs: BTreeMap<Currency, f64>,
    multipliers: BTreeMap<Currency, f64>,
}

impl CurrencyQuery {
    pub fn new(reason: TransactionReason) -> Self {
        Self {
            reason,
            inputs: BTreeMap::new(),
            multipliers: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, currency: Currency, amount: f64) -> Self {
        self.inputs.insert(currency, amount);
        self
    }

    pub fn input(&self, currency: Currency) -> f64 {
        self.inputs.get(&currency).copied().unwrap_or(0.0)
    }

    pub fn multiply(&mut self, currency: Currency, factor: f64) {
        *self.multipliers.entry(currency).or_insert(1.0) *= factor;
    }

    pub fn multiplier(&self, currency: Currency) -> f64 {
        self.multipliers.get(&currency).copied().unwrap_or(1.0)
    }

    /// Input after every applied multiplier
    pub fn output(&self, currency: Currency) -> f64 {
        self.input(currency) * self.multiplier(currency)
    }
}

/// Kinds of strategy effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Scale one currency for the listed transaction reasons
    CurrencyModifier {
        currency: Currency,
        reasons: Vec<TransactionReason>,
        multiplier: f64,
        /// Use `2 - multiplier` when the queried amount is negative
        invert_if_negative: bool,
        /// Report the effect as positive when it shrinks the currency
        flip_positive: bool,
    },
    /// Scale the integration rate of one facility category
    RateModifier {
        category: FacilityCategory,
        multiplier: f64,
    },
}

impl Effect {
    pub fn multiplier(&self) -> f64 {
        match self {
            Effect::CurrencyModifier { multiplier, .. } | Effect::RateModifier { multiplier, .. } => {
                *multiplier
            }
        }
    }

    /// Whether the player would see this effect as a bonus
    pub fn is_positive(&self) -> bool {
        match self {
            Effect::CurrencyModifier {
                multiplier,
                flip_positive,
                ..
            } => (*multiplier > 1.0) ^ *flip_positive,
            Effect::RateModifier { multiplier, .. } => *multiplier > 1.0,
        }
    }

    /// Scale the query if this effect listens to its reason
    pub fn modify(&self, query: &mut CurrencyQuery) {
        match self {
            Effect::CurrencyModifier {
                currency,
                reasons,
                multiplier,
                invert_if_negative,
                ..
            } => {
                if !reasons.contains(&query.reason) {
                    return;
                }
                let mut factor = *multiplier;
                if *invert_if_negative && query.input(*currency) < 0.0 {
                    factor = 2.0 - factor;
                }
                query.multiply(*currency, factor);
            }
            Effect::RateModifier {
                category,
                multiplier,
            } => {
                if query.reason == TransactionReason::rate_for(*category) {
                    query.multiply(Currency::Rate, *multiplier);
                }
            }
        }
    }
}

/// Handle returned when an effect is applied
pub type EffectId = u32;

/// Registry of currently applied effects
#[derive(Debug, Clone, Default)]
pub struct StrategyEffects {
    effects: Vec<(EffectId, Effect)>,
    next_id: EffectId,
}

impl StrategyEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an effect. Returns the handle to unapply it with.
    pub fn apply(&mut self, effect: Effect) -> EffectId {
        self.next_id += 1;
        let id = self.next_id;
        tracing::debug!(effect = id, ?effect, "applied strategy effect");
        self.effects.push((id, effect));
        id
    }

    /// Remove a previously applied effect
    pub fn unapply(&mut self, id: EffectId) -> Option<Effect> {
        let pos = self.effects.iter().position(|(e, _)| *e == id)?;
        tracing::debug!(effect = id, "unapplied strategy effect");
        Some(self.effects.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run every applied effect over the query, in application order
    pub fn modify(&self, query: &mut CurrencyQuery) {
        for (_, effect) in &self.effects {
            effect.modify(query);
        }
    }

    /// Combined rate multiplier for a reason
    pub fn rate(&self, reason: TransactionReason) -> f64 {
        let mut query = CurrencyQuery::new(reason).with_input(Currency::Rate, 1.0);
        self.modify(&mut query);
        query.output(Currency::Rate)
    }
}

impl RateModifiers for StrategyEffects {
    fn rate_multiplier(&self, category: FacilityCategory) -> f64 {
        self.rate(TransactionReason::rate_for(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_boost(multiplier: f64) -> Effect {
        Effect::CurrencyModifier {
            currency: Currency::Rate,
            reasons: vec![TransactionReason::RateIntegrationPad],
            multiplier,
            invert_if_negative: false,
            flip_positive: false,
        }
    }

    #[test]
    fn test_no_effects_is_neutral() {
        let effects = StrategyEffects::new();
        assert_eq!(effects.rate_multiplier(FacilityCategory::Pad), 1.0);
        assert_eq!(NoModifiers.rate_multiplier(FacilityCategory::Hangar), 1.0);
    }

    #[test]
    fn test_apply_and_unapply() {
        let mut effects = StrategyEffects::new();
        let a = effects.apply(rate_boost(1.2));
        let b = effects.apply(Effect::RateModifier {
            category: FacilityCategory::Pad,
            multiplier: 1.5,
        });
        assert!((effects.rate_multiplier(FacilityCategory::Pad) - 1.8).abs() < 1e-9);
        assert_eq!(effects.rate_multiplier(FacilityCategory::Hangar), 1.0);

        assert!(effects.unapply(a).is_some());
        assert!(effects.unapply(a).is_none());
        assert!((effects.rate_multiplier(FacilityCategory::Pad) - 1.5).abs() < 1e-9);
        effects.unapply(b);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_invert_if_negative() {
        let effect = Effect::CurrencyModifier {
            currency: Currency::Funds,
            reasons: vec![TransactionReason::SalaryEngineers],
            multiplier: 0.8,
            invert_if_negative: true,
            flip_positive: true,
        };
        let mut query =
            CurrencyQuery::new(TransactionReason::SalaryEngineers).with_input(Currency::Funds, -100.0);
        effect.modify(&mut query);
        assert!((query.output(Currency::Funds) + 120.0).abs() < 1e-9);

        let mut query =
            CurrencyQuery::new(TransactionReason::SalaryEngineers).with_input(Currency::Funds, 100.0);
        effect.modify(&mut query);
        assert!((query.output(Currency::Funds) - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_reason_ignored() {
        let mut query =
            CurrencyQuery::new(TransactionReason::StructureConstruction).with_input(Currency::Rate, 1.0);
        rate_boost(2.0).modify(&mut query);
        assert_eq!(query.output(Currency::Rate), 1.0);
    }

    #[test]
    fn test_is_positive() {
        assert!(rate_boost(1.1).is_positive());
        assert!(!rate_boost(0.9).is_positive());
        let cheaper = Effect::CurrencyModifier {
            currency: Currency::Funds,
            reasons: vec![TransactionReason::StructureConstruction],
            multiplier: 0.9,
            invert_if_negative: false,
            flip_positive: true,
        };
        assert!(cheaper.is_positive());
    }
}
