//! Derived booking price
//!
//! `energy_cost = hours × power_kW × efficiency × rate`, plus a flat platform
//! fee and taxes. Terms keep full precision; only the final sum is rounded
//! to two decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::ChargeDuration;
use crate::shared::errors::DomainError;

/// How taxes are derived for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TaxPolicy {
    /// Fraction of the energy cost (0.04 = 4%)
    Percentage(Decimal),
    /// Flat amount per booking
    Fixed(Decimal),
}

impl TaxPolicy {
    /// `None` when the percentage overflows
    pub fn taxes_for(&self, energy_cost: Decimal) -> Option<Decimal> {
        match self {
            Self::Percentage(rate) => energy_cost.checked_mul(*rate),
            Self::Fixed(amount) => Some(*amount),
        }
    }
}

/// Pricing constants applied to every booking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    pub platform_fee: Decimal,
    pub tax: TaxPolicy,
    /// Added to `total` each time a booking's schedule is changed
    pub modification_surcharge: Decimal,
    /// Assumed charging efficiency (fraction of rated power delivered)
    pub charging_efficiency: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            platform_fee: dec!(2.50),
            tax: TaxPolicy::Percentage(dec!(0.04)),
            modification_surcharge: dec!(2.50),
            charging_efficiency: dec!(0.8),
        }
    }
}

/// Inputs to a price computation
#[derive(Debug, Clone, Copy)]
pub struct PriceInput {
    pub duration: ChargeDuration,
    pub power_kw: Decimal,
    pub rate_per_kwh: Decimal,
}

/// Pricing breakdown stored on the booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceBreakdown {
    #[schema(value_type = String, example = "0.35")]
    pub rate: Decimal,
    #[schema(value_type = String, example = "120")]
    pub energy_kwh: Decimal,
    #[schema(value_type = String, example = "42.00")]
    pub energy_cost: Decimal,
    #[schema(value_type = String, example = "2.50")]
    pub platform_fee: Decimal,
    #[schema(value_type = String, example = "1.68")]
    pub taxes: Decimal,
    #[schema(value_type = String, example = "46.18")]
    pub total: Decimal,
}

/// Round half away from zero to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn out_of_range() -> DomainError {
    DomainError::Validation("price out of range".into())
}

impl PricingPolicy {
    /// Pure price computation. Deterministic for identical inputs.
    pub fn price(&self, input: &PriceInput) -> Result<PriceBreakdown, DomainError> {
        if input.power_kw < Decimal::ZERO {
            return Err(DomainError::Validation("power must not be negative".into()));
        }
        if input.rate_per_kwh < Decimal::ZERO {
            return Err(DomainError::Validation("rate must not be negative".into()));
        }

        let hours = input.duration.hours_decimal();
        let energy_kwh = hours
            .checked_mul(input.power_kw)
            .and_then(|kwh| kwh.checked_mul(self.charging_efficiency))
            .ok_or_else(out_of_range)?;
        let energy_cost = energy_kwh
            .checked_mul(input.rate_per_kwh)
            .ok_or_else(out_of_range)?;
        let taxes = self.tax.taxes_for(energy_cost).ok_or_else(out_of_range)?;
        let total = energy_cost
            .checked_add(self.platform_fee)
            .and_then(|sum| sum.checked_add(taxes))
            .map(round_money)
            .ok_or_else(out_of_range)?;

        Ok(PriceBreakdown {
            rate: input.rate_per_kwh,
            energy_kwh,
            energy_cost,
            platform_fee: self.platform_fee,
            taxes,
            total,
        })
    }
}

impl PriceBreakdown {
    /// Add the modification surcharge to the total. Energy cost, fee and
    /// taxes are left untouched; the schedule change does not reprice.
    pub fn with_surcharge(&self, surcharge: Decimal) -> Result<Self, DomainError> {
        let total = self
            .total
            .checked_add(surcharge)
            .map(round_money)
            .ok_or_else(out_of_range)?;
        Ok(Self {
            total,
            ..self.clone()
        })
    }

    /// Surcharges added to `total` since the booking was priced
    pub fn modification_fees(&self) -> Decimal {
        self.total - round_money(self.energy_cost + self.platform_fee + self.taxes)
    }
}
