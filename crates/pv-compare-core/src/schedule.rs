use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::PvCompareError;
use crate::tax::{bracket_rate, holding_days};
use crate::types::{Money, Period, Rate};
use crate::PvCompareResult;

/// Longest schedule the builders produce: one hundred years of months.
pub const MAX_SCHEDULE_HORIZON: Period = 1200;

fn check_horizon(field: &str, horizon: Period) -> PvCompareResult<()> {
    if horizon > MAX_SCHEDULE_HORIZON {
        return Err(PvCompareError::invalid(
            field,
            format!("At most {MAX_SCHEDULE_HORIZON} periods are supported"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Contiguous cash flows for periods `0..=horizon`. Periods beyond the
/// horizon are zero. Never mutated: overrides build a new schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Money>", into = "Vec<Money>")]
pub struct CashFlowSchedule {
    flows: Vec<Money>,
}

impl CashFlowSchedule {
    pub fn from_flows(flows: Vec<Money>) -> PvCompareResult<Self> {
        if flows.is_empty() {
            return Err(PvCompareError::invalid(
                "flows",
                "A schedule needs at least the period 0 entry",
            ));
        }
        Ok(CashFlowSchedule { flows })
    }

    /// Last period carried by the schedule.
    pub fn horizon(&self) -> Period {
        (self.flows.len() - 1) as Period
    }

    /// Amount at `period`, zero past the horizon.
    pub fn amount(&self, period: Period) -> Money {
        self.flows
            .get(period as usize)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn flows(&self) -> &[Money] {
        &self.flows
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, Money)> + '_ {
        self.flows
            .iter()
            .enumerate()
            .map(|(t, cf)| (t as Period, *cf))
    }

    /// Undiscounted sum of every entry.
    pub fn total(&self) -> Money {
        self.flows.iter().sum()
    }

    /// New schedule with the given periods replaced wholesale.
    pub fn with_overrides(&self, overrides: &BTreeMap<Period, Money>) -> PvCompareResult<Self> {
        let mut flows = self.flows.clone();
        for (&period, &amount) in overrides {
            let slot = flows.get_mut(period as usize).ok_or_else(|| {
                PvCompareError::invalid(
                    "overrides",
                    format!(
                        "Period {period} is outside the schedule horizon 0..={}",
                        self.horizon()
                    ),
                )
            })?;
            *slot = amount;
        }
        Ok(CashFlowSchedule { flows })
    }
}

impl TryFrom<Vec<Money>> for CashFlowSchedule {
    type Error = PvCompareError;

    fn try_from(flows: Vec<Money>) -> Result<Self, Self::Error> {
        CashFlowSchedule::from_flows(flows)
    }
}

impl From<CashFlowSchedule> for Vec<Money> {
    fn from(schedule: CashFlowSchedule) -> Self {
        schedule.flows
    }
}

// ---------------------------------------------------------------------------
// Installment plan
// ---------------------------------------------------------------------------

/// How one installment was grossed up for withholding tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentLine {
    pub period: Period,
    /// Even share of the remaining principal
    pub net: Money,
    /// Amount that, invested today, grows into `net` by this period
    pub principal_invested: Money,
    pub implied_yield: Money,
    pub tax_rate: Rate,
    pub tax: Money,
    /// `net + tax`, the amount carried by the schedule
    pub gross: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub schedule: CashFlowSchedule,
    /// Net installment before any tax gross-up
    pub installment_amount: Money,
    pub remaining_principal: Money,
    /// Per-installment breakdown, populated only with tax gross-up
    pub lines: Vec<InstallmentLine>,
}

/// Build the installment schedule together with its gross-up breakdown.
///
/// Period 0 holds the down payment; the remaining principal is split evenly
/// over periods `1..=installment_count` with no remainder correction.
pub fn build_installment_plan(
    principal: Money,
    down_payment: Money,
    installment_count: u32,
    monthly_rate: Rate,
    apply_tax: bool,
) -> PvCompareResult<InstallmentPlan> {
    if principal < Decimal::ZERO {
        return Err(PvCompareError::invalid("principal", "Price cannot be negative"));
    }
    if down_payment < Decimal::ZERO {
        return Err(PvCompareError::invalid(
            "down_payment",
            "Down payment cannot be negative",
        ));
    }
    if monthly_rate <= -Decimal::ONE {
        return Err(PvCompareError::invalid(
            "monthly_rate",
            "Discount rate must be greater than -100%",
        ));
    }
    check_horizon("installment_count", installment_count)?;

    let remaining = (principal - down_payment).max(Decimal::ZERO);

    if installment_count == 0 {
        if !remaining.is_zero() {
            return Err(PvCompareError::invalid(
                "installment_count",
                "At least one installment is needed to pay the remaining principal",
            ));
        }
        return Ok(InstallmentPlan {
            schedule: CashFlowSchedule::from_flows(vec![down_payment])?,
            installment_amount: Decimal::ZERO,
            remaining_principal: remaining,
            lines: Vec::new(),
        });
    }

    let net = remaining / Decimal::from(installment_count);
    let mut flows = Vec::with_capacity(installment_count as usize + 1);
    flows.push(down_payment);

    let mut lines = Vec::new();
    if apply_tax {
        let one_plus_r = Decimal::ONE + monthly_rate;
        for t in 1..=installment_count {
            let line = gross_up_installment(net, one_plus_r, t)?;
            flows.push(line.gross);
            lines.push(line);
        }
    } else {
        flows.extend(std::iter::repeat(net).take(installment_count as usize));
    }

    tracing::debug!(
        %remaining,
        installment_count,
        %net,
        apply_tax,
        "built installment schedule"
    );

    Ok(InstallmentPlan {
        schedule: CashFlowSchedule::from_flows(flows)?,
        installment_amount: net,
        remaining_principal: remaining,
        lines,
    })
}

/// Schedule of the installment stream; see [`build_installment_plan`].
pub fn build_installment_schedule(
    principal: Money,
    down_payment: Money,
    installment_count: u32,
    monthly_rate: Rate,
    apply_tax: bool,
) -> PvCompareResult<CashFlowSchedule> {
    build_installment_plan(
        principal,
        down_payment,
        installment_count,
        monthly_rate,
        apply_tax,
    )
    .map(|plan| plan.schedule)
}

fn gross_up_installment(
    net: Money,
    one_plus_r: Decimal,
    period: Period,
) -> PvCompareResult<InstallmentLine> {
    let growth = one_plus_r.checked_powu(u64::from(period)).ok_or_else(|| {
        PvCompareError::FinancialImpossibility(format!(
            "Growth factor overflows at period {period}"
        ))
    })?;
    let principal_invested = net.checked_div(growth).ok_or_else(|| {
        PvCompareError::FinancialImpossibility(format!(
            "Invested principal is not representable at period {period}"
        ))
    })?;

    let implied_yield = net - principal_invested;
    let tax_rate = bracket_rate(holding_days(period));
    let tax = (implied_yield * tax_rate).max(Decimal::ZERO);

    Ok(InstallmentLine {
        period,
        net,
        principal_invested,
        implied_yield,
        tax_rate,
        tax,
        gross: net + tax,
    })
}

// ---------------------------------------------------------------------------
// Lump sum
// ---------------------------------------------------------------------------

/// Single payment at period 0, zeros through `horizon` so both streams line
/// up period by period.
pub fn build_lumpsum_schedule(
    discounted_price: Money,
    horizon: Period,
) -> PvCompareResult<CashFlowSchedule> {
    if discounted_price < Decimal::ZERO {
        return Err(PvCompareError::invalid(
            "discounted_price",
            "Price cannot be negative",
        ));
    }
    check_horizon("horizon", horizon)?;
    let mut flows = vec![Decimal::ZERO; horizon as usize + 1];
    flows[0] = discounted_price;
    CashFlowSchedule::from_flows(flows)
}
