//! Mortgage bank: underwriting and monthly servicing.
//!
//! The set of serviced households is derived from household loan state
//! (`loan_amount > 0`); the bank keeps no ledger of its own.
//!
//! Policy:
//!   - Origination: loan-to-value ceiling, loan at most `max_dti` times
//!     annual income, liquid wealth covers the down payment.
//!   - Servicing: wealth must cover the instalment. A shortfall is a
//!     default: the dwelling is repossessed and the loan written off.

use crate::{
    config::BankConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    house::House,
    household::Household,
    population::repossess_dwelling,
    types::Tick,
};

/// Balances below this are treated as repaid.
const PAYOFF_EPSILON: f64 = 1e-6;
/// Slack on the LTV comparison so a loan exactly at the ceiling passes.
const LTV_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum MortgageRejection {
    NoLoanRequired,
    LoanToValue { ltv: f64, max_ltv: f64 },
    DebtToIncome { loan: f64, limit: f64 },
    InsufficientDeposit { wealth: f64, down_payment: f64 },
}

/// One instalment split into its parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instalment {
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
}

pub struct MortgageBank {
    interest_rate: f64,
    max_ltv: f64,
    max_dti: f64,
}

impl MortgageBank {
    pub fn new(config: &BankConfig) -> SimResult<Self> {
        if config.initial_interest_rate < 0.0 {
            return Err(SimError::NegativeInterestRate { rate: config.initial_interest_rate });
        }
        Ok(Self {
            interest_rate: config.initial_interest_rate,
            max_ltv: config.max_ltv,
            max_dti: config.max_dti,
        })
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn update_interest_rate(&mut self, rate: f64) -> SimResult<()> {
        if rate < 0.0 || rate.is_nan() {
            return Err(SimError::NegativeInterestRate { rate });
        }
        log::info!("bank: interest rate {:.4} -> {:.4}", self.interest_rate, rate);
        self.interest_rate = rate;
        Ok(())
    }

    /// Fixed-rate annuity instalment. `annual_rate` is a fraction.
    pub fn monthly_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
        if principal <= 0.0 {
            return 0.0;
        }
        if months == 0 {
            return principal;
        }
        let r = annual_rate / 12.0;
        let n = months as f64;
        if r == 0.0 {
            return principal / n;
        }
        principal * r / (1.0 - (1.0 + r).powf(-n))
    }

    /// Instalment at the bank's current rate over a full term.
    pub fn payment_for(&self, principal: f64, term_years: u32) -> f64 {
        Self::monthly_payment(principal, self.interest_rate, term_years * 12)
    }

    /// Outstanding principal of an annuity after `paid` of `months`
    /// instalments.
    pub fn remaining_balance(principal: f64, annual_rate: f64, months: u32, paid: u32) -> f64 {
        if paid >= months {
            return 0.0;
        }
        let r = annual_rate / 12.0;
        if r == 0.0 {
            return principal * (1.0 - paid as f64 / months as f64);
        }
        let grow_n = (1.0 + r).powi(months as i32);
        let grow_k = (1.0 + r).powi(paid as i32);
        principal * (grow_n - grow_k) / (grow_n - 1.0)
    }

    /// Re-derive the instalment from the current balance and the months left.
    pub fn amortization_step(principal: f64, annual_rate: f64, remaining_months: u32) -> Instalment {
        let months = remaining_months.max(1);
        let payment = Self::monthly_payment(principal, annual_rate, months);
        let interest = principal * annual_rate / 12.0;
        let mut principal_part = (payment - interest).clamp(0.0, principal);
        if principal - principal_part < PAYOFF_EPSILON {
            principal_part = principal;
        }
        Instalment { payment: interest + principal_part, interest, principal: principal_part }
    }

    /// Check a loan request without touching the household.
    /// Returns the loan amount on success.
    pub fn underwrite(
        &self,
        household: &Household,
        house_price: f64,
        down_payment: f64,
    ) -> Result<f64, MortgageRejection> {
        let loan = house_price - down_payment;
        if loan <= 0.0 || house_price <= 0.0 {
            return Err(MortgageRejection::NoLoanRequired);
        }
        if loan > self.max_ltv * house_price + LTV_EPSILON {
            return Err(MortgageRejection::LoanToValue { ltv: loan / house_price, max_ltv: self.max_ltv });
        }
        let limit = self.max_dti * household.total_income();
        if loan > limit {
            return Err(MortgageRejection::DebtToIncome { loan, limit });
        }
        if household.wealth < down_payment {
            return Err(MortgageRejection::InsufficientDeposit { wealth: household.wealth, down_payment });
        }
        Ok(loan)
    }

    /// Underwrite and, on success, debit the down payment and record the
    /// loan on the household. The caller creates the contract.
    pub fn approve_mortgage(
        &self,
        household: &mut Household,
        house_price: f64,
        down_payment: f64,
        loan_term_years: u32,
    ) -> bool {
        match self.underwrite(household, house_price, down_payment) {
            Ok(loan) => {
                household.update_wealth(-down_payment);
                household.set_loan(loan, loan_term_years);
                true
            }
            Err(reason) => {
                log::trace!("bank: {} rejected: {reason:?}", household.id);
                false
            }
        }
    }

    /// Households currently serviced by the bank.
    pub fn serviced(households: &[Household]) -> impl Iterator<Item = &Household> {
        households.iter().filter(|h| h.has_active_loan())
    }

    /// Collect one instalment from every serviced household.
    pub fn collect_payments(
        &self,
        households: &mut [Household],
        houses: &mut [House],
        tick: Tick,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let (mut collected, mut repaid, mut defaults) = (0usize, 0usize, 0usize);

        for household in households.iter_mut().filter(|h| h.has_active_loan()) {
            let payments_made = match &household.contract {
                Some(c) => c.payments_made,
                None => {
                    log::warn!("tick={tick} bank: {} holds a loan without a contract; writing off", household.id);
                    household.clear_loan();
                    continue;
                }
            };
            let term_months = household.loan_term_years * 12;
            let remaining = term_months.saturating_sub(payments_made);
            let step = Self::amortization_step(household.loan_amount, self.interest_rate, remaining);

            if household.wealth >= step.payment {
                household.update_wealth(-step.payment);
                collected += 1;
                let Some(contract) = household.contract.as_mut() else { continue };
                let paid_off = contract.amortize(step.principal);
                household.loan_amount = contract.remaining_mortgage;
                if paid_off {
                    household.clear_loan();
                    repaid += 1;
                    events.push(SimEvent::MortgageRepaid { tick, household_id: household.id });
                }
            } else {
                defaults += 1;
                let outstanding = household.loan_amount;
                let wealth = household.wealth;
                let house_id = repossess_dwelling(household, houses);
                household.want_to_move = true;
                log::info!(
                    "tick={tick} bank: {} defaulted owing {outstanding:.0} (due {:.0}, wealth {wealth:.0})",
                    household.id,
                    step.payment
                );
                events.push(SimEvent::ForeclosureRecorded {
                    tick,
                    household_id: household.id,
                    house_id,
                    outstanding_principal: outstanding,
                    payment_due: step.payment,
                    wealth,
                });
            }
        }

        log::debug!("tick={tick} bank: collected={collected} repaid={repaid} defaults={defaults}");
        events
    }
}
