//! Housing contracts: the legal arrangement tying a household to a house.

use crate::{house::Tenure, types::HouseId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    OwnerOccupiedWithoutLoan,
    OwnerOccupiedWithLoan,
    RentedFromLandlord,
    SocialHousing,
}

impl ContractType {
    /// The tenure of the dwelling this contract type occupies.
    pub fn tenure(&self) -> Tenure {
        match self {
            Self::OwnerOccupiedWithoutLoan | Self::OwnerOccupiedWithLoan => Tenure::Buy,
            Self::RentedFromLandlord => Tenure::PrivateRent,
            Self::SocialHousing => Tenure::SocialRent,
        }
    }

    pub fn is_owner_occupied(&self) -> bool {
        matches!(self, Self::OwnerOccupiedWithoutLoan | Self::OwnerOccupiedWithLoan)
    }

    pub fn is_rental(&self) -> bool {
        matches!(self, Self::RentedFromLandlord | Self::SocialHousing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingContract {
    pub kind: ContractType,
    pub house: HouseId,
    /// Months lived under this contract.
    pub months_elapsed: u32,
    /// Mortgage instalments paid so far. Drives the remaining term.
    pub payments_made: u32,
    pub remaining_mortgage: f64,
    /// Rent for rentals, annuity instalment for mortgaged owners, 0 otherwise.
    pub monthly_cost: f64,
}

impl HousingContract {
    pub fn new(kind: ContractType, house: HouseId, monthly_cost: f64) -> Self {
        Self {
            kind,
            house,
            months_elapsed: 0,
            payments_made: 0,
            remaining_mortgage: 0.0,
            monthly_cost,
        }
    }

    pub fn mortgaged(house: HouseId, principal: f64, monthly_payment: f64) -> Self {
        Self {
            kind: ContractType::OwnerOccupiedWithLoan,
            house,
            months_elapsed: 0,
            payments_made: 0,
            remaining_mortgage: principal,
            monthly_cost: monthly_payment,
        }
    }

    pub fn outright(house: HouseId) -> Self {
        Self::new(ContractType::OwnerOccupiedWithoutLoan, house, 0.0)
    }

    pub fn years_in_place(&self) -> f64 {
        self.months_elapsed as f64 / 12.0
    }

    /// Advance one month of tenure.
    pub fn advance_month(&mut self) {
        self.months_elapsed += 1;
    }

    /// Reduce the outstanding principal by one instalment's principal
    /// portion. Returns true when the loan is now fully repaid, in which
    /// case the contract has flipped to `OwnerOccupiedWithoutLoan`.
    pub fn amortize(&mut self, principal_paid: f64) -> bool {
        if self.kind != ContractType::OwnerOccupiedWithLoan {
            return false;
        }
        self.payments_made += 1;
        self.remaining_mortgage = (self.remaining_mortgage - principal_paid).max(0.0);
        if self.remaining_mortgage <= 0.0 {
            self.settle_loan();
            return true;
        }
        false
    }

    /// Close out the loan on this contract without moving.
    pub fn settle_loan(&mut self) {
        self.remaining_mortgage = 0.0;
        self.monthly_cost = 0.0;
        if self.kind == ContractType::OwnerOccupiedWithLoan {
            self.kind = ContractType::OwnerOccupiedWithoutLoan;
        }
    }
}
