use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};

use super::{AssetRef, Custody, CustodyError};

/// In-memory multi-asset ledger.
///
/// Balances are keyed by `(holder, asset)`. Token transfers made by a third party
/// require an operator approval granted with [`Ledger::approve_operator`], the way an
/// ERC-1155 contract gates `safeTransferFrom` behind `setApprovalForAll`.
///
/// Every mutation validates first and applies second, so a failed call leaves the
/// ledger untouched.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(Address, AssetRef), U256>,
    approvals: HashSet<(Address, Address)>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits newly issued `amount` of `asset` to `holder`.
    ///
    /// Minting is ledger administration (genesis allocations, test fixtures) and is
    /// not part of the [`Custody`] interface channels rely on.
    pub fn mint(
        &mut self,
        holder: Address,
        asset: AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError> {
        let balance = self.balance(holder, &asset);
        let credited = balance
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { holder })?;
        self.set_balance(holder, asset, credited);
        tracing::debug!(%holder, %asset, %amount, "Minted");
        Ok(())
    }

    /// Grants or revokes `operator` the right to move any of `owner`'s tokens.
    pub fn approve_operator(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.approvals.insert((owner, operator));
        } else {
            self.approvals.remove(&(owner, operator));
        }
        tracing::debug!(%owner, %operator, approved, "Operator approval set");
    }

    pub fn is_approved(&self, owner: Address, operator: Address) -> bool {
        self.approvals.contains(&(owner, operator))
    }

    /// Sum of all balances in `asset`.
    pub fn total_supply(&self, asset: &AssetRef) -> U256 {
        self.balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .fold(U256::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    fn balance(&self, holder: Address, asset: &AssetRef) -> U256 {
        self.balances
            .get(&(holder, *asset))
            .copied()
            .unwrap_or_default()
    }

    fn set_balance(&mut self, holder: Address, asset: AssetRef, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&(holder, asset));
        } else {
            self.balances.insert((holder, asset), amount);
        }
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        asset: &AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError> {
        let available = self.balance(from, asset);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                holder: from,
                asset: *asset,
                available,
                required: amount,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let credited = self
            .balance(to, asset)
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { holder: to })?;
        self.set_balance(from, *asset, available - amount);
        self.set_balance(to, *asset, credited);
        Ok(())
    }
}

impl Custody for Ledger {
    fn lock(
        &mut self,
        operator: Address,
        from: Address,
        escrow: Address,
        asset: &AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError> {
        let needs_approval = !asset.is_native() && operator != from;
        if needs_approval && !self.is_approved(from, operator) {
            return Err(CustodyError::NotApproved {
                owner: from,
                operator,
            });
        }
        self.transfer(from, escrow, asset, amount)
    }

    fn release(
        &mut self,
        escrow: Address,
        to: Address,
        asset: &AssetRef,
        amount: U256,
    ) -> Result<(), CustodyError> {
        self.transfer(escrow, to, asset, amount)
    }

    fn balance_of(&self, holder: Address, asset: &AssetRef) -> U256 {
        self.balance(holder, asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ALICE: Address = address!("0x1111111111111111111111111111111111111111");
    const BOB: Address = address!("0x2222222222222222222222222222222222222222");
    const OPERATOR: Address = address!("0x3333333333333333333333333333333333333333");
    const ESCROW: Address = address!("0x4444444444444444444444444444444444444444");
    const TOKEN: Address = address!("0x5555555555555555555555555555555555555555");

    fn token() -> AssetRef {
        AssetRef::token(TOKEN, U256::from(1))
    }

    #[test]
    fn test_lock_token_requires_approval() {
        let mut ledger = Ledger::new();
        ledger.mint(ALICE, token(), U256::from(100)).unwrap();

        let err = ledger
            .lock(OPERATOR, ALICE, ESCROW, &token(), U256::from(10))
            .unwrap_err();
        assert_eq!(
            err,
            CustodyError::NotApproved {
                owner: ALICE,
                operator: OPERATOR
            }
        );
        assert_eq!(ledger.balance_of(ALICE, &token()), U256::from(100));

        ledger.approve_operator(ALICE, OPERATOR, true);
        ledger
            .lock(OPERATOR, ALICE, ESCROW, &token(), U256::from(10))
            .unwrap();
        assert_eq!(ledger.balance_of(ALICE, &token()), U256::from(90));
        assert_eq!(ledger.balance_of(ESCROW, &token()), U256::from(10));
    }

    #[test]
    fn test_lock_native_needs_no_approval() {
        let mut ledger = Ledger::new();
        ledger.mint(ALICE, AssetRef::Native, U256::from(5)).unwrap();
        ledger
            .lock(OPERATOR, ALICE, ESCROW, &AssetRef::Native, U256::from(5))
            .unwrap();
        assert_eq!(ledger.balance_of(ALICE, &AssetRef::Native), U256::ZERO);
        assert_eq!(ledger.balance_of(ESCROW, &AssetRef::Native), U256::from(5));
    }

    #[test]
    fn test_revoked_approval() {
        let mut ledger = Ledger::new();
        ledger.mint(ALICE, token(), U256::from(1)).unwrap();
        ledger.approve_operator(ALICE, OPERATOR, true);
        ledger.approve_operator(ALICE, OPERATOR, false);
        assert!(!ledger.is_approved(ALICE, OPERATOR));
        assert!(
            ledger
                .lock(OPERATOR, ALICE, ESCROW, &token(), U256::from(1))
                .is_err()
        );
    }

    #[test]
    fn test_insufficient_balance_is_atomic() {
        let mut ledger = Ledger::new();
        ledger.mint(ESCROW, token(), U256::from(100)).unwrap();

        let err = ledger
            .release(ESCROW, BOB, &token(), U256::from(101))
            .unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientBalance { available, required, .. }
            if available == U256::from(100) && required == U256::from(101)));
        assert_eq!(ledger.balance_of(ESCROW, &token()), U256::from(100));
        assert_eq!(ledger.balance_of(BOB, &token()), U256::ZERO);
    }

    #[test]
    fn test_overflow_is_atomic() {
        let mut ledger = Ledger::new();
        ledger.mint(BOB, token(), U256::MAX).unwrap();
        ledger.mint(ESCROW, token(), U256::from(1)).unwrap();

        let err = ledger
            .release(ESCROW, BOB, &token(), U256::from(1))
            .unwrap_err();
        assert_eq!(err, CustodyError::Overflow { holder: BOB });
        assert_eq!(ledger.balance_of(ESCROW, &token()), U256::from(1));
        assert_eq!(ledger.balance_of(BOB, &token()), U256::MAX);
    }

    #[test]
    fn test_transfers_conserve_supply() {
        let mut ledger = Ledger::new();
        ledger.mint(ALICE, token(), U256::from(100)).unwrap();
        ledger.approve_operator(ALICE, OPERATOR, true);
        ledger
            .lock(OPERATOR, ALICE, ESCROW, &token(), U256::from(70))
            .unwrap();
        ledger
            .release(ESCROW, BOB, &token(), U256::from(30))
            .unwrap();
        ledger
            .release(ESCROW, ALICE, &token(), U256::from(40))
            .unwrap();
        assert_eq!(ledger.total_supply(&token()), U256::from(100));
        assert_eq!(ledger.balance_of(ESCROW, &token()), U256::ZERO);
        assert_eq!(ledger.balance_of(ALICE, &token()), U256::from(70));
        assert_eq!(ledger.balance_of(BOB, &token()), U256::from(30));
    }

    #[test]
    fn test_assets_are_isolated() {
        let mut ledger = Ledger::new();
        let other = AssetRef::token(TOKEN, U256::from(2));
        ledger.mint(ALICE, token(), U256::from(10)).unwrap();
        ledger.mint(ALICE, other, U256::from(3)).unwrap();
        assert!(
            ledger
                .release(ALICE, BOB, &other, U256::from(4))
                .is_err()
        );
        assert_eq!(ledger.total_supply(&token()), U256::from(10));
        assert_eq!(ledger.total_supply(&other), U256::from(3));
    }
}
