//! The per-agreement channel state machine.
//!
//! A channel is born `Open` when the factory initializes it and locks the sender's
//! funds into its escrow account. It then ends exactly once:
//!
//! - `close`: the receiver redeems a sender-signed amount; the remainder is refunded.
//! - `cancel`: after expiry the sender takes everything back.
//!
//! The channel address is both its escrow account at custody and the
//! `verifyingContract` of its EIP-712 domain.

use alloy_primitives::{Address, U256};
use paychan_types::custody::{AssetRef, Custody, CustodyError};
use paychan_types::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::chain::{Eip155ChainReference, decimal_u256};
use crate::domain::PaymentChannelDomain;
use crate::error::ChannelError;
use crate::verifier::verify_payment;

/// Who is calling and when, as asserted by the host executing the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: UnixTimestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: UnixTimestamp) -> Self {
        Self { caller, timestamp }
    }
}

/// The immutable parameters a channel is initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTerms {
    pub sender: Address,
    pub receiver: Address,
    pub asset: AssetRef,
    #[serde(with = "decimal_u256")]
    pub locked_amount: U256,
    pub expires_at: UnixTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelState {
    Open,
    Closed,
    Cancelled,
}

/// How a channel's escrow was paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub state: ChannelState,
    pub paid_to_receiver: U256,
    pub refunded_to_sender: U256,
}

#[derive(Debug, Clone)]
pub struct PaymentChannel {
    address: Address,
    chain: Eip155ChainReference,
    terms: Option<ChannelTerms>,
    state: ChannelState,
}

impl PaymentChannel {
    /// An uninitialized channel at `address`.
    pub fn new(address: Address, chain: Eip155ChainReference) -> Self {
        Self {
            address,
            chain,
            terms: None,
            state: ChannelState::Open,
        }
    }

    /// Fixes the channel's terms. Succeeds at most once per channel.
    ///
    /// Does not move funds; the factory locks `locked_amount` into the channel's
    /// escrow right after.
    pub fn initialize(&mut self, terms: ChannelTerms) -> Result<(), ChannelError> {
        if self.terms.is_some() {
            return Err(ChannelError::AlreadyInitialized);
        }
        if terms.locked_amount.is_zero() {
            return Err(ChannelError::InvalidAmount);
        }
        self.terms = Some(terms);
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain(&self) -> Eip155ChainReference {
        self.chain
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn terms(&self) -> Result<&ChannelTerms, ChannelError> {
        self.terms.as_ref().ok_or(ChannelError::NotInitialized)
    }

    pub fn sender(&self) -> Result<Address, ChannelError> {
        Ok(self.terms()?.sender)
    }

    pub fn receiver(&self) -> Result<Address, ChannelError> {
        Ok(self.terms()?.receiver)
    }

    pub fn asset(&self) -> Result<AssetRef, ChannelError> {
        Ok(self.terms()?.asset)
    }

    pub fn locked_amount(&self) -> Result<U256, ChannelError> {
        Ok(self.terms()?.locked_amount)
    }

    pub fn expires_at(&self) -> Result<UnixTimestamp, ChannelError> {
        Ok(self.terms()?.expires_at)
    }

    /// The only domain this channel accepts payment signatures under.
    pub fn domain(&self) -> PaymentChannelDomain {
        PaymentChannelDomain::for_channel(self.chain, self.address)
    }

    /// Terms of a channel that can still settle. A settled channel no longer resolves.
    fn open_terms(&self) -> Result<ChannelTerms, ChannelError> {
        let terms = *self.terms()?;
        if self.state != ChannelState::Open {
            return Err(ChannelError::NotFound(self.address));
        }
        Ok(terms)
    }

    /// Redeems `amount` to the receiver and refunds the rest of the escrow to the sender.
    ///
    /// Only the receiver may call this, with the sender's signature over
    /// `Payment { amount }` under [`Self::domain`].
    #[instrument(skip_all, err, fields(channel = %self.address, amount = %amount))]
    pub fn close<C: Custody + ?Sized>(
        &mut self,
        ctx: &CallContext,
        amount: U256,
        signature: &[u8],
        custody: &mut C,
    ) -> Result<Settlement, ChannelError> {
        let terms = self.open_terms()?;
        if ctx.caller != terms.receiver {
            return Err(ChannelError::NotReceiver(ctx.caller));
        }
        if amount.is_zero() {
            return Err(ChannelError::InvalidAmount);
        }
        verify_payment(amount, signature, &self.domain(), terms.sender)?;

        let held = custody.balance_of(self.address, &terms.asset);
        if amount > terms.locked_amount || amount > held {
            return Err(CustodyError::InsufficientBalance {
                holder: self.address,
                asset: terms.asset,
                available: terms.locked_amount.min(held),
                required: amount,
            }
            .into());
        }
        // Residue beyond the locked amount is swept to the sender too.
        let change = held - amount;
        ensure_credits(
            &*custody,
            &terms.asset,
            &[(terms.receiver, amount), (terms.sender, change)],
        )?;

        custody.release(self.address, terms.receiver, &terms.asset, amount)?;
        if !change.is_zero() {
            custody.release(self.address, terms.sender, &terms.asset, change)?;
        }
        self.state = ChannelState::Closed;
        tracing::info!(
            channel = %self.address,
            receiver = %terms.receiver,
            %amount,
            refund = %change,
            "Payment channel closed"
        );
        Ok(Settlement {
            state: self.state,
            paid_to_receiver: amount,
            refunded_to_sender: change,
        })
    }

    /// Returns the whole escrow to the sender once the channel has expired.
    #[instrument(skip_all, err, fields(channel = %self.address))]
    pub fn cancel<C: Custody + ?Sized>(
        &mut self,
        ctx: &CallContext,
        custody: &mut C,
    ) -> Result<Settlement, ChannelError> {
        let terms = self.open_terms()?;
        if ctx.caller != terms.sender {
            return Err(ChannelError::NotSender(ctx.caller));
        }
        if !ctx.timestamp.has_reached(terms.expires_at) {
            return Err(ChannelError::NotExpired {
                now: ctx.timestamp,
                expires_at: terms.expires_at,
            });
        }

        let held = custody.balance_of(self.address, &terms.asset);
        ensure_credits(&*custody, &terms.asset, &[(terms.sender, held)])?;
        custody.release(self.address, terms.sender, &terms.asset, held)?;
        self.state = ChannelState::Cancelled;
        tracing::info!(
            channel = %self.address,
            sender = %terms.sender,
            refund = %held,
            "Payment channel cancelled"
        );
        Ok(Settlement {
            state: self.state,
            paid_to_receiver: U256::ZERO,
            refunded_to_sender: held,
        })
    }
}

/// Fails if any of `credits` would overflow its recipient's balance.
///
/// Checked before the first release so a settlement either moves everything or nothing.
fn ensure_credits<C: Custody + ?Sized>(
    custody: &C,
    asset: &AssetRef,
    credits: &[(Address, U256)],
) -> Result<(), CustodyError> {
    for (i, (holder, _)) in credits.iter().enumerate() {
        // Sum per holder; sender and receiver may be the same account.
        if credits[..i].iter().any(|(seen, _)| seen == holder) {
            continue;
        }
        let incoming = credits
            .iter()
            .filter(|(h, _)| h == holder)
            .try_fold(U256::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or(CustodyError::Overflow { holder: *holder })?;
        custody
            .balance_of(*holder, asset)
            .checked_add(incoming)
            .ok_or(CustodyError::Overflow { holder: *holder })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::sign_payment_sync;
    use alloy_primitives::address;
    use alloy_signer_local::PrivateKeySigner;
    use paychan_types::custody::Ledger;

    const CHANNEL: Address = address!("0xCafac3dD18aC6c6e92c921884f9E4176737C052c");
    const RECEIVER: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn sender() -> PrivateKeySigner {
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap()
    }

    fn terms() -> ChannelTerms {
        ChannelTerms {
            sender: sender().address(),
            receiver: RECEIVER,
            asset: AssetRef::Native,
            locked_amount: U256::from(100),
            expires_at: UnixTimestamp::from_secs(1_000),
        }
    }

    /// An initialized channel with its escrow funded directly.
    fn funded() -> (PaymentChannel, Ledger) {
        let mut channel = PaymentChannel::new(CHANNEL, Eip155ChainReference::new(31337));
        channel.initialize(terms()).unwrap();
        let mut ledger = Ledger::new();
        ledger.mint(CHANNEL, AssetRef::Native, U256::from(100)).unwrap();
        (channel, ledger)
    }

    #[test]
    fn test_uninitialized_accessors() {
        let channel = PaymentChannel::new(CHANNEL, Eip155ChainReference::new(31337));
        assert_eq!(channel.sender(), Err(ChannelError::NotInitialized));
        assert_eq!(channel.domain().verifying_contract, CHANNEL);
    }

    #[test]
    fn test_initialize_rejects_zero_amount() {
        let mut channel = PaymentChannel::new(CHANNEL, Eip155ChainReference::new(31337));
        let mut zero = terms();
        zero.locked_amount = U256::ZERO;
        assert_eq!(channel.initialize(zero), Err(ChannelError::InvalidAmount));
        assert!(channel.terms().is_err());
    }

    #[test]
    fn test_initialize_once() {
        let (mut channel, _) = funded();
        let mut other = terms();
        other.receiver = Address::ZERO;
        other.locked_amount = U256::from(1);
        assert_eq!(
            channel.initialize(other),
            Err(ChannelError::AlreadyInitialized)
        );
        assert_eq!(channel.terms().unwrap(), &terms());
    }

    #[test]
    fn test_close_settles_and_is_terminal() {
        let (mut channel, mut ledger) = funded();
        let signature = sign_payment_sync(&sender(), &channel.domain(), U256::from(60)).unwrap();
        let ctx = CallContext::new(RECEIVER, UnixTimestamp::from_secs(10));
        let settlement = channel
            .close(&ctx, U256::from(60), &signature, &mut ledger)
            .unwrap();
        assert_eq!(
            settlement,
            Settlement {
                state: ChannelState::Closed,
                paid_to_receiver: U256::from(60),
                refunded_to_sender: U256::from(40),
            }
        );
        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(
            channel.close(&ctx, U256::from(60), &signature, &mut ledger),
            Err(ChannelError::NotFound(CHANNEL))
        );
    }

    #[test]
    fn test_close_zero_amount() {
        let (mut channel, mut ledger) = funded();
        let signature = sign_payment_sync(&sender(), &channel.domain(), U256::ZERO).unwrap();
        let ctx = CallContext::new(RECEIVER, UnixTimestamp::from_secs(10));
        assert_eq!(
            channel.close(&ctx, U256::ZERO, &signature, &mut ledger),
            Err(ChannelError::InvalidAmount)
        );
    }

    #[test]
    fn test_close_overflowing_receiver_moves_nothing() {
        let (mut channel, mut ledger) = funded();
        ledger.mint(RECEIVER, AssetRef::Native, U256::MAX).unwrap();
        let signature = sign_payment_sync(&sender(), &channel.domain(), U256::from(60)).unwrap();
        let ctx = CallContext::new(RECEIVER, UnixTimestamp::from_secs(10));
        let err = channel
            .close(&ctx, U256::from(60), &signature, &mut ledger)
            .unwrap_err();
        assert_eq!(
            err,
            ChannelError::Custody(CustodyError::Overflow { holder: RECEIVER })
        );
        assert_eq!(channel.state(), ChannelState::Open);
        assert_eq!(
            ledger.balance_of(CHANNEL, &AssetRef::Native),
            U256::from(100)
        );
    }

    #[test]
    fn test_ensure_credits_sums_same_holder() {
        let mut ledger = Ledger::new();
        ledger
            .mint(RECEIVER, AssetRef::Native, U256::MAX - U256::from(5))
            .unwrap();
        let credits = [(RECEIVER, U256::from(3)), (RECEIVER, U256::from(3))];
        assert_eq!(
            ensure_credits(&ledger, &AssetRef::Native, &credits),
            Err(CustodyError::Overflow { holder: RECEIVER })
        );
        assert!(ensure_credits(&ledger, &AssetRef::Native, &credits[..1]).is_ok());
    }

    #[test]
    fn test_cancel_before_and_after_expiry() {
        let (mut channel, mut ledger) = funded();
        let early = CallContext::new(sender().address(), UnixTimestamp::from_secs(999));
        assert_eq!(
            channel.cancel(&early, &mut ledger),
            Err(ChannelError::NotExpired {
                now: UnixTimestamp::from_secs(999),
                expires_at: UnixTimestamp::from_secs(1_000),
            })
        );
        let due = CallContext::new(sender().address(), UnixTimestamp::from_secs(1_000));
        let settlement = channel.cancel(&due, &mut ledger).unwrap();
        assert_eq!(settlement.state, ChannelState::Cancelled);
        assert_eq!(settlement.refunded_to_sender, U256::from(100));
        assert_eq!(
            ledger.balance_of(sender().address(), &AssetRef::Native),
            U256::from(100)
        );
    }

    #[test]
    fn test_terms_serde() {
        let json = serde_json::to_value(terms()).unwrap();
        assert_eq!(json["lockedAmount"], "100");
        assert_eq!(json["asset"], "native");
        assert_eq!(json["expiresAt"], "1000");
    }
}
