//! The state the host serves: one channel factory and the custody ledger it settles on.
//!
//! All access goes through a single [`tokio::sync::Mutex`], so every call observes
//! and mutates a consistent ledger and calls are executed one at a time. Calls are
//! stamped while the lock is held and stamps never go backwards, so execution order
//! and timestamp order agree.

use alloy_primitives::Address;
use paychan_chain_eip155::chain::Eip155ChainReference;
use paychan_chain_eip155::{CallContext, PaymentChannelsFactory};
use paychan_types::custody::{CustodyError, Ledger};
use paychan_types::timestamp::UnixTimestamp;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::{Config, GenesisAllocation};

pub type SharedDevnet = Arc<Mutex<Devnet>>;

#[derive(Debug)]
pub struct Devnet {
    pub factory: PaymentChannelsFactory,
    pub ledger: Ledger,
    last_stamp: UnixTimestamp,
}

impl Devnet {
    pub fn new(factory: Address, chain: Eip155ChainReference) -> Self {
        Self {
            factory: PaymentChannelsFactory::new(factory, chain),
            ledger: Ledger::new(),
            last_stamp: UnixTimestamp::default(),
        }
    }

    /// Credits each allocation to the ledger.
    pub fn with_genesis(mut self, genesis: &[GenesisAllocation]) -> Result<Self, CustodyError> {
        for allocation in genesis {
            self.ledger
                .mint(allocation.holder, allocation.asset, allocation.amount)?;
        }
        Ok(self)
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.factory = self.factory.with_event_capacity(capacity);
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, CustodyError> {
        Self::new(config.factory(), config.chain())
            .with_event_capacity(config.event_capacity())
            .with_genesis(config.genesis())
    }

    /// Stamps a call by `caller` with the system clock, never earlier than the
    /// previous stamp.
    pub fn call_context(&mut self, caller: Address) -> CallContext {
        self.stamp_at(caller, UnixTimestamp::now())
    }

    fn stamp_at(&mut self, caller: Address, clock: UnixTimestamp) -> CallContext {
        self.last_stamp = self.last_stamp.max(clock);
        CallContext::new(caller, self.last_stamp)
    }

    pub fn into_shared(self) -> SharedDevnet {
        Arc::new(Mutex::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};
    use paychan_types::custody::{AssetRef, Custody};

    #[test]
    fn test_genesis_is_minted() {
        let holder = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let genesis = vec![
            GenesisAllocation {
                holder,
                asset: AssetRef::Native,
                amount: U256::from(10),
            },
            GenesisAllocation {
                holder,
                asset: AssetRef::Native,
                amount: U256::from(5),
            },
        ];
        let devnet = Devnet::new(Address::ZERO, Eip155ChainReference::new(31337))
            .with_genesis(&genesis)
            .unwrap();
        assert_eq!(
            devnet.ledger.balance_of(holder, &AssetRef::Native),
            U256::from(15)
        );
        assert_eq!(devnet.factory.address(), Address::ZERO);
    }

    #[test]
    fn test_call_stamps_never_go_backwards() {
        let caller = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let mut devnet = Devnet::new(Address::ZERO, Eip155ChainReference::new(31337));
        let first = devnet.stamp_at(caller, UnixTimestamp::from_secs(200));
        let second = devnet.stamp_at(caller, UnixTimestamp::from_secs(150));
        let third = devnet.stamp_at(caller, UnixTimestamp::from_secs(201));
        assert_eq!(first.timestamp, UnixTimestamp::from_secs(200));
        assert_eq!(second.timestamp, UnixTimestamp::from_secs(200));
        assert_eq!(third.timestamp, UnixTimestamp::from_secs(201));
        assert_eq!(second.caller, caller);

        let live = devnet.call_context(caller);
        assert!(live.timestamp >= third.timestamp);
    }

    #[test]
    fn test_genesis_overflow() {
        let genesis = vec![
            GenesisAllocation {
                holder: Address::ZERO,
                asset: AssetRef::Native,
                amount: U256::MAX,
            };
            2
        ];
        let result =
            Devnet::new(Address::ZERO, Eip155ChainReference::new(1)).with_genesis(&genesis);
        assert!(matches!(result, Err(CustodyError::Overflow { .. })));
    }
}
