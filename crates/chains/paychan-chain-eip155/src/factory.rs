//! Channel creation and the channel table.
//!
//! The factory derives each channel's address from its own address and a creation
//! nonce, the way the EVM `CREATE` opcode does, locks the sender's funds into the
//! new channel's escrow and keeps the channel until it settles. Settled channels
//! are removed; later lookups fail with [`ChannelError::NotFound`].
//!
//! The event log is unbounded unless a capacity is set with
//! [`PaymentChannelsFactory::with_event_capacity`]. Long-running owners either set
//! one or drain the log with [`PaymentChannelsFactory::drain_events`].

use alloy_primitives::{Address, U256};
use paychan_types::custody::{AssetRef, Custody};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

use crate::chain::{Eip155ChainReference, decimal_u256};
use crate::channel::{CallContext, ChannelTerms, PaymentChannel};
use crate::error::ChannelError;

/// Events emitted by the factory and its channels, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ChannelEvent {
    PaymentChannelCreated {
        channel: Address,
    },
    PaymentChannelClosed {
        channel: Address,
        #[serde(with = "decimal_u256")]
        amount: U256,
    },
    PaymentChannelCancelled {
        channel: Address,
    },
}

impl ChannelEvent {
    pub fn channel(&self) -> Address {
        match self {
            ChannelEvent::PaymentChannelCreated { channel }
            | ChannelEvent::PaymentChannelClosed { channel, .. }
            | ChannelEvent::PaymentChannelCancelled { channel } => *channel,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentChannelsFactory {
    address: Address,
    chain: Eip155ChainReference,
    nonce: u64,
    channels: HashMap<Address, PaymentChannel>,
    events: Vec<ChannelEvent>,
    event_capacity: Option<usize>,
}

impl PaymentChannelsFactory {
    pub fn new(address: Address, chain: Eip155ChainReference) -> Self {
        Self {
            address,
            chain,
            nonce: 0,
            channels: HashMap::new(),
            events: Vec::new(),
            event_capacity: None,
        }
    }

    /// Keeps at most `capacity` events; the oldest are dropped first.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain(&self) -> Eip155ChainReference {
        self.chain
    }

    /// Address the next created channel will get.
    pub fn next_channel_address(&self) -> Address {
        self.address.create(self.nonce)
    }

    /// Opens a channel from `ctx.caller` to `receiver`, locking `amount` of `asset`.
    ///
    /// Token assets require the caller to have approved the factory as operator at
    /// custody. Nothing is recorded unless the lock succeeds.
    #[instrument(skip_all, err, fields(sender = %ctx.caller, receiver = %receiver, amount = %amount))]
    pub fn create_channel<C: Custody + ?Sized>(
        &mut self,
        ctx: &CallContext,
        receiver: Address,
        duration: u64,
        asset: AssetRef,
        amount: U256,
        custody: &mut C,
    ) -> Result<Address, ChannelError> {
        if amount.is_zero() {
            return Err(ChannelError::InvalidAmount);
        }
        let expires_at = ctx
            .timestamp
            .checked_add(duration)
            .ok_or(ChannelError::InvalidDuration)?;

        let address = self.next_channel_address();
        let mut channel = PaymentChannel::new(address, self.chain);
        channel.initialize(ChannelTerms {
            sender: ctx.caller,
            receiver,
            asset,
            locked_amount: amount,
            expires_at,
        })?;
        custody.lock(self.address, ctx.caller, address, &asset, amount)?;

        self.nonce += 1;
        self.channels.insert(address, channel);
        self.emit(ChannelEvent::PaymentChannelCreated { channel: address });
        tracing::info!(
            channel = %address,
            sender = %ctx.caller,
            %receiver,
            %asset,
            %amount,
            %expires_at,
            "Payment channel created"
        );
        Ok(address)
    }

    pub fn channel(&self, address: Address) -> Result<&PaymentChannel, ChannelError> {
        self.channels
            .get(&address)
            .ok_or(ChannelError::NotFound(address))
    }

    /// Open channels, in no particular order.
    pub fn channels(&self) -> impl Iterator<Item = &PaymentChannel> {
        self.channels.values()
    }

    /// Re-initializes a live channel. Channels are initialized exactly once at
    /// creation, so this always fails and changes nothing.
    pub fn initialize_channel(
        &mut self,
        address: Address,
        terms: ChannelTerms,
    ) -> Result<(), ChannelError> {
        self.channels
            .get_mut(&address)
            .ok_or(ChannelError::NotFound(address))?
            .initialize(terms)
    }

    /// Settles a channel in the receiver's favour. See [`PaymentChannel::close`].
    pub fn close<C: Custody + ?Sized>(
        &mut self,
        ctx: &CallContext,
        channel: Address,
        amount: U256,
        signature: &[u8],
        custody: &mut C,
    ) -> Result<ChannelEvent, ChannelError> {
        let settlement = self
            .channels
            .get_mut(&channel)
            .ok_or(ChannelError::NotFound(channel))?
            .close(ctx, amount, signature, custody)?;
        self.channels.remove(&channel);
        Ok(self.emit(ChannelEvent::PaymentChannelClosed {
            channel,
            amount: settlement.paid_to_receiver,
        }))
    }

    /// Refunds an expired channel to its sender. See [`PaymentChannel::cancel`].
    pub fn cancel<C: Custody + ?Sized>(
        &mut self,
        ctx: &CallContext,
        channel: Address,
        custody: &mut C,
    ) -> Result<ChannelEvent, ChannelError> {
        self.channels
            .get_mut(&channel)
            .ok_or(ChannelError::NotFound(channel))?
            .cancel(ctx, custody)?;
        self.channels.remove(&channel);
        Ok(self.emit(ChannelEvent::PaymentChannelCancelled { channel }))
    }

    pub fn events(&self) -> &[ChannelEvent] {
        &self.events
    }

    /// Takes the event log, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<ChannelEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: ChannelEvent) -> ChannelEvent {
        self.events.push(event.clone());
        if let Some(capacity) = self.event_capacity {
            let excess = self.events.len().saturating_sub(capacity);
            if excess > 0 {
                self.events.drain(..excess);
                tracing::warn!(capacity, dropped = excess, "Event log full, dropped oldest events");
            }
        }
        event
    }
}
