use alloy_primitives::Address;
use paychan_types::custody::CustodyError;
use paychan_types::timestamp::UnixTimestamp;

use crate::verifier::SignatureError;

/// Reasons a channel or factory operation is refused.
///
/// Every failing operation leaves channel state and custody balances as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Invalid duration")]
    InvalidDuration,
    #[error("Channel already initialized")]
    AlreadyInitialized,
    #[error("Channel not initialized")]
    NotInitialized,
    #[error("Caller {0} is not the sender")]
    NotSender(Address),
    #[error("Caller {0} is not the receiver")]
    NotReceiver(Address),
    #[error("Invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("Channel not expired: now {now}, expires at {expires_at}")]
    NotExpired {
        now: UnixTimestamp,
        expires_at: UnixTimestamp,
    },
    #[error(transparent)]
    Custody(#[from] CustodyError),
    #[error("Channel {0} not found")]
    NotFound(Address),
}
