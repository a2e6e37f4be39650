//! HTTP endpoints of the devnet host.
//!
//! Each state-changing endpoint runs one factory or ledger operation under the
//! devnet lock, stamped with the system clock. Failed operations change nothing
//! and are answered with `{ "error": "..." }` and a status derived from the error.

use alloy_primitives::{Address, Bytes, U256};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use paychan_chain_eip155::chain::decimal_u256;
use paychan_chain_eip155::domain::{PAYMENT_CHANNEL_NAME, PAYMENT_CHANNEL_VERSION};
use paychan_chain_eip155::{
    ChannelError, ChannelEvent, ChannelTerms, PaymentChannel, PaymentChannelDomain,
};
use paychan_types::chain::ChainId;
use paychan_types::custody::{AssetRef, Custody, CustodyError};
use paychan_types::timestamp::UnixTimestamp;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::devnet::SharedDevnet;

pub fn routes() -> Router<SharedDevnet> {
    Router::new()
        .route("/domain", get(get_domain))
        .route("/channels", post(post_channel))
        .route("/channels/{address}", get(get_channel))
        .route("/channels/{address}/close", post(post_close))
        .route("/channels/{address}/cancel", post(post_cancel))
        .route("/approvals", post(post_approval))
        .route("/balances/{holder}", get(get_balance))
        .route("/events", get(get_events))
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl HostError {
    pub fn status(&self) -> StatusCode {
        match self {
            HostError::Channel(error) => match error {
                ChannelError::NotFound(_) => StatusCode::NOT_FOUND,
                ChannelError::NotSender(_)
                | ChannelError::NotReceiver(_)
                | ChannelError::InvalidSignature(_)
                | ChannelError::Custody(CustodyError::NotApproved { .. }) => StatusCode::FORBIDDEN,
                ChannelError::NotExpired { .. } | ChannelError::AlreadyInitialized => {
                    StatusCode::CONFLICT
                }
                ChannelError::InvalidAmount
                | ChannelError::InvalidDuration
                | ChannelError::NotInitialized
                | ChannelError::Custody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
        }
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(error = %self, %status, "Request rejected");
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResponse {
    pub chain_id: ChainId,
    pub factory: Address,
    pub name: String,
    pub version: String,
}

/// `GET /domain`: what a client needs to derive any channel's EIP-712 domain.
#[instrument(skip_all)]
pub async fn get_domain(State(devnet): State<SharedDevnet>) -> Json<DomainResponse> {
    let devnet = devnet.lock().await;
    Json(DomainResponse {
        chain_id: devnet.factory.chain().into(),
        factory: devnet.factory.address(),
        name: PAYMENT_CHANNEL_NAME.to_string(),
        version: PAYMENT_CHANNEL_VERSION.to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub caller: Address,
    pub receiver: Address,
    pub duration: u64,
    pub asset: AssetRef,
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelResponse {
    pub channel: Address,
    pub expires_at: UnixTimestamp,
}

/// `POST /channels`: opens a channel from `caller` to `receiver`.
#[instrument(skip_all, err)]
pub async fn post_channel(
    State(devnet): State<SharedDevnet>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<CreateChannelResponse>), HostError> {
    let mut devnet = devnet.lock().await;
    let devnet = &mut *devnet;
    let ctx = devnet.call_context(body.caller);
    let channel = devnet.factory.create_channel(
        &ctx,
        body.receiver,
        body.duration,
        body.asset,
        body.amount,
        &mut devnet.ledger,
    )?;
    let expires_at = devnet.factory.channel(channel)?.expires_at()?;
    Ok((
        StatusCode::CREATED,
        Json(CreateChannelResponse {
            channel,
            expires_at,
        }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelView {
    pub address: Address,
    #[serde(flatten)]
    pub terms: ChannelTerms,
    #[serde(with = "decimal_u256")]
    pub balance: U256,
    pub domain: PaymentChannelDomain,
}

impl ChannelView {
    fn new<C: Custody + ?Sized>(
        channel: &PaymentChannel,
        custody: &C,
    ) -> Result<Self, ChannelError> {
        let terms = *channel.terms()?;
        Ok(Self {
            address: channel.address(),
            balance: custody.balance_of(channel.address(), &terms.asset),
            terms,
            domain: channel.domain(),
        })
    }
}

/// `GET /channels/{address}`: terms, escrow balance and signing domain of an open channel.
#[instrument(skip_all, err)]
pub async fn get_channel(
    State(devnet): State<SharedDevnet>,
    Path(address): Path<Address>,
) -> Result<Json<ChannelView>, HostError> {
    let devnet = devnet.lock().await;
    let channel = devnet.factory.channel(address)?;
    Ok(Json(ChannelView::new(channel, &devnet.ledger)?))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseRequest {
    pub caller: Address,
    #[serde(with = "decimal_u256")]
    pub amount: U256,
    pub signature: Bytes,
}

/// `POST /channels/{address}/close`: the receiver redeems a signed payment.
#[instrument(skip_all, err, fields(channel = %address))]
pub async fn post_close(
    State(devnet): State<SharedDevnet>,
    Path(address): Path<Address>,
    Json(body): Json<CloseRequest>,
) -> Result<Json<ChannelEvent>, HostError> {
    let mut devnet = devnet.lock().await;
    let devnet = &mut *devnet;
    let ctx = devnet.call_context(body.caller);
    let event = devnet.factory.close(
        &ctx,
        address,
        body.amount,
        &body.signature,
        &mut devnet.ledger,
    )?;
    Ok(Json(event))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelRequest {
    pub caller: Address,
}

/// `POST /channels/{address}/cancel`: the sender reclaims an expired channel.
#[instrument(skip_all, err, fields(channel = %address))]
pub async fn post_cancel(
    State(devnet): State<SharedDevnet>,
    Path(address): Path<Address>,
    Json(body): Json<CancelRequest>,
) -> Result<Json<ChannelEvent>, HostError> {
    let mut devnet = devnet.lock().await;
    let devnet = &mut *devnet;
    let ctx = devnet.call_context(body.caller);
    let event = devnet.factory.cancel(&ctx, address, &mut devnet.ledger)?;
    Ok(Json(event))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

/// `POST /approvals`: sets whether `operator` may move `owner`'s tokens.
#[instrument(skip_all)]
pub async fn post_approval(
    State(devnet): State<SharedDevnet>,
    Json(body): Json<ApprovalRequest>,
) -> Json<ApprovalRequest> {
    let mut devnet = devnet.lock().await;
    devnet
        .ledger
        .approve_operator(body.owner, body.operator, body.approved);
    let approved = devnet.ledger.is_approved(body.owner, body.operator);
    Json(ApprovalRequest { approved, ..body })
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    #[serde(default)]
    pub asset: Option<AssetRef>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub holder: Address,
    pub asset: AssetRef,
    #[serde(with = "decimal_u256")]
    pub balance: U256,
}

/// `GET /balances/{holder}?asset=`: custody balance, native currency by default.
#[instrument(skip_all)]
pub async fn get_balance(
    State(devnet): State<SharedDevnet>,
    Path(holder): Path<Address>,
    Query(query): Query<BalanceQuery>,
) -> Json<BalanceResponse> {
    let asset = query.asset.unwrap_or(AssetRef::Native);
    let devnet = devnet.lock().await;
    Json(BalanceResponse {
        holder,
        asset,
        balance: devnet.ledger.balance_of(holder, &asset),
    })
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub drain: bool,
}

/// `GET /events?drain=`: the event log in emission order; `drain=true` empties it.
#[instrument(skip_all)]
pub async fn get_events(
    State(devnet): State<SharedDevnet>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<ChannelEvent>> {
    let mut devnet = devnet.lock().await;
    if query.drain {
        Json(devnet.factory.drain_events())
    } else {
        Json(devnet.factory.events().to_vec())
    }
}
