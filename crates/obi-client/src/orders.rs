//! Order construction, signing and submission.
//!
//! Order-affecting transactions follow a strict discipline: validate the
//! spec, convert prices and amounts to the fixed-point wire encoding,
//! reserve a nonce, serialize the canonical payload, sign it, submit.
//! A rejected submission drops the sequencer to `Desynced`; the caller
//! must `fetch_next_nonce` before the next reservation. A signed order is
//! single-use and never resent unmodified.

use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::schema::{RejectionBody, TxReceipt};
use crate::session::ExchangeSession;
use crate::signer::SignerError;
use obi_core::{MarketId, OrderSide, OrderStatus, OrderType, Price, Size, TimeInForce, TrackedOrder};

/// Caller-facing order parameters.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub market: MarketId,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Amount in base units; must be positive.
    pub base_amount: Size,
    /// Limit price; ignored for market orders.
    pub price: Price,
    pub time_in_force: TimeInForce,
    /// Explicit client order index; assigned by the session when absent.
    pub client_order_index: Option<u64>,
}

impl OrderSpec {
    /// A GTC limit order.
    pub fn limit(market: MarketId, side: OrderSide, base_amount: Size, price: Price) -> Self {
        Self {
            market,
            side,
            order_type: OrderType::Limit,
            base_amount,
            price,
            time_in_force: TimeInForce::GoodTilCancelled,
            client_order_index: None,
        }
    }

    fn validate(&self) -> ClientResult<()> {
        if !self.base_amount.is_positive() {
            return Err(ClientError::Validation(format!(
                "base_amount must be positive, got {}",
                self.base_amount
            )));
        }
        if self.order_type == OrderType::Limit && self.price.inner().is_sign_negative() {
            return Err(ClientError::Validation(format!(
                "limit price must be non-negative, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Canonical order transaction. Immutable once signed; the serialized
/// field order below is exactly what the signature covers.
#[derive(Debug, Clone, Serialize)]
pub struct OrderTx {
    pub market: MarketId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub base_amount: i64,
    pub price: i64,
    pub client_order_index: u64,
    pub time_in_force: TimeInForce,
    pub nonce: u64,
    pub account_index: u32,
    pub api_key_index: u8,
}

/// Canonical cancel transaction: the order reference and a fresh nonce.
#[derive(Debug, Clone, Serialize)]
pub struct CancelTx {
    pub client_order_index: u64,
    pub nonce: u64,
    pub account_index: u32,
    pub api_key_index: u8,
}

/// POST body: the signed transaction with its signature appended.
#[derive(Serialize)]
struct SignedEnvelope<'a, T: Serialize> {
    #[serde(flatten)]
    tx: &'a T,
    signature: &'a str,
}

/// An order transaction plus its signature. Single-use.
#[derive(Debug, Clone)]
pub struct SignedOrder {
    pub intent: OrderTx,
    pub signature: String,
}

/// A cancel transaction plus its signature. Single-use.
#[derive(Debug, Clone)]
pub struct SignedCancel {
    pub intent: CancelTx,
    pub signature: String,
}

/// Map a send_tx rejection to the error taxonomy. HTTP 409 is the
/// exchange's nonce-conflict status.
fn map_rejection(status: u16, body: &str, nonce: u64) -> ClientError {
    if status == 409 {
        return ClientError::NonceDesync { nonce };
    }
    match serde_json::from_str::<RejectionBody>(body) {
        Ok(parsed) => ClientError::Rejected {
            code: parsed.code,
            message: parsed.message,
        },
        Err(_) => ClientError::Rejected {
            code: u32::from(status),
            message: body.to_string(),
        },
    }
}

impl ExchangeSession {
    /// Validate, encode, nonce and sign an order without submitting it.
    pub async fn sign_create_order(&mut self, spec: OrderSpec) -> ClientResult<SignedOrder> {
        spec.validate()?;

        let identity = self
            .identity
            .clone()
            .ok_or(ClientError::Signing(SignerError::NoSigningKey))?;

        // Encode before reserving so an encoding failure cannot strand a
        // reservation.
        let base_amount = spec.base_amount.to_wire()?;
        let price = match spec.order_type {
            OrderType::Limit => spec.price.to_wire()?,
            OrderType::Market => 0,
        };

        let client_order_index = spec
            .client_order_index
            .unwrap_or_else(|| self.next_client_order_index());
        let nonce = self.nonce.reserve()?;

        let intent = OrderTx {
            market: spec.market,
            side: spec.side,
            order_type: spec.order_type,
            base_amount,
            price,
            client_order_index,
            time_in_force: spec.time_in_force,
            nonce,
            account_index: self.account_index,
            api_key_index: self.api_key_index,
        };

        let canonical =
            serde_json::to_vec(&intent).expect("order tx serialization is infallible");
        let signature = match identity.sign_payload(&canonical).await {
            Ok(signature) => signature,
            Err(err) => {
                // The reserved value is unusable; make that state explicit.
                self.nonce.desync();
                return Err(err.into());
            }
        };

        Ok(SignedOrder { intent, signature })
    }

    /// Submit a signed order. On acceptance the nonce reservation is
    /// confirmed; on any rejection the sequencer drops to `Desynced` and
    /// the caller must `fetch_next_nonce` before retrying with a fresh
    /// signature.
    pub async fn send_transaction(&mut self, order: &SignedOrder) -> ClientResult<TxReceipt> {
        let envelope = SignedEnvelope {
            tx: &order.intent,
            signature: &order.signature,
        };
        self.post_signed(&envelope, order.intent.nonce).await
    }

    /// Sign and submit in one call, recording the optimistic ledger entry.
    pub async fn create_order(&mut self, spec: OrderSpec) -> ClientResult<TrackedOrder> {
        let market = spec.market.clone();
        let side = spec.side;
        let order_type = spec.order_type;
        let size = spec.base_amount;
        let price = spec.price;

        let signed = self.sign_create_order(spec).await?;
        let receipt = self.send_transaction(&signed).await?;
        debug!(
            market = %market,
            client_order_index = signed.intent.client_order_index,
            tx_hash = receipt.tx_hash.as_deref().unwrap_or(""),
            "order accepted"
        );

        let order = TrackedOrder {
            client_order_index: signed.intent.client_order_index,
            market,
            side,
            order_type,
            size,
            price,
            status: OrderStatus::Pending,
        };
        self.ledger.record_submitted_order(order.clone());
        Ok(order)
    }

    /// Sign and submit a cancel for a previously submitted order, then
    /// drop the local entry pending the next sync's confirmation.
    pub async fn cancel_order(&mut self, client_order_index: u64) -> ClientResult<TxReceipt> {
        let identity = self
            .identity
            .clone()
            .ok_or(ClientError::Signing(SignerError::NoSigningKey))?;

        let nonce = self.nonce.reserve()?;
        let intent = CancelTx {
            client_order_index,
            nonce,
            account_index: self.account_index,
            api_key_index: self.api_key_index,
        };

        let canonical =
            serde_json::to_vec(&intent).expect("cancel tx serialization is infallible");
        let signature = match identity.sign_payload(&canonical).await {
            Ok(signature) => signature,
            Err(err) => {
                self.nonce.desync();
                return Err(err.into());
            }
        };
        let signed = SignedCancel { intent, signature };

        let envelope = SignedEnvelope {
            tx: &signed.intent,
            signature: &signed.signature,
        };
        let receipt = self.post_signed(&envelope, nonce).await?;
        self.ledger.remove_order(client_order_index);
        Ok(receipt)
    }

    async fn post_signed<T: Serialize>(&mut self, body: &T, nonce: u64) -> ClientResult<TxReceipt> {
        let headers = self.auth_headers().await?;
        let url = self.gateway.url("/api/v1/transaction/send_tx");

        let response = headers
            .apply(self.gateway.http().post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            self.nonce.confirm();
            let text = response
                .text()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            serde_json::from_str(&text).map_err(|e| ClientError::Schema(format!("send_tx: {e}")))
        } else {
            let text = response.text().await.unwrap_or_default();
            self.nonce.desync();
            Err(map_rejection(status.as_u16(), &text, nonce))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSession;
    use crate::gateway::MarketDataGateway;
    use crate::ledger::StateLedger;
    use crate::nonce::{NonceError, NonceSequencer, NonceState};
    use crate::signer::{tests::test_key_bytes, SigningIdentity};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn test_session() -> ExchangeSession {
        let identity =
            Arc::new(SigningIdentity::from_key_bytes(&test_key_bytes(), None).unwrap());
        ExchangeSession {
            account_index: 3,
            api_key_index: 1,
            gateway: MarketDataGateway::new("https://api.example.exchange").unwrap(),
            identity: Some(Arc::clone(&identity)),
            auth: Some(AuthSession::new(identity, 3, 1, 60_000)),
            nonce: NonceSequencer::new(),
            ledger: StateLedger::new(),
            order_seq: 1_700_000_000_000,
        }
    }

    fn eth_limit_spec() -> OrderSpec {
        OrderSpec::limit(
            MarketId::new("ETH-PERP").unwrap(),
            OrderSide::Buy,
            Size::new(dec!(1.5)),
            Price::new(dec!(2451.25)),
        )
    }

    #[tokio::test]
    async fn test_signed_order_uses_reserved_nonce() {
        let mut session = test_session();
        session.nonce.resync(7);

        let signed = session.sign_create_order(eth_limit_spec()).await.unwrap();
        assert_eq!(signed.intent.nonce, 7);

        // Submission would confirm; the next reservation is exactly one greater
        session.nonce.confirm();
        assert_eq!(session.nonce.reserve(), Ok(8));
    }

    #[tokio::test]
    async fn test_sign_converts_to_fixed_point() {
        let mut session = test_session();
        session.nonce.resync(1);

        let signed = session.sign_create_order(eth_limit_spec()).await.unwrap();
        assert_eq!(signed.intent.price, 2_451_250_000);
        assert_eq!(signed.intent.base_amount, 1_500_000);
        assert_eq!(signed.intent.account_index, 3);
        assert_eq!(signed.intent.api_key_index, 1);
        assert!(signed.signature.starts_with("0x"));
    }

    #[tokio::test]
    async fn test_sign_assigns_client_order_index() {
        let mut session = test_session();
        session.nonce.resync(1);

        let first = session.sign_create_order(eth_limit_spec()).await.unwrap();
        session.nonce.confirm();
        let second = session.sign_create_order(eth_limit_spec()).await.unwrap();
        assert_eq!(
            second.intent.client_order_index,
            first.intent.client_order_index + 1
        );

        // An explicit index is passed through untouched
        session.nonce.confirm();
        let mut spec = eth_limit_spec();
        spec.client_order_index = Some(42);
        let third = session.sign_create_order(spec).await.unwrap();
        assert_eq!(third.intent.client_order_index, 42);
    }

    #[tokio::test]
    async fn test_sign_rejects_non_positive_amount() {
        let mut session = test_session();
        session.nonce.resync(1);

        let mut spec = eth_limit_spec();
        spec.base_amount = Size::new(dec!(0));
        let result = session.sign_create_order(spec).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));

        // Validation failed before the nonce was touched
        assert_eq!(session.nonce_state(), NonceState::Fresh { next: 1 });
    }

    #[tokio::test]
    async fn test_sign_rejects_negative_limit_price() {
        let mut session = test_session();
        session.nonce.resync(1);

        let mut spec = eth_limit_spec();
        spec.price = Price::new(dec!(-1));
        let result = session.sign_create_order(spec).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sign_without_resync_fails() {
        let mut session = test_session();

        let result = session.sign_create_order(eth_limit_spec()).await;
        assert!(matches!(
            result,
            Err(ClientError::Nonce(NonceError::Desynced))
        ));
    }

    #[tokio::test]
    async fn test_canonical_payload_field_order() {
        let mut session = test_session();
        session.nonce.resync(5);

        let signed = session.sign_create_order(eth_limit_spec()).await.unwrap();
        let json = serde_json::to_string(&signed.intent).unwrap();

        // The signature covers exactly these bytes; field order is fixed
        let market_pos = json.find("\"market\"").unwrap();
        let side_pos = json.find("\"side\"").unwrap();
        let nonce_pos = json.find("\"nonce\"").unwrap();
        let api_key_pos = json.find("\"api_key_index\"").unwrap();
        assert!(market_pos < side_pos);
        assert!(side_pos < nonce_pos);
        assert!(nonce_pos < api_key_pos);
    }

    #[tokio::test]
    async fn test_signed_envelope_appends_signature() {
        let mut session = test_session();
        session.nonce.resync(5);

        let signed = session.sign_create_order(eth_limit_spec()).await.unwrap();
        let envelope = SignedEnvelope {
            tx: &signed.intent,
            signature: &signed.signature,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json.get("signature").and_then(|v| v.as_str()),
            Some(signed.signature.as_str())
        );
        assert_eq!(json.get("nonce").and_then(|v| v.as_u64()), Some(5));
    }

    #[test]
    fn test_map_rejection_409_is_nonce_desync() {
        let err = map_rejection(409, r#"{"code": 21104, "message": "invalid nonce"}"#, 17);
        assert!(matches!(err, ClientError::NonceDesync { nonce: 17 }));
    }

    #[test]
    fn test_map_rejection_parses_error_body() {
        let err = map_rejection(400, r#"{"code": 31000, "message": "margin too low"}"#, 17);
        match err {
            ClientError::Rejected { code, message } => {
                assert_eq!(code, 31000);
                assert_eq!(message, "margin too low");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_rejection_falls_back_to_raw_body() {
        let err = map_rejection(500, "internal error", 17);
        match err {
            ClientError::Rejected { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
