//! Outbound command envelope and its pure constructors
//!
//! A command batch is what the strategy engine hands back to the
//! dispatcher: zero or more envelopes, each naming the venue it targets and
//! carrying one concrete action. Constructing an envelope never performs
//! I/O — timestamps and ids are threaded in by the caller so these
//! functions stay pure and testable. The wire shape is fixed by the
//! upstream peer: `event` is always the literal `"command"`, `action` is a
//! string naming the operation, and `data` is either an array of payload
//! records or `null` for the two payload-less actions.

use crate::snapshot::{OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderPayload {
    pub client_order_id: String,
    pub symbol: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderPayload {
    pub client_order_id: String,
    pub symbol: String,
}

/// The envelope every outbound command travels in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub event_id: String,
    pub event: String,
    pub exchange: String,
    pub node: String,
    pub instance: String,
    pub algo: String,
    pub action: String,
    pub message: Option<String>,
    pub timestamp: i64,
    pub data: serde_json::Value,
}

/// Shared identity fields every command from one engine instance carries.
/// Cloned cheaply into each envelope at construction time.
#[derive(Debug, Clone)]
pub struct CommandIdentity {
    pub node: String,
    pub instance: String,
    pub algo: String,
}

impl CommandIdentity {
    fn envelope(&self, exchange: &str, timestamp: i64, action: &str, data: serde_json::Value) -> Command {
        Command {
            event_id: uuid::Uuid::new_v4().to_string(),
            event: "command".to_string(),
            exchange: exchange.to_string(),
            node: self.node.clone(),
            instance: self.instance.clone(),
            algo: self.algo.clone(),
            action: action.to_string(),
            message: None,
            timestamp,
            data,
        }
    }

    pub fn create_order(
        &self,
        exchange: &str,
        timestamp: i64,
        client_order_id: String,
        symbol: String,
        side: Side,
        order_type: OrderType,
        price: Decimal,
        amount: Decimal,
    ) -> Command {
        let payload = CreateOrderPayload {
            client_order_id,
            symbol,
            amount,
            price,
            side,
            order_type,
        };
        self.envelope(
            exchange,
            timestamp,
            "create_orders",
            serde_json::json!([payload]),
        )
    }

    pub fn cancel_order(&self, exchange: &str, timestamp: i64, client_order_id: String, symbol: String) -> Command {
        let payload = CancelOrderPayload { client_order_id, symbol };
        self.envelope(exchange, timestamp, "cancel_orders", serde_json::json!([payload]))
    }

    pub fn cancel_all_orders(&self, exchange: &str, timestamp: i64) -> Command {
        self.envelope(exchange, timestamp, "cancel_all_orders", serde_json::Value::Null)
    }

    pub fn get_balance(&self, exchange: &str, timestamp: i64) -> Command {
        self.envelope(exchange, timestamp, "get_balance", serde_json::Value::Null)
    }
}
