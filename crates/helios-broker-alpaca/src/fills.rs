//! Fill-event stream (BRK-00R-05): one reader task per broker session,
//! delivering fill and order-status transitions in submission order.
//!
//! Consumers must tolerate duplicate deliveries — this stream makes no
//! attempt to de-dupe; idempotency by `broker_order_id` + `status` is the
//! caller's (`helios-runtime`'s) responsibility, same as for the REST path.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use helios_schemas::OrderSide;

use crate::error::AlpacaError;

/// One fill or order-status transition delivered over the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FillEvent {
    pub broker_order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub filled_qty: i64,
    pub fill_price_micros: Option<i64>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RawStreamMessage {
    event: String,
    order: RawStreamOrder,
}

#[derive(Debug, Deserialize)]
struct RawStreamOrder {
    id: String,
    symbol: String,
    side: String,
    filled_qty: String,
    filled_avg_price: Option<String>,
}

fn parse_event(msg: &str) -> Option<FillEvent> {
    let raw: RawStreamMessage = serde_json::from_str(msg).ok()?;
    let side = match raw.order.side.to_ascii_lowercase().as_str() {
        "buy" => OrderSide::Buy,
        "sell" => OrderSide::Sell,
        _ => return None,
    };
    let filled_qty: i64 = raw.order.filled_qty.parse().ok()?;
    let fill_price_micros = raw
        .order
        .filled_avg_price
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|p| helios_execution::prices::price_to_micros(p).ok());

    Some(FillEvent {
        broker_order_id: raw.order.id,
        symbol: raw.order.symbol,
        side,
        filled_qty,
        fill_price_micros,
        status: raw.event,
    })
}

/// Opens the trade-update WebSocket, authenticates, and spawns a reader task
/// that forwards parsed [`FillEvent`]s onto the returned channel. The task
/// exits (dropping the sender, which closes the receiver) when the socket
/// closes; reconnection is the caller's responsibility via `AlpacaBroker`'s
/// backoff policy, mirroring the REST connect/disconnect contract.
pub async fn stream_fills(
    stream_url: &str,
    api_key_id: &str,
    api_secret_key: &str,
) -> Result<mpsc::UnboundedReceiver<FillEvent>, AlpacaError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(stream_url)
        .await
        .map_err(|e| AlpacaError::Other {
            detail: format!("websocket connect failed: {e}"),
        })?;

    let (mut write, mut read) = ws_stream.split();

    let auth = serde_json::json!({
        "action": "auth",
        "key": api_key_id,
        "secret": api_secret_key,
    });
    write
        .send(Message::Text(auth.to_string()))
        .await
        .map_err(|e| AlpacaError::Other {
            detail: format!("websocket auth send failed: {e}"),
        })?;

    let subscribe = serde_json::json!({
        "action": "listen",
        "data": { "streams": ["trade_updates"] },
    });
    write
        .send(Message::Text(subscribe.to_string()))
        .await
        .map_err(|e| AlpacaError::Other {
            detail: format!("websocket subscribe send failed: {e}"),
        })?;

    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            let text = match msg {
                Ok(Message::Text(t)) => t,
                Ok(_) => continue,
                Err(_) => break,
            };
            if let Some(event) = parse_event(&text) {
                if tx.send(event).is_err() {
                    break;
                }
            }
        }
    });

    Ok(rx)
}
