//! REST adapter for an Alpaca-style brokerage API.
//!
//! Two hosts: the trading API (account, assets, positions, orders) and
//! the market-data API (historical bars). All transport failures map to
//! `BrokerError::Connectivity`; a 404 on the position endpoint maps to
//! `NotFound`; 403/422 on order submission map to `Rejected`.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use swing_core::{
    AccountSummary, AssetInfo, Bar, BarInterval, Lookback, OrderAck, OrderIntent, PositionHandle,
    Price, PriceSeries, Qty,
};

use crate::client::{BoxFuture, BrokerClient};
use crate::error::{BrokerError, BrokerResult};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the REST adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Trading API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Market-data API base URL.
    #[serde(default = "default_data_url")]
    pub data_url: String,
    /// API key id (`APCA-API-KEY-ID` header).
    pub api_key_id: String,
    /// API secret key (`APCA-API-SECRET-KEY` header).
    pub api_secret_key: String,
}

fn default_base_url() -> String {
    "https://paper-api.alpaca.markets".to_string()
}

fn default_data_url() -> String {
    "https://data.alpaca.markets".to_string()
}

impl RestConfig {
    /// Credentials from `APCA_API_KEY_ID`/`APCA_API_SECRET_KEY`, hosts
    /// at their paper-trading defaults. Used when the config file has
    /// no `[broker]` section.
    pub fn from_env() -> Self {
        Self {
            base_url: default_base_url(),
            data_url: default_data_url(),
            api_key_id: std::env::var("APCA_API_KEY_ID").unwrap_or_default(),
            api_secret_key: std::env::var("APCA_API_SECRET_KEY").unwrap_or_default(),
        }
    }
}

// --- Wire DTOs ---

#[derive(Debug, Deserialize)]
struct AccountDto {
    equity: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct AssetDto {
    symbol: String,
    tradable: bool,
}

#[derive(Debug, Deserialize)]
struct PositionDto {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    current_price: String,
}

#[derive(Debug, Serialize)]
struct OrderDto<'a> {
    symbol: &'a str,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderAckDto {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BarDto {
    t: DateTime<Utc>,
    o: Decimal,
    h: Decimal,
    l: Decimal,
    c: Decimal,
}

#[derive(Debug, Deserialize)]
struct BarsDto {
    #[serde(default)]
    bars: Vec<BarDto>,
}

fn parse_decimal(raw: &str, field: &str) -> BrokerResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| BrokerError::Connectivity(format!("malformed {field} `{raw}`: {e}")))
}

/// Alpaca-style REST broker client.
pub struct RestBroker {
    client: Client,
    config: RestConfig,
}

impl RestBroker {
    pub fn new(config: RestConfig) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| BrokerError::Connectivity(format!("failed to create HTTP client: {e}")))?;

        info!(base_url = %config.base_url, data_url = %config.data_url, "REST broker initialized");
        Ok(Self { client, config })
    }

    fn trading_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("APCA-API-KEY-ID", &self.config.api_key_id)
            .header("APCA-API-SECRET-KEY", &self.config.api_secret_key)
    }

    async fn read_error_body(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("HTTP {status}: {body}")
    }

    async fn get_account(&self) -> BrokerResult<AccountSummary> {
        let response = self
            .authed(self.client.get(self.trading_url("/v2/account")))
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("account request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }

        let dto: AccountDto = response
            .json()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("malformed account response: {e}")))?;

        Ok(AccountSummary {
            equity: parse_decimal(&dto.equity, "equity")?,
            status: dto.status,
        })
    }

    async fn get_asset(&self, ticker: &str) -> BrokerResult<AssetInfo> {
        let response = self
            .authed(self.client.get(self.trading_url(&format!("/v2/assets/{ticker}"))))
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("asset request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BrokerError::NotFound(format!("asset {ticker}")));
        }
        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }

        let dto: AssetDto = response
            .json()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("malformed asset response: {e}")))?;

        Ok(AssetInfo {
            symbol: dto.symbol,
            tradable: dto.tradable,
        })
    }

    async fn get_open_position(&self, ticker: &str) -> BrokerResult<PositionHandle> {
        let response = self
            .authed(
                self.client
                    .get(self.trading_url(&format!("/v2/positions/{ticker}"))),
            )
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("position request failed: {e}")))?;

        // Expected and frequent; not logged as an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BrokerError::NotFound(format!("no open position for {ticker}")));
        }
        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }

        let dto: PositionDto = response
            .json()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("malformed position response: {e}")))?;

        Ok(PositionHandle {
            ticker: dto.symbol,
            qty: Qty::new(parse_decimal(&dto.qty, "qty")?),
            avg_entry_price: Price::new(parse_decimal(&dto.avg_entry_price, "avg_entry_price")?),
            current_price: Price::new(parse_decimal(&dto.current_price, "current_price")?),
        })
    }

    async fn post_order(&self, intent: &OrderIntent) -> BrokerResult<OrderAck> {
        let dto = OrderDto {
            symbol: &intent.ticker,
            qty: intent.qty.inner().to_string(),
            side: intent.side.as_str(),
            order_type: intent.order_type.as_str(),
            time_in_force: intent.time_in_force.as_str(),
            limit_price: intent.limit_price.map(|p| p.inner().to_string()),
        };

        debug!(
            ticker = %intent.ticker,
            side = %intent.side,
            order_type = intent.order_type.as_str(),
            qty = %intent.qty,
            limit_price = ?intent.limit_price,
            is_exit = intent.is_exit,
            "submitting order"
        );

        let response = self
            .authed(self.client.post(self.trading_url("/v2/orders")).json(&dto))
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("order submission failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(BrokerError::Rejected(Self::read_error_body(response).await));
        }
        if !status.is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }

        let ack: OrderAckDto = response
            .json()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("malformed order response: {e}")))?;

        Ok(OrderAck { id: ack.id })
    }

    async fn delete_order(&self, order_id: &str) -> BrokerResult<()> {
        let response = self
            .authed(
                self.client
                    .delete(self.trading_url(&format!("/v2/orders/{order_id}"))),
            )
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("cancel request failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BrokerError::NotFound(format!("order {order_id}")));
        }
        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }
        Ok(())
    }

    async fn delete_all_orders(&self) -> BrokerResult<()> {
        let response = self
            .authed(self.client.delete(self.trading_url("/v2/orders")))
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("cancel-all request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }
        Ok(())
    }

    async fn list_open_orders(&self, ticker: &str) -> BrokerResult<Vec<OrderAck>> {
        let response = self
            .authed(
                self.client
                    .get(self.trading_url("/v2/orders"))
                    .query(&[("status", "open"), ("symbols", ticker)]),
            )
            .send()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("open-orders request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BrokerError::Connectivity(
                Self::read_error_body(response).await,
            ));
        }

        let acks: Vec<OrderAckDto> = response
            .json()
            .await
            .map_err(|e| BrokerError::Connectivity(format!("malformed orders response: {e}")))?;

        Ok(acks.into_iter().map(|a| OrderAck { id: a.id }).collect())
    }

    async fn get_bars(
        &self,
        ticker: &str,
        interval: BarInterval,
        lookback: Lookback,
    ) -> BrokerResult<PriceSeries> {
        let start = lookback.start_from(Utc::now()).to_rfc3339();
        let url = format!("{}/v2/stocks/{ticker}/bars", self.config.data_url);

        let response = self
            .authed(self.client.get(&url).query(&[
                ("timeframe", interval.as_query()),
                ("start", start.as_str()),
                ("limit", "1000"),
            ]))
            .send()
            .await
            .map_err(|e| BrokerError::DataUnavailable(format!("bars request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BrokerError::DataUnavailable(
                Self::read_error_body(response).await,
            ));
        }

        let dto: BarsDto = response
            .json()
            .await
            .map_err(|e| BrokerError::DataUnavailable(format!("malformed bars response: {e}")))?;

        let bars = dto
            .bars
            .into_iter()
            .map(|b| Bar {
                timestamp: b.t,
                open: Price::new(b.o),
                high: Price::new(b.h),
                low: Price::new(b.l),
                close: Price::new(b.c),
            })
            .collect::<Vec<_>>();

        debug!(ticker, %interval, bar_count = bars.len(), "fetched bars");
        Ok(PriceSeries::new(ticker, interval, bars))
    }
}

impl BrokerClient for RestBroker {
    fn account(&self) -> BoxFuture<'_, BrokerResult<AccountSummary>> {
        Box::pin(self.get_account())
    }

    fn asset<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, BrokerResult<AssetInfo>> {
        Box::pin(self.get_asset(ticker))
    }

    fn open_position<'a>(
        &'a self,
        ticker: &'a str,
    ) -> BoxFuture<'a, BrokerResult<PositionHandle>> {
        Box::pin(self.get_open_position(ticker))
    }

    fn submit_order<'a>(
        &'a self,
        intent: &'a OrderIntent,
    ) -> BoxFuture<'a, BrokerResult<OrderAck>> {
        Box::pin(self.post_order(intent))
    }

    fn cancel_order<'a>(&'a self, order_id: &'a str) -> BoxFuture<'a, BrokerResult<()>> {
        Box::pin(self.delete_order(order_id))
    }

    fn cancel_all_orders(&self) -> BoxFuture<'_, BrokerResult<()>> {
        Box::pin(self.delete_all_orders())
    }

    fn open_orders<'a>(&'a self, ticker: &'a str) -> BoxFuture<'a, BrokerResult<Vec<OrderAck>>> {
        Box::pin(self.list_open_orders(ticker))
    }

    fn bars<'a>(
        &'a self,
        ticker: &'a str,
        interval: BarInterval,
        lookback: Lookback,
    ) -> BoxFuture<'a, BrokerResult<PriceSeries>> {
        Box::pin(self.get_bars(ticker, interval, lookback))
    }
}
