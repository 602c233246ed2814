//! Yahoo Finance data adapter.
//!
//! Fetches daily closes from Yahoo's v8 chart API. Korean ETFs use the `.KS`
//! suffix (`122630.KS`). Every request carries the configured timeout; a
//! timeout or transport error is a `DataRetrieval` failure for that code only.

use crate::domain::error::SignalError;
use crate::domain::price_history::{PriceHistory, PricePoint};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooAdapter {
    pub fn new(timeout: Duration) -> Result<Self, SignalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SignalError::DataRetrieval {
                code: "*".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end_ts = Utc::now().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn parse_response(code: &str, resp: ChartResponse) -> Result<PriceHistory, SignalError> {
        let retrieval = |reason: String| SignalError::DataRetrieval {
            code: code.to_string(),
            reason,
        };

        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return Err(match resp.chart.error {
                    Some(err) => retrieval(format!("{}: {}", err.code, err.description)),
                    None => retrieval("empty result with no error".into()),
                });
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| SignalError::NoData {
                code: code.to_string(),
            })?;

        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| retrieval("no quote data".into()))?;

        let mut points: Vec<PricePoint> = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Null closes mark non-trading days.
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| retrieval(format!("invalid timestamp: {ts}")))?;

            // Intraday snapshot of the current session shares the last bar's date.
            if let Some(last) = points.last_mut() {
                if last.date == date {
                    last.close = close;
                    continue;
                }
            }
            points.push(PricePoint { date, close });
        }

        if points.is_empty() {
            return Err(SignalError::NoData {
                code: code.to_string(),
            });
        }

        PriceHistory::new(code, points)
    }

    fn fetch_with_retry(
        &self,
        code: &str,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        let url = Self::chart_url(symbol, start);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
                tracing::debug!(%code, attempt, "retrying chart request");
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        last_error = Some(SignalError::DataRetrieval {
                            code: code.to_string(),
                            reason: format!("HTTP {status} for {symbol}"),
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(SignalError::DataRetrieval {
                            code: code.to_string(),
                            reason: format!("unknown symbol {symbol}"),
                        });
                    }

                    if !status.is_success() {
                        return Err(SignalError::DataRetrieval {
                            code: code.to_string(),
                            reason: format!("HTTP {status} for {symbol}"),
                        });
                    }

                    let chart: ChartResponse =
                        resp.json().map_err(|e| SignalError::DataRetrieval {
                            code: code.to_string(),
                            reason: format!("failed to parse response for {symbol}: {e}"),
                        })?;

                    return Self::parse_response(code, chart);
                }
                Err(e) => {
                    let retryable = e.is_connect() || e.is_timeout();
                    let err = SignalError::DataRetrieval {
                        code: code.to_string(),
                        reason: e.to_string(),
                    };
                    if !retryable {
                        return Err(err);
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SignalError::DataRetrieval {
            code: code.to_string(),
            reason: "max retries exceeded".into(),
        }))
    }
}

impl DataPort for YahooAdapter {
    fn fetch_history(
        &self,
        code: &str,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<PriceHistory, SignalError> {
        self.fetch_with_retry(code, symbol, start_date)
    }
}
