// src/transmit.rs
use crate::process::{date_parser::Period, normalize::NormalizedTable};
use chrono::NaiveDate;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{error, info, instrument, warn};
use url::Url;

/// JSON body posted to the spreadsheet endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// First day of the data month, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Category → count, in column order.
    pub data: Map<String, Value>,
}

impl Payload {
    /// Built from the first table row only; `None` for an empty table.
    pub fn from_table(table: &NormalizedTable, period: Period) -> Option<Self> {
        let data = table
            .first_row()?
            .map(|(name, v)| (name.to_string(), Value::from(v as i64)))
            .collect();
        Some(Self {
            date: period.first_day(),
            data,
        })
    }
}

/// How a transmission attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// Nothing to send.
    Skipped,
    /// 200 or 302; `message` is the endpoint's `message` field when it sent one.
    Delivered { status: u16, message: Option<String> },
    /// Any other status, with the raw body.
    Rejected { status: u16, body: String },
    /// The request never completed.
    Failed { error: String },
}

impl TransmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransmitOutcome::Skipped | TransmitOutcome::Delivered { .. })
    }
}

impl fmt::Display for TransmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitOutcome::Skipped => write!(f, "table empty; nothing sent"),
            TransmitOutcome::Delivered {
                message: Some(m), ..
            } => write!(f, "delivered: {}", m),
            TransmitOutcome::Delivered { status, .. } => {
                write!(f, "delivered (status {}, no details)", status)
            }
            TransmitOutcome::Rejected { status, body } => {
                write!(f, "transmission error (status {}): {}", status, body)
            }
            TransmitOutcome::Failed { error } => write!(f, "network error: {}", error),
        }
    }
}

fn ack_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("message")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// POST the first row of `table` to `endpoint`.
///
/// Never fails: transport errors and rejections come back as outcomes.
#[instrument(level = "info", skip_all, fields(%period))]
pub async fn send_table(
    client: &Client,
    endpoint: &Url,
    table: &NormalizedTable,
    period: Period,
) -> TransmitOutcome {
    let Some(payload) = Payload::from_table(table, period) else {
        info!("table empty; skipping transmission");
        return TransmitOutcome::Skipped;
    };

    let body = match serde_json::to_string(&payload) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "serializing payload");
            return TransmitOutcome::Failed {
                error: e.to_string(),
            };
        }
    };

    info!(date = %payload.date, columns = payload.data.len(), "sending payload");
    let resp = match client
        .post(endpoint.clone())
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "request failed");
            return TransmitOutcome::Failed {
                error: e.to_string(),
            };
        }
    };

    let status = resp.status();
    info!(status = status.as_u16(), "endpoint responded");
    let text = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "reading response body");
            String::new()
        }
    };

    let outcome = if status == StatusCode::OK || status == StatusCode::FOUND {
        TransmitOutcome::Delivered {
            status: status.as_u16(),
            message: ack_message(&text),
        }
    } else {
        TransmitOutcome::Rejected {
            status: status.as_u16(),
            body: text,
        }
    };

    if outcome.is_success() {
        info!("{}", outcome);
    } else {
        error!("{}", outcome);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{
        normalize::clean_fixed_layout,
        raw_table::{Cell, RawGrid},
    };
    use serde_json::json;
    use tracing_subscriber::{fmt, EnvFilter};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init_test_logging() {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,rousai_scraper=debug")),
            )
            .with_test_writer()
            .try_init();
    }

    fn construction_table() -> NormalizedTable {
        let t = |s: &str| Cell::Text(s.to_string());
        clean_fixed_layout(&RawGrid::new(vec![
            vec![],
            vec![],
            vec![Cell::Empty, Cell::Empty, t("墜落・転落"), t("転倒"), t("感電")],
            vec![t("建設業"), t("総計"), Cell::Number(12.0), Cell::Number(3.9), t("-")],
            vec![t("建設業"), t("土木"), Cell::Number(1.0), Cell::Number(1.0), Cell::Number(1.0)],
        ]))
    }

    fn period() -> Period {
        Period::new(2024, 7).unwrap()
    }

    fn endpoint(server: &MockServer) -> Url {
        Url::parse(&format!("{}/exec", server.uri())).unwrap()
    }

    #[test]
    fn payload_uses_first_row_as_integers_in_column_order() {
        let payload = Payload::from_table(&construction_table(), period()).unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"date":"2024-07-01","data":{"墜落・転落":12,"転倒":3,"感電":0}}"#
        );
    }

    #[tokio::test]
    async fn empty_table_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = send_table(
            &Client::new(),
            &endpoint(&server),
            &NormalizedTable::default(),
            period(),
        )
        .await;
        assert_eq!(outcome, TransmitOutcome::Skipped);
    }

    #[tokio::test]
    async fn table_without_known_columns_sends_nothing() {
        init_test_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let t = |s: &str| Cell::Text(s.to_string());
        let table = clean_fixed_layout(&RawGrid::new(vec![
            vec![],
            vec![],
            vec![Cell::Empty, Cell::Empty, t("墜落・転落(計)"), t("合計")],
            vec![t("建設業"), t("総計"), Cell::Number(5.0), Cell::Number(5.0)],
        ]));
        assert_eq!(table.rows().len(), 1);
        assert!(Payload::from_table(&table, period()).is_none());

        let outcome = send_table(&Client::new(), &endpoint(&server), &table, period()).await;
        assert_eq!(outcome, TransmitOutcome::Skipped);
    }

    #[tokio::test]
    async fn ok_response_reports_message() {
        init_test_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/exec"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "date": "2024-07-01",
                "data": {"墜落・転落": 12, "転倒": 3, "感電": 0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"message":"ok"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = send_table(
            &Client::new(),
            &endpoint(&server),
            &construction_table(),
            period(),
        )
        .await;
        assert!(outcome.is_success());
        assert!(outcome.to_string().contains("ok"));
        assert_eq!(
            outcome,
            TransmitOutcome::Delivered {
                status: 200,
                message: Some("ok".to_string())
            }
        );
    }

    #[tokio::test]
    async fn ok_without_json_is_generic_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>done</html>"))
            .mount(&server)
            .await;

        let outcome = send_table(
            &Client::new(),
            &endpoint(&server),
            &construction_table(),
            period(),
        )
        .await;
        assert_eq!(
            outcome,
            TransmitOutcome::Delivered {
                status: 200,
                message: None
            }
        );
    }

    #[tokio::test]
    async fn server_error_is_reported_with_body() {
        init_test_logging();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("script failed"))
            .mount(&server)
            .await;

        let outcome = send_table(
            &Client::new(),
            &endpoint(&server),
            &construction_table(),
            period(),
        )
        .await;
        assert!(!outcome.is_success());
        assert!(outcome.to_string().contains("script failed"));
        assert_eq!(
            outcome,
            TransmitOutcome::Rejected {
                status: 500,
                body: "script failed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_failed_outcome() {
        init_test_logging();
        // Nothing listens on the discard port.
        let url = Url::parse("http://127.0.0.1:9/exec").unwrap();

        let outcome = send_table(&Client::new(), &url, &construction_table(), period()).await;
        assert!(matches!(outcome, TransmitOutcome::Failed { .. }));
    }
}
