//! PostgREST-compatible table store client.
//!
//! Upserts are a single `POST {url}/rest/v1/{table}?on_conflict=...` with a
//! JSON array body. The store answers with the affected rows, and an empty
//! answer counts as a failed insert.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Request, StatusCode};
use serde_json::Value;
use url::Url;

use super::{MetricStore, metrics_to_rows};
use crate::Result;
use crate::config::{FieldMapping, StoreConfig};
use crate::error::{DqError, redact_url};
use crate::quality::CompletenessMetric;

/// `Prefer` header asking for merge-on-conflict and the affected rows back.
pub const PREFER_HEADER: &str = "resolution=merge-duplicates,return=representation";

/// Longest slice of an error body kept in messages.
const MAX_ERROR_BODY: usize = 200;

/// REST client for a PostgREST/Supabase table.
#[derive(Debug)]
pub struct RestTableStore {
    client: Client,
    config: StoreConfig,
    mapping: Option<FieldMapping>,
    endpoint: Url,
}

impl RestTableStore {
    /// Validates the settings and builds the HTTP client.
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings or mapping, or when
    /// a conflict field is left out by the mapping, and a remote store error
    /// if the HTTP client cannot be built.
    pub fn new(config: StoreConfig, mapping: Option<FieldMapping>) -> Result<Self> {
        config.validate()?;
        if let Some(ref mapping) = mapping {
            mapping.validate()?;
        }

        let conflict = config.conflict_columns(mapping.as_ref())?;
        let endpoint = endpoint_url(&config, &conflict)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DqError::remote_store("Failed to build store client", e))?;

        tracing::debug!("Store endpoint: {}", redact_url(endpoint.as_str()));

        Ok(Self {
            client,
            config,
            mapping,
            endpoint,
        })
    }

    /// Upsert endpoint including the `on_conflict` query.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the upsert request for the given rows without sending it.
    ///
    /// # Errors
    /// Returns an error if the API key is not a valid header value or the
    /// request cannot be assembled.
    pub fn build_upsert_request(&self, rows: &[Value]) -> Result<Request> {
        let key = self.config.api_key.expose();
        let mut api_key = HeaderValue::from_str(key).map_err(|_| {
            DqError::configuration("store API key contains characters not allowed in a header")
        })?;
        api_key.set_sensitive(true);

        self.client
            .post(self.endpoint.clone())
            .header("apikey", api_key)
            .bearer_auth(key)
            .header("Prefer", PREFER_HEADER)
            .header(CONTENT_TYPE, "application/json")
            .json(rows)
            .build()
            .map_err(|e| DqError::remote_store("Failed to build upsert request", e))
    }
}

#[async_trait]
impl MetricStore for RestTableStore {
    fn describe(&self) -> String {
        format!(
            "table '{}' at {}",
            self.config.table_name,
            redact_url(&self.config.url)
        )
    }

    async fn upsert(&self, metrics: &[CompletenessMetric]) -> Result<usize> {
        let rows = metrics_to_rows(metrics, self.mapping.as_ref())?;
        if rows.is_empty() {
            return Ok(0);
        }

        let request = self.build_upsert_request(&rows)?;
        tracing::debug!("Upserting {} row(s) into {}", rows.len(), self.describe());

        let response = self.client.execute(request).await.map_err(|e| {
            DqError::remote_store(format!("Upsert request to {} failed", self.describe()), e)
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DqError::remote_store("Failed to read upsert response", e))?;

        parse_ack(status, &body)
    }
}

/// Interprets an upsert response, returning the number of acknowledged rows.
///
/// # Errors
/// Returns a remote store error for non-2xx statuses, bodies that are not a
/// JSON array, and empty acknowledgements.
pub fn parse_ack(status: StatusCode, body: &str) -> Result<usize> {
    if !status.is_success() {
        return Err(DqError::remote_store_message(format!(
            "store returned {}: {}",
            status,
            truncate(body.trim(), MAX_ERROR_BODY)
        )));
    }

    let rows: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| DqError::remote_store("store response is not a JSON array", e))?;

    if rows.is_empty() {
        return Err(DqError::remote_store_message(
            "store acknowledged no rows for the upsert",
        ));
    }

    Ok(rows.len())
}

fn endpoint_url(config: &StoreConfig, conflict: &[String]) -> Result<Url> {
    let mut url = Url::parse(&config.url).map_err(|e| {
        DqError::configuration(format!(
            "store URL '{}' is invalid: {}",
            redact_url(&config.url),
            e
        ))
    })?;

    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| DqError::configuration("store URL cannot be used as a base"))?
        .pop_if_empty()
        .extend(["rest", "v1", config.table_name.as_str()]);
    url.query_pairs_mut()
        .append_pair("on_conflict", &conflict.join(","));

    Ok(url)
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStamp;
    use crate::quality::build_metric_record;
    use crate::security::ApiKey;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(url: &str) -> StoreConfig {
        StoreConfig::new(url, ApiKey::new("service-key"), "dq_metrics")
    }

    fn metrics() -> Vec<CompletenessMetric> {
        let stamp = RunStamp {
            run_timestamp: "2026-02-05 12:00:00".to_string(),
            metric_date: "2026-02-05".to_string(),
        };
        vec![
            build_metric_record("daily", &stamp, "users", "email", 10, 2),
            build_metric_record("daily", &stamp, "users", "name", 10, 0),
        ]
    }

    fn header<'a>(request: &'a Request, name: &str) -> &'a str {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Serves one canned HTTP response and returns the raw request received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buffer = [0u8; 4096];

            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                received.extend_from_slice(&buffer[..read]);

                let text = String::from_utf8_lossy(&received);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if received.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&received).into_owned()
        });

        (url, handle)
    }

    #[test]
    fn test_endpoint_includes_table_and_conflict_target() {
        let store = RestTableStore::new(config("https://project.supabase.co"), None).unwrap();
        let endpoint = store.endpoint();

        assert_eq!(endpoint.path(), "/rest/v1/dq_metrics");
        let conflict: Vec<(String, String)> = endpoint.query_pairs().into_owned().collect();
        assert_eq!(
            conflict,
            vec![(
                "on_conflict".to_string(),
                "pipeline_name,metric_date,table_name,column_name".to_string()
            )]
        );
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        let store = RestTableStore::new(config("https://project.supabase.co/"), None).unwrap();
        assert_eq!(store.endpoint().path(), "/rest/v1/dq_metrics");
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        assert!(RestTableStore::new(config("ftp://project.supabase.co"), None).is_err());

        let mapping = FieldMapping::new([("bogus", "x")]);
        assert!(RestTableStore::new(config("https://project.supabase.co"), Some(mapping)).is_err());
    }

    /// Mapping shaped like a dated output-keys document without `pipeline_name`.
    fn output_keys_mapping() -> FieldMapping {
        FieldMapping::new([
            ("metric_date", "metric_date"),
            ("table_name", "table_name"),
            ("column_name", "column_name"),
            ("total_rows", "total_rows"),
            ("missing_rows", "missing_rows"),
            ("missing_percentage", "missing_percentage"),
        ])
    }

    #[test]
    fn test_conflict_target_is_part_of_mapped_rows() {
        let mapping = FieldMapping::new([
            ("metric_date", "date"),
            ("table_name", "tbl"),
            ("column_name", "col"),
            ("missing_percentage", "pct"),
        ]);
        let store = RestTableStore::new(
            config("https://project.supabase.co")
                .with_on_conflict(["metric_date", "table_name", "column_name"]),
            Some(mapping.clone()),
        )
        .unwrap();

        let (_, conflict) = store
            .endpoint()
            .query_pairs()
            .find(|(key, _)| key == "on_conflict")
            .unwrap();
        assert_eq!(conflict, "date,tbl,col");

        let rows = metrics_to_rows(&metrics(), Some(&mapping)).unwrap();
        for column in conflict.split(',') {
            assert!(
                rows.iter().all(|row| row.get(column).is_some()),
                "conflict column '{}' missing from upsert rows",
                column
            );
        }
    }

    #[test]
    fn test_new_rejects_conflict_field_dropped_by_mapping() {
        let error = RestTableStore::new(
            config("https://project.supabase.co"),
            Some(output_keys_mapping()),
        )
        .unwrap_err();
        assert!(matches!(error, DqError::Configuration { .. }));
        assert!(error.to_string().contains("pipeline_name"));

        let store = RestTableStore::new(
            config("https://project.supabase.co")
                .with_on_conflict(["metric_date", "table_name", "column_name"]),
            Some(output_keys_mapping()),
        )
        .unwrap();
        assert!(
            store
                .endpoint()
                .as_str()
                .ends_with("on_conflict=metric_date%2Ctable_name%2Ccolumn_name")
        );
    }

    #[test]
    fn test_upsert_request_shape() {
        let store = RestTableStore::new(config("https://project.supabase.co"), None).unwrap();
        let rows = metrics_to_rows(&metrics(), None).unwrap();

        let request = store.build_upsert_request(&rows).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(header(&request, "apikey"), "service-key");
        assert_eq!(header(&request, "authorization"), "Bearer service-key");
        assert_eq!(header(&request, "prefer"), PREFER_HEADER);
        assert_eq!(header(&request, "content-type"), "application/json");
        assert!(request.headers()["apikey"].is_sensitive());

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: Vec<Value> = serde_json::from_slice(body).unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["column_name"], "email");
        assert_eq!(sent[0]["missing_percentage"], 20.0);
    }

    #[test]
    fn test_describe_hides_credentials() {
        let store = RestTableStore::new(config("https://svc:pw@project.supabase.co"), None).unwrap();

        let description = store.describe();
        assert!(description.contains("dq_metrics"));
        assert!(!description.contains("pw@"));
        assert!(!description.contains("service-key"));
        assert!(!format!("{:?}", store).contains("service-key"));
    }

    #[test]
    fn test_parse_ack() {
        assert_eq!(parse_ack(StatusCode::CREATED, r#"[{"id": 1}, {"id": 2}]"#).unwrap(), 2);

        let empty = parse_ack(StatusCode::OK, "[]").unwrap_err();
        assert!(empty.to_string().contains("Remote store"));

        let rejected = parse_ack(StatusCode::CONFLICT, r#"{"message": "duplicate key"}"#).unwrap_err();
        assert!(matches!(rejected, DqError::RemoteStore { .. }));
        assert!(rejected.to_string().contains("409"));

        assert!(parse_ack(StatusCode::OK, r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_upsert_round_trip() {
        let (url, server) = serve_once(
            "HTTP/1.1 201 Created",
            r#"[{"column_name": "email"}, {"column_name": "name"}]"#,
        )
        .await;
        let store = RestTableStore::new(config(&url), None).unwrap();

        let acknowledged = store.upsert(&metrics()).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(acknowledged, 2);
        assert!(request.starts_with("POST /rest/v1/dq_metrics?on_conflict="));
        assert!(request.contains("apikey: service-key"));
        assert!(request.contains("\"table_name\":\"users\""));
    }

    #[tokio::test]
    async fn test_upsert_server_error() {
        let (url, server) =
            serve_once("HTTP/1.1 500 Internal Server Error", r#"{"message": "boom"}"#).await;
        let store = RestTableStore::new(config(&url), None).unwrap();

        let error = store.upsert(&metrics()).await.unwrap_err();
        server.await.unwrap();

        assert!(error.to_string().contains("Remote store"));
        assert!(matches!(error, DqError::RemoteStore { .. }));
    }

    #[tokio::test]
    async fn test_upsert_with_mapping_sends_mapped_rows() {
        let (url, server) = serve_once("HTTP/1.1 201 Created", r#"[{"tbl": "users"}]"#).await;
        let mapping = FieldMapping::new([("table_name", "tbl")]);
        let store =
            RestTableStore::new(config(&url).with_on_conflict(["table_name"]), Some(mapping))
                .unwrap();

        store.upsert(&metrics()[..1]).await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /rest/v1/dq_metrics?on_conflict=tbl "));
        assert!(request.contains(r#"[{"tbl":"users"}]"#));
        assert!(!request.contains("pipeline_name\":"));
    }
}
