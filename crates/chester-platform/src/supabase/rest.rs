use async_trait::async_trait;
use gloo_net::http::{Method, RequestBuilder};
use serde_json::Value;

use chester_core::ports::{DataPort, Row};
use chester_core::query::{Filter, Query};
use chester_types::{ChesterError, Result};
use super::client::SupabaseClient;
use super::query::{encode_filter, encode_query};

/// Table access through PostgREST.
pub struct SupabaseGateway {
    client: SupabaseClient,
}

impl SupabaseGateway {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client.request(method, &format!("/rest/v1/{}", table))
    }
}

fn with_params(builder: RequestBuilder, params: Vec<(String, String)>) -> RequestBuilder {
    builder.query(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn into_rows(value: Value) -> Result<Vec<Row>> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Err(ChesterError::Gateway(format!("expected rows, got {}", other))),
    }
}

fn require_filter(op: &str, table: &str, filter: &Filter) -> Result<()> {
    if filter.is_empty() {
        return Err(ChesterError::Validation(format!(
            "refusing unfiltered {} on {}",
            op, table
        )));
    }
    Ok(())
}

#[async_trait(?Send)]
impl DataPort for SupabaseGateway {
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
        log::debug!("POST {} ({} rows)", table, rows.len());
        let builder = self
            .table(Method::POST, table)
            .header("Prefer", "return=representation");
        let body = Value::Array(rows);
        into_rows(self.client.send(builder, Some(&body)).await?)
    }

    async fn update(&self, table: &str, patch: Row, filter: &Filter) -> Result<Vec<Row>> {
        require_filter("update", table, filter)?;
        log::debug!("PATCH {} where {:?}", table, filter.conditions());
        let builder = with_params(
            self.table(Method::PATCH, table)
                .header("Prefer", "return=representation"),
            encode_filter(filter),
        );
        into_rows(self.client.send(builder, Some(&patch)).await?)
    }

    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        log::debug!("GET {}", table);
        let builder = with_params(self.table(Method::GET, table), encode_query(query));
        into_rows(self.client.send(builder, None).await?)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        require_filter("delete", table, filter)?;
        log::debug!("DELETE {} where {:?}", table, filter.conditions());
        let builder = with_params(
            self.table(Method::DELETE, table)
                .header("Prefer", "return=minimal"),
            encode_filter(filter),
        );
        self.client.send(builder, None).await?;
        Ok(())
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value> {
        log::debug!("RPC {}", procedure);
        let builder = self
            .client
            .request(Method::POST, &format!("/rest/v1/rpc/{}", procedure));
        self.client.send(builder, Some(&args)).await
    }

    fn backend_name(&self) -> &str {
        "supabase"
    }
}
