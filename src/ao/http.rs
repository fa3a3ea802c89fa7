//! reqwest implementations of the AO service seams.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::graphql::{
    transaction_query, transactions_query, GraphqlRequest, GraphqlResponse, TransactionData,
    TransactionPage, TransactionVariables, TransactionsData, TransactionsVariables,
};
use super::transport::{
    AoMessenger, ContentStore, DataItemSigner, DryRunRequest, DryRunResult, MessageIndex,
    MessageRequest,
};
use super::types::{IndexedTransaction, Tag};
use crate::platform::ClientError;

/// Tags every outgoing AO message carries after the caller's own.
pub const PROTOCOL_TAGS: [(&str, &str); 4] = [
    ("Data-Protocol", "ao"),
    ("Variant", "ao.TN.1"),
    ("Type", "Message"),
    ("SDK", "clara-ao"),
];

/// Placeholder identity the compute unit expects on dry runs.
const DRY_RUN_ID: &str = "1234";

fn with_protocol_tags(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .cloned()
        .chain(PROTOCOL_TAGS.iter().map(|(n, v)| Tag::new(*n, *v)))
        .collect()
}

fn preview(body: &str) -> String {
    body.chars().take(500).collect()
}

/// Parse a base URL so that relative joins append to its path.
fn base_url(raw: &str) -> Result<Url, ClientError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| ClientError::config(format!("Invalid URL {}: {}", raw, e)))
}

fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path)
        .map_err(|e| ClientError::config(format!("Invalid path {}: {}", path, e)))
}

/// Read the body, failing on non-2xx statuses.
async fn success_body(response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(ClientError::from_reqwest)?;
    if !status.is_success() {
        return Err(ClientError::http(status.as_u16(), preview(&body)));
    }
    Ok(body)
}

fn parse_json<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| {
        ClientError::parse(format!(
            "Failed to parse {}: {}, body: {}",
            what,
            e,
            preview(body)
        ))
    })
}

/// GraphQL search index client.
pub struct GoldskyIndex {
    client: Client,
    url: Url,
}

impl GoldskyIndex {
    pub fn new(url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: &str) -> Result<Self, ClientError> {
        let url =
            Url::parse(url).map_err(|e| ClientError::config(format!("Invalid URL {}: {}", url, e)))?;
        Ok(Self { client, url })
    }

    async fn query<V, D>(&self, query: String, variables: V) -> Result<D, ClientError>
    where
        V: Serialize + Send + Sync,
        D: DeserializeOwned,
    {
        let request = GraphqlRequest { query, variables };
        let response = self
            .client
            .post(self.url.clone())
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let body = success_body(response).await?;
        let parsed: GraphqlResponse<D> = parse_json(&body, "index response")?;
        parsed.into_data()
    }
}

#[async_trait]
impl MessageIndex for GoldskyIndex {
    async fn transaction(&self, id: &str) -> Result<Option<IndexedTransaction>, ClientError> {
        debug!("Index lookup for transaction {}", id);
        let data: TransactionData = self
            .query(
                transaction_query(),
                TransactionVariables { id: id.to_string() },
            )
            .await?;
        Ok(data.transaction)
    }

    async fn incoming(
        &self,
        entity_id: &str,
        limit: usize,
        cursor: &str,
    ) -> Result<TransactionPage, ClientError> {
        debug!(
            "Index listing for {} (limit={}, cursor={:?})",
            entity_id, limit, cursor
        );
        let data: TransactionsData = self
            .query(
                transactions_query(),
                TransactionsVariables::incoming(entity_id, limit, cursor),
            )
            .await?;
        Ok(data.transactions.into())
    }
}

/// Arweave gateway serving raw transaction data.
pub struct ArweaveGateway {
    client: Client,
    base: Url,
}

impl ArweaveGateway {
    pub fn new(gateway_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), gateway_url)
    }

    pub fn with_client(client: Client, gateway_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            base: base_url(gateway_url)?,
        })
    }
}

#[async_trait]
impl ContentStore for ArweaveGateway {
    async fn fetch(&self, id: &str) -> Result<String, ClientError> {
        let url = join(&self.base, id)?;
        debug!("Fetching message data from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;
        success_body(response).await
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DryRunBody<'a> {
    id: &'a str,
    target: &'a str,
    owner: &'a str,
    anchor: &'a str,
    data: &'a str,
    tags: Vec<Tag>,
}

/// Messenger unit (writes) and compute unit (dry runs).
pub struct AoConnect {
    client: Client,
    mu_url: Url,
    cu_url: Url,
}

impl AoConnect {
    pub fn new(mu_url: &str, cu_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), mu_url, cu_url)
    }

    pub fn with_client(client: Client, mu_url: &str, cu_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client,
            mu_url: base_url(mu_url)?,
            cu_url: base_url(cu_url)?,
        })
    }
}

#[async_trait]
impl AoMessenger for AoConnect {
    async fn message(
        &self,
        request: MessageRequest,
        signer: &dyn DataItemSigner,
    ) -> Result<String, ClientError> {
        let tags = with_protocol_tags(&request.tags);
        let item = signer.sign(&request.process, &tags, &request.data).await?;
        debug!(
            "Submitting data item {} ({} bytes) to {}",
            item.id,
            item.raw.len(),
            request.process
        );

        let response = self
            .client
            .post(self.mu_url.clone())
            .header("Content-Type", "application/octet-stream")
            .header("Accept", "application/json")
            .body(item.raw)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let body = success_body(response).await?;
        let submitted: SubmitResponse = parse_json(&body, "messenger response")?;
        Ok(submitted.id.unwrap_or(item.id))
    }

    async fn dryrun(&self, request: DryRunRequest) -> Result<DryRunResult, ClientError> {
        let mut url = join(&self.cu_url, "dry-run")?;
        url.query_pairs_mut()
            .append_pair("process-id", &request.process);
        debug!("Dry run against {}", request.process);

        let body = DryRunBody {
            id: DRY_RUN_ID,
            target: &request.process,
            owner: DRY_RUN_ID,
            anchor: "0",
            data: &request.data,
            tags: with_protocol_tags(&request.tags),
        };
        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let body = success_body(response).await?;
        parse_json(&body, "dry-run result")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ao::transport::SignedDataItem;
    use crate::platform::ClientErrorKind;
    use axum::body::Bytes;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{}", addr)
    }

    struct RecordingSigner {
        tags: Mutex<Vec<Tag>>,
    }

    #[async_trait]
    impl DataItemSigner for RecordingSigner {
        async fn sign(
            &self,
            _target: &str,
            tags: &[Tag],
            _data: &str,
        ) -> Result<SignedDataItem, ClientError> {
            *self.tags.lock().unwrap() = tags.to_vec();
            Ok(SignedDataItem {
                id: "local-id".to_string(),
                raw: b"signed-bytes".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn index_posts_query_and_variables() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let recorded = seen.clone();
        let router = Router::new().route(
            "/graphql",
            post(move |Json(body): Json<Value>| {
                let recorded = recorded.clone();
                async move {
                    *recorded.lock().unwrap() = body;
                    Json(json!({
                        "data": { "transaction": { "id": "abc123", "data": {} } }
                    }))
                }
            }),
        );
        let base = serve(router).await;
        let index = GoldskyIndex::new(&format!("{}/graphql", base)).unwrap();

        let tx = index.transaction("abc123").await.unwrap().unwrap();
        assert_eq!(tx.id, "abc123");

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["variables"], json!({ "id": "abc123" }));
        assert!(body["query"].as_str().unwrap().contains("transaction(id: $id)"));
    }

    #[tokio::test]
    async fn index_missing_transaction_is_none() {
        let router = Router::new().route(
            "/graphql",
            post(|| async { Json(json!({ "data": { "transaction": null } })) }),
        );
        let base = serve(router).await;
        let index = GoldskyIndex::new(&format!("{}/graphql", base)).unwrap();
        assert!(index.transaction("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn index_listing_keeps_order() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                Json(json!({
                    "data": { "transactions": {
                        "pageInfo": { "hasNextPage": false },
                        "edges": [
                            { "cursor": "c-new", "node": { "id": "new", "data": {} } },
                            { "cursor": "c-old", "node": { "id": "old", "data": {} } }
                        ]
                    } }
                }))
            }),
        );
        let base = serve(router).await;
        let index = GoldskyIndex::new(&format!("{}/graphql", base)).unwrap();
        let page = index.incoming("proc", 2, "").await.unwrap();
        let ids: Vec<_> = page.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(page.next_cursor.as_deref(), Some("c-old"));
    }

    #[tokio::test]
    async fn index_malformed_json_is_parse_error() {
        let router = Router::new().route("/graphql", post(|| async { "not json" }));
        let base = serve(router).await;
        let index = GoldskyIndex::new(&format!("{}/graphql", base)).unwrap();
        let err = index.transaction("x").await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Parse);
    }

    #[tokio::test]
    async fn gateway_returns_body_and_maps_404() {
        let router = Router::new().route(
            "/:id",
            get(|Path(id): Path<String>| async move {
                if id == "missing" {
                    Err((StatusCode::NOT_FOUND, "Not Found"))
                } else {
                    Ok(format!("body of {}", id))
                }
            }),
        );
        let base = serve(router).await;
        let gateway = ArweaveGateway::new(&base).unwrap();

        assert_eq!(gateway.fetch("abc123").await.unwrap(), "body of abc123");

        let err = gateway.fetch("missing").await.unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Http);
        assert_eq!(err.status_code, Some(404));
    }

    #[tokio::test]
    async fn messenger_posts_signed_bytes() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let recorded = received.clone();
        let router = Router::new().route(
            "/",
            post(move |body: Bytes| {
                let recorded = recorded.clone();
                async move {
                    *recorded.lock().unwrap() = body.to_vec();
                    Json(json!({ "id": "mu-id", "message": "Processing DataItem" }))
                }
            }),
        );
        let base = serve(router).await;
        let connect = AoConnect::new(&base, &base).unwrap();
        let signer = RecordingSigner {
            tags: Mutex::new(Vec::new()),
        };

        let id = connect
            .message(
                MessageRequest {
                    process: "proto".to_string(),
                    tags: vec![Tag::new("Action", "Send-Message")],
                    data: "hi".to_string(),
                },
                &signer,
            )
            .await
            .unwrap();

        assert_eq!(id, "mu-id");
        assert_eq!(received.lock().unwrap().as_slice(), b"signed-bytes");
        let tags = signer.tags.lock().unwrap().clone();
        assert_eq!(tags[0], Tag::new("Action", "Send-Message"));
        assert!(tags.contains(&Tag::new("Data-Protocol", "ao")));
    }

    #[tokio::test]
    async fn dry_run_targets_process() {
        let seen = Arc::new(Mutex::new((String::new(), Value::Null)));
        let recorded = seen.clone();
        let router = Router::new().route(
            "/dry-run",
            post(
                move |Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                    let recorded = recorded.clone();
                    async move {
                        *recorded.lock().unwrap() =
                            (q.get("process-id").cloned().unwrap_or_default(), body);
                        Json(json!({
                            "Messages": [{ "Data": "{\"Owner\":\"o\",\"Profile\":{}}" }],
                            "Spawns": [],
                            "Output": []
                        }))
                    }
                },
            ),
        );
        let base = serve(router).await;
        let connect = AoConnect::new(&base, &base).unwrap();

        let result = connect
            .dryrun(DryRunRequest {
                process: "profile-proc".to_string(),
                tags: vec![Tag::new("Action", "Info")],
                data: "1984".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.messages.len(), 1);
        let (process_id, body) = seen.lock().unwrap().clone();
        assert_eq!(process_id, "profile-proc");
        assert_eq!(body["Target"], "profile-proc");
        assert_eq!(body["Data"], "1984");
        assert_eq!(body["Tags"][0], json!({ "name": "Action", "value": "Info" }));
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let base = base_url("http://localhost:8080/gateway").unwrap();
        assert_eq!(
            join(&base, "abc").unwrap().as_str(),
            "http://localhost:8080/gateway/abc"
        );
    }
}
