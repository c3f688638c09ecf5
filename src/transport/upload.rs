//! Multipart upload transport
//!
//! One POST per operation, following the GraphQL multipart request
//! convention: an `operations` form field carrying the request JSON with
//! every attachment position nulled out, a `map` field associating each
//! numbered file part with its path in `variables`, then the file parts
//! themselves. Only mutations listed in the upload configuration are
//! routed here.

use crate::config::UploadConfig;
use crate::core::error::{GraftResult, TransportError};
use crate::core::operation::{FileAttachment, Operation};
use crate::transport::{ResponseStream, Transport, single_response, validate_scheme};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value, json};

/// HTTP terminal for file-carrying mutations
#[derive(Debug)]
pub struct UploadTransport {
    endpoint: String,
    mutations: Vec<String>,
    client: reqwest::Client,
}

impl UploadTransport {
    pub fn new(config: UploadConfig) -> GraftResult<Self> {
        validate_scheme("upload.endpoint", &config.endpoint, &["http", "https"])?;
        Ok(Self {
            endpoint: config.endpoint,
            mutations: config.mutations,
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether an operation name is routed to this transport
    pub fn handles(&self, operation_name: &str) -> bool {
        self.mutations.iter().any(|m| m == operation_name)
    }
}

#[async_trait]
impl Transport for UploadTransport {
    async fn request(&self, operation: Operation) -> GraftResult<ResponseStream> {
        let mut payload = operation.payload();
        payload.variables = nulled_variables(&payload.variables, &operation.attachments);

        let operations_json = serde_json::to_string(&payload)?;
        let map_json = serde_json::to_string(&multipart_map(&operation.attachments))?;

        let mut form = Form::new()
            .text("operations", operations_json)
            .text("map", map_json);

        for (index, attachment) in operation.attachments.into_iter().enumerate() {
            let FileAttachment {
                filename,
                content_type,
                bytes,
                ..
            } = attachment;
            let part = Part::bytes(bytes)
                .file_name(filename)
                .mime_str(&content_type)
                .map_err(|e| TransportError::Protocol {
                    message: format!("invalid content type '{}': {}", content_type, e),
                })?;
            form = form.part(index.to_string(), part);
        }

        tracing::debug!(endpoint = %self.endpoint, "Sending multipart operation");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Network {
                message: format!("upload endpoint returned HTTP {}", status),
            }
            .into());
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        Ok(single_response(value))
    }
}

/// Replace every attachment position in the variables with JSON `null`
///
/// The multipart convention requires the nulled position to exist in the
/// serialized variables so the server can splice the file back in.
fn nulled_variables(variables: &Value, attachments: &[FileAttachment]) -> Value {
    let mut variables = match variables {
        Value::Object(_) => variables.clone(),
        _ => json!({}),
    };
    for attachment in attachments {
        set_path_null(&mut variables, &attachment.variable_path);
    }
    variables
}

/// Walk a dotted object path, creating intermediate objects, and set the
/// final position to `null`
fn set_path_null(variables: &mut Value, path: &str) {
    let mut current = variables;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), Value::Null);
            return;
        }
        current = map.entry(segment.to_string()).or_insert_with(|| json!({}));
    }
}

/// Build the `map` form field: part index → path in the operation JSON
fn multipart_map(attachments: &[FileAttachment]) -> Value {
    let mut map = Map::new();
    for (index, attachment) in attachments.iter().enumerate() {
        map.insert(
            index.to_string(),
            json!([format!("variables.{}", attachment.variable_path)]),
        );
    }
    Value::Object(map)
}
