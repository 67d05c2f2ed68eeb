use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::{Result, WhatsubError};
use crate::http::{RequestDescriptor, ResponseOutcome};

/// One-shot GET against the records endpoint. The body is read chunk by
/// chunk in arrival order until the remote closes the stream; whatever
/// status the remote chose is delivered as a normal outcome. Only transport
/// failures (DNS, refused connection, TLS, a dropped socket mid-body) turn
/// into errors, and there is no retry and no client-side timeout.
///
/// Every invocation reports exactly once through the injected diagnostics:
/// either the completed outcome or the failure.
pub struct TableRecordsFetcher {
    http: reqwest::Client,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TableRecordsFetcher {
    /// Redirects are not followed; a 3xx is a deliverable outcome like any
    /// other status.
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(WhatsubError::ClientBuild)?;
        Ok(Self { http, diagnostics })
    }

    pub fn with_client(http: reqwest::Client, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { http, diagnostics }
    }

    pub async fn fetch_records(&self, descriptor: &RequestDescriptor) -> Result<ResponseOutcome> {
        match self.run(descriptor).await {
            Ok(outcome) => {
                self.diagnostics.completed(&outcome);
                Ok(outcome)
            }
            Err(error) => {
                self.diagnostics.failed(&error);
                Err(error)
            }
        }
    }

    async fn run(&self, descriptor: &RequestDescriptor) -> Result<ResponseOutcome> {
        descriptor.validate()?;
        let url = descriptor.url();
        let mut request = self.http.get(&url);
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let mut response = request.send().await.map_err(|source| WhatsubError::Transport {
            endpoint: url.clone(),
            source,
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let mut body = Vec::new();
        loop {
            let chunk = response.chunk().await.map_err(|source| WhatsubError::Transport {
                endpoint: url.clone(),
                source,
            })?;
            match chunk {
                Some(bytes) => body.extend_from_slice(&bytes),
                None => break,
            }
        }

        Ok(ResponseOutcome {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}
