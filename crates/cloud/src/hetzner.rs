// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`CloudProvider`] backed by the Hetzner Cloud REST API.

use crate::error::CloudError;
use crate::model::{CloudServer, CloudServerStatus, CreateServerSpec, SshKey, UpdateServerSpec};
use crate::provider::CloudProvider;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

const API_BASE: &str = "https://api.hetzner.cloud/v1";

pub struct HetznerProvider {
    client: reqwest::Client,
    token: String,
}

impl HetznerProvider {
    pub fn new(token: String) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CloudError::Request(e.to_string()))?;
        Ok(Self { client, token })
    }

    fn retry_policy() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(4)
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, CloudError> {
        (|| async {
            let mut req = self
                .client
                .request(method.clone(), format!("{API_BASE}{path}"))
                .bearer_auth(&self.token);
            if let Some(ref b) = body {
                req = req.json(b);
            }
            let response = req.send().await.map_err(|e| CloudError::Request(e.to_string()))?;
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!(path, "hetzner api rate limited, backing off");
                return Err(CloudError::RateLimited { retry_after_secs: 1 });
            }
            Ok(response)
        })
        .retry(Self::retry_policy())
        .when(|e| matches!(e, CloudError::RateLimited { .. }))
        .await
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, CloudError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body: HetznerErrorBody = response
            .json()
            .await
            .unwrap_or(HetznerErrorBody { error: HetznerErrorDetail::default() });
        match body.error.code.as_str() {
            "invalid_input" => Err(CloudError::InvalidLabels(body.error.message)),
            "resource_limit_exceeded" => Err(CloudError::ResourceLimitExceeded(body.error.message)),
            _ => Err(CloudError::Request(format!("{status}: {}", body.error.message))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HetznerErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct HetznerErrorBody {
    error: HetznerErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServerWire {
    id: u64,
    name: String,
    server_type: ServerTypeWire,
    datacenter: DatacenterWire,
    public_net: PublicNetWire,
    status: String,
    created: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ServerTypeWire {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DatacenterWire {
    location: LocationWire,
}

#[derive(Debug, Deserialize)]
struct LocationWire {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PublicNetWire {
    ipv4: Option<Ipv4Wire>,
    ipv6: Option<Ipv6Wire>,
}

#[derive(Debug, Deserialize)]
struct Ipv4Wire {
    ip: String,
}

#[derive(Debug, Deserialize)]
struct Ipv6Wire {
    ip: String,
}

impl From<ServerWire> for CloudServer {
    fn from(wire: ServerWire) -> Self {
        let status = match wire.status.as_str() {
            "running" => CloudServerStatus::Running,
            "off" => CloudServerStatus::Off,
            _ => CloudServerStatus::Initializing,
        };
        let created_at_secs = chrono::DateTime::parse_from_rfc3339(&wire.created)
            .map(|dt| dt.timestamp().max(0) as u64)
            .unwrap_or(0);
        Self {
            id: wire.id,
            name: wire.name,
            server_type: wire.server_type.name,
            location: wire.datacenter.location.name,
            ipv4: wire.public_net.ipv4.map(|v| v.ip),
            ipv6: wire.public_net.ipv6.map(|v| v.ip),
            status,
            created_at_secs,
            labels: wire.labels,
        }
    }
}

#[async_trait]
impl CloudProvider for HetznerProvider {
    async fn create_server(&self, spec: CreateServerSpec) -> Result<CloudServer, CloudError> {
        let body = json!({
            "name": spec.name,
            "server_type": spec.server_type,
            "location": spec.location,
            "image": spec.image,
            "ssh_keys": spec.ssh_key_names,
            "labels": spec.labels,
            "public_net": {
                "enable_ipv4": spec.net.ipv4,
                "enable_ipv6": spec.net.ipv6,
            },
            "user_data": spec.user_data,
        });
        let response = self.request(reqwest::Method::POST, "/servers", Some(body)).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct Wrapper {
            server: ServerWire,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper.server.into())
    }

    async fn get_server_by_name(&self, name: &str) -> Result<Option<CloudServer>, CloudError> {
        let path = format!("/servers?name={}", urlencoding_light(name));
        let response = self.request(reqwest::Method::GET, &path, None).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct Wrapper {
            servers: Vec<ServerWire>,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper.servers.into_iter().next().map(Into::into))
    }

    async fn list_servers(&self) -> Result<Vec<CloudServer>, CloudError> {
        let response = self.request(reqwest::Method::GET, "/servers", None).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct Wrapper {
            servers: Vec<ServerWire>,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper.servers.into_iter().map(Into::into).collect())
    }

    async fn update_server(&self, spec: UpdateServerSpec) -> Result<CloudServer, CloudError> {
        let existing = self
            .get_server_by_name(&spec.current_name)
            .await?
            .ok_or_else(|| CloudError::NotFound(spec.current_name.clone()))?;
        let body = json!({ "name": spec.new_name, "labels": spec.labels });
        let path = format!("/servers/{}", existing.id);
        let response = self.request(reqwest::Method::PUT, &path, Some(body)).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct Wrapper {
            server: ServerWire,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper.server.into())
    }

    async fn rebuild_server(&self, name: &str, image: &str) -> Result<(), CloudError> {
        let existing =
            self.get_server_by_name(name).await?.ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        let body = json!({ "image": image });
        let path = format!("/servers/{}/actions/rebuild", existing.id);
        let response = self.request(reqwest::Method::POST, &path, Some(body)).await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    async fn power_off_server(&self, name: &str) -> Result<(), CloudError> {
        let existing =
            self.get_server_by_name(name).await?.ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        let path = format!("/servers/{}/actions/poweroff", existing.id);
        let response = self.request(reqwest::Method::POST, &path, None).await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    async fn delete_server(&self, name: &str) -> Result<(), CloudError> {
        let existing =
            self.get_server_by_name(name).await?.ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        let path = format!("/servers/{}", existing.id);
        let response = self.request(reqwest::Method::DELETE, &path, None).await?;
        Self::error_for_status(response).await?;
        Ok(())
    }

    async fn get_ssh_key_by_name(&self, name: &str) -> Result<Option<SshKey>, CloudError> {
        let path = format!("/ssh_keys?name={}", urlencoding_light(name));
        let response = self.request(reqwest::Method::GET, &path, None).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct KeyWire {
            name: String,
            fingerprint: String,
        }
        #[derive(Deserialize)]
        struct Wrapper {
            ssh_keys: Vec<KeyWire>,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper
            .ssh_keys
            .into_iter()
            .next()
            .map(|k| SshKey { name: k.name, fingerprint: k.fingerprint }))
    }

    async fn hourly_price(
        &self,
        server_type: &str,
        location: &str,
    ) -> Result<Option<f64>, CloudError> {
        let path = format!("/server_types?name={}", urlencoding_light(server_type));
        let response = self.request(reqwest::Method::GET, &path, None).await?;
        let response = Self::error_for_status(response).await?;
        #[derive(Deserialize)]
        struct PriceWire {
            location: String,
            price_hourly: PriceAmountWire,
        }
        #[derive(Deserialize)]
        struct PriceAmountWire {
            gross: String,
        }
        #[derive(Deserialize)]
        struct ServerTypeDetailWire {
            prices: Vec<PriceWire>,
        }
        #[derive(Deserialize)]
        struct Wrapper {
            server_types: Vec<ServerTypeDetailWire>,
        }
        let wrapper: Wrapper =
            response.json().await.map_err(|e| CloudError::Decode(e.to_string()))?;
        Ok(wrapper
            .server_types
            .into_iter()
            .flat_map(|t| t.prices)
            .find(|p| p.location == location)
            .and_then(|p| p.price_hourly.gross.parse::<f64>().ok()))
    }
}

/// `reqwest`'s URL builder already percent-encodes query values added via
/// `.query(&[...])`; this helper exists because our query strings are built
/// by hand for cache-friendly, readable paths in retry logging.
fn urlencoding_light(value: &str) -> String {
    value.replace(' ', "%20")
}
