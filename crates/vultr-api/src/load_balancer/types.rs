//! Load balancer records for the Vultr v2 API.
//!
//! All types match the JSON bodies of `/v2/load-balancers` endpoints
//! (snake_case keys). Optional fields are skipped when unset so partial
//! updates never send `null`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::response::{Meta, Page};

/// Decode an explicit `null` list as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u32) -> bool {
    *n == 0
}

// ── Load balancer ────────────────────────────────────────────────────

/// A load balancer as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// ISO 8601 date-time.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date_created: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// e.g. `pending`, `active`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ipv4: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ipv6: String,
    /// IDs of the attached backend instances.
    #[serde(
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub instances: Vec<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub nodes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_info: Option<GenericInfo>,
    #[serde(rename = "has_ssl", skip_serializing_if = "Option::is_none")]
    pub ssl_info: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_ssl: Option<AutoSsl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http3: Option<bool>,
    #[serde(
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub forwarding_rules: Vec<ForwardingRule>,
    #[serde(
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub firewall_rules: Vec<FirewallRule>,
    #[serde(
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub global_regions: Vec<String>,
}

impl LoadBalancer {
    /// Whether a certificate is installed (uploaded or AutoSSL).
    pub fn has_ssl(&self) -> bool {
        self.ssl_info.unwrap_or(false)
    }

    pub fn http2_enabled(&self) -> bool {
        self.http2.unwrap_or(false)
    }

    pub fn http3_enabled(&self) -> bool {
        self.http3.unwrap_or(false)
    }

    pub fn forwarding_rule(&self, rule_id: &str) -> Option<&ForwardingRule> {
        self.forwarding_rules
            .iter()
            .find(|r| r.id.as_deref() == Some(rule_id))
    }

    pub fn firewall_rule(&self, rule_id: &str) -> Option<&FirewallRule> {
        self.firewall_rules
            .iter()
            .find(|r| r.id.as_deref() == Some(rule_id))
    }

    pub fn balancing_algorithm(&self) -> Option<&str> {
        self.generic_info
            .as_ref()
            .and_then(|g| g.balancing_algorithm.as_deref())
    }
}

/// Body for `POST /v2/load-balancers` and `PATCH /v2/load-balancers/{id}`.
///
/// Every field is optional. On update, fields left unset are not sent and
/// stay unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub instances: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
    #[serde(rename = "sticky_session", skip_serializing_if = "Option::is_none")]
    pub sticky_sessions: Option<StickySessions>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub forwarding_rules: Vec<ForwardingRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Ssl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_ssl: Option<AutoSsl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_redirect: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http3: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<bool>,
    /// `roundrobin` or `leastconn`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balancing_algorithm: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub firewall_rules: Vec<FirewallRule>,
    /// Connection timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// VPC ID to attach the load balancer to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub global_regions: Vec<String>,
}

// ── Nested configuration ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// `http`, `https` or `tcp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Only meaningful for HTTP(S) checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhealthy_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_threshold: Option<u32>,
}

/// Generic configuration as reported on a [`LoadBalancer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balancing_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_redirect: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticky_sessions: Option<StickySessions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,
}

/// Cookie-based session affinity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickySessions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
}

// ── Rules ────────────────────────────────────────────────────────────

/// Maps a frontend (protocol, port) pair to a backend (protocol, port) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingRule {
    /// Assigned by the server; ignored when creating a rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub frontend_protocol: String,
    pub frontend_port: u16,
    pub backend_protocol: String,
    pub backend_port: u16,
}

impl ForwardingRule {
    pub fn new(
        frontend_protocol: impl Into<String>,
        frontend_port: u16,
        backend_protocol: impl Into<String>,
        backend_port: u16,
    ) -> Self {
        Self {
            id: None,
            frontend_protocol: frontend_protocol.into(),
            frontend_port,
            backend_protocol: backend_protocol.into(),
            backend_port,
        }
    }
}

/// Write-side view of a [`ForwardingRule`] without its `id`.
#[derive(Debug, Serialize)]
pub(crate) struct ForwardingRuleBody<'a> {
    frontend_protocol: &'a str,
    frontend_port: u16,
    backend_protocol: &'a str,
    backend_port: u16,
}

impl<'a> From<&'a ForwardingRule> for ForwardingRuleBody<'a> {
    fn from(rule: &'a ForwardingRule) -> Self {
        Self {
            frontend_protocol: &rule.frontend_protocol,
            frontend_port: rule.frontend_port,
            backend_protocol: &rule.backend_protocol,
            backend_port: rule.backend_port,
        }
    }
}

/// IP family a firewall rule applies to.
///
/// Values other than `v4` and `v6` are kept verbatim in [`IpType::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IpType {
    #[default]
    V4,
    V6,
    Other(String),
}

impl IpType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::V4 => "v4",
            Self::V6 => "v6",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for IpType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "v4" => Self::V4,
            "v6" => Self::V6,
            _ => Self::Other(raw),
        }
    }
}

impl From<IpType> for String {
    fn from(ip_type: IpType) -> Self {
        match ip_type {
            IpType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for IpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound access rule attached to a load balancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub port: u16,
    pub ip_type: IpType,
    /// CIDR (`192.0.2.0/24`) or a named source such as `cloudflare`.
    pub source: String,
}

impl FirewallRule {
    pub fn new(port: u16, ip_type: IpType, source: impl Into<String>) -> Self {
        Self {
            id: None,
            port,
            ip_type,
            source: source.into(),
        }
    }
}

// ── SSL ──────────────────────────────────────────────────────────────

/// Uploaded certificate material, either PEM text or base64.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ssl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_b64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_b64: Option<String>,
}

// Key material never goes to logs.
impl fmt::Debug for Ssl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Ssl")
            .field("private_key", &redact(&self.private_key))
            .field("certificate", &self.certificate)
            .field("chain", &self.chain)
            .field("private_key_b64", &redact(&self.private_key_b64))
            .field("certificate_b64", &self.certificate_b64)
            .field("chain_b64", &self.chain_b64)
            .finish()
    }
}

/// Automatic certificate issuance for a domain managed in Vultr DNS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSsl {
    pub domain_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

// ── Envelopes ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoadBalancerEnvelope {
    pub load_balancer: LoadBalancer,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoadBalancersEnvelope {
    #[serde(deserialize_with = "null_as_empty")]
    pub load_balancers: Vec<LoadBalancer>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForwardingRuleEnvelope {
    pub forwarding_rule: ForwardingRule,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForwardingRulesEnvelope {
    #[serde(deserialize_with = "null_as_empty")]
    pub forwarding_rules: Vec<ForwardingRule>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FirewallRuleEnvelope {
    pub firewall_rule: FirewallRule,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FirewallRulesEnvelope {
    #[serde(deserialize_with = "null_as_empty")]
    pub firewall_rules: Vec<FirewallRule>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

impl From<LoadBalancersEnvelope> for Page<LoadBalancer> {
    fn from(env: LoadBalancersEnvelope) -> Self {
        Self {
            items: env.load_balancers,
            meta: env.meta,
        }
    }
}

impl From<ForwardingRulesEnvelope> for Page<ForwardingRule> {
    fn from(env: ForwardingRulesEnvelope) -> Self {
        Self {
            items: env.forwarding_rules,
            meta: env.meta,
        }
    }
}

impl From<FirewallRulesEnvelope> for Page<FirewallRule> {
    fn from(env: FirewallRulesEnvelope) -> Self {
        Self {
            items: env.firewall_rules,
            meta: env.meta,
        }
    }
}
