// Load balancer endpoints of the Vultr v2 API.
//
// Base path: /v2/load-balancers
// Sub-resources: forwarding-rules, firewall-rules (read-only), ssl, auto_ssl

pub mod types;

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::response::{ApiResponse, ListOptions, Page};

use self::types::{
    FirewallRule, FirewallRuleEnvelope, FirewallRulesEnvelope, ForwardingRule,
    ForwardingRuleBody, ForwardingRuleEnvelope, ForwardingRulesEnvelope, LoadBalancer,
    LoadBalancerEnvelope, LoadBalancerRequest, LoadBalancersEnvelope,
};

const LB_PATH: &str = "/v2/load-balancers";

/// Every load balancer operation exposed by the API.
///
/// Implemented by [`LoadBalancerHandler`]; kept as a trait so callers can
/// substitute a fake in their own tests. Each call is a single request with
/// no retry. Dropping the returned future aborts the request in flight.
#[async_trait]
pub trait LoadBalancerService: Send + Sync {
    /// `POST /v2/load-balancers`
    async fn create(&self, request: &LoadBalancerRequest)
    -> Result<ApiResponse<LoadBalancer>, Error>;

    /// `GET /v2/load-balancers/{id}`
    async fn get(&self, lb_id: &str) -> Result<ApiResponse<LoadBalancer>, Error>;

    /// `PATCH /v2/load-balancers/{id}`. Unset request fields are left as is.
    async fn update(&self, lb_id: &str, request: &LoadBalancerRequest) -> Result<(), Error>;

    /// `DELETE /v2/load-balancers/{id}`
    async fn delete(&self, lb_id: &str) -> Result<(), Error>;

    /// `DELETE /v2/load-balancers/{id}/ssl`
    async fn delete_ssl(&self, lb_id: &str) -> Result<(), Error>;

    /// `DELETE /v2/load-balancers/{id}/auto_ssl`
    async fn delete_auto_ssl(&self, lb_id: &str) -> Result<(), Error>;

    /// `GET /v2/load-balancers`
    async fn list(
        &self,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<LoadBalancer>>, Error>;

    /// `POST /v2/load-balancers/{id}/forwarding-rules`. The rule's `id` is
    /// not sent; the returned rule carries the server-assigned one.
    async fn create_forwarding_rule(
        &self,
        lb_id: &str,
        rule: &ForwardingRule,
    ) -> Result<ApiResponse<ForwardingRule>, Error>;

    /// `GET /v2/load-balancers/{id}/forwarding-rules/{rule_id}`
    async fn get_forwarding_rule(
        &self,
        lb_id: &str,
        rule_id: &str,
    ) -> Result<ApiResponse<ForwardingRule>, Error>;

    /// `DELETE /v2/load-balancers/{id}/forwarding-rules/{rule_id}`
    async fn delete_forwarding_rule(&self, lb_id: &str, rule_id: &str) -> Result<(), Error>;

    /// `GET /v2/load-balancers/{id}/forwarding-rules`
    async fn list_forwarding_rules(
        &self,
        lb_id: &str,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<ForwardingRule>>, Error>;

    /// `GET /v2/load-balancers/{id}/firewall-rules`
    async fn list_firewall_rules(
        &self,
        lb_id: &str,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<FirewallRule>>, Error>;

    /// `GET /v2/load-balancers/{id}/firewall-rules/{rule_id}`
    async fn get_firewall_rule(
        &self,
        lb_id: &str,
        rule_id: &str,
    ) -> Result<ApiResponse<FirewallRule>, Error>;
}

// ── Paths ────────────────────────────────────────────────────────────

/// An ID must be a single, literal path segment. Anything the URL parser
/// would resolve (`..`) or split (`/`, `?`, `#`) could address another
/// endpoint, so it is rejected before a request is built.
fn require(value: &str, what: &'static str) -> Result<(), Error> {
    let invalid = value.trim().is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#', '%']);
    if invalid {
        Err(Error::InvalidArgument(what))
    } else {
        Ok(())
    }
}

/// `/v2/load-balancers/{id}`
fn lb_path(lb_id: &str) -> Result<String, Error> {
    require(lb_id, "load balancer ID")?;
    Ok(format!("{LB_PATH}/{lb_id}"))
}

/// `/v2/load-balancers/{id}/{sub}`
fn sub_path(lb_id: &str, sub: &str) -> Result<String, Error> {
    Ok(format!("{}/{sub}", lb_path(lb_id)?))
}

/// `/v2/load-balancers/{id}/{sub}/{rule_id}`
fn rule_path(lb_id: &str, sub: &str, rule_id: &str, what: &'static str) -> Result<String, Error> {
    let base = sub_path(lb_id, sub)?;
    require(rule_id, what)?;
    Ok(format!("{base}/{rule_id}"))
}

// ── Handler ──────────────────────────────────────────────────────────

/// [`LoadBalancerService`] backed by the shared [`Client`].
///
/// Obtained from [`Client::load_balancers`].
#[derive(Debug, Clone)]
pub struct LoadBalancerHandler {
    client: Client,
}

impl LoadBalancerHandler {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    async fn delete_path(&self, path: &str) -> Result<(), Error> {
        let req = self.client.new_request(Method::DELETE, path)?;
        self.client.execute_empty(req).await?;
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerService for LoadBalancerHandler {
    async fn create(
        &self,
        request: &LoadBalancerRequest,
    ) -> Result<ApiResponse<LoadBalancer>, Error> {
        debug!(label = ?request.label, region = ?request.region, "creating load balancer");
        let req = self.client.new_json_request(Method::POST, LB_PATH, request)?;
        let resp = self.client.execute::<LoadBalancerEnvelope>(req).await?;
        Ok(resp.map(|env| env.load_balancer))
    }

    async fn get(&self, lb_id: &str) -> Result<ApiResponse<LoadBalancer>, Error> {
        let req = self.client.new_request(Method::GET, &lb_path(lb_id)?)?;
        let resp = self.client.execute::<LoadBalancerEnvelope>(req).await?;
        Ok(resp.map(|env| env.load_balancer))
    }

    async fn update(&self, lb_id: &str, request: &LoadBalancerRequest) -> Result<(), Error> {
        let req = self
            .client
            .new_json_request(Method::PATCH, &lb_path(lb_id)?, request)?;
        self.client.execute_empty(req).await?;
        Ok(())
    }

    async fn delete(&self, lb_id: &str) -> Result<(), Error> {
        self.delete_path(&lb_path(lb_id)?).await
    }

    async fn delete_ssl(&self, lb_id: &str) -> Result<(), Error> {
        self.delete_path(&sub_path(lb_id, "ssl")?).await
    }

    async fn delete_auto_ssl(&self, lb_id: &str) -> Result<(), Error> {
        self.delete_path(&sub_path(lb_id, "auto_ssl")?).await
    }

    async fn list(
        &self,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<LoadBalancer>>, Error> {
        let req = self.client.new_list_request(LB_PATH, options)?;
        let resp = self.client.execute::<LoadBalancersEnvelope>(req).await?;
        Ok(resp.map(Page::from))
    }

    async fn create_forwarding_rule(
        &self,
        lb_id: &str,
        rule: &ForwardingRule,
    ) -> Result<ApiResponse<ForwardingRule>, Error> {
        let path = sub_path(lb_id, "forwarding-rules")?;
        let req = self
            .client
            .new_json_request(Method::POST, &path, &ForwardingRuleBody::from(rule))?;
        let resp = self.client.execute::<ForwardingRuleEnvelope>(req).await?;
        Ok(resp.map(|env| env.forwarding_rule))
    }

    async fn get_forwarding_rule(
        &self,
        lb_id: &str,
        rule_id: &str,
    ) -> Result<ApiResponse<ForwardingRule>, Error> {
        let path = rule_path(lb_id, "forwarding-rules", rule_id, "forwarding rule ID")?;
        let req = self.client.new_request(Method::GET, &path)?;
        let resp = self.client.execute::<ForwardingRuleEnvelope>(req).await?;
        Ok(resp.map(|env| env.forwarding_rule))
    }

    async fn delete_forwarding_rule(&self, lb_id: &str, rule_id: &str) -> Result<(), Error> {
        let path = rule_path(lb_id, "forwarding-rules", rule_id, "forwarding rule ID")?;
        self.delete_path(&path).await
    }

    async fn list_forwarding_rules(
        &self,
        lb_id: &str,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<ForwardingRule>>, Error> {
        let path = sub_path(lb_id, "forwarding-rules")?;
        let req = self.client.new_list_request(&path, options)?;
        let resp = self.client.execute::<ForwardingRulesEnvelope>(req).await?;
        Ok(resp.map(Page::from))
    }

    async fn list_firewall_rules(
        &self,
        lb_id: &str,
        options: Option<&ListOptions>,
    ) -> Result<ApiResponse<Page<FirewallRule>>, Error> {
        let path = sub_path(lb_id, "firewall-rules")?;
        let req = self.client.new_list_request(&path, options)?;
        let resp = self.client.execute::<FirewallRulesEnvelope>(req).await?;
        Ok(resp.map(Page::from))
    }

    async fn get_firewall_rule(
        &self,
        lb_id: &str,
        rule_id: &str,
    ) -> Result<ApiResponse<FirewallRule>, Error> {
        let path = rule_path(lb_id, "firewall-rules", rule_id, "firewall rule ID")?;
        let req = self.client.new_request(Method::GET, &path)?;
        let resp = self.client.execute::<FirewallRuleEnvelope>(req).await?;
        Ok(resp.map(|env| env.firewall_rule))
    }
}
