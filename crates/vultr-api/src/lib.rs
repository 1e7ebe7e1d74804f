// vultr-api: Async Rust client for the Vultr v2 load balancer API

pub mod client;
pub mod error;
pub mod load_balancer;
pub mod response;
pub mod transport;

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::Error;
pub use load_balancer::types::{
    AutoSsl, FirewallRule, ForwardingRule, GenericInfo, HealthCheck, IpType, LoadBalancer,
    LoadBalancerRequest, Ssl, StickySessions,
};
pub use load_balancer::{LoadBalancerHandler, LoadBalancerService};
pub use response::{ApiResponse, Links, ListOptions, Meta, Page, RawResponse};
pub use transport::{TlsMode, TransportConfig};
