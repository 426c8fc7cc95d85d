#![allow(dead_code)]

use rally_rest::{ClientConfig, CollectionPolicy, RallyClient};
use rally_transport::mock::MockTransport;

pub const BASE: &str = "https://rally.test/slm/webservice/1.36";

/// URL of a resource under the test service.
pub fn url(path: &str) -> String {
    format!("{BASE}/{path}")
}

pub fn config(policy: CollectionPolicy) -> ClientConfig {
    ClientConfig {
        base_url: "https://rally.test/slm".to_string(),
        collection_policy: policy,
        ..ClientConfig::new("user@example.com", "secret")
    }
}

/// A client over a fresh mock transport. The returned mock shares state
/// with the one inside the client.
pub fn client(policy: CollectionPolicy) -> (RallyClient, MockTransport) {
    init_tracing();
    let mock = MockTransport::new();
    let client = RallyClient::with_transport(config(policy), mock.clone());
    (client, mock)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
