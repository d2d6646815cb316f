mod scenarios;
mod sites;

use std::sync::Arc;

use httpmock::MockServer;
use pdsls_redirect::{
    Endpoints, MemorySettingsStore, RedirectHttpClient, Settings, SettingsStore, Translator,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Logs of the pipeline, shown for failing tests. Filter with `TRACING`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRACING").unwrap_or_else(|_| EnvFilter::new("info"));
    // Several tests race to install it; the first one wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// One mock server standing in for the AppView, the PLC directory and every
/// PDS, plus a translator wired to it.
struct Upstream {
    server: MockServer,
    store: Arc<MemorySettingsStore>,
    translator: Translator,
}

impl Upstream {
    fn start(settings: Settings) -> Self {
        init_tracing();
        let server = MockServer::start();
        let endpoints =
            Endpoints::new(&server.base_url(), &server.base_url(), "https://pdsls.dev").unwrap();
        let client = RedirectHttpClient::builder()
            .endpoints(endpoints)
            .build()
            .unwrap();
        let store = Arc::new(MemorySettingsStore::new(settings));
        let translator =
            Translator::with_client(&client, Arc::clone(&store) as Arc<dyn SettingsStore>);
        Self {
            server,
            store,
            translator,
        }
    }

    fn base(&self) -> String {
        self.server.base_url()
    }

    fn handle(&self, handle: &str, did: &str) -> httpmock::Mock<'_> {
        let did = did.to_string();
        self.server.mock(|when, then| {
            when.path("/xrpc/com.atproto.identity.resolveHandle")
                .query_param("handle", handle);
            then.status(200).json_body(json!({ "did": did }));
        })
    }

    /// `did:plc` document whose PDS is the mock server itself.
    fn did_document(&self, did: &str) -> httpmock::Mock<'_> {
        let pds = self.base();
        self.server.mock(|when, then| {
            when.path(format!("/{did}"));
            then.status(200).json_body(json!({
                "id": did,
                "service": [{
                    "id": "#atproto_pds",
                    "type": "AtprotoPersonalDataServer",
                    "serviceEndpoint": pds
                }]
            }));
        })
    }

    async fn open(&self, url: &str) -> Option<String> {
        self.translator
            .translate(Some(url))
            .await
            .url()
            .map(str::to_string)
    }
}
