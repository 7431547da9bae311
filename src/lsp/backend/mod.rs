mod server;
mod state;

pub use state::Snapshot;

use state::Workspace;
use tower_lsp_server::lsp_types::Uri;
use tower_lsp_server::Client;

use crate::lsp::diagnostics::syntax_diagnostics;

pub struct Backend {
    client: Client,
    workspace: Workspace,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            workspace: Workspace::default(),
        }
    }

    async fn publish_diagnostics(&self, uri: &Uri) {
        let Some(text) = self.workspace.text(uri).await else {
            self.client
                .publish_diagnostics(uri.clone(), Vec::new(), None)
                .await;
            return;
        };
        let errors = self.workspace.parse_errors(uri).await;
        self.client
            .publish_diagnostics(uri.clone(), syntax_diagnostics(&text, &errors), None)
            .await;
    }
}
