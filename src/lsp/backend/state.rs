use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp_server::lsp_types::Uri;

use crate::language::errors::SyntaxError;
use crate::language::parser::{parse, ParseResult};
use crate::lsp::completion::CompletionError;
use crate::model::LinkedFile;

/// Immutable per-request bundle. The parse tree and `text` always refer to
/// the same revision; the linked model may lag behind it when the latest
/// edit did not parse cleanly.
pub struct Snapshot {
    pub text: Arc<str>,
    pub parse: Arc<ParseResult>,
    pub linked: Option<Arc<LinkedFile>>,
    pub latest_well_formed: bool,
}

impl Snapshot {
    /// The stale-state arbiter. Node-identity resolution must run against
    /// the tree the linked model was built from; when the live tree is
    /// malformed, search the linked model's own tree instead. Mixing the
    /// two produces dangling descriptor lookups.
    pub fn search_target(&self) -> &Arc<ParseResult> {
        if self.latest_well_formed {
            return &self.parse;
        }
        match &self.linked {
            Some(linked) => linked.parse(),
            None => &self.parse,
        }
    }
}

struct DocumentState {
    text: Arc<str>,
    parse: Arc<ParseResult>,
    linked: Option<Arc<LinkedFile>>,
    well_formed: bool,
}

/// Per-document workspace cache. Each edit reparses; a clean parse also
/// relinks, a broken one keeps the previous linked model so completion can
/// fall back to it.
#[derive(Default)]
pub(super) struct Workspace {
    inner: RwLock<HashMap<Uri, DocumentState>>,
}

impl Workspace {
    pub(super) async fn update(&self, uri: Uri, text: String) {
        let parse = Arc::new(parse(&text));
        let well_formed = parse.is_well_formed();
        let mut map = self.inner.write().await;
        let previous = map.remove(&uri).and_then(|state| state.linked);
        let linked = if well_formed {
            Some(Arc::new(LinkedFile::link(parse.clone())))
        } else {
            previous
        };
        map.insert(
            uri,
            DocumentState {
                text: Arc::from(text),
                parse,
                linked,
                well_formed,
            },
        );
    }

    pub(super) async fn remove(&self, uri: &Uri) {
        self.inner.write().await.remove(uri);
    }

    pub(super) async fn snapshot(&self, uri: &Uri) -> Result<Snapshot, CompletionError> {
        let map = self.inner.read().await;
        let state = map.get(uri).ok_or_else(|| CompletionError::DocumentNotFound {
            uri: uri.to_string(),
        })?;
        Ok(Snapshot {
            text: state.text.clone(),
            parse: state.parse.clone(),
            linked: state.linked.clone(),
            latest_well_formed: state.well_formed,
        })
    }

    pub(super) async fn parse_errors(&self, uri: &Uri) -> Vec<SyntaxError> {
        let map = self.inner.read().await;
        map.get(uri)
            .map(|state| state.parse.errors.clone())
            .unwrap_or_default()
    }

    pub(super) async fn text(&self, uri: &Uri) -> Option<Arc<str>> {
        let map = self.inner.read().await;
        map.get(uri).map(|state| state.text.clone())
    }
}
