//! Workspace: the set of open documents.
//!
//! Each open document is an [`EditorSession`] keyed by a [`DocumentId`]. Sessions share one
//! tokenizer registry (and therefore one theme) and one clipboard. Exactly one session may be
//! active; intents from the host go to it through [`Workspace::handle_active`].

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::config::EditorConfig;
use crate::error::SessionError;
use crate::host::{Clipboard, LoadedFile, MemoryClipboard};
use crate::session::{EditorIntent, EditorSession, LoadOptions};
use crate::tokenizer::TokenizerRegistry;

/// Opaque identifier for an open document in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

struct DocumentEntry {
    uri: Option<String>,
    session: EditorSession,
}

/// Open documents plus the active one.
pub struct Workspace {
    config: EditorConfig,
    registry: Arc<TokenizerRegistry>,
    clipboard: Arc<dyn Clipboard>,
    documents: BTreeMap<DocumentId, DocumentEntry>,
    uri_to_document: HashMap<String, DocumentId>,
    active: Option<DocumentId>,
    next_id: u64,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new(
        config: EditorConfig,
        registry: Arc<TokenizerRegistry>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            config,
            registry,
            clipboard,
            documents: BTreeMap::new(),
            uri_to_document: HashMap::new(),
            active: None,
            next_id: 1,
        }
    }

    /// Returns the number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no document is open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Shared tokenizer registry.
    pub fn registry(&self) -> &Arc<TokenizerRegistry> {
        &self.registry
    }

    /// Ids of all open documents, ascending.
    pub fn document_ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.keys().copied()
    }

    /// Open a document. The first document opened becomes active.
    ///
    /// `uri` is host-provided; opening the same uri twice is rejected.
    pub fn open(
        &mut self,
        uri: Option<String>,
        loaded: Result<LoadedFile, String>,
        options: LoadOptions,
    ) -> Result<DocumentId, SessionError> {
        if let Some(uri) = uri.as_ref()
            && self.uri_to_document.contains_key(uri)
        {
            return Err(SessionError::UriAlreadyOpen(uri.clone()));
        }

        let id = DocumentId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let mut session = EditorSession::new(
            self.config.clone(),
            self.registry.clone(),
            self.clipboard.clone(),
        );
        session.load(loaded, options);

        if let Some(uri) = uri.as_ref() {
            self.uri_to_document.insert(uri.clone(), id);
        }
        self.documents.insert(id, DocumentEntry { uri, session });
        if self.active.is_none() {
            self.active = Some(id);
        }
        debug!(document = id.0, "document opened");
        Ok(id)
    }

    /// Close a document. Its highlight worker is cancelled and joined.
    pub fn close(&mut self, id: DocumentId) -> Result<(), SessionError> {
        let entry = self
            .documents
            .remove(&id)
            .ok_or(SessionError::UnknownDocument(id))?;
        if let Some(uri) = entry.uri.as_ref() {
            self.uri_to_document.remove(uri);
        }
        if self.active == Some(id) {
            self.active = self.documents.keys().next().copied();
        }
        debug!(document = id.0, "document closed");
        Ok(())
    }

    /// Document opened with `uri`.
    pub fn document_for_uri(&self, uri: &str) -> Option<DocumentId> {
        self.uri_to_document.get(uri).copied()
    }

    /// Uri of a document, if it has one.
    pub fn uri(&self, id: DocumentId) -> Option<&str> {
        self.documents.get(&id)?.uri.as_deref()
    }

    /// Session of a document.
    pub fn session(&self, id: DocumentId) -> Result<&EditorSession, SessionError> {
        self.documents
            .get(&id)
            .map(|entry| &entry.session)
            .ok_or(SessionError::UnknownDocument(id))
    }

    /// Mutable session of a document.
    pub fn session_mut(&mut self, id: DocumentId) -> Result<&mut EditorSession, SessionError> {
        self.documents
            .get_mut(&id)
            .map(|entry| &mut entry.session)
            .ok_or(SessionError::UnknownDocument(id))
    }

    /// Active document id.
    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    /// Make `id` the active document.
    pub fn set_active(&mut self, id: DocumentId) -> Result<(), SessionError> {
        if !self.documents.contains_key(&id) {
            return Err(SessionError::UnknownDocument(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Active session.
    pub fn active_session_mut(&mut self) -> Result<&mut EditorSession, SessionError> {
        let id = self.active.ok_or(SessionError::NoActiveDocument)?;
        self.session_mut(id)
    }

    /// Route an intent to the active session.
    pub fn handle_active(
        &mut self,
        intent: EditorIntent,
    ) -> Result<Option<Range<usize>>, SessionError> {
        Ok(self.active_session_mut()?.handle(intent))
    }

    /// Refresh tokenizer color caches and re-highlight every open document.
    pub fn theme_changed(&mut self) {
        self.registry.invalidate_cached_colors();
        for entry in self.documents.values_mut() {
            entry.session.highlight_all();
        }
    }

    /// Frame tick for every open document.
    pub fn tick(&mut self) {
        for entry in self.documents.values_mut() {
            entry.session.tick();
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(
            EditorConfig::default(),
            Arc::new(TokenizerRegistry::default()),
            Arc::new(MemoryClipboard::new()),
        )
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("document_count", &self.documents.len())
            .field("uri_count", &self.uri_to_document.len())
            .field("active", &self.active)
            .finish()
    }
}
