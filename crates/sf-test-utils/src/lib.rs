//! Testing utilities for the storefront forms workspace
//!
//! Shared fixtures, a recording preview allocator, a counting selection
//! control and an in-memory product API.

#![allow(missing_docs)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use sf_form::FieldChange;
use sf_preview::{
    HandleId, PreviewAllocator, PreviewHandle, PreviewRegistry, PreviewStats, PreviewUri, RawFile,
    ReleaseOutcome,
};
use sf_session::{
    ApiError, AuthContext, FieldNames, Payload, PartBody, ProductApi, ProductId, ProductRecord,
};
use sf_staging::SelectionControl;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ----------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------

pub fn png(name: &str) -> RawFile {
    RawFile::new(name, "image/png", vec![0x89u8, b'P', b'N', b'G'])
}

pub fn pdf(name: &str) -> RawFile {
    RawFile::new(name, "application/pdf", vec![b'%', b'P', b'D', b'F'])
}

pub fn product_record(id: &str, images: &[&str]) -> ProductRecord {
    ProductRecord::from_json(&json!({
        "data": {
            "id": id,
            "name": "A",
            "price": 10,
            "stock": 5,
            "category": "daily",
            "isFeatured": false,
            "description": "Fresh",
            "images": images,
        }
    }))
    .unwrap()
}

/// Changes that make a blank create form pass field validation
pub fn complete_create_changes() -> Vec<FieldChange> {
    vec![
        FieldChange::text("name", "Ocean Mist"),
        FieldChange::number("price", "120000"),
        FieldChange::number("stock", "3"),
        FieldChange::text("category", "sport"),
        FieldChange::bool("isFeatured", true),
        FieldChange::text("description", "Citrus and sea salt"),
    ]
}

pub fn admin() -> AuthContext {
    AuthContext::admin("test-token")
}

// ----------------------------------------------------------------------
// Recording allocator
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    Allocated(HandleId),
    Released(HandleId, ReleaseOutcome),
}

/// Preview registry that logs every call
#[derive(Debug, Default)]
pub struct RecordingAllocator {
    registry: PreviewRegistry,
    events: Mutex<Vec<PreviewEvent>>,
}

impl RecordingAllocator {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PreviewEvent> {
        self.events.lock().clone()
    }

    pub fn invalid_releases(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, PreviewEvent::Released(_, outcome) if !outcome.is_released()))
            .count()
    }

    /// Every allocation released exactly once, and nothing else released
    #[track_caller]
    pub fn assert_balanced(&self) {
        let stats = self.stats();
        assert!(stats.is_balanced(), "outstanding previews: {stats:?}");
        assert_eq!(self.invalid_releases(), 0, "invalid releases: {:?}", self.events());
    }
}

impl PreviewAllocator for RecordingAllocator {
    fn allocate(&self, file: &RawFile) -> PreviewHandle {
        let handle = self.registry.allocate(file);
        self.events.lock().push(PreviewEvent::Allocated(handle.id()));
        handle
    }

    fn release(&self, handle: &PreviewHandle) -> ReleaseOutcome {
        let outcome = self.registry.release(handle);
        self.events
            .lock()
            .push(PreviewEvent::Released(handle.id(), outcome));
        outcome
    }

    fn stats(&self) -> PreviewStats {
        self.registry.stats()
    }

    fn resolve(&self, uri: &PreviewUri) -> Option<Arc<[u8]>> {
        self.registry.resolve(uri)
    }
}

// ----------------------------------------------------------------------
// Selection control
// ----------------------------------------------------------------------

/// Selection control counting its resets; clones share the counter
#[derive(Debug, Clone, Default)]
pub struct CountingControl(Arc<AtomicUsize>);

impl CountingControl {
    pub fn resets(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Box<dyn SelectionControl> {
        Box::new(self.clone())
    }
}

impl SelectionControl for CountingControl {
    fn reset(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------
// In-memory product API
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Fetch(ProductId),
    Create(Payload),
    Update(ProductId, Payload),
}

#[derive(Debug, Default)]
struct Store {
    records: HashMap<ProductId, ProductRecord>,
    calls: Vec<ApiCall>,
    next_error: Option<ApiError>,
    next_id: usize,
}

/// Product backend kept in memory
///
/// Stores text parts as fields and uploaded files as `/uploads/<name>`.
#[derive(Debug, Default)]
pub struct InMemoryProductApi {
    names: FieldNames,
    store: Mutex<Store>,
}

impl InMemoryProductApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: ProductRecord) -> Self {
        self.store.lock().records.insert(record.id.clone(), record);
        self
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: ApiError) {
        self.store.lock().next_error = Some(error);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.store.lock().calls.clone()
    }

    pub fn record(&self, id: &ProductId) -> Option<ProductRecord> {
        self.store.lock().records.get(id).cloned()
    }

    fn begin(&self, call: ApiCall) -> Result<(), ApiError> {
        let mut store = self.store.lock();
        store.calls.push(call);
        store.next_error.take().map_or(Ok(()), Err)
    }

    fn apply(&self, id: ProductId, payload: &Payload, mut images: Vec<String>) -> ProductRecord {
        let mut fields = serde_json::Map::new();
        fields.insert("id".into(), Value::String(id.to_string()));
        let image_parts = [
            &self.names.create_images,
            &self.names.edit_new_images,
            &self.names.existing_images,
            &self.names.deleted_images,
        ];

        for part in payload.parts() {
            match &part.body {
                PartBody::Text(value) if !image_parts.contains(&&part.name) => {
                    fields.insert(part.name.clone(), Value::String(value.clone()));
                }
                PartBody::File { file_name, .. } => images.push(format!("/uploads/{file_name}")),
                PartBody::Text(_) => {}
            }
        }
        fields.insert("images".into(), json!(images));

        let record = ProductRecord::from_json(&Value::Object(fields))
            .unwrap_or_else(|e| panic!("stored record is malformed: {e}"));
        self.store.lock().records.insert(id, record.clone());
        record
    }
}

#[async_trait::async_trait]
impl ProductApi for InMemoryProductApi {
    async fn fetch_product(
        &self,
        _auth: &AuthContext,
        id: &ProductId,
    ) -> Result<ProductRecord, ApiError> {
        self.begin(ApiCall::Fetch(id.clone()))?;
        self.record(id).ok_or(ApiError::NotFound)
    }

    async fn create_product(
        &self,
        _auth: &AuthContext,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError> {
        self.begin(ApiCall::Create(payload.clone()))?;
        let id = {
            let mut store = self.store.lock();
            store.next_id += 1;
            ProductId::new(format!("new-{}", store.next_id))
        };
        Ok(self.apply(id, payload, Vec::new()))
    }

    async fn update_product(
        &self,
        _auth: &AuthContext,
        id: &ProductId,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError> {
        self.begin(ApiCall::Update(id.clone(), payload.clone()))?;
        if self.record(id).is_none() {
            return Err(ApiError::NotFound);
        }
        let kept = payload
            .named(&self.names.existing_images)
            .filter_map(|p| p.as_text().map(str::to_string))
            .collect();
        Ok(self.apply(id.clone(), payload, kept))
    }
}
