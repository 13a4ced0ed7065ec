//! Product form session
//!
//! Owns everything one create or edit form needs between load and
//! teardown:
//! - the load-time [`FormSnapshot`] and current [`FormState`]
//! - the [`ImageReconciliation`] with its staged previews
//! - the lifecycle state and the in-flight guard
//!
//! Every user action goes through [`FormSession::dispatch`]. Submission is
//! split into [`FormSession::begin_submit`] and
//! [`FormSession::complete_submit`] so callers can drive the request
//! themselves; [`FormSession::submit`] composes both around a
//! [`ProductApi`].

use crate::api::{ApiError, ApiOperation, Notification, ProductApi, ProductId, ProductRecord};
use crate::auth::AuthContext;
use crate::config::EngineConfig;
use crate::error::{SessionError, StateMachineError};
use crate::payload::{self, Payload};
use crate::state_machine::{validate_transition, SessionState};
use sf_form::{
    FieldChange, FieldErrors, FieldValues, FilesChanged, FormSchema, FormSnapshot, FormState,
};
use sf_preview::{PreviewAllocator, RawFile};
use sf_staging::{
    ImageReconciliation, ImageSummary, NullControl, PersistedImageRef, SelectionControl,
    StagedFileCollection,
};
use std::sync::Arc;

/// Whether the form creates a new product or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    /// New product; starts from schema defaults
    Create,
    /// Existing product; starts from the fetched record
    Edit(ProductId),
}

impl FormMode {
    /// Create mode
    #[inline]
    #[must_use]
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create)
    }

    /// Edited product, if any
    #[inline]
    #[must_use]
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            Self::Create => None,
            Self::Edit(id) => Some(id),
        }
    }

    fn operation(&self) -> ApiOperation {
        match self {
            Self::Create => ApiOperation::Create,
            Self::Edit(_) => ApiOperation::Update,
        }
    }
}

/// A user action on the form
#[derive(Debug, Clone)]
pub enum FormEvent {
    /// A scalar field changed
    Edit(FieldChange),
    /// Files picked in the image control
    Select(Vec<RawFile>),
    /// Staged file at index removed
    RemoveStaged(usize),
    /// Every staged file removed
    ClearStaged,
    /// Persisted image marked for deletion
    RemovePersisted(PersistedImageRef),
    /// Deletion mark undone
    RestorePersisted(PersistedImageRef),
}

impl From<FieldChange> for FormEvent {
    fn from(change: FieldChange) -> Self {
        Self::Edit(change)
    }
}

/// A validated payload ready to send
#[derive(Debug, Clone)]
pub struct PreparedSubmission {
    mode: FormMode,
    payload: Payload,
}

impl PreparedSubmission {
    /// Create or edit
    #[inline]
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Multipart body
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// First half of a submission
#[derive(Debug)]
pub enum SubmitStep {
    /// Send this payload, then call [`FormSession::complete_submit`]
    Send(PreparedSubmission),
    /// Nothing to send
    Finished(SubmitOutcome),
}

/// A failed request
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitFailure {
    /// Which call failed
    pub operation: ApiOperation,
    /// Why
    pub error: ApiError,
}

impl SubmitFailure {
    /// Global notification for this failure
    #[must_use]
    pub fn notification(&self) -> Notification {
        self.error.notification(self.operation)
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Stored by the backend
    Saved(ProductRecord),
    /// Edit mode with nothing changed; no request sent
    NoChanges,
    /// Local validation failed; no request sent
    Invalid(FieldErrors),
    /// The backend rejected or never received the request
    Failed(SubmitFailure),
}

impl SubmitOutcome {
    /// Whether the product was stored
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// State of one product form from load to teardown
#[derive(Debug)]
pub struct FormSession {
    config: EngineConfig,
    auth: AuthContext,
    schema: FormSchema,
    mode: FormMode,
    state: SessionState,
    snapshot: FormSnapshot,
    form: FormState,
    images: ImageReconciliation,
    in_flight: bool,
    notification: Option<Notification>,
}

impl FormSession {
    /// Open a create form; ready immediately
    ///
    /// # Errors
    /// - `SessionError::Unauthorized` unless `auth` may manage products
    /// - `SessionError::Config` if `config` does not validate
    pub fn create(
        config: EngineConfig,
        auth: AuthContext,
        allocator: Arc<dyn PreviewAllocator>,
    ) -> Result<Self, SessionError> {
        Self::open(config, auth, allocator, FormMode::Create)
    }

    /// Open an edit form; `Loading` until [`Self::finish_load`] or
    /// [`Self::load`]
    ///
    /// # Errors
    /// As [`Self::create`]
    pub fn edit(
        config: EngineConfig,
        auth: AuthContext,
        allocator: Arc<dyn PreviewAllocator>,
        id: ProductId,
    ) -> Result<Self, SessionError> {
        Self::open(config, auth, allocator, FormMode::Edit(id))
    }

    fn open(
        config: EngineConfig,
        auth: AuthContext,
        allocator: Arc<dyn PreviewAllocator>,
        mode: FormMode,
    ) -> Result<Self, SessionError> {
        if !auth.can_manage_products() {
            tracing::warn!(role = ?auth.role(), "refused form session for non-admin");
            return Err(SessionError::Unauthorized);
        }
        config.validate()?;

        let schema = FormSchema::product();
        let snapshot = FormSnapshot::for_create(&schema);
        let staged =
            StagedFileCollection::new(allocator, Box::new(NullControl), config.staging_limits());
        let state = if mode.is_create() {
            SessionState::Ready
        } else {
            SessionState::Loading
        };
        tracing::debug!(?mode, ?state, "opened form session");

        Ok(Self {
            form: FormState::from_snapshot(&snapshot),
            images: ImageReconciliation::for_create(staged),
            config,
            auth,
            schema,
            mode,
            state,
            snapshot,
            in_flight: false,
            notification: None,
        })
    }

    /// With a custom schema (call before loading or editing)
    #[must_use]
    pub fn with_schema(mut self, schema: FormSchema) -> Self {
        self.snapshot = FormSnapshot::for_create(&schema);
        self.form = FormState::from_snapshot(&self.snapshot);
        self.schema = schema;
        self
    }

    /// With the picker's selection control
    #[must_use]
    pub fn with_control(mut self, control: Box<dyn SelectionControl>) -> Self {
        self.images.staged_mut().set_control(control);
        self
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Install the fetched record as the snapshot
    ///
    /// # Errors
    /// `SessionError::IllegalTransition` unless the session is `Loading`
    pub fn finish_load(&mut self, record: ProductRecord) -> Result<(), SessionError> {
        validate_transition(self.state, SessionState::Ready)?;
        if self.mode.product_id() != Some(&record.id) {
            tracing::warn!(
                expected = ?self.mode.product_id(),
                got = %record.id,
                "loaded record id differs from the edited product"
            );
        }

        self.snapshot =
            FormSnapshot::from_record(&self.schema, &record.fields, record.images.clone());
        self.form = FormState::from_snapshot(&self.snapshot);
        self.images.load_original(record.images);
        self.state = SessionState::Ready;
        tracing::debug!(id = %record.id, images = self.images.original().len(), "record loaded");
        Ok(())
    }

    /// Record a failed fetch
    ///
    /// Returns the notification to show; it is also kept for
    /// [`Self::take_notification`].
    ///
    /// # Errors
    /// `SessionError::IllegalTransition` unless the session is `Loading`
    pub fn fail_load(&mut self, error: &ApiError) -> Result<Notification, SessionError> {
        self.transition(SessionState::LoadFailed)?;
        let notification = error.notification(ApiOperation::Load);
        tracing::warn!(%error, "failed to load product");
        self.notification = Some(notification.clone());
        Ok(notification)
    }

    /// Fetch the edited record through `api`
    ///
    /// # Errors
    /// - `SessionError::IllegalTransition` unless the session is `Loading`
    /// - `SessionError::Api` if the fetch failed (the session is then
    ///   `LoadFailed`)
    pub async fn load(&mut self, api: &dyn ProductApi) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        validate_transition(self.state, SessionState::Ready)?;
        let Some(id) = self.mode.product_id().cloned() else {
            return Err(SessionError::NotLoaded);
        };

        self.in_flight = true;
        let result = api.fetch_product(&self.auth, &id).await;
        self.in_flight = false;

        match result {
            Ok(record) => self.finish_load(record),
            Err(error) => {
                self.fail_load(&error)?;
                Err(error.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Apply one user action
    ///
    /// File events are reduced to [`FilesChanged`] and fed to the same
    /// reducer as field edits. A rejected selection only sets the image
    /// field's error.
    ///
    /// # Errors
    /// - `SessionError::Busy` while loading or submitting
    /// - `SessionError::NotLoaded` after a failed load
    /// - `SessionError::IllegalTransition` once saved or closed
    /// - `SessionError::Form` if a field change does not fit the schema
    /// - `SessionError::Staging` for an out-of-range staged index
    pub fn dispatch(&mut self, event: impl Into<FormEvent>) -> Result<(), SessionError> {
        self.ensure_editable(SessionState::Editing)?;

        match event.into() {
            FormEvent::Edit(change) => self.form.apply(&self.schema, change)?,
            FormEvent::Select(files) => {
                let change = match self.images.staged_mut().select(files) {
                    Ok(receipt) => FilesChanged::Accepted {
                        count: receipt.total,
                    },
                    Err(error) => FilesChanged::Rejected {
                        error: error.to_string(),
                    },
                };
                self.form.apply(&self.schema, FieldChange::Files(change))?;
            }
            FormEvent::RemoveStaged(index) => {
                self.images.staged_mut().remove(index)?;
                let count = self.images.staged().len();
                self.form
                    .apply(&self.schema, FieldChange::Files(FilesChanged::Accepted { count }))?;
            }
            FormEvent::ClearStaged => {
                self.images.staged_mut().clear();
                self.form.apply(
                    &self.schema,
                    FieldChange::Files(FilesChanged::Accepted { count: 0 }),
                )?;
            }
            FormEvent::RemovePersisted(image) => {
                self.images.remove_persisted(&image);
            }
            FormEvent::RestorePersisted(image) => {
                if !self.images.restore_persisted(&image) {
                    tracing::debug!(%image, "restore of an image that was not removed");
                }
            }
        }

        self.state = SessionState::Editing;
        Ok(())
    }

    fn ensure_editable(&self, next: SessionState) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if self.state == SessionState::LoadFailed {
            return Err(SessionError::NotLoaded);
        }
        validate_transition(self.state, next)?;
        Ok(())
    }

    fn transition(&mut self, to: SessionState) -> Result<(), StateMachineError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = ?self.state, ?to, "session transition");
        self.state = to;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether anything differs from the snapshot
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        sf_form::is_dirty(&self.schema, self.form.values(), &self.snapshot, &self.images)
    }

    /// Scalar fields that differ from the snapshot
    #[must_use]
    pub fn dirty_fields(&self) -> Vec<&str> {
        sf_form::dirty_fields(&self.schema, self.form.values(), &self.snapshot)
    }

    /// Whether the submit button is enabled
    ///
    /// Not while busy; in edit mode only with unsaved changes.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.is_busy()
            && self.state.is_editable()
            && (self.mode.is_create() || self.is_dirty())
    }

    /// Whether a load or submission is in flight
    #[inline]
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight || self.state == SessionState::Loading
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Create or edit
    #[inline]
    #[must_use]
    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Field schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load-time snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    /// Current values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &FieldValues {
        self.form.values()
    }

    /// Current field errors
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        self.form.errors()
    }

    /// Persisted and staged images
    #[inline]
    #[must_use]
    pub fn images(&self) -> &ImageReconciliation {
        &self.images
    }

    /// Image summary box of the edit form
    #[must_use]
    pub fn image_summary(&self) -> ImageSummary {
        self.images.summary()
    }

    /// URL to display a persisted image
    #[must_use]
    pub fn display_url(&self, image: &PersistedImageRef) -> String {
        image.display_url(self.config.asset_base_url.as_deref())
    }

    /// Pending global notification
    #[inline]
    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Take the pending global notification
    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Validate and build the payload
    ///
    /// Edit mode without changes settles as `NoChanges`; failed validation
    /// settles as `Invalid` and returns to `Ready`. Otherwise the session is
    /// `Submitting` with the in-flight guard set until
    /// [`Self::complete_submit`].
    ///
    /// # Errors
    /// - `SessionError::Busy` while loading or submitting
    /// - `SessionError::NotLoaded` after a failed load
    /// - `SessionError::IllegalTransition` once saved or closed
    pub fn begin_submit(&mut self) -> Result<SubmitStep, SessionError> {
        self.ensure_editable(SessionState::Validating)?;

        if !self.mode.is_create() && !self.is_dirty() {
            tracing::info!("edit submitted without changes");
            self.notification = Some(Notification::no_changes());
            return Ok(SubmitStep::Finished(SubmitOutcome::NoChanges));
        }

        self.transition(SessionState::Validating)?;
        let errors = sf_form::validate(
            &self.schema,
            self.form.values(),
            self.images.net_image_count(),
            self.config.min_images,
        );
        if !errors.is_empty() {
            tracing::info!(fields = errors.len(), "submission blocked by validation");
            self.form.set_errors(errors.clone());
            self.transition(SessionState::Ready)?;
            return Ok(SubmitStep::Finished(SubmitOutcome::Invalid(errors)));
        }
        self.form.set_errors(FieldErrors::new());

        let payload = payload::build(
            &self.mode,
            &self.schema,
            self.form.values(),
            &self.images,
            &self.config.field_names,
        );
        self.transition(SessionState::Submitting)?;
        self.in_flight = true;

        Ok(SubmitStep::Send(PreparedSubmission {
            mode: self.mode.clone(),
            payload,
        }))
    }

    /// Settle an in-flight submission
    ///
    /// On success every staged preview is released and the session is
    /// `Done`. On failure backend field errors are merged into the form
    /// errors and the session returns to `Ready`.
    ///
    /// # Errors
    /// `SessionError::IllegalTransition` if nothing is in flight
    pub fn complete_submit(
        &mut self,
        result: Result<ProductRecord, ApiError>,
    ) -> Result<SubmitOutcome, SessionError> {
        if !self.in_flight {
            validate_transition(self.state, SessionState::Done)?;
        }
        self.in_flight = false;

        match result {
            Ok(record) => {
                self.transition(SessionState::Done)?;
                let released = self.images.staged_mut().clear();
                tracing::info!(id = %record.id, released, "product saved");
                self.notification = Some(Notification::saved(self.mode.is_create()));
                Ok(SubmitOutcome::Saved(record))
            }
            Err(error) => {
                tracing::warn!(%error, "submission failed");
                if let Some(backend) = error.field_errors() {
                    let mut errors = self.form.errors().clone();
                    errors.merge(backend);
                    self.form.set_errors(errors);
                }
                self.transition(SessionState::Ready)?;
                let failure = SubmitFailure {
                    operation: self.mode.operation(),
                    error,
                };
                self.notification = Some(failure.notification());
                Ok(SubmitOutcome::Failed(failure))
            }
        }
    }

    /// Validate, send through `api` and settle
    ///
    /// # Errors
    /// As [`Self::begin_submit`]; API failures are reported as
    /// `SubmitOutcome::Failed`, not as errors
    pub async fn submit(&mut self, api: &dyn ProductApi) -> Result<SubmitOutcome, SessionError> {
        let prepared = match self.begin_submit()? {
            SubmitStep::Finished(outcome) => return Ok(outcome),
            SubmitStep::Send(prepared) => prepared,
        };

        let result = match prepared.mode() {
            FormMode::Create => api.create_product(&self.auth, prepared.payload()).await,
            FormMode::Edit(id) => {
                api.update_product(&self.auth, id, prepared.payload())
                    .await
            }
        };
        self.complete_submit(result)
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Discard the form
    ///
    /// Returns whether unsaved changes were dropped.
    ///
    /// # Errors
    /// `SessionError::Busy` while a submission is in flight
    pub fn cancel(&mut self) -> Result<bool, SessionError> {
        let had_changes = self.state.is_editable() && self.is_dirty();
        self.teardown()?;
        Ok(had_changes)
    }

    /// Release every preview and close the session
    ///
    /// Idempotent. Returns the number of previews released.
    ///
    /// # Errors
    /// `SessionError::Busy` while a submission is in flight
    pub fn teardown(&mut self) -> Result<usize, SessionError> {
        if self.state == SessionState::Closed {
            return Ok(0);
        }
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.transition(SessionState::Closed)?;
        let released = self.images.staged_mut().clear();
        tracing::debug!(released, "form session closed");
        Ok(released)
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            let released = self.images.staged_mut().clear();
            tracing::debug!(released, state = ?self.state, "form session dropped without teardown");
        }
    }
}

#[cfg(all(test, not(feature = "strict-debug")))]
mod tests {
    use super::*;
    use crate::auth::Role;
    use serde_json::json;
    use sf_form::FieldValue;
    use sf_preview::PreviewRegistry;

    mockall::mock! {
        Api {}

        #[async_trait::async_trait]
        impl ProductApi for Api {
            async fn fetch_product(
                &self,
                auth: &AuthContext,
                id: &ProductId,
            ) -> Result<ProductRecord, ApiError>;

            async fn create_product(
                &self,
                auth: &AuthContext,
                payload: &Payload,
            ) -> Result<ProductRecord, ApiError>;

            async fn update_product(
                &self,
                auth: &AuthContext,
                id: &ProductId,
                payload: &Payload,
            ) -> Result<ProductRecord, ApiError>;
        }
    }

    fn record() -> ProductRecord {
        ProductRecord::from_json(&json!({
            "data": {
                "id": "p1",
                "name": "A",
                "price": 10,
                "stock": 5,
                "category": "daily",
                "isFeatured": false,
                "description": "Fresh",
                "images": ["r1", "r2"]
            }
        }))
        .unwrap()
    }

    fn png(name: &str) -> RawFile {
        RawFile::new(name, "image/png", vec![0u8; 4])
    }

    fn admin() -> AuthContext {
        AuthContext::admin("t0k")
    }

    fn loaded_edit(registry: &Arc<PreviewRegistry>) -> FormSession {
        let mut session = FormSession::edit(
            EngineConfig::default(),
            admin(),
            registry.clone(),
            ProductId::new("p1"),
        )
        .unwrap();
        session.finish_load(record()).unwrap();
        session
    }

    fn fill_create(session: &mut FormSession) {
        for change in [
            FieldChange::text("name", "Ocean Mist"),
            FieldChange::number("price", "120000"),
            FieldChange::number("stock", "3"),
            FieldChange::text("category", "sport"),
            FieldChange::text("description", "Citrus"),
        ] {
            session.dispatch(change).unwrap();
        }
    }

    #[test]
    fn non_admin_cannot_open() {
        let err = FormSession::create(
            EngineConfig::default(),
            AuthContext::new(Some("t".into()), Role::Client),
            PreviewRegistry::shared(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Unauthorized));
    }

    #[test]
    fn invalid_config_is_refused() {
        let err = FormSession::create(
            EngineConfig::default().with_max_files(0),
            admin(),
            PreviewRegistry::shared(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn load_installs_snapshot() {
        let mut api = MockApi::new();
        api.expect_fetch_product()
            .withf(|_, id| id.as_str() == "p1")
            .times(1)
            .returning(|_, _| Ok(record()));

        let mut session = FormSession::edit(
            EngineConfig::default(),
            admin(),
            PreviewRegistry::shared(),
            ProductId::new("p1"),
        )
        .unwrap();
        assert!(session.is_busy());
        assert!(matches!(
            session.dispatch(FieldChange::text("name", "B")),
            Err(SessionError::Busy)
        ));

        session.load(&api).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.values().get("price"), Some(&FieldValue::Number("10".into())));
        assert_eq!(session.images().net_image_count(), 2);
        assert!(!session.is_dirty());
        assert!(!session.can_submit());
    }

    #[tokio::test]
    async fn failed_load_blocks_editing() {
        let mut api = MockApi::new();
        api.expect_fetch_product()
            .returning(|_, _| Err(ApiError::NotFound));

        let mut session = FormSession::edit(
            EngineConfig::default(),
            admin(),
            PreviewRegistry::shared(),
            ProductId::new("missing"),
        )
        .unwrap();

        assert!(matches!(
            session.load(&api).await,
            Err(SessionError::Api(ApiError::NotFound))
        ));
        assert_eq!(session.state(), SessionState::LoadFailed);
        assert_eq!(
            session.take_notification().map(|n| n.text),
            Some("Product not found".to_string())
        );
        assert!(matches!(
            session.dispatch(FieldChange::text("name", "B")),
            Err(SessionError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn unchanged_edit_sends_nothing() {
        let api = MockApi::new();
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);

        let outcome = session.submit(&api).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::NoChanges);
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(
            session.notification().map(|n| n.title.as_str()),
            Some("No Changes")
        );
    }

    #[test]
    fn whitespace_and_numeric_equal_edits_stay_clean() {
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);

        session.dispatch(FieldChange::number("price", "10.0")).unwrap();
        session.dispatch(FieldChange::text("name", " A ")).unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert!(!session.is_dirty());

        session.dispatch(FieldChange::number("price", "11")).unwrap();
        assert_eq!(session.dirty_fields(), ["price"]);
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn create_without_images_is_invalid() {
        let api = MockApi::new();
        let mut session =
            FormSession::create(EngineConfig::default(), admin(), PreviewRegistry::shared())
                .unwrap();
        fill_create(&mut session);

        let outcome = session.submit(&api).await.unwrap();
        let SubmitOutcome::Invalid(errors) = outcome else {
            panic!("expected invalid, got {outcome:?}");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("images"),
            Some("At least 1 product image is required")
        );
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.errors(), &errors);
    }

    #[test]
    fn removing_every_image_is_invalid() {
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);
        session
            .dispatch(FormEvent::RemovePersisted("r1".into()))
            .unwrap();
        session
            .dispatch(FormEvent::RemovePersisted("r2".into()))
            .unwrap();

        let SubmitStep::Finished(SubmitOutcome::Invalid(errors)) = session.begin_submit().unwrap()
        else {
            panic!("expected invalid");
        };
        assert!(errors.contains("images"));

        session
            .dispatch(FormEvent::RestorePersisted("r2".into()))
            .unwrap();
        assert!(matches!(
            session.begin_submit().unwrap(),
            SubmitStep::Send(_)
        ));
    }

    #[test]
    fn busy_while_in_flight() {
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);
        session.dispatch(FormEvent::Select(vec![png("f1.png")])).unwrap();

        let SubmitStep::Send(prepared) = session.begin_submit().unwrap() else {
            panic!("expected a payload");
        };
        assert_eq!(prepared.payload().named("newImages").count(), 1);
        assert!(session.is_busy());
        assert!(!session.can_submit());
        assert!(matches!(session.begin_submit(), Err(SessionError::Busy)));
        assert!(matches!(
            session.dispatch(FormEvent::ClearStaged),
            Err(SessionError::Busy)
        ));
        assert!(matches!(session.teardown(), Err(SessionError::Busy)));

        let outcome = session.complete_submit(Ok(record())).unwrap();
        assert!(outcome.is_saved());
        assert_eq!(session.state(), SessionState::Done);
        assert!(registry.stats().is_balanced());
        assert_eq!(session.teardown().unwrap(), 0);
    }

    #[test]
    fn complete_without_begin_is_illegal() {
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);
        assert!(matches!(
            session.complete_submit(Ok(record())),
            Err(SessionError::IllegalTransition(_))
        ));
    }

    #[tokio::test]
    async fn backend_validation_errors_reach_fields() {
        let mut api = MockApi::new();
        api.expect_update_product()
            .times(1)
            .returning(|_, _, _| {
                Err(ApiError::from_response(
                    400,
                    &json!({"errors": [{"field": "name", "message": "Name already used"}]}),
                ))
            });

        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);
        session.dispatch(FieldChange::text("name", "B")).unwrap();

        let outcome = session.submit(&api).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.errors().get("name"), Some("Name already used"));
        assert_eq!(
            session.notification().map(|n| n.title.as_str()),
            Some("Validation Error")
        );

        session.dispatch(FieldChange::text("name", "C")).unwrap();
        assert!(session.errors().is_empty());
    }

    #[tokio::test]
    async fn create_submits_staged_files() {
        let mut api = MockApi::new();
        api.expect_create_product()
            .withf(|auth, payload| {
                auth.token() == Some("t0k")
                    && payload.named("images").count() == 2
                    && payload.text("name") == Some("Ocean Mist")
            })
            .times(1)
            .returning(|_, _| Ok(record()));

        let registry = PreviewRegistry::shared();
        let mut session =
            FormSession::create(EngineConfig::default(), admin(), registry.clone()).unwrap();
        fill_create(&mut session);
        session
            .dispatch(FormEvent::Select(vec![png("f1.png"), png("f2.png")]))
            .unwrap();

        let outcome = session.submit(&api).await.unwrap();
        assert!(outcome.is_saved());
        assert_eq!(
            session.take_notification().map(|n| n.title),
            Some("Product Created!".to_string())
        );
        assert!(registry.stats().is_balanced());
    }

    #[test]
    fn rejected_selection_sets_image_error_only() {
        let registry = PreviewRegistry::shared();
        let config = EngineConfig::default().with_max_files(2);
        let mut session = FormSession::create(config, admin(), registry.clone()).unwrap();

        session
            .dispatch(FormEvent::Select(vec![png("a.png"), png("b.png"), png("c.png")]))
            .unwrap();
        assert_eq!(session.images().staged().len(), 0);
        assert_eq!(
            session.errors().get("images"),
            Some("Maximum 2 files. You already have 0 files.")
        );

        session.dispatch(FormEvent::Select(vec![png("a.png")])).unwrap();
        assert!(!session.errors().contains("images"));
        assert!(matches!(
            session.dispatch(FormEvent::RemoveStaged(5)),
            Err(SessionError::Staging(_))
        ));
    }

    #[test]
    fn cancel_and_drop_release_previews() {
        let registry = PreviewRegistry::shared();
        let mut session = loaded_edit(&registry);
        session.dispatch(FormEvent::Select(vec![png("a.png")])).unwrap();
        assert_eq!(registry.stats().outstanding, 1);
        assert!(session.cancel().unwrap());
        assert!(registry.stats().is_balanced());
        assert_eq!(session.state(), SessionState::Closed);

        let mut other = loaded_edit(&registry);
        other.dispatch(FormEvent::Select(vec![png("b.png")])).unwrap();
        drop(other);
        assert!(registry.stats().is_balanced());
    }

    #[test]
    fn display_url_uses_asset_base() {
        let session = FormSession::create(
            EngineConfig::default().with_asset_base_url("https://cdn.example.com"),
            admin(),
            PreviewRegistry::shared(),
        )
        .unwrap();
        assert_eq!(
            session.display_url(&"/uploads/a.jpg".into()),
            "https://cdn.example.com/uploads/a.jpg"
        );
    }
}
