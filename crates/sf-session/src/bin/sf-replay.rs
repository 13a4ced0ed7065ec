//! Replay a scripted form session against a dry-run product API
//!
//! ```text
//! sf-replay --config engine.toml --script session.json --mode edit --record record.json
//! ```
//!
//! The script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"type": "text", "field": "name", "value": "Ocean Mist"},
//!   {"type": "number", "field": "price", "raw": "120000"},
//!   {"type": "select", "files": [{"name": "a.png", "content_type": "image/png", "size": 512}]},
//!   {"type": "remove_persisted", "image": "/uploads/r1.jpg"}
//! ]
//! ```
//!
//! The submission outcome, field errors and payload summary are printed to
//! stdout as JSON; logs go to stderr.

use anyhow::{ensure, Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sf_form::{FieldChange, FieldErrors};
use sf_preview::{PreviewAllocator, PreviewRegistry, RawFile};
use sf_session::payload::PartSummary;
use sf_session::{
    ApiError, AuthContext, EngineConfig, FormEvent, FormSession, Notification, PartBody, Payload,
    ProductApi, ProductId, ProductRecord, SessionState, SubmitOutcome,
};
use sf_staging::{ImageSummary, PersistedImageRef};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Deserialize)]
struct ScriptFile {
    name: String,
    content_type: String,
    #[serde(default)]
    size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ScriptStep {
    Text { field: String, value: String },
    Number { field: String, raw: String },
    Bool { field: String, value: bool },
    Select { files: Vec<ScriptFile> },
    RemoveStaged { index: usize },
    ClearStaged,
    RemovePersisted { image: String },
    RestorePersisted { image: String },
}

impl ScriptStep {
    fn into_event(self) -> FormEvent {
        match self {
            Self::Text { field, value } => FieldChange::text(field, value).into(),
            Self::Number { field, raw } => FieldChange::number(field, raw).into(),
            Self::Bool { field, value } => FieldChange::bool(field, value).into(),
            Self::Select { files } => FormEvent::Select(
                files
                    .into_iter()
                    .map(|f| RawFile::new(f.name, f.content_type, vec![0u8; f.size]))
                    .collect(),
            ),
            Self::RemoveStaged { index } => FormEvent::RemoveStaged(index),
            Self::ClearStaged => FormEvent::ClearStaged,
            Self::RemovePersisted { image } => {
                FormEvent::RemovePersisted(PersistedImageRef::new(image))
            }
            Self::RestorePersisted { image } => {
                FormEvent::RestorePersisted(PersistedImageRef::new(image))
            }
        }
    }
}

/// Product API that stores nothing and echoes the payload back
#[derive(Debug, Default)]
struct DryRunApi {
    record: Option<ProductRecord>,
    sent: Mutex<Option<Payload>>,
}

impl DryRunApi {
    fn echo(&self, id: ProductId, payload: &Payload) -> ProductRecord {
        *self.sent.lock() = Some(payload.clone());

        let mut fields = serde_json::Map::new();
        let mut images = Vec::new();
        for part in payload.parts() {
            match &part.body {
                PartBody::File { file_name, .. } => {
                    images.push(PersistedImageRef::new(format!("/uploads/{file_name}")));
                }
                PartBody::Text(value) => {
                    fields.insert(part.name.clone(), Value::String(value.clone()));
                }
            }
        }
        ProductRecord { id, fields, images }
    }
}

#[async_trait::async_trait]
impl ProductApi for DryRunApi {
    async fn fetch_product(
        &self,
        _auth: &AuthContext,
        id: &ProductId,
    ) -> Result<ProductRecord, ApiError> {
        self.record
            .clone()
            .filter(|r| &r.id == id)
            .ok_or(ApiError::NotFound)
    }

    async fn create_product(
        &self,
        _auth: &AuthContext,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError> {
        Ok(self.echo(ProductId::new("dry-run"), payload))
    }

    async fn update_product(
        &self,
        _auth: &AuthContext,
        id: &ProductId,
        payload: &Payload,
    ) -> Result<ProductRecord, ApiError> {
        Ok(self.echo(id.clone(), payload))
    }
}

#[derive(Debug, Serialize)]
struct Report {
    mode: String,
    outcome: &'static str,
    state: SessionState,
    dirty_fields: Vec<String>,
    images: ImageSummary,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Vec<PartSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<ProductRecord>,
}

fn cli() -> Command {
    Command::new("sf-replay")
        .version(sf_session::VERSION)
        .about("Replay a scripted product form session against a dry-run API")
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Engine config (TOML); defaults apply when omitted"),
        )
        .arg(
            Arg::new("script")
                .long("script")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON array of form events"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .default_value("create")
                .value_parser(["create", "edit"])
                .help("Form mode"),
        )
        .arg(
            Arg::new("record")
                .long("record")
                .value_parser(value_parser!(PathBuf))
                .help("Product record served to the edit form (JSON)"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .default_value("replay")
                .help("Admin bearer token passed to the API"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_json(path: &PathBuf) -> Result<Value> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let script_path = matches
        .get_one::<PathBuf>("script")
        .context("--script is required")?;
    let script: Vec<ScriptStep> = serde_json::from_value(read_json(script_path)?)
        .with_context(|| format!("invalid script {}", script_path.display()))?;

    let record = matches
        .get_one::<PathBuf>("record")
        .map(|path| -> Result<ProductRecord> { Ok(ProductRecord::from_json(&read_json(path)?)?) })
        .transpose()?;

    let token = matches
        .get_one::<String>("token")
        .cloned()
        .unwrap_or_default();
    let auth = AuthContext::admin(token);
    let mode = matches
        .get_one::<String>("mode")
        .map_or("create", String::as_str);

    let registry = PreviewRegistry::shared();
    let mut session = if mode == "edit" {
        let id = record
            .as_ref()
            .map(|r| r.id.clone())
            .context("--record is required in edit mode")?;
        FormSession::edit(config, auth, registry.clone(), id)?
    } else {
        FormSession::create(config, auth, registry.clone())?
    };
    let api = DryRunApi {
        record,
        sent: Mutex::new(None),
    };
    if mode == "edit" {
        session.load(&api).await?;
    }

    let steps = script.len();
    for (i, step) in script.into_iter().enumerate() {
        session
            .dispatch(step.into_event())
            .with_context(|| format!("script step {i}"))?;
    }
    tracing::info!(steps, dirty = session.is_dirty(), "script replayed");

    let dirty_fields = session
        .dirty_fields()
        .into_iter()
        .map(str::to_string)
        .collect();
    let images = session.image_summary();
    let outcome = session.submit(&api).await?;

    let (label, saved) = match outcome {
        SubmitOutcome::Saved(record) => ("saved", Some(record)),
        SubmitOutcome::NoChanges => ("no_changes", None),
        SubmitOutcome::Invalid(_) => ("invalid", None),
        SubmitOutcome::Failed(_) => ("failed", None),
    };
    let report = Report {
        mode: mode.to_string(),
        outcome: label,
        state: session.state(),
        dirty_fields,
        images,
        errors: session.errors().clone(),
        notification: session.take_notification(),
        payload: api.sent.lock().as_ref().map(Payload::summary),
        saved,
    };

    session.teardown()?;
    let stats = registry.stats();
    ensure!(stats.is_balanced(), "previews leaked: {stats:?}");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
