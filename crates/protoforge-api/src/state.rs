//! Application state wiring the wizard and its collaborators together.
//!
//! The wizard is generic over repository and spawner traits; `AppState` pins
//! it to the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use protoforge_core::olc::session::SessionRegistry;
use protoforge_core::olc::wizard::OlcWizard;
use protoforge_core::service::lock::LockChecker;
use protoforge_core::service::protfunc::ProtfuncParser;
use protoforge_core::service::typeclass::TypeclassRegistry;
use protoforge_infra::config::{load_olc_config, resolve_data_dir};
use protoforge_infra::lock::LockStringEvaluator;
use protoforge_infra::olc::sqlite_draft_store::SqliteOlcDraftStore;
use protoforge_infra::protfunc::InlineProtfuncParser;
use protoforge_infra::spawner::SqliteSpawner;
use protoforge_infra::sqlite::object::SqliteObjectRepository;
use protoforge_infra::sqlite::pool::{DatabasePool, database_url};
use protoforge_infra::sqlite::prototype::SqlitePrototypeRepository;
use protoforge_infra::typeclass::ConfigTypeclassRegistry;

pub type ConcreteWizard = OlcWizard<SqlitePrototypeRepository, SqliteSpawner>;

/// Shared application state used by every CLI command.
#[derive(Clone)]
pub struct AppState {
    pub wizard: Arc<ConcreteWizard>,
    pub prototypes: SqlitePrototypeRepository,
    pub spawner: Arc<SqliteSpawner>,
    pub locks: Arc<dyn LockChecker>,
    pub drafts: Arc<SqliteOlcDraftStore>,
    pub sessions: Arc<SessionRegistry>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve the data directory, load config, open the database and wire
    /// the services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = load_olc_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("Failed to open the prototype database")?;

        let parser: Arc<dyn ProtfuncParser> = Arc::new(InlineProtfuncParser::new());
        let locks: Arc<dyn LockChecker> = Arc::new(LockStringEvaluator::new());
        let typeclasses: Arc<dyn TypeclassRegistry> =
            Arc::new(ConfigTypeclassRegistry::from_config(&config));

        let prototypes = SqlitePrototypeRepository::new(db_pool.clone());
        let new_spawner = || {
            SqliteSpawner::new(
                prototypes.clone(),
                SqliteObjectRepository::new(db_pool.clone()),
                parser.clone(),
                typeclasses.clone(),
                &config,
            )
        };

        // The wizard owns its spawner; direct `spawn` commands get their own.
        let wizard = OlcWizard::new(
            prototypes.clone(),
            new_spawner(),
            parser.clone(),
            locks.clone(),
            typeclasses.clone(),
            config.clone(),
        );
        let spawner = new_spawner();

        tracing::debug!(data_dir = %data_dir.display(), "application state initialized");

        Ok(Self {
            wizard: Arc::new(wizard),
            prototypes,
            spawner: Arc::new(spawner),
            locks,
            drafts: Arc::new(SqliteOlcDraftStore::new(db_pool)),
            sessions: Arc::new(SessionRegistry::new()),
            data_dir,
        })
    }
}
