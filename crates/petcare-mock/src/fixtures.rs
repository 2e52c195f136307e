//! Lazily loaded fixture data.
//!
//! Each fixture is an async factory run on first use; the parsed value is
//! cached for the lifetime of the store. A failed load is not cached, so the
//! next request retries it.

use anyhow::Context;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub type FixtureFuture = BoxFuture<'static, anyhow::Result<Value>>;

type FixtureFactory = Box<dyn Fn() -> FixtureFuture + Send + Sync>;

struct LazyFixture {
    factory: FixtureFactory,
    cell: OnceCell<Arc<Value>>,
}

#[derive(Default)]
pub struct FixtureStore {
    fixtures: HashMap<String, LazyFixture>,
}

impl fmt::Debug for FixtureStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.fixtures.keys().collect();
        names.sort();
        f.debug_struct("FixtureStore")
            .field("fixtures", &names)
            .finish()
    }
}

impl FixtureStore {
    pub fn builder() -> FixtureStoreBuilder {
        FixtureStoreBuilder::default()
    }

    /// Load (on first use) and return the named fixture.
    pub async fn get(&self, name: &str) -> anyhow::Result<Arc<Value>> {
        let fixture = self
            .fixtures
            .get(name)
            .with_context(|| format!("unknown fixture '{name}'"))?;

        let value = fixture
            .cell
            .get_or_try_init(|| async {
                debug!("Loading fixture '{}'", name);
                (fixture.factory)().await.map(Arc::new)
            })
            .await
            .with_context(|| format!("failed to load fixture '{name}'"))?;
        Ok(Arc::clone(value))
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.fixtures
            .get(name)
            .map(|f| f.cell.initialized())
            .unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }
}

#[derive(Default)]
pub struct FixtureStoreBuilder {
    fixtures: HashMap<String, LazyFixture>,
}

impl FixtureStoreBuilder {
    /// Register an async factory. Later registrations replace earlier ones.
    pub fn provider<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> FixtureFuture + Send + Sync + 'static,
    {
        self.fixtures.insert(
            name.into(),
            LazyFixture {
                factory: Box::new(factory),
                cell: OnceCell::new(),
            },
        );
        self
    }

    /// JSON compiled into the binary, parsed on first use.
    pub fn embedded(self, name: impl Into<String>, json: &'static str) -> Self {
        let name = name.into();
        let label = name.clone();
        self.provider(name, move || {
            let label = label.clone();
            Box::pin(async move {
                serde_json::from_str::<Value>(json)
                    .with_context(|| format!("embedded fixture '{label}' is not valid JSON"))
            })
        })
    }

    /// JSON file read with `tokio::fs` on first use.
    pub fn file(self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.provider(name, move || {
            let path = path.clone();
            Box::pin(async move { load_json_file(&path).await })
        })
    }

    pub fn build(self) -> FixtureStore {
        info!("Fixture store ready with {} providers", self.fixtures.len());
        FixtureStore {
            fixtures: self.fixtures,
        }
    }
}

pub async fn load_json_file(path: &Path) -> anyhow::Result<Value> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}
