//! Routes and fixtures for the pet-care demo API.
//!
//! Fixtures ship embedded in the binary. A fixtures directory, when given,
//! replaces each embedded document with `<dir>/<name>.json`.

mod account;
mod boards;
mod pets;

use crate::error::RegistryError;
use crate::fixtures::FixtureStore;
use crate::handler::{handler_fn, HandlerContext, RouteHandler};
use crate::registry::RouteRegistry;
use serde_json::{json, Value};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

pub const BOARDS: &str = "boards";
pub const COMMENTS: &str = "comments";
pub const PETS: &str = "pets";
pub const USERS_ME: &str = "users_me";
pub const NOTIFICATIONS: &str = "notifications";

pub const DEFAULT_PAGE_SIZE: usize = 10;

const EMBEDDED: [(&str, &str); 5] = [
    (BOARDS, include_str!("../../fixtures/boards.json")),
    (COMMENTS, include_str!("../../fixtures/comments.json")),
    (PETS, include_str!("../../fixtures/pets.json")),
    (USERS_ME, include_str!("../../fixtures/users_me.json")),
    (NOTIFICATIONS, include_str!("../../fixtures/notifications.json")),
];

/// Fixture store with every document the demo routes read.
pub fn fixture_store(fixtures_dir: Option<&Path>) -> FixtureStore {
    EMBEDDED
        .iter()
        .fold(FixtureStore::builder(), |builder, (name, json)| {
            match fixtures_dir {
                Some(dir) => builder.file(*name, dir.join(format!("{name}.json"))),
                None => builder.embedded(*name, *json),
            }
        })
        .build()
}

/// Registry with the demo API's endpoints.
pub fn default_registry(store: Arc<FixtureStore>) -> Result<RouteRegistry, RegistryError> {
    let mut builder = RouteRegistry::builder();
    boards::register(&mut builder, &store)?;
    pets::register(&mut builder, &store)?;
    account::register(&mut builder, &store)?;
    Ok(builder.build())
}

/// Handler that receives the shared fixture store along with its context.
fn with_store<F, Fut>(store: &Arc<FixtureStore>, f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(Arc<FixtureStore>, HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    let store = Arc::clone(store);
    handler_fn(move |ctx| f(Arc::clone(&store), ctx))
}

/// One page of `items`, shaped like a Spring `Page` response.
///
/// `page` is 0-based. A page past the end has empty `content`.
pub fn paginate(items: &[Value], page: usize, size: usize) -> Value {
    let size = size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(size);
    let content: Vec<Value> = items
        .iter()
        .skip(page.saturating_mul(size))
        .take(size)
        .cloned()
        .collect();

    json!({
        "content": content,
        "page": page,
        "size": size,
        "totalElements": total,
        "totalPages": total_pages,
        "last": page.saturating_add(1) >= total_pages,
    })
}

/// First element of a fixture array whose `field` equals the numeric `id`.
pub(crate) fn find_by<'a>(items: &'a Value, field: &str, id: &str) -> Option<&'a Value> {
    let id: u64 = id.parse().ok()?;
    items
        .as_array()?
        .iter()
        .find(|item| item.get(field).and_then(Value::as_u64) == Some(id))
}

pub(crate) fn find_by_id<'a>(items: &'a Value, id: &str) -> Option<&'a Value> {
    find_by(items, "id", id)
}

pub(crate) fn usize_param(value: Option<&str>, default: usize) -> usize {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
