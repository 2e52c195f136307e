use super::{with_store, NOTIFICATIONS, USERS_ME};
use crate::error::RegistryError;
use crate::fixtures::FixtureStore;
use crate::handler::HandlerContext;
use crate::registry::RouteRegistryBuilder;
use hyper::Method;
use serde_json::Value;
use std::sync::Arc;

pub(super) fn register(
    builder: &mut RouteRegistryBuilder,
    store: &Arc<FixtureStore>,
) -> Result<(), RegistryError> {
    builder
        .register(Method::GET, "/api/users/me", with_store(store, current_user))?
        .register(
            Method::GET,
            "/api/notifications",
            with_store(store, notifications),
        )?;
    Ok(())
}

async fn current_user(
    store: Arc<FixtureStore>,
    _ctx: HandlerContext,
) -> anyhow::Result<Option<Value>> {
    let user = store.get(USERS_ME).await?;
    Ok(Some(user.as_ref().clone()))
}

/// `GET /api/notifications?unread=true` keeps only unread entries.
async fn notifications(
    store: Arc<FixtureStore>,
    ctx: HandlerContext,
) -> anyhow::Result<Option<Value>> {
    let all = store.get(NOTIFICATIONS).await?;
    if ctx.param("unread") != Some("true") {
        return Ok(Some(all.as_ref().clone()));
    }

    let unread: Vec<Value> = all
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|n| n["read"] == false)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Some(Value::Array(unread)))
}
