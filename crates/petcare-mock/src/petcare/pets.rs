use super::{find_by_id, with_store, PETS};
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
        .register(Method::GET, "/api/pets", with_store(store, list))?
        .register(Method::GET, "/api/pets/", with_store(store, detail))?;
    Ok(())
}

async fn list(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    let pets = store.get(PETS).await?;
    let Some(species) = ctx.param("species") else {
        return Ok(Some(pets.as_ref().clone()));
    };

    let matching: Vec<Value> = pets
        .as_array()
        .map(|all| {
            all.iter()
                .filter(|pet| {
                    pet["species"]
                        .as_str()
                        .is_some_and(|s| s.eq_ignore_ascii_case(species))
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Ok(Some(Value::Array(matching)))
}

async fn detail(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    if ctx.segments().len() != 1 {
        return Ok(None);
    }
    let Some(id) = ctx.id() else {
        return Ok(None);
    };
    let pets = store.get(PETS).await?;
    Ok(find_by_id(&pets, id).cloned())
}
