use super::{find_by_id, paginate, usize_param, with_store, BOARDS, COMMENTS, DEFAULT_PAGE_SIZE};
use crate::error::RegistryError;
use crate::fixtures::FixtureStore;
use crate::handler::{handler_fn, HandlerContext};
use crate::registry::RouteRegistryBuilder;
use hyper::Method;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ids handed to created posts start here, clear of the fixture ids.
const FIRST_CREATED_ID: u64 = 1000;

pub(super) fn register(
    builder: &mut RouteRegistryBuilder,
    store: &Arc<FixtureStore>,
) -> Result<(), RegistryError> {
    let next_id = Arc::new(AtomicU64::new(FIRST_CREATED_ID));

    builder
        .register(Method::GET, "/api/boards", with_store(store, list))?
        .register(Method::GET, "/api/boards/", with_store(store, detail))?
        .register(
            Method::POST,
            "/api/boards",
            handler_fn(move |ctx| {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                async move { anyhow::Ok(Some(created(&ctx, id))) }
            }),
        )?
        .register(Method::PUT, "/api/boards/", with_store(store, update))?
        .register(Method::DELETE, "/api/boards/", with_store(store, remove))?;
    Ok(())
}

/// `GET /api/boards?page=&size=&category=`
async fn list(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    let boards = store.get(BOARDS).await?;
    let page = usize_param(ctx.param("page"), 0);
    let size = usize_param(ctx.param("size"), DEFAULT_PAGE_SIZE);

    let items: Vec<Value> = boards
        .as_array()
        .map(|all| {
            all.iter()
                .filter(|board| match ctx.param("category") {
                    Some(category) => board["category"] == category,
                    None => true,
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(paginate(&items, page, size)))
}

/// `GET /api/boards/{id}` or `GET /api/boards/{id}/comments`
async fn detail(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    let segments = ctx.segments();
    let boards = store.get(BOARDS).await?;

    match segments.as_slice() {
        [id] => Ok(find_by_id(&boards, id).cloned()),
        [id, "comments"] => {
            if find_by_id(&boards, id).is_none() {
                return Ok(None);
            }
            let board_id = id.parse::<u64>().ok();
            let comments = store.get(COMMENTS).await?;
            let for_board: Vec<Value> = comments
                .as_array()
                .map(|all| {
                    all.iter()
                        .filter(|c| c["boardId"].as_u64() == board_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            Ok(Some(Value::Array(for_board)))
        }
        _ => Ok(None),
    }
}

/// `PUT /api/boards/{id}`: the stored post with the body's fields applied.
async fn update(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    let Some(id) = ctx.id() else {
        return Ok(None);
    };
    let boards = store.get(BOARDS).await?;
    let Some(mut board) = find_by_id(&boards, id).cloned() else {
        return Ok(None);
    };

    if let (Some(target), Some(Value::Object(changes))) =
        (board.as_object_mut(), ctx.request.body.as_ref())
    {
        for (key, value) in changes {
            if key != "id" {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Some(board))
}

/// `DELETE /api/boards/{id}`
async fn remove(store: Arc<FixtureStore>, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
    let Some(id) = ctx.id() else {
        return Ok(None);
    };
    let boards = store.get(BOARDS).await?;
    Ok(find_by_id(&boards, id).map(|_| json!({ "success": true })))
}

fn created(ctx: &HandlerContext, id: u64) -> Value {
    let mut board = match &ctx.request.body {
        Some(Value::Object(fields)) => fields.clone(),
        Some(other) => {
            let mut fields = Map::new();
            fields.insert("content".to_string(), other.clone());
            fields
        }
        None => Map::new(),
    };
    board.insert("id".to_string(), json!(id));
    board.entry("likeCount").or_insert(json!(0));
    board.entry("commentCount").or_insert(json!(0));
    Value::Object(board)
}
