/* 📖 # How do item requests map onto HTTP responses?

Each handler returns `ShelfResult<HttpResponse>` and uses `?` freely. The router then
sorts errors by kind:

- `Validation` becomes 400 with the validation message
- `NotFound` becomes 404 `{"message":"Item not found"}`
- anything else is passed up unchanged, and the HTTP server logs it and answers 500
  with the generic body

A malformed id is answered like an unknown one, so a client can never reach the 500
path by typing a bad URL.
*/

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use shelf_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpStatusCode};
use shelf_base::{ErrorKind, ShelfError, ShelfResult};

use crate::item::{ItemId, ItemPatch, NewItem};
use crate::store::StoreHandle;

/// Route prefix of the item collection.
pub const ITEMS_PATH: &str = "/api/items";

pub const ITEM_NOT_FOUND: &str = "Item not found";
pub const ITEM_DELETED: &str = "Item deleted successfully";

/// Body of every message-only response.
#[derive(Debug, Serialize)]
pub(crate) struct MessageResponse<'a> {
    pub message: &'a str,
}

/// Serialize data to JSON and wrap it in a response with the given status.
pub(crate) fn json_response<T: Serialize>(
    status: HttpStatusCode,
    data: &T,
) -> ShelfResult<HttpResponse> {
    serde_json::to_string(data)
        .map(|json| HttpResponse::json(status, json))
        .map_err(|e| shelf_base::err!("JSON serialization error: {}", e))
}

pub(crate) fn message_response(status: HttpStatusCode, message: &str) -> ShelfResult<HttpResponse> {
    json_response(status, &MessageResponse { message })
}

/// A request that addressed the item routes.
enum Route<'a> {
    Collection,
    Member(&'a str),
}

/// Handlers for the `/api/items` routes.
#[derive(Debug, Clone)]
pub struct ItemService {
    store: StoreHandle,
}

impl ItemService {
    /// Create the service around the shared store handle.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Handle a request below `/api`. Returns None if the path is not an item route.
    pub fn route(&self, request: &HttpRequest) -> Option<ShelfResult<HttpResponse>> {
        let route = Self::match_route(request.path())?;
        let method = request.method();
        debug!(method = %method, path = request.path(), "routing item request");

        let result = match (&route, method) {
            (Route::Collection, HttpMethod::Get) => self.list(),
            (Route::Collection, HttpMethod::Post) => self.create(request),
            (Route::Member(id), HttpMethod::Get) => self.get(id),
            (Route::Member(id), HttpMethod::Put) => self.update(id, request),
            (Route::Member(id), HttpMethod::Delete) => self.delete(id),
            (Route::Collection, _) => return Some(Self::method_not_allowed("GET, POST")),
            (Route::Member(_), _) => return Some(Self::method_not_allowed("GET, PUT, DELETE")),
        };
        Some(Self::map_expected_errors(result))
    }

    fn match_route(path: &str) -> Option<Route<'_>> {
        let rest = path.strip_prefix(ITEMS_PATH)?;
        if rest.is_empty() || rest == "/" {
            return Some(Route::Collection);
        }
        let id = rest.strip_prefix('/')?;
        let id = id.strip_suffix('/').unwrap_or(id);
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Route::Member(id))
    }

    fn method_not_allowed(allow: &str) -> ShelfResult<HttpResponse> {
        Ok(message_response(HttpStatusCode::MethodNotAllowed, "Method not allowed")?
            .with_header("Allow", allow))
    }

    fn map_expected_errors(result: ShelfResult<HttpResponse>) -> ShelfResult<HttpResponse> {
        match result {
            Ok(response) => Ok(response),
            Err(e) => match e.kind() {
                ErrorKind::Validation { message } => {
                    warn!(reason = %message, "rejected item request");
                    message_response(HttpStatusCode::BadRequest, message)
                }
                ErrorKind::NotFound { .. } => {
                    debug!(error = %e, "item not found");
                    message_response(HttpStatusCode::NotFound, ITEM_NOT_FOUND)
                }
                _ => Err(e),
            },
        }
    }

    fn parse_id(raw: &str) -> ShelfResult<ItemId> {
        ItemId::parse(raw).ok_or_else(|| {
            Box::new(ShelfError::not_found("Item").context(format!("malformed id '{}'", raw)))
        })
    }

    fn not_found(id: &ItemId) -> Box<ShelfError> {
        Box::new(ShelfError::not_found("Item").context(format!("id {}", id)))
    }

    /// Parse a JSON object body. An empty body counts as `{}`.
    fn parse_body<T: DeserializeOwned>(request: &HttpRequest) -> ShelfResult<T> {
        let bytes = request.body().as_bytes();
        let value = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_slice::<serde_json::Value>(bytes).map_err(|e| {
                Box::new(ShelfError::validation("Invalid JSON body").context(e.to_string()))
            })?
        };
        if !value.is_object() {
            return Err(Box::new(ShelfError::validation(
                "Request body must be a JSON object",
            )));
        }
        serde_json::from_value(value).map_err(|e| {
            Box::new(ShelfError::validation("Invalid item fields").context(e.to_string()))
        })
    }

    fn list(&self) -> ShelfResult<HttpResponse> {
        let items = self.store.list()?;
        debug!(count = items.len(), "listing items");
        json_response(HttpStatusCode::Ok, &items)
    }

    fn get(&self, raw_id: &str) -> ShelfResult<HttpResponse> {
        let id = Self::parse_id(raw_id)?;
        let item = self.store.get(&id)?.ok_or_else(|| Self::not_found(&id))?;
        json_response(HttpStatusCode::Ok, &item)
    }

    fn create(&self, request: &HttpRequest) -> ShelfResult<HttpResponse> {
        let fields = Self::parse_body::<NewItem>(request)?.validate()?;
        let item = self.store.insert(fields)?;
        info!(id = %item.id(), "item created");
        json_response(HttpStatusCode::Created, &item)
    }

    fn update(&self, raw_id: &str, request: &HttpRequest) -> ShelfResult<HttpResponse> {
        let id = Self::parse_id(raw_id)?;
        // an unknown id is a 404 whatever the body holds
        if self.store.get(&id)?.is_none() {
            return Err(Self::not_found(&id));
        }
        let patch = Self::parse_body::<ItemPatch>(request)?.validate()?;
        let item = self
            .store
            .update(&id, patch)?
            .ok_or_else(|| Self::not_found(&id))?;
        info!(id = %id, "item updated");
        json_response(HttpStatusCode::Ok, &item)
    }

    fn delete(&self, raw_id: &str) -> ShelfResult<HttpResponse> {
        let id = Self::parse_id(raw_id)?;
        self.store.remove(&id)?.ok_or_else(|| Self::not_found(&id))?;
        info!(id = %id, "item deleted");
        message_response(HttpStatusCode::Ok, ITEM_DELETED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, NewItem};
    use crate::store::InMemoryStore;
    use expect_test::expect;

    fn service_with_store() -> (ItemService, StoreHandle) {
        let store = StoreHandle::new(InMemoryStore::new());
        (ItemService::new(store.clone()), store)
    }

    fn call(service: &ItemService, request: HttpRequest) -> HttpResponse {
        service.route(&request).expect("item route").unwrap()
    }

    fn body(response: &HttpResponse) -> String {
        response.body().as_string().unwrap()
    }

    fn seed(store: &StoreHandle, name: &str) -> Item {
        let fields = NewItem {
            name: Some(name.to_string()),
            description: None,
        };
        store.insert(fields.validate().unwrap()).unwrap()
    }

    #[test]
    fn test_list_empty() {
        let (service, _store) = service_with_store();
        let response = call(&service, HttpRequest::new(HttpMethod::Get, "/api/items"));

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
        assert_eq!(body(&response), "[]");
    }

    #[test]
    fn test_create_returns_201_with_id() {
        let (service, store) = service_with_store();
        let request = HttpRequest::new(HttpMethod::Post, "/api/items")
            .with_body(r#"{"name":"Lamp","description":"Desk lamp"}"#);
        let response = call(&service, request);

        assert_eq!(response.status().as_u16(), 201);
        let created: Item = serde_json::from_str(&body(&response)).unwrap();
        assert_eq!(created.name(), "Lamp");
        assert_eq!(created.description(), Some("Desk lamp"));
        assert_eq!(store.get(created.id()).unwrap(), Some(created));
    }

    #[test]
    fn test_create_without_name_is_400() {
        let (service, store) = service_with_store();
        seed(&store, "Existing");

        for payload in [r#"{"description":"no name"}"#, r#"{"name":""}"#, ""] {
            let request = HttpRequest::new(HttpMethod::Post, "/api/items").with_body(payload);
            let response = call(&service, request);
            assert_eq!(response.status().as_u16(), 400, "payload {}", payload);
            expect![[r#"{"message":"Name is required"}"#]].assert_eq(&body(&response));
        }
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_create_with_malformed_body_is_400() {
        let (service, store) = service_with_store();

        let cases = [
            ("{oops", r#"{"message":"Invalid JSON body"}"#),
            (r#"["Lamp"]"#, r#"{"message":"Request body must be a JSON object"}"#),
            (r#"{"name":7}"#, r#"{"message":"Invalid item fields"}"#),
        ];
        for (payload, expected) in cases {
            let request = HttpRequest::new(HttpMethod::Post, "/api/items").with_body(payload);
            let response = call(&service, request);
            assert_eq!(response.status().as_u16(), 400);
            assert_eq!(body(&response), expected);
        }
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_get_by_id() {
        let (service, store) = service_with_store();
        let lamp = seed(&store, "Lamp");

        let response = call(
            &service,
            HttpRequest::new(HttpMethod::Get, format!("/api/items/{}", lamp.id())),
        );
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(body(&response), serde_json::to_string(&lamp).unwrap());
    }

    #[test]
    fn test_get_unknown_and_malformed_ids_are_404() {
        let (service, _store) = service_with_store();

        for path in [
            format!("/api/items/{}", ItemId::generate()),
            "/api/items/123".to_string(),
            "/api/items/not-a-valid-id".to_string(),
        ] {
            let response = call(&service, HttpRequest::new(HttpMethod::Get, path.clone()));
            assert_eq!(response.status().as_u16(), 404, "path {}", path);
            expect![[r#"{"message":"Item not found"}"#]].assert_eq(&body(&response));
        }
    }

    #[test]
    fn test_update_changes_fields_and_keeps_id() {
        let (service, store) = service_with_store();
        let lamp = seed(&store, "Lamp");

        let request = HttpRequest::new(HttpMethod::Put, format!("/api/items/{}", lamp.id()))
            .with_body(r#"{"name":"Floor lamp","description":"Tall"}"#);
        let response = call(&service, request);
        assert_eq!(response.status().as_u16(), 200);

        let updated: Item = serde_json::from_str(&body(&response)).unwrap();
        assert_eq!(updated.id(), lamp.id());
        assert_eq!(updated.name(), "Floor lamp");
        assert_eq!(updated.description(), Some("Tall"));
        assert_eq!(store.get(lamp.id()).unwrap(), Some(updated));
    }

    #[test]
    fn test_update_with_empty_name_is_400() {
        let (service, store) = service_with_store();
        let lamp = seed(&store, "Lamp");

        let request = HttpRequest::new(HttpMethod::Put, format!("/api/items/{}", lamp.id()))
            .with_body(r#"{"name":""}"#);
        let response = call(&service, request);
        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(store.get(lamp.id()).unwrap().unwrap().name(), "Lamp");
    }

    #[test]
    fn test_update_unknown_is_404() {
        let (service, _store) = service_with_store();
        let request = HttpRequest::new(HttpMethod::Put, format!("/api/items/{}", ItemId::generate()))
            .with_body(r#"{"name":"Ghost"}"#);
        assert_eq!(call(&service, request).status().as_u16(), 404);
    }

    #[test]
    fn test_update_unknown_with_invalid_body_is_404() {
        let (service, store) = service_with_store();
        let path = format!("/api/items/{}", ItemId::generate());
        for payload in [r#"{"name":""}"#, "[1,2]", "{broken"] {
            let request = HttpRequest::new(HttpMethod::Put, path.clone()).with_body(payload);
            let response = call(&service, request);
            assert_eq!(response.status().as_u16(), 404, "payload {}", payload);
            expect![[r#"{"message":"Item not found"}"#]].assert_eq(&body(&response));
        }
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_delete_then_everything_is_404() {
        let (service, store) = service_with_store();
        let lamp = seed(&store, "Lamp");
        let path = format!("/api/items/{}", lamp.id());

        let response = call(&service, HttpRequest::new(HttpMethod::Delete, path.clone()));
        assert_eq!(response.status().as_u16(), 200);
        expect![[r#"{"message":"Item deleted successfully"}"#]].assert_eq(&body(&response));

        let get = call(&service, HttpRequest::new(HttpMethod::Get, path.clone()));
        assert_eq!(get.status().as_u16(), 404);
        let put = call(
            &service,
            HttpRequest::new(HttpMethod::Put, path.clone()).with_body(r#"{"name":"x"}"#),
        );
        assert_eq!(put.status().as_u16(), 404);
        for _ in 0..2 {
            let again = call(&service, HttpRequest::new(HttpMethod::Delete, path.clone()));
            assert_eq!(again.status().as_u16(), 404);
        }
    }

    #[test]
    fn test_list_returns_creation_order() {
        let (service, _store) = service_with_store();
        for name in ["Item 1", "Item 2"] {
            let request = HttpRequest::new(HttpMethod::Post, "/api/items")
                .with_body(format!(r#"{{"name":"{}"}}"#, name));
            assert_eq!(call(&service, request).status().as_u16(), 201);
        }

        let response = call(&service, HttpRequest::new(HttpMethod::Get, "/api/items"));
        let items: Vec<Item> = serde_json::from_str(&body(&response)).unwrap();
        let names: Vec<&str> = items.iter().map(|item| item.name()).collect();
        assert_eq!(names, ["Item 1", "Item 2"]);
    }

    #[test]
    fn test_unsupported_method_is_405_with_allow() {
        let (service, _store) = service_with_store();

        let response = call(&service, HttpRequest::new(HttpMethod::Delete, "/api/items"));
        assert_eq!(response.status().as_u16(), 405);
        assert_eq!(response.headers().get("Allow"), Some("GET, POST"));

        let member = format!("/api/items/{}", ItemId::generate());
        let response = call(&service, HttpRequest::new(HttpMethod::Post, member));
        assert_eq!(response.headers().get("Allow"), Some("GET, PUT, DELETE"));
    }

    #[test]
    fn test_non_item_paths_are_not_routed() {
        let (service, _store) = service_with_store();
        for path in ["/api/itemsx", "/api/items/a/b", "/api/other", "/index.html"] {
            assert!(service.route(&HttpRequest::new(HttpMethod::Get, path)).is_none());
        }
    }

    #[test]
    fn test_query_string_is_ignored() {
        let (service, store) = service_with_store();
        seed(&store, "Lamp");
        let response = call(&service, HttpRequest::new(HttpMethod::Get, "/api/items?sort=name"));
        assert_eq!(response.status().as_u16(), 200);
        assert!(body(&response).contains("Lamp"));
    }
}
