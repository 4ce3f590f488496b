/* 📖 # Why a single unified API service?

The ApiService is the one HttpService registered with the server. It routes on the
request path:

- `/api/items` and `/api/items/{id}` -> ItemService
- any other `/api/...` path -> 404 `{"message":"Not found"}`
- every other path -> StaticAssetService for GET and HEAD, 404 otherwise

A HEAD response carries the same status and headers as the GET response; the server
sends it without the body.

One service means one handle to manage, and MockPal tests register exactly what
production runs.
*/

use tracing::debug;

use shelf_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatusCode};
use shelf_base::{FilePath, PalHandle, ShelfResult};

use super::assets::StaticAssetService;
use super::items::{ItemService, message_response};
use crate::store::StoreHandle;

/// HTTP service providing the item API and the public directory.
#[derive(Debug, Clone)]
pub struct ApiService {
    items: ItemService,
    assets: StaticAssetService,
}

impl ApiService {
    /// Create the service from the shared store handle and the public directory.
    ///
    /// # Examples
    /// ```
    /// use shelf_base::{FilePath, MockPal, PalHandle};
    /// use shelf_engine::{ApiService, InMemoryStore, StoreHandle};
    ///
    /// let store = StoreHandle::new(InMemoryStore::new());
    /// let pal = PalHandle::new(MockPal::new());
    /// let service = ApiService::new(store, pal, FilePath::from("public"));
    /// ```
    pub fn new(store: StoreHandle, pal: PalHandle, public_dir: FilePath) -> Self {
        Self {
            items: ItemService::new(store),
            assets: StaticAssetService::new(pal, public_dir),
        }
    }

    fn is_api_path(path: &str) -> bool {
        path == "/api" || path.starts_with("/api/")
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> ShelfResult<HttpResponse> {
        let path = request.path();

        if Self::is_api_path(path) {
            if let Some(result) = self.items.route(&request) {
                return result;
            }
            debug!(path, "unknown API path");
            return message_response(HttpStatusCode::NotFound, "Not found");
        }

        if matches!(request.method(), HttpMethod::Get | HttpMethod::Head) {
            self.assets.serve(path)
        } else {
            debug!(method = %request.method(), path, "non-GET request outside the API");
            Ok(HttpResponse::text(HttpStatusCode::NotFound, "Not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use crate::store::{FileStore, InMemoryStore};
    use expect_test::expect;
    use shelf_base::pal::http::HttpServerConfig;
    use shelf_base::{MockPal, Pal};

    fn create_test_service(mock: &MockPal) -> ApiService {
        mock.add_file(FilePath::from("public/index.html"), b"<h1>Items</h1>".to_vec());
        ApiService::new(
            StoreHandle::new(InMemoryStore::new()),
            PalHandle::new(mock.clone()),
            FilePath::from("public"),
        )
    }

    #[test]
    fn test_root_serves_index_page() {
        let mock = MockPal::new();
        let service = create_test_service(&mock);
        let response = service.handle_request(HttpRequest::new(HttpMethod::Get, "/")).unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.body().as_string(), Some("<h1>Items</h1>".to_string()));
    }

    #[test]
    fn test_unknown_api_path_is_json_404() {
        let mock = MockPal::new();
        let service = create_test_service(&mock);
        for path in ["/api", "/api/other", "/api/items/a/b"] {
            let response = service.handle_request(HttpRequest::new(HttpMethod::Get, path)).unwrap();
            assert_eq!(response.status().as_u16(), 404);
            expect![[r#"{"message":"Not found"}"#]].assert_eq(&response.body().as_string().unwrap());
        }
    }

    #[test]
    fn test_non_get_outside_api_is_404() {
        let mock = MockPal::new();
        let service = create_test_service(&mock);
        let response = service
            .handle_request(HttpRequest::new(HttpMethod::Post, "/index.html"))
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[test]
    fn test_head_on_static_file_matches_get() {
        let mock = MockPal::new();
        let service = create_test_service(&mock);
        let get = service.handle_request(HttpRequest::new(HttpMethod::Get, "/index.html")).unwrap();
        let head = service
            .handle_request(HttpRequest::new(HttpMethod::Head, "/index.html"))
            .unwrap();
        assert_eq!(head.status().as_u16(), 200);
        assert_eq!(head.headers(), get.headers());

        let missing = service
            .handle_request(HttpRequest::new(HttpMethod::Head, "/missing.css"))
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);
    }

    #[test]
    fn test_store_failure_propagates_as_error() {
        let mock = MockPal::new();
        let store = FileStore::open(PalHandle::new(mock.clone()), &FilePath::from("data")).unwrap();
        let service = ApiService::new(
            StoreHandle::new(store),
            PalHandle::new(mock.clone()),
            FilePath::from("public"),
        );

        mock.set_fail_writes(true);
        let request = HttpRequest::new(HttpMethod::Post, "/api/items").with_body(r#"{"name":"Lamp"}"#);
        let err = service.handle_request(request).unwrap_err();
        assert!(err.to_string().starts_with("while writing collection data/items.json"));
    }

    #[test]
    fn test_crud_flow_through_mock_server() {
        let mock = MockPal::new();
        let store = FileStore::open(PalHandle::new(mock.clone()), &FilePath::from("data")).unwrap();
        let service = ApiService::new(
            StoreHandle::new(store),
            PalHandle::new(mock.clone()),
            FilePath::from("public"),
        );
        let handle = mock
            .start_http_server(Box::new(service), HttpServerConfig::default())
            .unwrap();
        let port = handle.port();

        let created = mock
            .simulate_request(
                port,
                HttpRequest::new(HttpMethod::Post, "/api/items")
                    .with_body(r#"{"name":"Lamp","description":"Desk lamp"}"#),
            )
            .unwrap();
        assert_eq!(created.status().as_u16(), 201);
        let item: Item = serde_json::from_str(&created.body().as_string().unwrap()).unwrap();

        let path = format!("/api/items/{}", item.id());
        let updated = mock
            .simulate_request(
                port,
                HttpRequest::new(HttpMethod::Put, path.clone()).with_body(r#"{"name":"Floor lamp"}"#),
            )
            .unwrap();
        assert_eq!(updated.status().as_u16(), 200);

        let persisted = String::from_utf8(mock.file_content(&FilePath::from("data/items.json")).unwrap())
            .unwrap();
        assert!(persisted.contains("Floor lamp"));

        let deleted = mock
            .simulate_request(port, HttpRequest::new(HttpMethod::Delete, path.clone()))
            .unwrap();
        assert_eq!(deleted.status().as_u16(), 200);

        let gone = mock
            .simulate_request(port, HttpRequest::new(HttpMethod::Get, path))
            .unwrap();
        assert_eq!(gone.status().as_u16(), 404);
    }
}
