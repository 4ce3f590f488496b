/* 📖 # Why an API module in shelf_engine?

The api module exposes the engine over HTTP. Its services implement the HttpService
trait from shelf_base, so they run unchanged on RealPal (tiny_http) and on MockPal in
tests.

- ItemService: the `/api/items` CRUD routes
- StaticAssetService: files from the public directory, `index.html` at `/`
- ApiService: the single registered service routing between the two
*/

mod assets;
mod items;
mod service;

pub use assets::{StaticAssetService, guess_content_type};
pub use items::{ITEM_DELETED, ITEM_NOT_FOUND, ITEMS_PATH, ItemService};
pub use service::ApiService;
