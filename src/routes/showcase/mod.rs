mod editor;
mod form;
mod handler;
mod model;

pub use editor::{CreatedItem, ImageUploadError, ShowcaseEditor, UpdatedItem};
pub use form::{ItemDraft, ItemForm, UploadedFile, parse_price};
pub use handler::{create_item, delete_item, list_items, update_item};
pub use model::{ItemFields, ItemImage, ItemWithImages, ShowcaseFilter, ShowcaseItem};
