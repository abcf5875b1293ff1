pub mod admin;
pub mod homepage;
pub mod layout;
pub mod quiz;

pub use layout::{page, titled};

use maud::Markup;

use crate::db::models::AuthUser;

/// Full page for normal navigation, fragment for htmx swaps.
pub fn render(is_htmx: bool, title: &str, body: Markup, user: Option<&AuthUser>) -> Markup {
    if is_htmx {
        titled(title, body)
    } else {
        page(title, body, user)
    }
}
