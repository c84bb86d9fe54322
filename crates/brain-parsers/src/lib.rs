pub mod css;
pub mod html;
pub mod types;

pub use css::CssParser;
pub use html::HtmlParser;
pub use types::*;
