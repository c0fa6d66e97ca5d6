pub mod description;
pub mod html;
pub mod lines;
pub mod url;
