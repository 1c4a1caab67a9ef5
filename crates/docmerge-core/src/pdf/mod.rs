mod concat;
mod document;
mod edit;
#[cfg(test)]
pub(crate) mod fixtures;

pub use concat::concatenate;
pub use document::{PageSelection, PdfDocument};
pub use edit::{PageEdit, delete_pages, delete_parsed_pages};
