mod article;
mod paging;

pub use article::*;
pub use paging::*;
