pub(crate) mod builder;
pub(crate) mod chunked;
pub(crate) mod format;
pub(crate) mod reader;
pub(crate) mod rle;
