pub(crate) mod animations;
pub(crate) mod summary;
