pub mod normalize;
pub mod record;
pub mod source;
