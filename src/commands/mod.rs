pub mod replay;
pub mod view;
