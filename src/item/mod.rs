pub mod codec;
pub mod udta_builder;

pub use codec::{decode_ilst, encode_ilst_content};
pub use udta_builder::build_udta;
