// Mon Jul 20 2026 - Alex

pub mod error;
pub mod feed;
pub mod record;
pub mod typeref;

pub use error::FeedError;
pub use feed::DeclFeed;
pub use record::{RawDecl, RawEnumMember, RawField};
pub use typeref::{ArrayLen, RefWrapper, TypeRef};
