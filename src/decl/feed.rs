// Mon Jul 20 2026 - Alex

use std::fs;
use std::path::Path;

use log::debug;

use crate::decl::error::FeedError;
use crate::decl::record::RawDecl;

/// An ordered batch of declarations, typically one translation unit. Feeds
/// are merged by the graph builder, which is where cross-unit deduplication
/// happens.
#[derive(Debug, Clone, Default)]
pub struct DeclFeed {
    pub label: String,
    pub decls: Vec<RawDecl>,
}

impl DeclFeed {
    pub fn new(label: &str, decls: Vec<RawDecl>) -> Self {
        Self { label: label.to_string(), decls }
    }

    pub fn from_json_str(label: &str, json: &str) -> Result<Self, FeedError> {
        let decls: Vec<RawDecl> = serde_json::from_str(json)?;
        debug!("feed '{}': {} declarations", label, decls.len());
        Ok(Self::new(label, decls))
    }

    pub fn from_path(path: &Path) -> Result<Self, FeedError> {
        let label = path.display().to_string();
        let text = fs::read_to_string(path)?;
        let feed = Self::from_json_str(&label, &text)?;
        if feed.decls.is_empty() {
            return Err(FeedError::EmptyFeed { path: label });
        }
        Ok(feed)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_parses_declaration_array() {
        let json = r#"[
            {"kind": "struct", "name": "A", "fields": [{"name": "x", "type": "int"}]},
            {"kind": "typedef", "name": "int_t", "target": "int"}
        ]"#;
        let feed = DeclFeed::from_json_str("inline", json).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.decls[1].kind_name(), "typedef");
    }

    #[test]
    fn test_fixture_feeds_parse() {
        for text in [
            include_str!("../../fixtures/typecases/source.json"),
            include_str!("../../fixtures/typecases/debug.json"),
            include_str!("../../fixtures/structcases/source.json"),
            include_str!("../../fixtures/structcases/debug.json"),
            include_str!("../../fixtures/splitobjs/source.json"),
            include_str!("../../fixtures/splitobjs/source2.json"),
            include_str!("../../fixtures/splitobjs/debug.json"),
        ] {
            let feed = DeclFeed::from_json_str("fixture", text).unwrap();
            assert!(!feed.is_empty());
        }
    }
}
