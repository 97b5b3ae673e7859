// Sun Jul 26 2026 - Alex

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::graph::node::TypeIdx;
use crate::layout::engine::LayoutEngine;
use crate::layout::info::LayoutInfo;
use crate::layout::target::TargetModel;

/// One declared root's computed layout, or the error that stopped it.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutEntry {
    pub name: String,
    pub index: TypeIdx,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every declared root of one graph laid out under one target model, in
/// declaration order. This is the payload of the `layout` subcommand.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutListing {
    pub target: TargetModel,
    pub entries: Vec<LayoutEntry>,
}

impl LayoutListing {
    pub fn from_engine(engine: &LayoutEngine<'_>) -> Self {
        let entries = engine
            .layout_all()
            .into_iter()
            .map(|(name, index, result)| match result {
                Ok(layout) => LayoutEntry { name, index, layout: Some(layout), error: None },
                Err(err) => LayoutEntry { name, index, layout: None, error: Some(err.to_string()) },
            })
            .collect();
        Self { target: *engine.target(), entries }
    }

    pub fn errored(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(json.as_bytes())
    }
}

impl fmt::Display for LayoutListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match (&entry.layout, &entry.error) {
                (Some(layout), _) => writeln!(f, "{}: {}", entry.name, layout)?,
                (None, Some(error)) => writeln!(f, "{}: error: {}", entry.name, error)?,
                (None, None) => writeln!(f, "{}: <no result>", entry.name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::DeclFeed;
    use crate::graph::builder::GraphBuilder;

    #[test]
    fn test_listing_keeps_errors_beside_layouts() {
        let feed = DeclFeed::from_json_str(
            "test",
            r#"[
            {"kind": "struct", "name": "ok", "fields": [{"name": "x", "type": "int"}]},
            {"kind": "struct", "name": "vague", "fields": [{"name": "b", "type": "char[]"}]}
        ]"#,
        )
        .unwrap();
        let out = GraphBuilder::from_feeds(&[feed]).build();
        let engine = LayoutEngine::new(&out.graph, TargetModel::lp64());
        let listing = LayoutListing::from_engine(&engine);
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.errored(), 1);
        let ok = listing.entries.iter().find(|e| e.name == "ok").unwrap();
        assert_eq!(ok.layout.as_ref().unwrap().size.as_u64(), 4);
        let json = listing.to_json().unwrap();
        assert!(json.contains("unresolved element count"));
    }
}
