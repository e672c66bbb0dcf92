//! Built-in object kinds.

use serde::{Deserialize, Serialize};

use crate::header::{VersionHeader, Versioned};

/// A versioned document: the usual owner of content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub header: VersionHeader,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            header: VersionHeader::new(name),
            description: String::new(),
            tags: Vec::new(),
        }
    }
}

impl Versioned for Document {
    const KIND: &'static str = "document";
    const LABEL: &'static str = "Document";

    fn header(&self) -> &VersionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut VersionHeader {
        &mut self.header
    }

    fn indexable_text(&self) -> Vec<String> {
        let mut text = vec![self.header.name.clone()];
        if !self.description.is_empty() {
            text.push(self.description.clone());
        }
        text.extend(self.tags.iter().cloned());
        text
    }
}

/// A versioned folder. Folders group other objects by path and hold no
/// content of their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(flatten)]
    pub header: VersionHeader,
    pub path: String,
}

impl Folder {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            header: VersionHeader::new(name),
            path: path.into(),
        }
    }
}

impl Versioned for Folder {
    const KIND: &'static str = "folder";
    const LABEL: &'static str = "Folder";
    const ACCEPTS_CONTENT: bool = false;

    fn header(&self) -> &VersionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut VersionHeader {
        &mut self.header
    }

    fn indexable_text(&self) -> Vec<String> {
        vec![self.header.name.clone(), self.path.clone()]
    }
}

/// A versioned user profile. Profile pictures and the like are content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub header: VersionHeader,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            header: VersionHeader::new(name),
            email: email.into(),
            display_name: String::new(),
        }
    }
}

impl Versioned for User {
    const KIND: &'static str = "user";
    const LABEL: &'static str = "User";

    fn header(&self) -> &VersionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut VersionHeader {
        &mut self.header
    }

    fn indexable_text(&self) -> Vec<String> {
        vec![self.header.name.clone(), self.display_name.clone()]
    }
}

/// Output format of a generated report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Pdf,
    Csv,
    Html,
}

/// A versioned report definition. Rendered output is stored as content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub header: VersionHeader,
    pub query: String,
    #[serde(default)]
    pub format: ReportFormat,
}

impl Report {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            header: VersionHeader::new(name),
            query: query.into(),
            format: ReportFormat::default(),
        }
    }
}

impl Versioned for Report {
    const KIND: &'static str = "report";
    const LABEL: &'static str = "Report";

    fn header(&self) -> &VersionHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut VersionHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_flattened() {
        let d = Document::new("spec");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["name"], "spec");
        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn clone_for_new_version_keeps_kind_fields() {
        let mut r = Report::new("monthly", "select 1");
        r.format = ReportFormat::Csv;
        let next = r.clone_for_new_version();
        assert_ne!(next.id(), r.id());
        assert_eq!(next.query, "select 1");
        assert_eq!(next.format, ReportFormat::Csv);
    }

    #[test]
    fn document_text_includes_tags() {
        let mut d = Document::new("spec");
        d.tags = vec!["draft".into()];
        assert_eq!(d.indexable_text(), vec!["spec", "draft"]);
    }
}
