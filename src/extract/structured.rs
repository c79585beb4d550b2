//! JSON-LD, microdata and RDFa extraction

use crate::document::{element_text, parse_selector};
use crate::Document;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A microdata `[itemscope]` item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MicrodataItem {
    /// The `itemtype` URL, when declared
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// `itemprop` name to value; later duplicates overwrite earlier ones
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
}

/// An RDFa `[property]` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RdfaEntry {
    pub property: String,
    pub content: String,
}

/// All structured-data markup found in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredData {
    #[serde(rename = "json-ld", skip_serializing_if = "Vec::is_empty")]
    pub json_ld: Vec<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub microdata: Vec<MicrodataItem>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rdfa: Vec<RdfaEntry>,
}

impl StructuredData {
    pub fn is_empty(&self) -> bool {
        self.json_ld.is_empty() && self.microdata.is_empty() && self.rdfa.is_empty()
    }
}

/// Extracts JSON-LD scripts, microdata items and RDFa properties
#[derive(Debug, Clone)]
pub struct StructuredDataExtractor<'a> {
    document: &'a Document,
    schema_type: Option<String>,
}

impl<'a> StructuredDataExtractor<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            schema_type: None,
        }
    }

    /// Keeps only JSON-LD objects whose `@type` and microdata items whose `itemtype`
    /// equal the given value
    ///
    /// RDFa entries are never filtered.
    pub fn schema_type(mut self, schema_type: impl Into<String>) -> Self {
        self.schema_type = Some(schema_type.into());
        self
    }

    pub fn extract(&self) -> StructuredData {
        StructuredData {
            json_ld: self.json_ld(),
            microdata: self.microdata(),
            rdfa: self.rdfa(),
        }
    }

    fn json_ld(&self) -> Vec<Value> {
        let Ok(selector) = parse_selector(r#"script[type="application/ld+json"]"#) else {
            return Vec::new();
        };

        let mut objects = Vec::new();
        for script in self.document.html().select(&selector) {
            let raw: String = script.text().collect();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(Value::Array(items)) => objects.extend(items),
                Ok(Value::Null) => {}
                Ok(value) => objects.push(value),
                Err(e) => {
                    tracing::debug!("Skipping invalid JSON-LD block: {}", e);
                }
            }
        }

        match &self.schema_type {
            Some(wanted) => objects
                .into_iter()
                .filter(|value| json_ld_type_matches(value, wanted))
                .collect(),
            None => objects,
        }
    }

    fn microdata(&self) -> Vec<MicrodataItem> {
        let (Ok(scope_selector), Ok(prop_selector)) =
            (parse_selector("[itemscope]"), parse_selector("[itemprop]"))
        else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for scope in self.document.html().select(&scope_selector) {
            let item_type = scope
                .value()
                .attr("itemtype")
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            if let Some(wanted) = &self.schema_type {
                if item_type.as_deref() != Some(wanted.as_str()) {
                    continue;
                }
            }

            let mut properties = BTreeMap::new();
            // `select` on an element only visits descendants, never the scope itself
            for prop in scope.select(&prop_selector) {
                let Some(name) = prop.value().attr("itemprop").filter(|n| !n.is_empty()) else {
                    continue;
                };
                let value = match prop.value().attr("content") {
                    Some(content) => content.to_string(),
                    None => element_text(&prop),
                };
                properties.insert(name.to_string(), value);
            }

            items.push(MicrodataItem {
                item_type,
                properties,
            });
        }

        items
    }

    fn rdfa(&self) -> Vec<RdfaEntry> {
        let Ok(selector) = parse_selector("[property]") else {
            return Vec::new();
        };

        self.document
            .html()
            .select(&selector)
            .filter_map(|element| {
                let property = element.value().attr("property").filter(|p| !p.is_empty())?;
                let content = match element.value().attr("content") {
                    Some(content) => content.to_string(),
                    None => element_text(&element),
                };
                (!content.is_empty()).then(|| RdfaEntry {
                    property: property.to_string(),
                    content,
                })
            })
            .collect()
    }
}

/// `@type` is a string equal to the wanted type
fn json_ld_type_matches(value: &Value, wanted: &str) -> bool {
    value.get("@type").and_then(Value::as_str) == Some(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;

    fn doc(html: &str) -> Document {
        Document::parse(html, Url::parse("https://example.com").unwrap())
    }

    const PAGE: &str = r#"<html><head>
        <script type="application/ld+json">{"@type": "Article", "headline": "Hello"}</script>
        <script type="application/ld+json">[{"@type": "Person", "name": "Ada"}, {"@type": ["Thing", "Article"]}]</script>
        <script type="application/ld+json">{not json</script>
        <meta property="og:title" content="OG Title">
        </head><body>
        <div itemscope itemtype="https://schema.org/Product">
            <span itemprop="name">Widget</span>
            <meta itemprop="price" content="9.99">
        </div>
        <div itemscope itemtype="https://schema.org/Event"><span itemprop="name">Launch</span></div>
        <span property="dc:creator">Grace</span>
        <span property="dc:empty"></span>
        </body></html>"#;

    #[test]
    fn test_json_ld() {
        let data = StructuredDataExtractor::new(&doc(PAGE)).extract();
        assert_eq!(data.json_ld.len(), 3);
        assert_eq!(data.json_ld[0]["headline"], "Hello");
        assert_eq!(data.json_ld[1]["name"], "Ada");
    }

    #[test]
    fn test_microdata() {
        let data = StructuredDataExtractor::new(&doc(PAGE)).extract();
        assert_eq!(data.microdata.len(), 2);

        let product = &data.microdata[0];
        assert_eq!(product.item_type.as_deref(), Some("https://schema.org/Product"));
        assert_eq!(product.properties["name"], "Widget");
        assert_eq!(product.properties["price"], "9.99");
    }

    #[test]
    fn test_rdfa() {
        let data = StructuredDataExtractor::new(&doc(PAGE)).extract();
        assert_eq!(
            data.rdfa,
            vec![
                RdfaEntry {
                    property: "og:title".into(),
                    content: "OG Title".into()
                },
                RdfaEntry {
                    property: "dc:creator".into(),
                    content: "Grace".into()
                },
            ]
        );
    }

    #[test]
    fn test_schema_type_filter() {
        let data = StructuredDataExtractor::new(&doc(PAGE))
            .schema_type("Article")
            .extract();
        // Only the object whose @type is exactly "Article"
        assert_eq!(data.json_ld.len(), 1);
        assert_eq!(data.json_ld[0]["headline"], "Hello");
        assert!(data.microdata.is_empty());
        assert_eq!(data.rdfa.len(), 2);

        let data = StructuredDataExtractor::new(&doc(PAGE))
            .schema_type("https://schema.org/Product")
            .extract();
        assert!(data.json_ld.is_empty());
        assert_eq!(data.microdata.len(), 1);
    }

    #[test]
    fn test_schema_type_requires_equality() {
        let d = doc(r#"
            <script type="application/ld+json">{"@type": ["Thing", "Article"]}</script>
            <div itemscope itemtype="https://schema.org/Product"><b itemprop="name">W</b></div>"#);

        let data = StructuredDataExtractor::new(&d).schema_type("Article").extract();
        assert!(data.json_ld.is_empty());

        let data = StructuredDataExtractor::new(&d).schema_type("Product").extract();
        assert!(data.microdata.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let d = doc(r#"<div itemscope itemtype="T"><b itemprop="k">v</b></div>"#);
        let json = serde_json::to_value(StructuredDataExtractor::new(&d).extract()).unwrap();
        assert_eq!(json, json!({"microdata": [{"@type": "T", "k": "v"}]}));
    }

    #[test]
    fn test_empty_document() {
        let data = StructuredDataExtractor::new(&doc("<p>plain</p>")).extract();
        assert!(data.is_empty());
    }
}
