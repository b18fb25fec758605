// Adapters layer: concrete implementations of the domain ports (the CSV
// identifier source and the catalog payload extractor).

use crate::domain::model::{Product, ProductId};
use crate::domain::ports::{Extractor, IdSource};
use crate::utils::error::{HarvestError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Identifier source backed by a CSV file: ids in the first column, one
/// header row. Paged with skip/take so a resumed run continues past the
/// rows it already consumed.
pub struct CsvIdSource {
    path: PathBuf,
}

impl CsvIdSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl IdSource for CsvIdSource {
    async fn load(&self, offset: usize, limit: usize) -> Result<Vec<ProductId>> {
        if !self.path.exists() {
            return Err(HarvestError::SourceError {
                message: format!("input file not found: {}", self.path.display()),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut ids = Vec::new();
        // Malformed rows are skipped, not errors.
        for record in reader.records().skip(offset).flatten() {
            let Some(id) = record.get(0).and_then(|field| field.trim().parse::<u64>().ok())
            else {
                continue;
            };
            ids.push(id);
            if ids.len() >= limit {
                break;
            }
        }
        Ok(ids)
    }
}

/// Maps a raw catalog API payload to the persisted record shape. Rejects
/// payloads without a numeric id; everything else degrades to defaults.
#[derive(Debug, Clone, Default)]
pub struct ProductExtractor;

impl Extractor for ProductExtractor {
    fn extract(&self, payload: &serde_json::Value) -> Option<Product> {
        let id = payload.get("id")?.as_u64()?;

        let images_url = payload
            .get("images")
            .and_then(|images| images.as_array())
            .map(|images| {
                images
                    .iter()
                    .filter_map(|img| img.get("base_url"))
                    .filter_map(|url| url.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Product {
            id,
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            url_key: payload
                .get("url_key")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            price: payload.get("price").and_then(|v| v.as_f64()),
            description: payload
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            images_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_source(contents: &str) -> (TempDir, CsvIdSource) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, CsvIdSource::new(path))
    }

    #[tokio::test]
    async fn test_loads_ids_after_header() {
        let (_dir, source) = write_source("pid,name\n1,a\n2,b\n3,c\n");
        let ids = source.load(0, 10).await.unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_offset_and_limit_page_through_rows() {
        let (_dir, source) = write_source("pid\n1\n2\n3\n4\n5\n");
        assert_eq!(source.load(0, 2).await.unwrap(), vec![1, 2]);
        assert_eq!(source.load(2, 2).await.unwrap(), vec![3, 4]);
        assert_eq!(source.load(5, 2).await.unwrap(), Vec::<u64>::new());
    }

    #[tokio::test]
    async fn test_malformed_rows_are_skipped() {
        let (_dir, source) = write_source("pid\n1\nnot-a-number\n\n3\n");
        let ids = source.load(0, 10).await.unwrap();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let source = CsvIdSource::new("/nonexistent/products.csv");
        assert!(source.load(0, 10).await.is_err());
    }

    #[test]
    fn test_extracts_all_fields() {
        let payload = serde_json::json!({
            "id": 42,
            "name": "Widget",
            "url_key": "widget-42",
            "price": 19.5,
            "description": "A widget",
            "images": [
                {"base_url": "https://img.example.com/1.jpg"},
                {"thumbnail": "no base url"},
                {"base_url": "https://img.example.com/2.jpg"}
            ]
        });

        let product = ProductExtractor.extract(&payload).unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.name.as_deref(), Some("Widget"));
        assert_eq!(product.url_key.as_deref(), Some("widget-42"));
        assert_eq!(product.price, Some(19.5));
        assert_eq!(product.description, "A widget");
        assert_eq!(
            product.images_url,
            vec![
                "https://img.example.com/1.jpg".to_string(),
                "https://img.example.com/2.jpg".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let payload = serde_json::json!({"id": 7});
        let product = ProductExtractor.extract(&payload).unwrap();
        assert_eq!(product.id, 7);
        assert!(product.name.is_none());
        assert!(product.description.is_empty());
        assert!(product.images_url.is_empty());
    }

    #[test]
    fn test_payload_without_id_is_rejected() {
        let payload = serde_json::json!({"name": "no id"});
        assert!(ProductExtractor.extract(&payload).is_none());
    }
}
