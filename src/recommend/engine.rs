//! Content-based product recommendations.

use super::tfidf::{cosine, TfidfVectorizer};
use crate::core::Product;
use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One recommended product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: u32,
    pub product_name: String,
    pub similarity: f64,
}

/// Recommends products whose descriptions are most similar to a given one.
///
/// # Example
///
/// ```
/// use mursis_analytics::data::create_tech_product_data;
/// use mursis_analytics::recommend::ProductRecommender;
///
/// let recommender = ProductRecommender::fit(create_tech_product_data()).unwrap();
/// let similar = recommender.recommend(103, 3).unwrap();
/// assert_eq!(similar.len(), 3);
/// assert!(similar.iter().all(|r| r.product_id != 103));
/// ```
#[derive(Debug, Clone)]
pub struct ProductRecommender {
    products: Vec<Product>,
    similarity: Vec<Vec<f64>>,
}

impl ProductRecommender {
    /// Vectorize descriptions and precompute pairwise cosine similarity.
    pub fn fit(products: Vec<Product>) -> Result<Self> {
        if products.is_empty() {
            return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
        }
        let descriptions: Vec<&str> = products.iter().map(|p| p.description.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&descriptions);
        let vectors = vectorizer.vectors();
        let similarity = vectors
            .iter()
            .map(|a| vectors.iter().map(|b| cosine(a, b)).collect())
            .collect();

        debug!(
            products = products.len(),
            vocabulary = vectorizer.vocabulary().len(),
            "product recommender fitted"
        );
        Ok(Self {
            products,
            similarity,
        })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Pairwise cosine similarity in catalog order.
    pub fn similarity_matrix(&self) -> &[Vec<f64>] {
        &self.similarity
    }

    /// Up to `top_n` other products, most similar first; equal similarity
    /// keeps catalog order.
    ///
    /// # Errors
    /// `NotFound` if `product_id` is not in the catalog.
    pub fn recommend(&self, product_id: u32, top_n: usize) -> Result<Vec<Recommendation>> {
        let idx = self
            .products
            .iter()
            .position(|p| p.product_id == product_id)
            .ok_or_else(|| AnalyticsError::NotFound(format!("product {}", product_id)))?;

        let mut candidates: Vec<(usize, f64)> = self.similarity[idx]
            .iter()
            .copied()
            .enumerate()
            .filter(|&(j, _)| j != idx)
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(candidates
            .into_iter()
            .take(top_n)
            .map(|(j, similarity)| Recommendation {
                product_id: self.products[j].product_id,
                product_name: self.products[j].product_name.clone(),
                similarity,
            })
            .collect())
    }
}
