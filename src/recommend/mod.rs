//! Content-based product recommendation from TF-IDF description vectors.

pub mod engine;
pub mod tfidf;

pub use engine::{ProductRecommender, Recommendation};
pub use tfidf::{cosine, tokenize, TfidfVectorizer, TURKISH_STOP_WORDS};
