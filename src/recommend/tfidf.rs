//! TF-IDF document vectors.
//!
//! Tokens are lowercase runs of at least two word characters (alphanumeric
//! or `_`). Term weights are raw counts times the smoothed inverse document
//! frequency `ln((1 + n) / (1 + df)) + 1`; each document vector is scaled to
//! unit L2 norm, so the dot product of two vectors is their cosine
//! similarity.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Turkish stop words removed before weighting.
pub const TURKISH_STOP_WORDS: [&str; 53] = [
    "acaba", "ama", "aslında", "az", "bazı", "belki", "biri", "birkaç", "birşey", "biz", "bu",
    "çok", "çünkü", "da", "daha", "de", "defa", "diye", "eğer", "en", "gibi", "hem", "hep",
    "hepsi", "her", "hiç", "için", "ile", "ise", "kez", "ki", "kim", "mı", "mu", "mü", "nasıl",
    "ne", "neden", "nerde", "nerede", "nereye", "niçin", "niye", "o", "sanki", "şey", "siz",
    "şu", "tüm", "ve", "veya", "ya", "yani",
];

/// Split text into lowercase tokens of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(String::from)
        .collect()
}

/// Fitted vocabulary with per-term idf and the L2-normalized document
/// vectors of the corpus it was fitted on.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    stop_words: BTreeSet<String>,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<Vec<f64>>,
}

impl TfidfVectorizer {
    /// Fit on `documents` with the Turkish stop list.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        Self::fit_with_stop_words(documents, &TURKISH_STOP_WORDS)
    }

    pub fn fit_with_stop_words<S: AsRef<str>>(documents: &[S], stop_words: &[&str]) -> Self {
        let stop_words: BTreeSet<String> = stop_words.iter().map(|w| w.to_lowercase()).collect();
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| {
                tokenize(d.as_ref())
                    .into_iter()
                    .filter(|t| !stop_words.contains(t))
                    .collect()
            })
            .collect();

        let mut doc_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&String> = tokens.iter().collect();
            for term in unique {
                *doc_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let vocabulary: BTreeMap<String, usize> = doc_frequency
            .keys()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        let idf: Vec<f64> = doc_frequency
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut vectorizer = Self {
            stop_words,
            vocabulary,
            idf,
            vectors: Vec::new(),
        };
        vectorizer.vectors = tokenized
            .iter()
            .map(|tokens| vectorizer.weigh(tokens))
            .collect();
        vectorizer
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&i| self.idf[i])
    }

    /// Unit vectors of the fitted corpus, in input order.
    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }

    /// Vector for new text; terms outside the vocabulary are ignored.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let tokens: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect();
        self.weigh(&tokens)
    }

    fn weigh(&self, tokens: &[String]) -> Vec<f64> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokens {
            if let Some(&i) = self.vocabulary.get(token) {
                *counts.entry(i).or_insert(0) += 1;
            }
        }

        let mut vector = vec![0.0; self.vocabulary.len()];
        for (i, count) in counts {
            vector[i] = count as f64 * self.idf[i];
        }
        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

/// Cosine similarity of unit vectors.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tokenize_drops_single_characters_and_punctuation() {
        assert_eq!(
            tokenize("Intel i7 işlemci, 6.5 inç; A_B x"),
            vec!["intel", "i7", "işlemci", "inç", "a_b"]
        );
    }

    #[test]
    fn stop_words_are_removed() {
        let v = TfidfVectorizer::fit(&["hafif ve taşınabilir", "ile güçlü"]);
        assert!(v.vocabulary().contains_key("hafif"));
        assert!(!v.vocabulary().contains_key("ve"));
        assert!(!v.vocabulary().contains_key("ile"));
    }

    #[test]
    fn smooth_idf_values() {
        let v = TfidfVectorizer::fit(&["ekran ram", "ekran ssd", "ekran"]);
        // df = 3 of n = 3
        assert_relative_eq!(v.idf("ekran").unwrap(), 1.0, epsilon = 1e-12);
        // df = 1 of n = 3
        assert_relative_eq!(v.idf("ram").unwrap(), 2.0_f64.ln() + 1.0, epsilon = 1e-12);
        assert!(v.idf("missing").is_none());
    }

    #[test]
    fn vectors_are_unit_length() {
        let v = TfidfVectorizer::fit(&["ekran ram ram", "ssd pil", "ve"]);
        for vec in &v.vectors()[..2] {
            let norm: f64 = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-12);
        }
        // a document made only of stop words stays the zero vector
        assert!(v.vectors()[2].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn identical_documents_have_cosine_one() {
        let v = TfidfVectorizer::fit(&["akıllı saat ekran", "akıllı saat ekran", "kulaklık"]);
        assert_relative_eq!(cosine(&v.vectors()[0], &v.vectors()[1]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(cosine(&v.vectors()[0], &v.vectors()[2]), 0.0);
        assert_relative_eq!(
            cosine(&v.transform("Akıllı saat, ekran!"), &v.vectors()[0]),
            1.0,
            epsilon = 1e-12
        );
    }
}
