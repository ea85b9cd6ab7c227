use std::collections::{HashMap, HashSet};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("nothing to compare against")]
    EmptyCorpus,

    #[error("empty vocabulary; documents contain only stop words")]
    EmptyVocabulary,
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "bottom", "but", "by", "can", "cannot", "cant", "could", "couldnt", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "first", "five", "for", "former",
    "formerly", "forty", "four", "from", "front", "full", "further", "get", "give", "go", "had",
    "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "ie",
    "if", "in", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last",
    "latter", "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile",
    "might", "mine", "more", "moreover", "most", "mostly", "move", "much", "must", "my",
    "myself", "name", "namely", "neither", "never", "nevertheless", "next", "nine", "no",
    "nobody", "none", "noone", "nor", "not", "nothing", "now", "nowhere", "of", "off", "often",
    "on", "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "part", "per", "perhaps", "please", "put", "rather", "re",
    "same", "see", "seem", "seemed", "seeming", "seems", "several", "she", "should", "show",
    "side", "since", "six", "sixty", "so", "some", "somehow", "someone", "something",
    "sometime", "sometimes", "somewhere", "still", "such", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "third", "this", "those", "though",
    "three", "through", "throughout", "thru", "thus", "to", "together", "too", "top", "toward",
    "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever", "whether",
    "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

type SparseVector = HashMap<String, f64>;

/// TF-IDF vectorizer with smoothed idf and l2-normalized rows.
#[derive(Debug, Clone)]
pub struct TfIdf {
    max_features: usize,
    stop_words: HashSet<&'static str>,
}

impl TfIdf {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Lowercased word tokens of two or more characters, stop words removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2 && !self.stop_words.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// Cosine similarity of `query` against each document of `corpus`, in
    /// corpus order. The vector space is fitted over the query and the corpus
    /// together.
    pub fn similarities(&self, query: &str, corpus: &[&str]) -> Result<Vec<f64>, SimilarityError> {
        if corpus.is_empty() {
            return Err(SimilarityError::EmptyCorpus);
        }

        let docs: Vec<HashMap<String, usize>> = std::iter::once(query)
            .chain(corpus.iter().copied())
            .map(|doc| {
                let mut counts = HashMap::new();
                for token in self.tokenize(doc) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let vocabulary = self.vocabulary(&docs);
        if vocabulary.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let n = docs.len() as f64;
        let idf: HashMap<&str, f64> = vocabulary
            .iter()
            .map(|term| {
                let df = docs.iter().filter(|d| d.contains_key(*term)).count() as f64;
                (*term, ((1.0 + n) / (1.0 + df)).ln() + 1.0)
            })
            .collect();

        let vectors: Vec<SparseVector> = docs
            .iter()
            .map(|counts| {
                let mut vector: SparseVector = counts
                    .iter()
                    .filter_map(|(term, &tf)| idf.get(term.as_str()).map(|w| (term.clone(), tf as f64 * w)))
                    .collect();
                let norm = vector.values().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    vector.values_mut().for_each(|v| *v /= norm);
                }
                vector
            })
            .collect();

        let (query_vector, corpus_vectors) = vectors.split_first().ok_or(SimilarityError::EmptyCorpus)?;
        Ok(corpus_vectors.iter().map(|doc| dot(query_vector, doc)).collect())
    }

    /// Terms kept in the vector space: the `max_features` most frequent across
    /// all documents, ties broken alphabetically.
    fn vocabulary<'a>(&self, docs: &'a [HashMap<String, usize>]) -> HashSet<&'a str> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            for (term, count) in doc {
                *totals.entry(term.as_str()).or_insert(0) += count;
            }
        }
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(self.max_features).map(|(term, _)| term).collect()
    }
}

fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, v)| large.get(term).map(|w| v * w))
        .sum()
}
