use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

/// Pick an image from `<folder>/<keyword>/`. Files whose name mentions one of
/// `keywords` are preferred; otherwise any file in the directory will do.
pub fn pick_image<R: Rng + ?Sized>(folder: &Path, keyword: &str, keywords: &[String], rng: &mut R) -> Option<PathBuf> {
    let dir = folder.join(keyword);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No images in {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    images.sort();

    let matches: Vec<&PathBuf> = images
        .iter()
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
            keywords.iter().any(|kw| name.contains(&kw.to_lowercase()))
        })
        .collect();

    if let Some(path) = matches.choose(rng) {
        return Some((*path).clone());
    }
    images.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_prefers_keyword_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let bitcoin = dir.path().join("bitcoin");
        std::fs::create_dir_all(&bitcoin).unwrap();
        std::fs::write(bitcoin.join("generic.png"), b"x").unwrap();
        std::fs::write(bitcoin.join("bitcoin-coin.png"), b"x").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let picked = pick_image(dir.path(), "bitcoin", &["bitcoin".to_string()], &mut rng).unwrap();
            assert!(picked.ends_with("bitcoin-coin.png"));
        }
        let any = pick_image(dir.path(), "bitcoin", &["nft".to_string()], &mut rng).unwrap();
        assert!(any.starts_with(&bitcoin));
    }

    #[test]
    fn test_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_image(dir.path(), "nft", &[], &mut rng).is_none());
    }
}
