// Candidate selection: which files in the meme directory are still unused,
// and the random draw of one run's batch from them.

use crate::errors::{MemeError, MemeResult};
use crate::used::UsedSet;
use rand::seq::index;
use rand::Rng;
use std::fs;
use std::path::Path;

/// Regular files directly inside `dir` whose names are not in `used`, in
/// directory-listing order. Symlinks count when they resolve to a file. Names
/// containing a line break are skipped since the used-set cannot hold them.
pub fn list_eligible(dir: &Path, used: &UsedSet) -> MemeResult<Vec<String>> {
    let unavailable = |source| MemeError::SourceUnavailable {
        path: dir.to_path_buf(),
        source,
    };
    let mut eligible = Vec::new();
    for entry in fs::read_dir(dir).map_err(unavailable)? {
        let entry = entry.map_err(unavailable)?;
        let is_file = fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            log::warn!("Skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        if name.contains(['\n', '\r']) {
            log::warn!("Skipping {:?}: a line break in the name cannot be recorded as used", name);
            continue;
        }
        if used.contains(&name) {
            continue;
        }
        eligible.push(name);
    }
    Ok(eligible)
}

/// Draw `limit` distinct items uniformly without replacement. Asking for more
/// than `eligible` holds is an error rather than a smaller batch.
pub fn sample<R: Rng + ?Sized>(
    eligible: &[String],
    limit: usize,
    rng: &mut R,
) -> MemeResult<Vec<String>> {
    if limit > eligible.len() {
        return Err(MemeError::InsufficientCandidates {
            requested: limit,
            available: eligible.len(),
        });
    }
    Ok(index::sample(rng, eligible.len(), limit)
        .into_iter()
        .map(|i| eligible[i].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::used::UsedStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use tempfile::tempdir;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_only_unused_regular_files() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(root.join(name), name.as_bytes()).unwrap();
        }
        fs::create_dir(root.join("folder.jpg")).unwrap();

        let used = UsedSet::new(names(&["b.jpg"]));
        let eligible: HashSet<String> = list_eligible(root, &used).unwrap().into_iter().collect();
        let expected: HashSet<String> = names(&["a.jpg", "c.jpg"]).into_iter().collect();
        assert_eq!(eligible, expected);
    }

    #[test]
    fn committed_name_with_trailing_space_is_not_eligible_again() {
        let temp = tempdir().unwrap();
        let memes = temp.path().join("memes");
        fs::create_dir(&memes).unwrap();
        fs::write(memes.join("cat.jpg "), b"meow").unwrap();
        fs::write(memes.join("cat.jpg"), b"meow").unwrap();
        let store = UsedStore::new(temp.path().join("used.txt"));

        let first = list_eligible(&memes, &store.load().unwrap()).unwrap();
        assert_eq!(first.len(), 2);
        store.commit(&names(&["cat.jpg "])).unwrap();

        let second = list_eligible(&memes, &store.load().unwrap()).unwrap();
        assert_eq!(second, names(&["cat.jpg"]));
    }

    #[test]
    fn names_with_line_breaks_are_skipped() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("ok.jpg"), b"x").unwrap();
        fs::write(root.join("two\nlines.jpg"), b"x").unwrap();
        fs::write(root.join("carriage\r.jpg"), b"x").unwrap();

        let eligible = list_eligible(root, &UsedSet::default()).unwrap();
        assert_eq!(eligible, names(&["ok.jpg"]));
    }

    #[test]
    fn missing_directory_is_reported() {
        let temp = tempdir().unwrap();
        let err = list_eligible(&temp.path().join("nope"), &UsedSet::default()).unwrap_err();
        assert!(matches!(err, MemeError::SourceUnavailable { .. }));
    }

    #[test]
    fn sample_returns_exact_count_of_distinct_members() {
        let eligible = names(&["a", "b", "c", "d", "e", "f"]);
        let pool: HashSet<&String> = eligible.iter().collect();
        for seed in 0..16u8 {
            let mut rng = StdRng::from_seed([seed; 32]);
            let batch = sample(&eligible, 4, &mut rng).unwrap();
            assert_eq!(batch.len(), 4);
            let distinct: HashSet<&String> = batch.iter().collect();
            assert_eq!(distinct.len(), 4);
            assert!(batch.iter().all(|item| pool.contains(item)));
        }
    }

    #[test]
    fn sample_of_whole_pool_is_a_permutation() {
        let eligible = names(&["a", "b", "c"]);
        let mut rng = StdRng::from_seed([7; 32]);
        let mut batch = sample(&eligible, 3, &mut rng).unwrap();
        batch.sort();
        assert_eq!(batch, eligible);
    }

    #[test]
    fn sample_larger_than_pool_fails() {
        let eligible = names(&["a"]);
        let mut rng = StdRng::from_seed([0; 32]);
        let err = sample(&eligible, 2, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            MemeError::InsufficientCandidates {
                requested: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn sample_of_zero_is_empty() {
        let mut rng = StdRng::from_seed([0; 32]);
        assert!(sample(&[], 0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn every_item_is_reachable() {
        let eligible = names(&["a", "b", "c", "d"]);
        let mut rng = StdRng::from_seed([42; 32]);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(sample(&eligible, 1, &mut rng).unwrap());
        }
        assert_eq!(seen.len(), eligible.len());
    }
}
