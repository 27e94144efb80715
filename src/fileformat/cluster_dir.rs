use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use itertools::Itertools;
use walkdir::WalkDir;

use crate::error::require_dir;

/// Members files are called "cluster" followed by digits, without extension
pub static CLUSTER_FILE_PATTERN: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^cluster(\d+)$").unwrap());

/// 1-based number of a cluster, in the order its centroid was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusterId(NonZeroUsize);
impl ClusterId {
    pub fn new(i: usize) -> Option<ClusterId> {
        NonZeroUsize::new(i).map(ClusterId)
    }

    /// From a 0-based arena index
    pub fn from_index(index: usize) -> ClusterId {
        ClusterId(NonZeroUsize::MIN.saturating_add(index))
    }

    pub fn index(&self) -> usize {
        self.0.get() - 1
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Name of the members file
    pub fn members_file_name(&self) -> String {
        format!("cluster{}", self.0)
    }

    /// Name of the file holding only the centroid
    pub fn centroid_file_name(&self) -> String {
        format!("centroid_cluster{}.fasta", self.0)
    }

    /// Members file of a cluster written under this id
    pub fn members_file(&self) -> ClusterFile {
        ClusterFile {
            name: self.members_file_name(),
        }
    }
}
impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster{}", self.0)
    }
}

///////////////////////////////
/// A members file found in a cluster directory. The file name as found on disk is the identity;
/// the centroid and count file names are derived from it, so "cluster007" pairs with
/// "centroid_cluster007.fasta" and "cluster0" is a cluster like any other
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterFile {
    pub name: String,
}
impl ClusterFile {
    /// Recognize a members file name; anything else gives None
    pub fn from_name(name: &str) -> Option<ClusterFile> {
        if CLUSTER_FILE_PATTERN.is_match(name) {
            Some(ClusterFile {
                name: name.to_string(),
            })
        } else {
            None
        }
    }

    /// The cluster number as written, without leading zeros
    fn digits(&self) -> &str {
        let digits = &self.name["cluster".len()..];
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }

    /// The id this file would have been written under, if its name is the canonical one
    pub fn id(&self) -> Option<ClusterId> {
        let id = ClusterId::new(self.name["cluster".len()..].parse().ok()?)?;
        if id.members_file_name() == self.name {
            Some(id)
        } else {
            None
        }
    }

    pub fn centroid_file_name(&self) -> String {
        format!("centroid_{}.fasta", self.name)
    }

    /// Name of the per-sample count report
    pub fn count_file_name(&self) -> String {
        format!("{}_seq_count", self.name)
    }
}
impl Ord for ClusterFile {
    /// Numeric order of the cluster number, then by name
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let (a, b) = (self.digits(), other.digits());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.name.cmp(&other.name))
    }
}
impl PartialOrd for ClusterFile {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for ClusterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

///////////////////////////////
/// A directory holding materialized clusters
#[derive(Debug, Clone)]
pub struct ClusterDir {
    pub path: PathBuf,
}
impl ClusterDir {
    /// Use an existing directory
    pub fn open(p: &Path) -> anyhow::Result<ClusterDir> {
        require_dir(p)?;
        Ok(ClusterDir {
            path: p.to_path_buf(),
        })
    }

    /// Use a directory, creating it if needed
    pub fn create(p: &Path) -> anyhow::Result<ClusterDir> {
        std::fs::create_dir_all(p)?;
        Ok(ClusterDir {
            path: p.to_path_buf(),
        })
    }

    pub fn members_path(&self, id: ClusterId) -> PathBuf {
        self.path.join(id.members_file_name())
    }

    pub fn centroid_path(&self, id: ClusterId) -> PathBuf {
        self.path.join(id.centroid_file_name())
    }

    pub fn file_path(&self, file: &ClusterFile) -> PathBuf {
        self.path.join(&file.name)
    }

    pub fn file_centroid_path(&self, file: &ClusterFile) -> PathBuf {
        self.path.join(file.centroid_file_name())
    }

    /// Find all members files, sorted by cluster number. Other files are ignored
    pub fn list_clusters(&self) -> anyhow::Result<Vec<ClusterFile>> {
        let mut list = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(file) = entry.file_name().to_str().and_then(ClusterFile::from_name) {
                list.push(file);
            }
        }
        Ok(list.into_iter().sorted().collect())
    }

    /// Delete the members and centroid files of every cluster not numbered 1..=num_clusters,
    /// i.e. everything a new extraction of num_clusters clusters will not overwrite
    pub fn remove_stale_clusters(&self, num_clusters: usize) -> anyhow::Result<Vec<ClusterFile>> {
        let mut removed = Vec::new();
        for file in self.list_clusters()? {
            let is_current = file.id().map(|id| id.get() <= num_clusters).unwrap_or(false);
            if is_current {
                continue;
            }
            std::fs::remove_file(self.file_path(&file))?;
            match std::fs::remove_file(self.file_centroid_path(&file)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            log::info!("Removed {} left from an earlier run", file);
            removed.push(file);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[ClusterFile]) -> Vec<&str> {
        list.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn file_names() {
        let id = ClusterId::from_index(0);
        assert_eq!(id.get(), 1);
        assert_eq!(id.members_file_name(), "cluster1");
        assert_eq!(id.centroid_file_name(), "centroid_cluster1.fasta");
        assert_eq!(id.to_string(), "cluster1");
        assert_eq!(id.members_file().count_file_name(), "cluster1_seq_count");
        assert_eq!(id.members_file().id(), Some(id));
    }

    #[test]
    fn only_members_files_are_recognized() {
        assert!(ClusterFile::from_name("cluster12").is_some());
        assert!(ClusterFile::from_name("cluster0").is_some());
        assert!(ClusterFile::from_name("cluster007").is_some());
        assert!(ClusterFile::from_name("centroid_cluster12.fasta").is_none());
        assert!(ClusterFile::from_name("cluster12.fasta").is_none());
        assert!(ClusterFile::from_name("cluster12_seq_count").is_none());
        assert!(ClusterFile::from_name("cluster").is_none());
        assert!(ClusterFile::from_name(".cluster1.tmp").is_none());
    }

    #[test]
    fn names_with_leading_zeros_keep_their_own_files() {
        let file = ClusterFile::from_name("cluster007").unwrap();
        assert_eq!(file.centroid_file_name(), "centroid_cluster007.fasta");
        assert_eq!(file.count_file_name(), "cluster007_seq_count");
        assert_eq!(file.id(), None);
        assert_eq!(ClusterFile::from_name("cluster0").unwrap().id(), None);
    }

    #[test]
    fn listing_is_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "cluster10",
            "cluster2",
            "cluster007",
            "cluster7",
            "cluster0",
            "centroid_cluster2.fasta",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("cluster3")).unwrap();

        let cdir = ClusterDir::open(dir.path()).unwrap();
        let list = cdir.list_clusters().unwrap();
        assert_eq!(
            names(&list),
            vec!["cluster0", "cluster2", "cluster007", "cluster7", "cluster10"]
        );
        assert_eq!(cdir.file_path(&list[2]), dir.path().join("cluster007"));
    }

    #[test]
    fn stale_clusters_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "cluster1",
            "centroid_cluster1.fasta",
            "cluster2",
            "cluster3",
            "centroid_cluster3.fasta",
            "cluster01",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let cdir = ClusterDir::open(dir.path()).unwrap();
        let removed = cdir.remove_stale_clusters(2).unwrap();
        assert_eq!(names(&removed), vec!["cluster01", "cluster3"]);
        assert_eq!(names(&cdir.list_clusters().unwrap()), vec!["cluster1", "cluster2"]);
        assert!(dir.path().join("centroid_cluster1.fasta").exists());
        assert!(!dir.path().join("centroid_cluster3.fasta").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn missing_directory() {
        assert!(ClusterDir::open(Path::new("/nonexistent/clusters")).is_err());
    }
}
