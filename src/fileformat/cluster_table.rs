use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use crate::error::require_file;
use crate::error::PipelineError;
use crate::fileformat::ClusterId;

/// One cluster: its centroid and members, in the order they appeared in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub centroid: String,
    pub members: Vec<String>,
}

///////////////////////////////
/// Centroid -> members, stored as an arena of clusters addressed by index.
/// Centroids keep the order in which they were first seen
#[derive(Debug, Default)]
pub struct ClusterMapping {
    clusters: Vec<Cluster>,
    index_of_centroid: HashMap<String, usize>,
    cluster_of_member: HashMap<String, usize>,
    num_conflicting_members: usize,
}
impl ClusterMapping {
    pub fn new() -> ClusterMapping {
        ClusterMapping::default()
    }

    /// Add one row of the table. Duplicate members within a cluster are kept as they are
    pub fn add_row(&mut self, centroid: &str, member: &str) {
        let index = match self.index_of_centroid.get(centroid) {
            Some(index) => *index,
            None => {
                let index = self.clusters.len();
                self.clusters.push(Cluster {
                    centroid: centroid.to_string(),
                    members: Vec::new(),
                });
                self.index_of_centroid.insert(centroid.to_string(), index);
                index
            }
        };

        //Upstream tables should be partitions; only report if they are not
        match self.cluster_of_member.get(member) {
            Some(&other) if other != index => {
                self.num_conflicting_members += 1;
                log::warn!(
                    "Sequence '{}' is a member of both centroid '{}' and '{}'",
                    member,
                    self.clusters[other].centroid,
                    centroid
                );
            }
            Some(_) => {}
            None => {
                self.cluster_of_member.insert(member.to_string(), index);
            }
        }

        self.clusters[index].members.push(member.to_string());
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.index())
    }

    pub fn num_conflicting_members(&self) -> usize {
        self.num_conflicting_members
    }

    /// Iterate over clusters along with their 1-based id
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &Cluster)> {
        self.clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (ClusterId::from_index(i), c))
    }

    /// Parse a two-column, tab-separated table without header.
    /// Any row that does not have exactly two fields is an error
    pub fn from_reader<R: Read>(r: R, source: &Path) -> anyhow::Result<ClusterMapping> {
        let mut mapping = ClusterMapping::new();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(r);

        for result in reader.records() {
            let record = result?;
            if record.len() != 2 {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(PipelineError::MalformedRow {
                    path: source.to_path_buf(),
                    line,
                    fields: record.len(),
                }
                .into());
            }
            mapping.add_row(record[0].trim(), record[1].trim());
        }

        Ok(mapping)
    }

    pub fn from_path(p: &Path) -> anyhow::Result<ClusterMapping> {
        require_file(p)?;
        let file = File::open(p)?;
        let mapping = ClusterMapping::from_reader(BufReader::new(file), p)?;
        log::info!("Read {} clusters from {}", mapping.len(), p.display());
        Ok(mapping)
    }
}
