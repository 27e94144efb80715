use std::path::Path;

use crate::fileformat::ClusterFile;

#[derive(Debug, serde::Serialize, serde::Deserialize, Eq, PartialEq)]
struct CountRow {
    sample: String,
    count: usize,
}

///////////////////////////////
/// Counts of reads per sample (columns) for each cluster (rows). Every cluster has one count
/// for every sample, zeros included
#[derive(Debug)]
pub struct MembershipMatrix {
    pub samples: Vec<String>,
    pub clusters: Vec<ClusterFile>,
    pub counts: Vec<Vec<usize>>,
}
impl MembershipMatrix {
    pub fn new(samples: Vec<String>) -> MembershipMatrix {
        MembershipMatrix {
            samples,
            clusters: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn add_cluster(&mut self, cluster: ClusterFile, counts: Vec<usize>) -> anyhow::Result<()> {
        if counts.len() != self.samples.len() {
            anyhow::bail!(
                "{} has {} counts but there are {} samples",
                cluster,
                counts.len(),
                self.samples.len()
            );
        }
        self.clusters.push(cluster);
        self.counts.push(counts);
        Ok(())
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Get (sample, count) for one cluster, in sample order
    pub fn rows_for(&self, cluster: &str) -> Option<Vec<(&str, usize)>> {
        let i = self.clusters.iter().position(|c| c.name == cluster)?;
        Some(
            self.samples
                .iter()
                .map(|s| s.as_str())
                .zip(self.counts[i].iter().copied())
                .collect(),
        )
    }

    /// Write one report per cluster, "sample<TAB>count" per row without header.
    /// Returns the clusters whose report could not be written
    pub fn write_reports(&self, dir: &Path) -> Vec<ClusterFile> {
        let mut failed = Vec::new();
        for (cluster, counts) in self.clusters.iter().zip(self.counts.iter()) {
            let p = dir.join(cluster.count_file_name());
            if let Err(e) = write_count_report(&p, &self.samples, counts) {
                log::error!("Failed to write {}: {:#}", p.display(), e);
                failed.push(cluster.clone());
            }
        }
        failed
    }
}

/// Sample names are written as they are, never quoted
pub fn write_count_report(p: &Path, samples: &[String], counts: &[usize]) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_path(p)?;

    for (sample, count) in samples.iter().zip(counts.iter()) {
        writer.serialize(CountRow {
            sample: sample.clone(),
            count: *count,
        })?;
    }
    writer.flush()?;
    Ok(())
}
