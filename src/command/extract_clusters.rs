use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

use crate::error::require_file;
use crate::error::PipelineError;
use crate::fileformat::write_fasta_atomic;
use crate::fileformat::Cluster;
use crate::fileformat::ClusterDir;
use crate::fileformat::ClusterId;
use crate::fileformat::ClusterMapping;
use crate::fileformat::SequenceUniverse;

use super::constants::EXTRACT_DEFAULT_PATH_OUT;
use super::constants::EXTRACT_ENV_PATH_UNIVERSE;
use super::threadcount::build_thread_pool;
use super::threadcount::determine_thread_counts_1;

#[derive(Args)]
pub struct ExtractClustersCMD {
    /// Cluster table, "centroid<TAB>member" per row, no header
    #[arg(value_parser)]
    pub path_table: PathBuf,

    /// FASTA file with all sequences that were clustered
    #[arg(value_parser, env = EXTRACT_ENV_PATH_UNIVERSE)]
    pub path_universe: PathBuf,

    /// Directory to store one FASTA file per cluster in
    #[arg(short = 'o', value_parser, default_value = EXTRACT_DEFAULT_PATH_OUT)]
    pub path_out: PathBuf,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}
impl ExtractClustersCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_counts_1(self.num_threads_total)?;
        log::info!("Using threads {}", num_threads);

        let report = ExtractClusters::run(&ExtractClusters {
            path_table: self.path_table.clone(),
            path_universe: self.path_universe.clone(),
            path_out: self.path_out.clone(),
            num_threads,
        })?;
        report.check()?;

        log::info!("ExtractClusters has finished succesfully");
        Ok(())
    }
}

/// What was written for one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedCluster {
    pub id: ClusterId,
    pub num_members: usize,
    pub num_missing_members: usize,
    pub has_centroid: bool,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub clusters: Vec<MaterializedCluster>,
    pub failed: Vec<ClusterId>,
}
impl ExtractReport {
    /// Turn failed clusters into an error, once all others have been written
    pub fn check(&self) -> Result<()> {
        if !self.failed.is_empty() {
            anyhow::bail!("{} clusters could not be written", self.failed.len());
        }
        Ok(())
    }
}

/// Splits a centroid/member table into one FASTA file per cluster, plus one file holding the
/// centroid only
pub struct ExtractClusters {
    pub path_table: PathBuf,
    pub path_universe: PathBuf,
    pub path_out: PathBuf,
    pub num_threads: usize,
}
impl ExtractClusters {
    /// Run the algorithm
    pub fn run(params: &ExtractClusters) -> anyhow::Result<ExtractReport> {
        //Check both inputs before reading either, so nothing is written if one is missing
        require_file(&params.path_table)?;
        require_file(&params.path_universe)?;

        //The full table is parsed before any output is produced; malformed rows abort here
        let mapping = ClusterMapping::from_path(&params.path_table)?;
        let universe = SequenceUniverse::from_path(&params.path_universe)?;
        let dir = ClusterDir::create(&params.path_out)?;

        let report = ExtractClusters::materialize(&mapping, &universe, &dir, params.num_threads)?;

        let num_members: usize = report.clusters.iter().map(|c| c.num_members).sum();
        let num_missing: usize = report.clusters.iter().map(|c| c.num_missing_members).sum();
        let num_no_centroid = report.clusters.iter().filter(|c| !c.has_centroid).count();
        log::info!(
            "Wrote {} clusters with {} sequences to {}",
            report.clusters.len(),
            num_members,
            params.path_out.display()
        );
        if num_missing > 0 || num_no_centroid > 0 {
            log::info!(
                "{} members and {} centroids were not in the sequence file",
                num_missing,
                num_no_centroid
            );
        }
        Ok(report)
    }

    /// Write all clusters of a mapping into a directory, replacing whatever clusters it held.
    /// Clusters are written in parallel; a cluster that fails is reported and the others still
    /// get written
    pub fn materialize(
        mapping: &ClusterMapping,
        universe: &SequenceUniverse,
        dir: &ClusterDir,
        num_threads: usize,
    ) -> anyhow::Result<ExtractReport> {
        //Clusters of an earlier run that this mapping does not overwrite would otherwise be
        //picked up by the filter and the counter
        let stale = dir.remove_stale_clusters(mapping.len())?;
        if !stale.is_empty() {
            log::info!("Removed {} clusters left from an earlier run", stale.len());
        }

        let pool = build_thread_pool(num_threads)?;
        let list_clusters: Vec<(ClusterId, &Cluster)> = mapping.iter().collect();

        let results: Vec<(ClusterId, Result<MaterializedCluster>)> = pool.install(|| {
            list_clusters
                .par_iter()
                .map(|(id, cluster)| (*id, materialize_cluster(dir, *id, cluster, universe)))
                .collect()
        });

        let mut report = ExtractReport::default();
        for (id, result) in results {
            match result {
                Ok(c) => report.clusters.push(c),
                Err(e) => {
                    log::error!("Failed to write {}: {:#}", id, e);
                    report.failed.push(id);
                }
            }
        }
        Ok(report)
    }
}

fn materialize_cluster(
    dir: &ClusterDir,
    id: ClusterId,
    cluster: &Cluster,
    universe: &SequenceUniverse,
) -> Result<MaterializedCluster> {
    //Members absent from the universe are expected when it was subsampled upstream
    let mut members = Vec::with_capacity(cluster.members.len());
    let mut num_missing_members = 0;
    for member in &cluster.members {
        match universe.get(member) {
            Some(rec) => members.push(rec),
            None => {
                num_missing_members += 1;
                log::debug!(
                    "{}",
                    PipelineError::MissingMember {
                        cluster: id.get(),
                        member: member.clone()
                    }
                );
            }
        }
    }
    write_fasta_atomic(&dir.members_path(id), members.iter().copied())?;

    let path_centroid = dir.centroid_path(id);
    let has_centroid = match universe.get(&cluster.centroid) {
        Some(rec) => {
            write_fasta_atomic(&path_centroid, [rec])?;
            true
        }
        None => {
            log::debug!(
                "{}",
                PipelineError::MissingCentroid {
                    cluster: id.get(),
                    centroid: cluster.centroid.clone()
                }
            );
            //Do not leave a centroid from an earlier run next to the new members file
            if path_centroid.exists() {
                std::fs::remove_file(&path_centroid)?;
            }
            false
        }
    };

    Ok(MaterializedCluster {
        id,
        num_members: members.len(),
        num_missing_members,
        has_centroid,
    })
}
