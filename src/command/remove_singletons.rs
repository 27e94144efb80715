use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

use crate::fileformat::count_fasta_records;
use crate::fileformat::ClusterDir;
use crate::fileformat::ClusterFile;

use super::constants::FILTER_DEFAULT_MIN_MEMBERS;
use super::threadcount::build_thread_pool;
use super::threadcount::determine_thread_counts_1;

#[derive(Args)]
pub struct RemoveSingletonsCMD {
    /// Directory with cluster files, as written by extract-clusters
    #[arg(value_parser)]
    pub path_clusters: PathBuf,

    /// Clusters with fewer members than this are deleted
    #[arg(long = "min-members", value_parser = clap::value_parser!(usize), default_value_t = FILTER_DEFAULT_MIN_MEMBERS)]
    pub min_members: usize,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}
impl RemoveSingletonsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_counts_1(self.num_threads_total)?;
        log::info!("Using threads {}", num_threads);

        let report = RemoveSingletons::run(&RemoveSingletons {
            path_clusters: self.path_clusters.clone(),
            min_members: self.min_members,
            num_threads,
        })?;
        report.check()?;

        log::info!("RemoveSingletons has finished succesfully");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Kept,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredCluster {
    pub cluster: ClusterFile,
    pub num_members: usize,
    pub outcome: FilterOutcome,
}

#[derive(Debug, Default)]
pub struct FilterReport {
    pub clusters: Vec<FilteredCluster>,
    pub failed: Vec<ClusterFile>,
}
impl FilterReport {
    pub fn kept(&self) -> Vec<ClusterFile> {
        self.with_outcome(FilterOutcome::Kept)
    }

    pub fn removed(&self) -> Vec<ClusterFile> {
        self.with_outcome(FilterOutcome::Removed)
    }

    fn with_outcome(&self, outcome: FilterOutcome) -> Vec<ClusterFile> {
        self.clusters
            .iter()
            .filter(|c| c.outcome == outcome)
            .map(|c| c.cluster.clone())
            .collect()
    }

    pub fn check(&self) -> Result<()> {
        if !self.failed.is_empty() {
            anyhow::bail!("{} clusters could not be removed", self.failed.len());
        }
        Ok(())
    }
}

/// Deletes clusters that have too few members, together with their centroid file
pub struct RemoveSingletons {
    pub path_clusters: PathBuf,
    pub min_members: usize,
    pub num_threads: usize,
}
impl RemoveSingletons {
    /// Run the algorithm
    pub fn run(params: &RemoveSingletons) -> anyhow::Result<FilterReport> {
        let dir = ClusterDir::open(&params.path_clusters)?;
        let report = RemoveSingletons::filter(&dir, params.min_members, params.num_threads)?;
        log::info!(
            "Kept {} clusters, removed {} with fewer than {} members",
            report.kept().len(),
            report.removed().len(),
            params.min_members
        );
        Ok(report)
    }

    pub fn filter(
        dir: &ClusterDir,
        min_members: usize,
        num_threads: usize,
    ) -> anyhow::Result<FilterReport> {
        let list_clusters = dir.list_clusters()?;
        let pool = build_thread_pool(num_threads)?;

        let results: Vec<(ClusterFile, Result<FilteredCluster>)> = pool.install(|| {
            list_clusters
                .into_par_iter()
                .map(|cluster| {
                    let result = filter_cluster(dir, &cluster, min_members);
                    (cluster, result)
                })
                .collect()
        });

        let mut report = FilterReport::default();
        for (cluster, result) in results {
            match result {
                Ok(c) => report.clusters.push(c),
                Err(e) => {
                    log::error!("Failed to remove {}: {:#}", cluster, e);
                    report.failed.push(cluster);
                }
            }
        }
        Ok(report)
    }
}

/// Works on the file as it was found, so "cluster007" is never confused with "cluster7"
fn filter_cluster(
    dir: &ClusterDir,
    cluster: &ClusterFile,
    min_members: usize,
) -> Result<FilteredCluster> {
    let path_members = dir.file_path(cluster);

    //A file that cannot be parsed counts as empty
    let num_members = match count_fasta_records(&path_members) {
        Ok(n) => n,
        Err(e) => {
            log::warn!("Could not read {}, counting it as empty: {:#}", cluster, e);
            0
        }
    };

    if num_members >= min_members {
        log::debug!("{} has {} members, keeping it", cluster, num_members);
        return Ok(FilteredCluster {
            cluster: cluster.clone(),
            num_members,
            outcome: FilterOutcome::Kept,
        });
    }

    std::fs::remove_file(&path_members)?;
    let path_centroid = dir.file_centroid_path(cluster);
    match std::fs::remove_file(&path_centroid) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    log::info!("Removed {}, it has {} members", cluster, num_members);

    Ok(FilteredCluster {
        cluster: cluster.clone(),
        num_members,
        outcome: FilterOutcome::Removed,
    })
}
