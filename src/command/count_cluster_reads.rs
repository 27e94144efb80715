use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

use crate::error::require_dir;
use crate::error::PipelineError;
use crate::fileformat::discover_samples;
use crate::fileformat::read_fasta_ids;
use crate::fileformat::ClusterDir;
use crate::fileformat::ClusterFile;
use crate::fileformat::MembershipMatrix;
use crate::fileformat::RawReadSets;

use super::constants::COUNT_DEFAULT_PATH_OUT;
use super::threadcount::build_thread_pool;
use super::threadcount::determine_thread_counts_1;

#[derive(Args)]
pub struct CountClusterReadsCMD {
    /// Directory with cluster files, after singleton removal
    #[arg(value_parser)]
    pub path_clusters: PathBuf,

    /// Directory with one FASTQ file per sample; the file names define the samples
    #[arg(value_parser)]
    pub path_samples: PathBuf,

    /// Directory with one "rawseqids_<sample>" file per sample, one read id per line
    #[arg(value_parser)]
    pub path_rawseqids: PathBuf,

    /// Directory to store one count file per cluster in
    #[arg(short = 'o', value_parser, default_value = COUNT_DEFAULT_PATH_OUT)]
    pub path_out: PathBuf,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}
impl CountClusterReadsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_counts_1(self.num_threads_total)?;
        log::info!("Using threads {}", num_threads);

        let report = CountClusterReads::run(&CountClusterReads {
            path_clusters: self.path_clusters.clone(),
            path_samples: self.path_samples.clone(),
            path_rawseqids: self.path_rawseqids.clone(),
            path_out: self.path_out.clone(),
            num_threads,
        })?;
        report.check()?;

        log::info!("CountClusterReads has finished succesfully");
        Ok(())
    }
}

#[derive(Debug)]
pub struct CountReport {
    pub matrix: MembershipMatrix,
    pub missing_samples: Vec<String>,
    pub failed: Vec<ClusterFile>,
}
impl CountReport {
    pub fn check(&self) -> Result<()> {
        if !self.failed.is_empty() {
            anyhow::bail!("{} clusters could not be counted", self.failed.len());
        }
        Ok(())
    }
}

/// For every cluster, counts how many reads of each sample ended up in it
pub struct CountClusterReads {
    pub path_clusters: PathBuf,
    pub path_samples: PathBuf,
    pub path_rawseqids: PathBuf,
    pub path_out: PathBuf,
    pub num_threads: usize,
}
impl CountClusterReads {
    /// Run the algorithm
    pub fn run(params: &CountClusterReads) -> anyhow::Result<CountReport> {
        //All directories must exist before anything is read or written
        require_dir(&params.path_clusters)?;
        require_dir(&params.path_samples)?;
        require_dir(&params.path_rawseqids)?;

        let dir = ClusterDir::open(&params.path_clusters)?;
        let samples = discover_samples(&params.path_samples)?;
        let (sets, missing) = RawReadSets::load(&samples, &params.path_rawseqids)?;
        log::info!(
            "Counting reads of {} samples, {} samples skipped",
            sets.len(),
            missing.len()
        );

        let (matrix, mut failed) = CountClusterReads::count(&dir, &sets, params.num_threads)?;

        std::fs::create_dir_all(&params.path_out)?;
        let failed_write = matrix.write_reports(&params.path_out);
        log::info!(
            "Wrote counts for {} clusters to {}",
            matrix.num_clusters() - failed_write.len(),
            params.path_out.display()
        );
        failed.extend(failed_write);

        let missing_samples = missing
            .iter()
            .filter_map(PipelineError::skipped_sample)
            .map(|s| s.to_string())
            .collect();

        Ok(CountReport {
            matrix,
            missing_samples,
            failed,
        })
    }

    /// Count all clusters of a directory. The clusters that could not be read are returned
    /// beside the matrix
    pub fn count(
        dir: &ClusterDir,
        sets: &RawReadSets,
        num_threads: usize,
    ) -> anyhow::Result<(MembershipMatrix, Vec<ClusterFile>)> {
        let list_clusters = dir.list_clusters()?;
        let pool = build_thread_pool(num_threads)?;

        let results: Vec<(ClusterFile, Result<Vec<usize>>)> = pool.install(|| {
            list_clusters
                .into_par_iter()
                .map(|cluster| {
                    let counts = count_cluster(dir, &cluster, sets);
                    (cluster, counts)
                })
                .collect()
        });

        let mut matrix = MembershipMatrix::new(sets.sample_names());
        let mut failed = Vec::new();
        for (cluster, result) in results {
            match result {
                Ok(counts) => matrix.add_cluster(cluster, counts)?,
                Err(e) => {
                    log::error!("Failed to count {}: {:#}", cluster, e);
                    failed.push(cluster);
                }
            }
        }
        Ok((matrix, failed))
    }
}

/// Counts for one cluster, in sample order
fn count_cluster(dir: &ClusterDir, cluster: &ClusterFile, sets: &RawReadSets) -> Result<Vec<usize>> {
    let member_ids = read_fasta_ids(&dir.file_path(cluster))?;
    Ok(sets
        .iter()
        .map(|(_, read_ids)| intersection_size(&member_ids, read_ids))
        .collect())
}

pub fn intersection_size(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|id| large.contains(*id)).count()
}
