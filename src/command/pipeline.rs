use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::constants::COUNT_DEFAULT_PATH_OUT;
use super::constants::EXTRACT_DEFAULT_PATH_OUT;
use super::constants::FILTER_DEFAULT_MIN_MEMBERS;
use super::count_cluster_reads::CountClusterReads;
use super::count_cluster_reads::CountReport;
use super::extract_clusters::ExtractClusters;
use super::remove_singletons::RemoveSingletons;
use super::threadcount::determine_thread_counts_1;

#[derive(Args)]
pub struct PipelineCMD {
    /// Cluster table, "centroid<TAB>member" per row, no header
    #[arg(value_parser)]
    pub path_table: PathBuf,

    /// FASTA file with all sequences that were clustered
    #[arg(value_parser)]
    pub path_universe: PathBuf,

    /// Directory with one FASTQ file per sample; the file names define the samples
    #[arg(value_parser)]
    pub path_samples: PathBuf,

    /// Directory with one "rawseqids_<sample>" file per sample
    #[arg(value_parser)]
    pub path_rawseqids: PathBuf,

    /// Directory to store clusters in
    #[arg(short = 'c', value_parser, default_value = EXTRACT_DEFAULT_PATH_OUT)]
    pub path_clusters: PathBuf,

    /// Directory to store count files in
    #[arg(short = 'o', value_parser, default_value = COUNT_DEFAULT_PATH_OUT)]
    pub path_out: PathBuf,

    /// Clusters with fewer members than this are deleted
    #[arg(long = "min-members", value_parser = clap::value_parser!(usize), default_value_t = FILTER_DEFAULT_MIN_MEMBERS)]
    pub min_members: usize,

    //Thread settings
    #[arg(short = '@', value_parser = clap::value_parser!(usize))]
    num_threads_total: Option<usize>,
}
impl PipelineCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let num_threads = determine_thread_counts_1(self.num_threads_total)?;
        log::info!("Using threads {}", num_threads);

        let report = Pipeline::run(&Pipeline {
            path_table: self.path_table.clone(),
            path_universe: self.path_universe.clone(),
            path_samples: self.path_samples.clone(),
            path_rawseqids: self.path_rawseqids.clone(),
            path_clusters: self.path_clusters.clone(),
            path_out: self.path_out.clone(),
            min_members: self.min_members,
            num_threads,
        })?;
        report.check()?;

        log::info!("Pipeline has finished succesfully");
        Ok(())
    }
}

/// Extraction, singleton removal and counting in one go
pub struct Pipeline {
    pub path_table: PathBuf,
    pub path_universe: PathBuf,
    pub path_samples: PathBuf,
    pub path_rawseqids: PathBuf,
    pub path_clusters: PathBuf,
    pub path_out: PathBuf,
    pub min_members: usize,
    pub num_threads: usize,
}
impl Pipeline {
    /// Run all stages. A stage only starts if the previous one had no failed clusters
    pub fn run(params: &Pipeline) -> anyhow::Result<CountReport> {
        //Fail before extracting if the counting inputs are not there
        crate::error::require_dir(&params.path_samples)?;
        crate::error::require_dir(&params.path_rawseqids)?;

        log::info!("Extracting clusters");
        ExtractClusters::run(&ExtractClusters {
            path_table: params.path_table.clone(),
            path_universe: params.path_universe.clone(),
            path_out: params.path_clusters.clone(),
            num_threads: params.num_threads,
        })?
        .check()?;

        log::info!("Removing clusters with fewer than {} members", params.min_members);
        RemoveSingletons::run(&RemoveSingletons {
            path_clusters: params.path_clusters.clone(),
            min_members: params.min_members,
            num_threads: params.num_threads,
        })?
        .check()?;

        log::info!("Counting reads per cluster");
        CountClusterReads::run(&CountClusterReads {
            path_clusters: params.path_clusters.clone(),
            path_samples: params.path_samples.clone(),
            path_rawseqids: params.path_rawseqids.clone(),
            path_out: params.path_out.clone(),
            num_threads: params.num_threads,
        })
    }
}
