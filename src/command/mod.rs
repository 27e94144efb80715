use clap::Subcommand;

pub mod constants;
pub mod count_cluster_reads;
pub mod extract_clusters;
pub mod pipeline;
pub mod readqual;
pub mod remove_singletons;
pub mod threadcount;

pub use count_cluster_reads::{CountClusterReads, CountClusterReadsCMD, CountReport};
pub use extract_clusters::{ExtractClusters, ExtractClustersCMD, ExtractReport};
pub use pipeline::{Pipeline, PipelineCMD};
pub use readqual::{ReadQual, ReadQualCMD};
pub use remove_singletons::{FilterOutcome, FilterReport, RemoveSingletons, RemoveSingletonsCMD};
pub use threadcount::determine_thread_counts_1;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Write one FASTA file per cluster of a centroid/member table
    ExtractClusters(ExtractClustersCMD),
    /// Delete clusters with too few members
    RemoveSingletons(RemoveSingletonsCMD),
    /// Count the reads of each sample in every cluster
    CountClusterReads(CountClusterReadsCMD),
    /// Run extract-clusters, remove-singletons and count-cluster-reads in a row
    Pipeline(PipelineCMD),
    /// Tabulate length and mean quality of the reads in a FASTQ file
    Readqual(ReadQualCMD),
}
impl Commands {
    pub fn try_execute(&mut self) -> anyhow::Result<()> {
        match self {
            Commands::ExtractClusters(cmd) => cmd.try_execute(),
            Commands::RemoveSingletons(cmd) => cmd.try_execute(),
            Commands::CountClusterReads(cmd) => cmd.try_execute(),
            Commands::Pipeline(cmd) => cmd.try_execute(),
            Commands::Readqual(cmd) => cmd.try_execute(),
        }
    }
}
