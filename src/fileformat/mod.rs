pub mod fasta;
pub mod cluster_table;
pub mod cluster_dir;
pub mod rawseqids;
pub mod count_report;
pub mod fastq;

pub use fasta::SequenceRecord;
pub use fasta::SequenceUniverse;
pub use fasta::read_fasta_records;
pub use fasta::read_fasta_ids;
pub use fasta::count_fasta_records;
pub use fasta::write_fasta_atomic;

pub use cluster_table::Cluster;
pub use cluster_table::ClusterMapping;

pub use cluster_dir::ClusterId;
pub use cluster_dir::ClusterDir;
pub use cluster_dir::ClusterFile;

pub use rawseqids::RawReadSets;
pub use rawseqids::discover_samples;

pub use count_report::MembershipMatrix;
