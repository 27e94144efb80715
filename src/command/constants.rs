pub const EXTRACT_DEFAULT_PATH_OUT: &str = "mmseqs2_clusters";
pub const EXTRACT_ENV_PATH_UNIVERSE: &str = "HQ_fastq";

pub const FILTER_DEFAULT_MIN_MEMBERS: usize = 2;

pub const COUNT_DEFAULT_PATH_OUT: &str = ".";

pub const READQUAL_DEFAULT_PATH_OUT: &str = "length_vs_quality.tsv";
