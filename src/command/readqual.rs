use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::fileformat::fastq::read_qualities;
use crate::fileformat::fastq::ReadQuality;

use super::constants::READQUAL_DEFAULT_PATH_OUT;

#[derive(Args)]
pub struct ReadQualCMD {
    /// FASTQ file, possibly compressed
    #[arg(long = "fastq", value_parser)]
    pub path_in: PathBuf,

    /// TSV file to store length and mean quality of each read in
    #[arg(short = 'o', value_parser, default_value = READQUAL_DEFAULT_PATH_OUT)]
    pub path_out: PathBuf,
}
impl ReadQualCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        ReadQual::run(&ReadQual {
            path_in: self.path_in.clone(),
            path_out: self.path_out.clone(),
        })?;
        log::info!("ReadQual has finished succesfully");
        Ok(())
    }
}

/// Length and mean quality of every read; the input for a length-vs-quality plot
pub struct ReadQual {
    pub path_in: PathBuf,
    pub path_out: PathBuf,
}
impl ReadQual {
    pub fn run(params: &ReadQual) -> anyhow::Result<Vec<ReadQuality>> {
        let list = read_qualities(&params.path_in)?;
        if list.is_empty() {
            anyhow::bail!("{} contains no reads", params.path_in.display());
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&params.path_out)?;
        for rq in &list {
            writer.serialize(rq)?;
        }
        writer.flush()?;

        let max_length = list.iter().map(|r| r.length).max().unwrap_or(0);
        let max_quality = list.iter().map(|r| r.mean_quality).fold(0.0, f64::max);
        log::info!(
            "{} reads, longest {} bp, highest mean quality {:.1}",
            list.len(),
            max_length,
            max_quality
        );
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_table_with_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("reads.fastq");
        std::fs::write(&path_in, "@r1\nACGT\n+\nIIII\n").unwrap();
        let path_out = tmp.path().join("out.tsv");

        let list = ReadQual::run(&ReadQual {
            path_in,
            path_out: path_out.clone(),
        })
        .unwrap();
        assert_eq!(list.len(), 1);

        let content = std::fs::read_to_string(&path_out).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("id\tlength\tmean_quality"));
        let fields: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(&fields[..2], &["r1", "4"]);
        let q: f64 = fields[2].parse().unwrap();
        assert!((q - 40.0).abs() < 1e-6);
    }

    #[test]
    fn no_reads_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("reads.fastq");
        std::fs::write(&path_in, "").unwrap();
        assert!(ReadQual::run(&ReadQual {
            path_in,
            path_out: tmp.path().join("out.tsv"),
        })
        .is_err());
    }
}
