use std::io::Read;
use std::path::Path;

use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record as FastqRecord;

use crate::error::require_file;
use crate::fileformat::fasta::open_maybe_compressed;

pub const PHRED_OFFSET: u8 = 33;
pub const MAX_PHRED: usize = 128;

/// Error probability for each Phred score 0..=MAX_PHRED
pub static PHRED_ERROR_PROB: std::sync::LazyLock<[f64; MAX_PHRED + 1]> =
    std::sync::LazyLock::new(|| {
        let mut tab = [0.0; MAX_PHRED + 1];
        for (q, p) in tab.iter_mut().enumerate() {
            *p = 10f64.powf(q as f64 / -10.0);
        }
        tab
    });

/// Average quality of a read, computed on error probabilities rather than on scores.
/// Takes the raw quality string (ASCII, offset 33). Empty reads have quality 0
pub fn mean_phred(qual: &[u8]) -> f64 {
    if qual.is_empty() {
        return 0.0;
    }
    let sum: f64 = qual
        .iter()
        .map(|c| {
            let q = c.saturating_sub(PHRED_OFFSET) as usize;
            PHRED_ERROR_PROB[q.min(MAX_PHRED)]
        })
        .sum();
    -10.0 * (sum / qual.len() as f64).log10()
}

/// Length and mean quality of one read
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReadQuality {
    pub id: String,
    pub length: usize,
    pub mean_quality: f64,
}

pub fn open_fastq(p: &Path) -> anyhow::Result<FastqReader<Box<dyn Read>>> {
    require_file(p)?;
    Ok(FastqReader::new(open_maybe_compressed(p)?))
}

/// Compute length and mean quality for all reads of a FASTQ file
pub fn read_qualities(p: &Path) -> anyhow::Result<Vec<ReadQuality>> {
    let mut reader = open_fastq(p)?;
    let mut list = Vec::new();
    while let Some(record) = reader.next() {
        let record = record?;
        list.push(ReadQuality {
            id: record.id()?.to_string(),
            length: record.seq().len(),
            mean_quality: mean_phred(record.qual()),
        });
    }
    Ok(list)
}
