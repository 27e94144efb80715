use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use itertools::Itertools;
use walkdir::WalkDir;

use crate::error::require_dir;
use crate::error::PipelineError;

/// Files in the sample directory with this extension each define one sample
pub const SAMPLE_FILE_EXTENSION: &str = "fastq";

/// Prefix of the per-sample files listing raw read ids
pub const RAWSEQIDS_PREFIX: &str = "rawseqids_";

pub fn rawseqids_path(dir: &Path, sample: &str) -> PathBuf {
    dir.join(format!("{}{}", RAWSEQIDS_PREFIX, sample))
}

/// List sample names, i.e. stems of the *.fastq files in a directory, sorted by name
pub fn discover_samples(p: &Path) -> anyhow::Result<Vec<String>> {
    require_dir(p)?;
    let mut list = Vec::new();
    for entry in WalkDir::new(p).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(SAMPLE_FILE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            list.push(stem.to_string());
        }
    }
    Ok(list.into_iter().sorted().collect())
}

/// Read a list of ids, one per line. Surrounding whitespace is removed and blank lines skipped
pub fn read_seqid_list(p: &Path) -> anyhow::Result<HashSet<String>> {
    let file = File::open(p)?;
    let reader = BufReader::new(file);
    let mut ids = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

///////////////////////////////
/// Raw read ids of each sample, in sample discovery order
#[derive(Debug, Default)]
pub struct RawReadSets {
    samples: Vec<(String, HashSet<String>)>,
}
impl RawReadSets {
    pub fn new() -> RawReadSets {
        RawReadSets::default()
    }

    pub fn add_sample(&mut self, name: &str, ids: HashSet<String>) {
        self.samples.push((name.to_string(), ids));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_names(&self) -> Vec<String> {
        self.samples.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashSet<String>)> {
        self.samples.iter().map(|(n, ids)| (n.as_str(), ids))
    }

    /// Load the id list of every sample. Samples whose list is absent or cannot be read are
    /// left out with one warning each; they are returned separately so the caller can report them
    pub fn load(
        samples: &[String],
        path_rawseqids: &Path,
    ) -> anyhow::Result<(RawReadSets, Vec<PipelineError>)> {
        require_dir(path_rawseqids)?;

        let mut sets = RawReadSets::new();
        let mut missing = Vec::new();
        for sample in samples {
            let p = rawseqids_path(path_rawseqids, sample);
            if !p.is_file() {
                let e = PipelineError::MissingSample {
                    sample: sample.clone(),
                    path: p,
                };
                log::warn!("{}", e);
                missing.push(e);
                continue;
            }
            match read_seqid_list(&p) {
                Ok(ids) => {
                    log::debug!("Sample {} has {} raw reads", sample, ids.len());
                    sets.add_sample(sample, ids);
                }
                Err(err) => {
                    let e = PipelineError::UnreadableSample {
                        sample: sample.clone(),
                        path: p,
                        msg: format!("{:#}", err),
                    };
                    log::warn!("{}", e);
                    missing.push(e);
                }
            }
        }
        Ok((sets, missing))
    }
}
